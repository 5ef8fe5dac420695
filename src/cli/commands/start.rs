//! Start command - resolve, download if needed, and launch the service

use crate::blocking;
use crate::cache::install::make_executable;
use crate::cache::{BinaryCache, Installer, UpdatePlan};
use crate::cli::args::StartArgs;
use crate::config::Config;
use crate::error::{DdddError, DdddResult};
use crate::platform::Platform;
use crate::release::{ReleaseDescriptor, ReleaseFeed};
use crate::service::{self, Readiness, ServiceAddr};
use crate::ui::{self, DownloadProgress, TaskSpinner, UiContext};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Execute the start command
pub async fn execute(args: StartArgs, config: &Config) -> DdddResult<()> {
    let ctx = UiContext::detect();

    let addr = ServiceAddr::new(
        args.address
            .unwrap_or_else(|| config.service.address.clone()),
        args.port.unwrap_or(config.service.port),
    );
    let readiness = args.readiness.unwrap_or(config.launcher.readiness);
    let ready_timeout = args.timeout.unwrap_or(config.launcher.ready_timeout_secs);
    let table = args.asset_table.unwrap_or(config.release.asset_table);

    ui::intro(&ctx, "ddddocr service");

    if service::is_running(&addr, readiness).await {
        ui::step_ok(
            &ctx,
            &format!("DDDDOCR service already running on {}", addr),
        );
        ui::key_value(&ctx, "MCP endpoint", &addr.mcp_url());
        ui::outro_success(&ctx, "Nothing to do");
        return Ok(());
    }

    let platform = Platform::detect();
    let filename = platform.asset_filename(table)?;
    let exe_name = platform.executable_name();
    debug!("Resolved asset {} ({} table)", filename, table);

    let cache = BinaryCache::new(config.cache_dir());
    cache.ensure_dir()?;

    let executable = prepare_executable(&ctx, config, &cache, filename, exe_name).await?;

    ui::key_value(&ctx, "Executable", &executable.display().to_string());
    ui::step_info(&ctx, &format!("Starting DDDDOCR service on {}...", addr));
    ui::key_value(&ctx, "Features", "ocr, det, slide, mcp");

    let handle = service::spawn_detached(&executable, &addr, &cache.log_file())?;

    ui::step_ok(
        &ctx,
        &format!("Service started with PID: {}", handle.pid),
    );
    ui::key_value(&ctx, "MCP endpoint", &addr.mcp_url());
    ui::key_value(&ctx, "API documentation", &addr.docs_url());
    ui::key_value(&ctx, "Log file", &cache.log_file().display().to_string());

    wait_for_service(&ctx, &addr, readiness, ready_timeout).await;
    Ok(())
}

/// Return an executable to launch, downloading the latest release when needed
async fn prepare_executable(
    ctx: &UiContext,
    config: &Config,
    cache: &BinaryCache,
    filename: &'static str,
    exe_name: &'static str,
) -> DdddResult<PathBuf> {
    let feed = ReleaseFeed::new(
        config.release.api_url.clone(),
        Duration::from_secs(config.release.timeout_secs),
    );

    debug!("Release feed {}", feed.api_url());

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Checking latest release...");
    let release = blocking(move || Ok(feed.latest_for(filename))).await?;

    let cached_exe = cache.find_executable(exe_name);

    let Some(release) = release else {
        spinner.stop_error(&format!("Could not find release for {}", filename));
        return match cached_exe {
            Some(exe) if config.launcher.offline_fallback => {
                ui::step_warn_hint(
                    ctx,
                    "Release feed unavailable, using cached executable",
                    &cached_label(cache),
                );
                make_executable(&exe);
                Ok(exe)
            }
            _ => Err(DdddError::ReleaseNotFound(filename.to_string())),
        };
    };
    spinner.stop(&format!("Latest release: {}", release.version));

    let plan = UpdatePlan::decide(
        cached_exe.is_some(),
        cache.cached_version().as_deref(),
        &release.version,
    );

    if !plan.needs_download() {
        if let Some(exe) = cached_exe.clone() {
            ui::step_ok(
                ctx,
                &format!("Using cached DDDDOCR: {}", display_version(&release.version)),
            );
            make_executable(&exe);
            return Ok(exe);
        }
    }

    match &plan {
        UpdatePlan::Update { from } => ui::step_info(
            ctx,
            &format!(
                "Updating ({} -> {}) DDDDOCR: {}...",
                from.as_deref().unwrap_or("unknown"),
                release.version,
                filename
            ),
        ),
        _ => ui::step_info(ctx, &format!("Downloading DDDDOCR: {}...", filename)),
    }
    download_release(ctx, cache, exe_name, release, cached_exe).await
}

async fn download_release(
    ctx: &UiContext,
    cache: &BinaryCache,
    exe_name: &'static str,
    release: ReleaseDescriptor,
    fallback: Option<PathBuf>,
) -> DdddResult<PathBuf> {
    ui::key_value(ctx, "Downloading from", &release.download_url);

    let installer = Installer::new(cache.clone(), exe_name);
    let progress = DownloadProgress::new(ctx);
    let version = release.version.clone();

    match blocking(move || installer.install(&release, &progress)).await {
        Ok(exe) => {
            ui::step_ok(
                ctx,
                &format!(
                    "Download and update completed ({})",
                    display_version(&version)
                ),
            );
            Ok(exe)
        }
        Err(e) => {
            debug!("Install failed: {}", e);
            // The swap either happened or was rolled back, so look again
            match cache.find_executable(exe_name).or(fallback) {
                Some(exe) if exe.exists() => {
                    ui::step_warn_hint(
                        ctx,
                        &format!("Error during download/update: {}", e),
                        &format!("Falling back to {}", cached_label(cache)),
                    );
                    make_executable(&exe);
                    Ok(exe)
                }
                _ => Err(e),
            }
        }
    }
}

async fn wait_for_service(ctx: &UiContext, addr: &ServiceAddr, readiness: Readiness, secs: u64) {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Waiting for service to start...");

    if service::wait_until_ready(addr, readiness, secs).await {
        spinner.stop("Service is ready");
        ui::outro_success(ctx, &format!("ddddocr listening on {}", addr.base_url()));
    } else {
        spinner.stop_warn("Service did not start within expected time");
        ui::outro_warn(ctx, "Check the service log for details");
    }
}

fn cached_label(cache: &BinaryCache) -> String {
    match cache.cached_version() {
        Some(v) => format!("cached DDDDOCR {}", display_version(&v)),
        None => "cached DDDDOCR (unknown version)".to_string(),
    }
}

/// `v1.6.0` whether or not the tag already carries the prefix
fn display_version(tag: &str) -> String {
    format!("v{}", tag.trim_start_matches('v'))
}
