//! Status command - service, platform and cache state

use crate::cache::BinaryCache;
use crate::config::Config;
use crate::error::DdddResult;
use crate::platform::Platform;
use crate::service::{self, ServiceAddr};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> DdddResult<()> {
    println!("{}", style("ddddctl Status").bold().cyan());
    println!();

    let addr = ServiceAddr::new(config.service.address.clone(), config.service.port);
    let readiness = config.launcher.readiness;

    println!("{}", style("Service:").bold());
    if service::is_running(&addr, readiness).await {
        println!("  {} Running on {} ({} check)", CHECK, addr, readiness);
        println!("    MCP endpoint: {}", addr.mcp_url());
        println!("    API documentation: {}", addr.docs_url());
    } else {
        println!("  {} Not running on {} ({} check)", CROSS, addr, readiness);
        println!("    Start it with: {}", style("ddddctl start").cyan());
    }

    println!();
    println!("{}", style("Platform:").bold());
    let platform = Platform::detect();
    println!("  {} Detected: {} {}", CHECK, platform.os, platform.arch);
    let table = config.release.asset_table;
    let exe_name = platform.executable_name();
    match platform.asset_filename(table) {
        Ok(asset) => println!("  {} Release asset: {} ({} table)", CHECK, asset, table),
        Err(e) => println!("  {} {}", CROSS, style(e).red()),
    }

    println!();
    println!("{}", style("Cache:").bold());
    let cache = BinaryCache::new(config.cache_dir());
    println!("  Directory: {}", cache.dir().display());
    match cache.installation(exe_name) {
        Some(install) => {
            println!("  {} Executable: {}", CHECK, install.executable.display());
            match install.version {
                Some(v) => println!("  {} Version: {}", CHECK, v),
                None => println!(
                    "  {} Version marker missing; next start will re-download",
                    WARN
                ),
            }
        }
        None => println!(
            "  {} No cached executable; {} will download it",
            WARN,
            style("ddddctl start").cyan()
        ),
    }

    Ok(())
}
