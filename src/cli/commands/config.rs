//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{DdddError, DdddResult};
use crate::platform::AssetTable;
use crate::service::Readiness;
use crate::ui::{self, UiContext};
use clap::ValueEnum;
use std::path::PathBuf;

/// Recognised `config set` keys
const KEYS: &[&str] = &[
    "general.log_format",
    "service.address",
    "service.port",
    "release.api_url",
    "release.asset_table",
    "release.timeout_secs",
    "launcher.readiness",
    "launcher.ready_timeout_secs",
    "launcher.cache_dir",
    "launcher.offline_fallback",
    "client.timeout_secs",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> DdddResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> DdddResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> DdddResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );
    Ok(())
}

async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> DdddResult<()> {
    let ctx = UiContext::detect();

    // Edit what is on disk, not the env-overridden view
    let mut config = if manager.path().exists() {
        manager.load_from_file(manager.path()).await?
    } else {
        Config::default()
    };

    apply(&mut config, key, value)?;
    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
    Ok(())
}

/// Set one dotted key on `config`
fn apply(config: &mut Config, key: &str, value: &str) -> DdddResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => {
            config.general.log_format = match value {
                "text" | "json" => value.to_string(),
                _ => return Err(invalid(key, value, "text or json")),
            }
        }
        ["service", "address"] => config.service.address = value.to_string(),
        ["service", "port"] => {
            config.service.port = value
                .parse()
                .map_err(|_| invalid(key, value, "a port number"))?
        }
        ["release", "api_url"] => config.release.api_url = value.to_string(),
        ["release", "asset_table"] => {
            config.release.asset_table = AssetTable::from_str(value, true)
                .map_err(|_| invalid(key, value, "musl or generic"))?
        }
        ["release", "timeout_secs"] => config.release.timeout_secs = parse_u64(key, value)?,
        ["launcher", "readiness"] => {
            config.launcher.readiness = Readiness::from_str(value, true)
                .map_err(|_| invalid(key, value, "poll or tcp"))?
        }
        ["launcher", "ready_timeout_secs"] => {
            config.launcher.ready_timeout_secs = parse_u64(key, value)?
        }
        ["launcher", "cache_dir"] => {
            config.launcher.cache_dir = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            }
        }
        ["launcher", "offline_fallback"] => {
            config.launcher.offline_fallback = parse_bool(key, value)?
        }
        ["client", "timeout_secs"] => config.client.timeout_secs = parse_u64(key, value)?,
        _ => {
            return Err(DdddError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                KEYS.join(", ")
            )))
        }
    }
    Ok(())
}

fn invalid(key: &str, value: &str, expected: &str) -> DdddError {
    DdddError::User(format!(
        "Invalid value '{}' for {}: expected {}",
        value, key, expected
    ))
}

fn parse_bool(key: &str, value: &str) -> DdddResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(key, value, "true or false")),
    }
}

fn parse_u64(key: &str, value: &str) -> DdddResult<u64> {
    value
        .parse()
        .map_err(|_| invalid(key, value, "a whole number of seconds"))
}
