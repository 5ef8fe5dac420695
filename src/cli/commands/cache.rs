//! Cache command - inspect or clear the binary cache

use crate::blocking;
use crate::cache::{sha256_file, BinaryCache};
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::DdddResult;
use crate::platform::Platform;
use crate::ui::{self, UiContext};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> DdddResult<()> {
    let cache = BinaryCache::new(config.cache_dir());

    match args.action {
        CacheAction::Path => {
            println!("{}", cache.dir().display());
            Ok(())
        }
        CacheAction::Info => show_info(cache).await,
        CacheAction::Clear { yes } => clear(&cache, yes).await,
    }
}

async fn show_info(cache: BinaryCache) -> DdddResult<()> {
    let exe_name = Platform::detect().executable_name();

    println!("Directory:  {}", cache.dir().display());

    let Some(install) = cache.installation(exe_name) else {
        println!("Executable: (none)");
        return Ok(());
    };

    println!("Executable: {}", install.executable.display());
    println!(
        "Version:    {}",
        install.version.as_deref().unwrap_or("(no marker)")
    );
    if let Some(at) = cache.installed_at() {
        println!("Installed:  {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    let exe = install.executable.clone();
    let digest = blocking(move || sha256_file(&exe)).await?;
    println!("SHA-256:    {}", digest);
    Ok(())
}

async fn clear(cache: &BinaryCache, yes: bool) -> DdddResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);

    if !cache.dir().exists() {
        ui::step_info(
            &ctx,
            &format!("Cache directory {} does not exist", cache.dir().display()),
        );
        return Ok(());
    }

    let prompt = format!("Delete {}?", cache.dir().display());
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Cache not cleared", "Pass --yes to skip the prompt");
        return Ok(());
    }

    if cache.clear()? {
        ui::step_ok_detail(&ctx, "Cache cleared", &cache.dir().display().to_string());
    }
    Ok(())
}
