//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};
use std::time::Duration;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            eprintln!("{} {}", style("[FAIL]").red(), message);
        }
    }

    /// Stop with warning message
    pub fn stop_warn(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            eprintln!("{} {}", style("[WARN]").yellow(), message);
        }
    }
}

/// Byte progress for the release download.
///
/// Interactive terminals get an indicatif bar with percentage, size and
/// throughput. Otherwise the bar is hidden but still counts, and a
/// one-line summary is printed when the download ends.
pub struct DownloadProgress {
    bar: ProgressBar,
    fancy: bool,
    silent: bool,
}

impl DownloadProgress {
    /// Progress for `ctx`
    pub fn new(ctx: &UiContext) -> Self {
        let fancy = ctx.use_fancy_output();
        let bar = if fancy {
            ProgressBar::no_length()
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            fancy,
            silent: false,
        }
    }

    /// Progress that prints nothing at all
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            fancy: false,
            silent: true,
        }
    }

    /// Begin reporting; `total` is the content length if the server sent one
    pub fn start(&self, total: Option<u64>) {
        if let Some(total) = total {
            self.bar.set_length(total);
        }
        if !self.fancy {
            return;
        }

        let style = match total {
            Some(_) => ProgressStyle::with_template(
                "  {spinner:.cyan} Downloading {bar:30.cyan/dim} {percent:>3}% {bytes}/{total_bytes} {bytes_per_sec:.dim}",
            ),
            None => ProgressStyle::with_template(
                "  {spinner:.cyan} Downloading {bytes} {bytes_per_sec:.dim}",
            ),
        };
        if let Ok(style) = style {
            self.bar
                .set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ").progress_chars("━╸─"));
        }
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    /// Account for `n` more bytes
    pub fn advance(&self, n: u64) {
        self.bar.inc(n);
    }

    /// Finish and print a summary line
    pub fn finish(&self, written: u64) {
        let elapsed = self.bar.elapsed();
        if self.fancy {
            self.bar.disable_steady_tick();
            self.bar.finish_and_clear();
        }
        if self.silent {
            return;
        }
        println!("  {}", summary_line(written, elapsed));
    }
}

/// "Downloaded 1.50 MiB in 2 seconds (768.00 KiB/s)"
fn summary_line(written: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rate = (written as f64 / secs) as u64;
        format!(
            "Downloaded {} in {} ({}/s)",
            HumanBytes(written),
            HumanDuration(elapsed),
            HumanBytes(rate)
        )
    } else {
        format!("Downloaded {}", HumanBytes(written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Testing...");
        spinner.stop("Done");
        spinner.start("Testing...");
        spinner.stop_warn("Slow");
    }

    #[test]
    fn download_progress_counts_while_hidden() {
        let ctx = UiContext::non_interactive();
        let progress = DownloadProgress::new(&ctx);
        progress.start(Some(100));
        progress.advance(40);
        progress.advance(60);
        assert_eq!(progress.bar.position(), 100);
        progress.finish(100);
    }

    #[test]
    fn summary_mentions_size() {
        let line = summary_line(1536, Duration::from_secs(2));
        assert!(line.starts_with("Downloaded 1.50 KiB"));
        assert!(line.contains("/s)"));
        assert_eq!(summary_line(10, Duration::ZERO), "Downloaded 10 B");
    }
}
