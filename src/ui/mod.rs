//! Terminal output for the launcher and maintenance commands
//!
//! Uses `cliclack` framing and an `indicatif` download bar on a terminal,
//! and plain tagged lines when piped or under CI. The request commands
//! (`ocr`, `det`, `slide`) bypass this and print bare results.
//!
//! ```rust,ignore
//! use ddddctl::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "ddddocr service");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Checking release feed...");
//! spinner.stop("Latest release: v1.6.0");
//!
//! ui::outro_success(&ctx, "Service started");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, step_info, step_ok, step_ok_detail,
    step_warn_hint,
};
pub use progress::{DownloadProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, DdddTheme};
