//! CLI command implementations

pub mod cache;
pub mod config;
pub mod det;
pub mod legacy;
pub mod mcp;
pub mod ocr;
pub mod ping;
pub mod slide;
pub mod smoke;
pub mod start;
pub mod status;

pub use cache::execute as cache;
pub use config::execute as config;
pub use det::execute as det;
pub use legacy::execute as legacy;
pub use mcp::execute as mcp;
pub use ocr::execute as ocr;
pub use ping::execute as ping;
pub use slide::execute as slide;
pub use smoke::execute as smoke;
pub use start::execute as start;
pub use status::execute as status;
