//! CLI argument definitions using clap derive

use crate::client::legacy::{Format, LegacyOption, Transport};
use crate::client::HsvRange;
use crate::platform::AssetTable;
use crate::service::Readiness;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ddddctl - run and query a local ddddocr service
///
/// Downloads the ddddocr release for this platform, keeps it cached,
/// starts it in the background and sends OCR, detection and slide
/// captcha requests to it.
#[derive(Parser, Debug)]
#[command(name = "ddddctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DDDDCTL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download (if needed) and start the ddddocr service
    Start(StartArgs),

    /// Recognize text in an image
    Ocr(OcrArgs),

    /// Detect objects in an image
    Det(DetArgs),

    /// Locate a slider piece in a background image
    Slide(SlideArgs),

    /// Call a legacy /{option}/{b64|file}/{text|json} route
    Legacy(LegacyArgs),

    /// Ping the service (legacy /ping)
    Ping(PingArgs),

    /// Talk to the service's MCP endpoint
    Mcp(McpArgs),

    /// Exercise every JSON route and print equivalent curl commands
    Smoke(SmokeArgs),

    /// Show service, release and cache state
    Status,

    /// Inspect or clear the binary cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the start command
#[derive(Parser, Debug, Default)]
pub struct StartArgs {
    /// Address to bind (default: from config)
    #[arg(long)]
    pub address: Option<String>,

    /// Port to bind (default: from config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Readiness check
    #[arg(long, value_enum)]
    pub readiness: Option<Readiness>,

    /// Seconds to wait for the service to answer after spawning
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Release asset naming
    #[arg(long, value_enum)]
    pub asset_table: Option<AssetTable>,
}

/// Arguments for the ocr command
#[derive(Parser, Debug)]
pub struct OcrArgs {
    /// Path to the image file
    pub image: PathBuf,

    /// Color filter preset (red, blue, green, yellow, orange, purple, cyan, black, white, gray); repeatable
    #[arg(long = "color-filter")]
    pub color_filter: Vec<String>,

    /// HSV range filter as h,s,v:h,s,v; repeatable, overrides presets
    #[arg(long = "hsv-range")]
    pub hsv_range: Vec<HsvRange>,

    /// Character range for recognition (0-7 or a custom string)
    #[arg(long)]
    pub charset_range: Option<String>,

    /// Ask for per-character probabilities
    #[arg(long)]
    pub probability: bool,

    /// Endpoint URL (default: <service>/ocr)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Print only the recognized text
    #[arg(long, conflicts_with = "json")]
    pub text_only: bool,

    /// Print the result data as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the det command
#[derive(Parser, Debug)]
pub struct DetArgs {
    /// Path to the image file
    pub image: PathBuf,

    /// Endpoint URL (default: <service>/det)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Print the result data as JSON
    #[arg(long)]
    pub json: bool,
}

/// Slide algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SlideAlgorithm {
    /// Template match of a (transparent) piece
    #[default]
    Match,
    /// Compare a background with and without the gap
    Comparison,
}

/// Arguments for the slide command
#[derive(Parser, Debug)]
pub struct SlideArgs {
    /// Path to the target/slide image
    pub target: PathBuf,

    /// Path to the background image
    pub background: PathBuf,

    /// Algorithm to use
    #[arg(long, value_enum, default_value_t = SlideAlgorithm::Match)]
    pub algorithm: SlideAlgorithm,

    /// Endpoint URL (default: <service>/slide-match or /slide-comparison)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use simple matching for non-transparent targets
    #[arg(long)]
    pub simple_target: bool,

    /// Print the result data as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the legacy command
#[derive(Parser, Debug)]
pub struct LegacyArgs {
    /// Route option
    #[arg(value_enum)]
    pub option: LegacyOption,

    /// Image(s): one, or target then background for match/simple_match/compare
    #[arg(required = true, num_args = 1..=2)]
    pub images: Vec<PathBuf>,

    /// How images are sent
    #[arg(long, value_enum, default_value_t = Transport::B64)]
    pub transport: Transport,

    /// Response format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Service base URL (default: from config)
    #[arg(long)]
    pub base_url: Option<String>,
}

/// Arguments for the ping command
#[derive(Parser, Debug)]
pub struct PingArgs {
    /// Service base URL (default: from config)
    #[arg(long)]
    pub base_url: Option<String>,
}

/// Arguments for the mcp command
#[derive(Parser, Debug)]
pub struct McpArgs {
    #[command(subcommand)]
    pub action: McpAction,

    /// MCP endpoint URL (default: <service>/mcp)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

/// MCP subcommands
#[derive(Subcommand, Debug)]
pub enum McpAction {
    /// Run the initialize handshake and print server info
    Init,

    /// List available tools
    Tools {
        /// Print the full tools/list result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Call a tool
    Call {
        /// Tool name
        tool: String,

        /// String argument (KEY=VALUE); repeatable
        #[arg(short, long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,

        /// Image argument, base64-encoded from a file (KEY=PATH); repeatable
        #[arg(short, long = "image", value_parser = parse_key_value)]
        images: Vec<(String, String)>,
    },
}

/// Arguments for the smoke command
#[derive(Parser, Debug)]
pub struct SmokeArgs {
    /// Image for the ocr and det routes
    #[arg(long, default_value = "./image/4.png")]
    pub image: PathBuf,

    /// Slide-match target image
    #[arg(long, default_value = "./image/a.png")]
    pub slide_target: PathBuf,

    /// Slide-match background image
    #[arg(long, default_value = "./image/b.png")]
    pub slide_background: PathBuf,

    /// Slide-comparison target image
    #[arg(long, default_value = "./image/c.jpg")]
    pub compare_target: PathBuf,

    /// Slide-comparison background image
    #[arg(long, default_value = "./image/d.jpg")]
    pub compare_background: PathBuf,

    /// Service base URL (default: from config)
    #[arg(long)]
    pub base_url: Option<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the cached installation
    Info,

    /// Print the cache directory
    Path,

    /// Delete the cache directory
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., service.port)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Parse KEY=VALUE
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE format: empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
