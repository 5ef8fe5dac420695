//! MCP command - JSON-RPC over the service's /mcp endpoint

use crate::blocking;
use crate::cli::args::{McpAction, McpArgs};
use crate::client::mcp::{self, McpClient};
use crate::client::load_image;
use crate::config::Config;
use crate::error::{DdddError, DdddResult};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

/// Execute the mcp command
pub async fn execute(args: McpArgs, config: &Config) -> DdddResult<()> {
    let url = args
        .endpoint
        .unwrap_or_else(|| format!("{}/mcp", config.service_url()));
    let mut api = McpClient::new(url, Duration::from_secs(config.client.timeout_secs));

    match args.action {
        McpAction::Init => {
            let info = blocking(move || api.initialize()).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        McpAction::Tools { json } => {
            let tools = blocking(move || {
                api.initialize()?;
                api.list_tools()
            })
            .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tools)?);
            } else {
                for name in mcp::tool_names(&tools) {
                    println!("{}", name);
                }
            }
        }
        McpAction::Call { tool, args, images } => {
            let arguments = build_arguments(args, &images)?;
            let result = blocking(move || {
                api.initialize()?;
                api.call_tool(&tool, Value::Object(arguments))
            })
            .await?;
            println!("{}", render_tool_result(&result)?);
        }
    }
    Ok(())
}

/// Merge string arguments with base64-encoded image files
fn build_arguments(
    args: Vec<(String, String)>,
    images: &[(String, String)],
) -> DdddResult<Map<String, Value>> {
    let mut arguments: Map<String, Value> = args
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    for (key, path) in images {
        let encoded = load_image("Image file", Path::new(path))?;
        arguments.insert(key.clone(), Value::String(encoded));
    }
    Ok(arguments)
}

/// Text blocks of a tools/call result, or the result as JSON.
/// `isError` results become errors.
fn render_tool_result(result: &Value) -> DdddResult<String> {
    let texts: Vec<&str> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if is_error {
        let message = if texts.is_empty() {
            "Tool call failed".to_string()
        } else {
            texts.join("\n")
        };
        return Err(DdddError::Service(message));
    }

    if texts.is_empty() {
        Ok(serde_json::to_string_pretty(result)?)
    } else {
        Ok(texts.join("\n"))
    }
}
