//! JSON-RPC 2.0 client for the service's `/mcp` endpoint

use crate::error::{DdddError, DdddResult};
use crate::http;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Protocol revision sent in `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const SESSION_HEADER: &str = "mcp-session-id";

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    /// `result`, or the `error` object as `DdddError::Mcp`
    pub fn into_result(self) -> DdddResult<Value> {
        match (self.error, self.result) {
            (Some(err), _) => Err(DdddError::Mcp {
                code: err.code,
                message: err.message,
            }),
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// MCP client over plain HTTP POSTs
pub struct McpClient {
    agent: Agent,
    url: String,
    next_id: AtomicU64,
    session: Option<String>,
}

impl McpClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
            url: url.into(),
            next_id: AtomicU64::new(1),
            session: None,
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Send one request and return its `result`
    pub fn request(&mut self, method: &str, params: Value) -> DdddResult<Value> {
        let request = JsonRpcRequest::new(method, params, self.next_id());
        debug!("MCP {} (id {})", request.method, request.id);

        let mut builder = self
            .agent
            .post(&self.url)
            .header("User-Agent", http::USER_AGENT)
            .header("Accept", "application/json, text/event-stream");
        if let Some(session) = &self.session {
            builder = builder.header(SESSION_HEADER, session.as_str());
        }

        let mut response = builder
            .send_json(&request)
            .map_err(|e| DdddError::unreachable(&self.url, e))?;

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session = Some(session.to_string());
        }

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DdddError::unreachable(&self.url, e))?;
        if status != 200 {
            return Err(DdddError::unreachable(
                &self.url,
                format!("{} returned HTTP {}", self.url, status),
            ));
        }

        parse_response(&body)?.into_result()
    }

    /// `initialize` handshake; returns the server's capabilities
    pub fn initialize(&mut self) -> DdddResult<Value> {
        self.request(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "ddddctl",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
    }

    /// `tools/list`
    pub fn list_tools(&mut self) -> DdddResult<Value> {
        self.request("tools/list", json!({}))
    }

    /// `tools/call`
    pub fn call_tool(&mut self, name: &str, arguments: Value) -> DdddResult<Value> {
        self.request(
            "tools/call",
            json!({
                "name": name,
                "arguments": arguments,
            }),
        )
    }
}

/// Parse a JSON body, or the last `data:` line of an SSE body
pub fn parse_response(body: &str) -> DdddResult<JsonRpcResponse> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let data = trimmed
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .ok_or_else(|| DdddError::Service("Empty MCP response".to_string()))?;
    Ok(serde_json::from_str(data)?)
}

/// Tool names from a `tools/list` result
pub fn tool_names(result: &Value) -> Vec<String> {
    result
        .get("tools")
        .and_then(Value::as_array)
        .map(|tools| {
            tools
                .iter()
                .filter_map(|t| t.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape() {
        let req = JsonRpcRequest::new("tools/list", json!({}), 7);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"jsonrpc": "2.0", "method": "tools/list", "params": {}, "id": 7})
        );
    }

    #[test]
    fn parse_plain_json() {
        let resp = parse_response(r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#).unwrap();
        assert_eq!(resp.into_result().unwrap(), json!({"tools": []}));
    }

    #[test]
    fn parse_event_stream() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\n\n";
        let resp = parse_response(body).unwrap();
        assert_eq!(resp.into_result().unwrap(), json!({"ok": true}));
    }

    #[test]
    fn error_object_surfaces() {
        let resp = parse_response(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.to_string(), "MCP error -32601: Method not found");
    }

    #[test]
    fn empty_body_is_error() {
        assert!(parse_response("").is_err());
    }

    #[test]
    fn tool_names_extracted() {
        let result = json!({"tools": [{"name": "ocr"}, {"name": "det"}, {"description": "x"}]});
        assert_eq!(tool_names(&result), vec!["ocr", "det"]);
    }
}
