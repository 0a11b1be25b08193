//! MCP server: request handling and the stdio transport loop.

use std::io::{self, BufRead, BufReader, Write};

use serde_json::{json, Value};
use tracing::{debug, error, warn};

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_VERSION};
use super::tools::ToolRegistry;
use crate::service::MemoryGraphService;

/// MCP server over one memory graph service instance.
///
/// The stdio loop processes one request at a time, which is exactly the
/// serialization the core's concurrency model requires of its host.
pub struct McpServer {
    service: MemoryGraphService,
    registry: ToolRegistry,
}

impl McpServer {
    /// Creates a server over a ready service.
    #[must_use]
    pub fn new(service: MemoryGraphService) -> Self {
        Self {
            service,
            registry: ToolRegistry::new(),
        }
    }

    /// Handles one request; notifications yield no response.
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                request.id,
                json!({
                    "protocolVersion": MCP_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": "axons",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            ),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => {
                let tools: Vec<Value> = self
                    .registry
                    .list_tools()
                    .into_iter()
                    .map(|tool| {
                        json!({
                            "name": tool.name,
                            "description": tool.description,
                            "inputSchema": tool.input_schema,
                        })
                    })
                    .collect();
                JsonRpcResponse::success(request.id, json!({ "tools": tools }))
            }
            "tools/call" => self.handle_tool_call(request.id, request.params),
            "notifications/initialized" | "notifications/cancelled" => return None,
            method => {
                if is_notification {
                    debug!(method, "ignoring unknown notification");
                    return None;
                }
                JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(method))
            }
        };
        if is_notification {
            None
        } else {
            Some(response)
        }
    }

    fn handle_tool_call(&mut self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params = params.unwrap_or(Value::Null);
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("missing tool name"));
        };
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        debug!(tool = name, "tool call");
        let result = self.registry.execute(&mut self.service, name, &arguments);
        let is_error = result.get("error").is_some();
        let text = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());

        JsonRpcResponse::success(
            id,
            json!({
                "content": [{ "type": "text", "text": text }],
                "isError": is_error,
            }),
        )
    }

    /// Runs the server over stdio until the input stream closes.
    pub async fn run_stdio(mut self) -> Result<(), io::Error> {
        let stdin = io::stdin();
        let stdout = io::stdout();

        let reader = BufReader::new(stdin.lock());
        let mut stdout = stdout.lock();

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    error!("failed to read line: {e}");
                    break;
                }
            };
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    warn!("failed to parse request: {e}");
                    let response = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    Self::write_response(&mut stdout, &response)?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(request) {
                Self::write_response(&mut stdout, &response)?;
            }
        }
        Ok(())
    }

    fn write_response(
        stdout: &mut impl Write,
        response: &JsonRpcResponse,
    ) -> Result<(), io::Error> {
        match serde_json::to_string(response) {
            Ok(json) => {
                writeln!(stdout, "{json}")?;
                stdout.flush()
            }
            Err(e) => {
                error!("failed to serialize response: {e}");
                // A minimal static error keeps the client from hanging.
                let fallback =
                    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;
                writeln!(stdout, "{fallback}")?;
                stdout.flush()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plasticity::PlasticityConfig;

    fn server() -> McpServer {
        let service = MemoryGraphService::open_in_memory(PlasticityConfig::default()).unwrap();
        McpServer::new(service)
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(Value::from(1)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[test]
    fn test_initialize_reports_tools_capability() {
        let mut server = server();
        let response = server
            .handle_request(request("initialize", json!({})))
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "axons");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_tools_list_exposes_operation_set() {
        let mut server = server();
        let response = server
            .handle_request(request("tools/list", json!({})))
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 23);
    }

    #[test]
    fn test_tool_call_round_trip() {
        let mut server = server();
        let response = server
            .handle_request(request(
                "tools/call",
                json!({
                    "name": "axons_store",
                    "arguments": { "content": "c", "summary": "s" }
                }),
            ))
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
    }

    #[test]
    fn test_tool_call_error_flag() {
        let mut server = server();
        let response = server
            .handle_request(request(
                "tools/call",
                json!({ "name": "axons_recall", "arguments": {} }),
            ))
            .unwrap();
        assert_eq!(response.result.unwrap()["isError"], true);
    }

    #[test]
    fn test_unknown_method() {
        let mut server = server();
        let response = server.handle_request(request("bogus", json!({}))).unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn test_notifications_get_no_response() {
        let mut server = server();
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(server.handle_request(notification).is_none());
    }
}
