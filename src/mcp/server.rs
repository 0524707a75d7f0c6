//! MCP server implementation.

use super::protocol::*;
use super::tools::{error_payload, get_resources, get_tools, read_resource, tool_payload};
use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::error::{CourseGenError, ErrorKind};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, instrument, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "course-generator";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server exposing the course-generation operations as tools.
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
    call_timeout: Duration,
}

impl McpServer {
    /// Create a server with the default components.
    pub fn new(settings: Settings) -> crate::error::Result<Self> {
        let call_timeout = Duration::from_secs(settings.server.request_timeout_secs);
        let dispatcher = Dispatcher::new(settings)?;
        Ok(Self::with_dispatcher(Arc::new(dispatcher), call_timeout))
    }

    pub fn with_dispatcher(dispatcher: Arc<Dispatcher>, call_timeout: Duration) -> Self {
        Self {
            dispatcher,
            call_timeout,
        }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Course generator MCP server starting");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve newline-delimited JSON-RPC until `reader` is exhausted.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut encoded = serde_json::to_string(&response)?;
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, MCP server stopping");
        Ok(())
    }

    /// Handle one input line. Notifications produce no response.
    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"));
            }
        };

        if request.id.is_none() {
            debug!("Notification: {}", request.method);
            return None;
        }

        Some(self.handle_request(request).await)
    }

    /// Handle a single JSON-RPC request.
    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id;
        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::from_result(id, &ToolsListResult { tools: get_tools() }),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => JsonRpcResponse::from_result(
                id,
                &ResourcesListResult {
                    resources: get_resources(),
                },
            ),
            "resources/read" => self.handle_resources_read(id, request.params),
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", other),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ListCapability { list_changed: false },
                resources: ListCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_resources_read(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ResourceReadParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e))
            }
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        match read_resource(&params.uri) {
            Some(text) => JsonRpcResponse::from_result(
                id,
                &ResourceReadResult {
                    contents: vec![ResourceContent {
                        uri: params.uri,
                        mime_type: "text/plain".to_string(),
                        text: text.to_string(),
                    }],
                },
            ),
            None => JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                &format!("Unknown resource: {}", params.uri),
            ),
        }
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e))
            }
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let result = self.call_tool(&params.name, params.arguments).await;
        JsonRpcResponse::from_result(id, &result)
    }

    /// Run one tool, bounded by the call timeout.
    #[instrument(skip(self, arguments))]
    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let arguments = arguments.unwrap_or(Value::Null);
        let call = self.dispatcher.call(name, arguments);

        let failure = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(result)) => {
                return match serde_json::to_string_pretty(&tool_payload(&result)) {
                    Ok(text) => ToolCallResult::text(text),
                    Err(e) => ToolCallResult::error(
                        error_payload(name, ErrorKind::Internal, &e.to_string()).to_string(),
                    ),
                };
            }
            Ok(Err(e)) => e,
            Err(_) => CourseGenError::Timeout(self.call_timeout.as_secs()),
        };

        error!("Tool {} failed: {}", name, failure);
        let body = error_payload(name, failure.kind(), &failure.to_string());
        ToolCallResult::error(serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string()))
    }
}
