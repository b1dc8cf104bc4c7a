// MCP server: newline-delimited JSON-RPC 2.0 over stdio

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

/// Longest accepted request line.
const MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

/// Responses waiting for the writer.
const RESPONSE_BUFFER: usize = 64;

/// One inbound line, or a line that could not be framed as UTF-8 text.
#[derive(Debug)]
enum Inbound {
    Line(String),
    Malformed(LinesCodecError),
}

/// `LinesCodec` that reports oversized and non-UTF-8 lines as frames.
///
/// `FramedRead` stops decoding buffered input after a decoder error, so
/// recoverable line errors must never surface as `Err`.
struct RequestCodec {
    lines: LinesCodec,
}

impl RequestCodec {
    fn new(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn recover(result: Result<Option<String>, LinesCodecError>) -> Result<Option<Inbound>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(Inbound::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(Inbound::Malformed(LinesCodecError::MaxLineLengthExceeded)))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                Ok(Some(Inbound::Malformed(LinesCodecError::Io(e))))
            }
            Err(e) => Err(e),
        }
    }
}

impl Decoder for RequestCodec {
    type Item = Inbound;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Inbound>, LinesCodecError> {
        Self::recover(self.lines.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Inbound>, LinesCodecError> {
        Self::recover(self.lines.decode_eof(buf))
    }
}

pub struct McpServer {
    registry: ToolRegistry,
    server_info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            server_info: ServerInfo {
                name: "trello-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve on stdin/stdout until stdin closes or ctrl-c.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        info!(tools = self.registry.len(), "MCP server listening on stdio");

        tokio::select! {
            result = self.serve(tokio::io::stdin(), tokio::io::stdout()) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl-c, shutting down");
                Ok(())
            }
        }
    }

    /// Serve requests from `reader`, writing one response line per request.
    ///
    /// Each request runs on its own task, so responses are written in
    /// completion order and a throttled tool call never blocks `ping`.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (responses, outbox) = mpsc::channel(RESPONSE_BUFFER);
        let writer_task = tokio::spawn(write_responses(outbox, writer));

        let mut lines = FramedRead::new(reader, RequestCodec::new(MAX_LINE_LENGTH));
        let mut in_flight = JoinSet::new();

        while let Some(inbound) = lines.next().await {
            let line = match inbound.context("Failed to read request line")? {
                Inbound::Line(line) => line,
                Inbound::Malformed(e) => {
                    warn!(error = %e, "Unreadable request line");
                    let response = JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error());
                    if responses.send(response).await.is_err() {
                        break;
                    }
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let server = Arc::clone(&self);
            let responses = responses.clone();
            in_flight.spawn(async move {
                if let Some(response) = server.handle_line(&line).await {
                    if responses.send(response).await.is_err() {
                        debug!("Response writer closed, dropping response");
                    }
                }
            });

            // Reap finished requests so the set stays small.
            while let Some(joined) = in_flight.try_join_next() {
                log_join(joined);
            }
        }

        info!(pending = in_flight.len(), "Input closed, finishing in-flight requests");
        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        drop(responses);

        writer_task.await.context("Response writer panicked")??;
        info!("MCP server stopped");
        Ok(())
    }

    /// Handle one raw line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Malformed JSON-RPC message");
                return Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "Invalid JSON-RPC request");
                Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        debug!(method = %request.method, "Request received");
        let result = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init) => info!(
                    client = %init.client_info.name,
                    client_version = %init.client_info.version,
                    protocol_version = %init.protocol_version,
                    "Client initialized"
                ),
                Err(e) => debug!(error = %e, "Unrecognized initialize params"),
            }
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.server_info.clone(),
        };
        to_result(&result)
    }

    fn list_tools(&self) -> Result<serde_json::Value, JsonRpcError> {
        to_result(&ListToolsResult {
            tools: self.registry.list_schemas(),
        })
    }

    async fn call_tool(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tools/call params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))
            })?;

        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        let result = match tool.execute(params.arguments).await {
            Ok(result) => result,
            Err(e) => {
                let message = format!("{:#}", e);
                warn!(tool = %params.name, error = %message, "Tool execution failed");
                CallToolResult::error(message)
            }
        };
        to_result(&result)
    }
}

async fn write_responses<W>(mut outbox: mpsc::Receiver<JsonRpcResponse>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = outbox.recv().await {
        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        writer
            .write_all(payload.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await?;
    }
    Ok(())
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "Request task failed");
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}
