use crate::app::App;
use crate::constants::server::{NAME, PROTOCOL_VERSION, VERSION};
use crate::errors::{ErrorCode, ToolError};
use crate::mcp::catalog::tool_catalog;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::services::logger::Logger;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct McpServer {
    app: Arc<App>,
    logger: Logger,
}

impl McpServer {
    pub fn new(app: App) -> Self {
        let logger = app.logger.child("server");
        Self {
            app: Arc::new(app),
            logger,
        }
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"list": true, "call": true}},
            "serverInfo": {"name": NAME, "version": VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": tool_catalog() })
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params = params.as_object().cloned().unwrap_or_default();
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        if name.is_empty() {
            return JsonRpcResponse::failure(
                id,
                ErrorCode::InvalidParams.as_i32(),
                "Missing tool name".to_string(),
            );
        }
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);

        let call_id = uuid::Uuid::new_v4().to_string();
        self.logger.debug(
            "tools/call",
            Some(&serde_json::json!({ "call_id": call_id, "tool": name })),
        );
        match self.app.tool_executor.execute(name, args).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(body) => JsonRpcResponse::success(id, body),
                Err(err) => JsonRpcResponse::failure(
                    id,
                    ErrorCode::InternalError.as_i32(),
                    format!("Failed to encode tool result: {}", err),
                ),
            },
            Err(err) => JsonRpcResponse::failure(id, err.code.as_i32(), err.message),
        }
    }

    /// Answers one protocol line. Notifications yield `None`.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError.as_i32(),
                    "Parse error".to_string(),
                ))
            }
        };
        let raw_id = parsed.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(req) => req,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    raw_id,
                    ErrorCode::InvalidRequest.as_i32(),
                    "Invalid request".to_string(),
                ))
            }
        };

        let id = request.id?;
        match request.method.as_str() {
            "initialize" => Some(JsonRpcResponse::success(id, self.handle_initialize())),
            "notifications/initialized" => Some(JsonRpcResponse::success(id, serde_json::json!({}))),
            "ping" => Some(JsonRpcResponse::success(id, serde_json::json!({}))),
            "tools/list" => Some(JsonRpcResponse::success(id, self.handle_tools_list())),
            "tools/call" => Some(self.handle_tools_call(id, request.params).await),
            _ => Some(JsonRpcResponse::failure(
                id,
                ErrorCode::MethodNotFound.as_i32(),
                "Method not found".to_string(),
            )),
        }
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Reads newline-delimited requests from `input`. Each request runs on
    /// its own task, so a slow remote command does not hold up other calls;
    /// responses go through a single writer and may arrive out of order.
    pub async fn serve<R, W>(&self, input: R, output: W) -> Result<(), ToolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_logger = self.logger.clone();
        let writer = tokio::spawn(async move {
            let mut out = BufWriter::new(output);
            while let Some(response) = rx.recv().await {
                let payload = match serde_json::to_string(&response) {
                    Ok(payload) => payload,
                    Err(err) => {
                        writer_logger.error(
                            "failed to encode response",
                            Some(&serde_json::json!({ "error": err.to_string() })),
                        );
                        continue;
                    }
                };
                out.write_all(payload.as_bytes()).await?;
                out.write_all(b"\n").await?;
                out.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let mut reader = input.lines();
        self.logger.info("listening", None);
        while let Some(line) = reader
            .next_line()
            .await
            .map_err(|err| ToolError::internal(err.to_string()))?
        {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                continue;
            }
            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_message(&trimmed).await {
                    let _ = tx.send(response);
                }
            });
        }

        // Input closed: let in-flight calls finish, then drain the writer.
        drop(tx);
        writer
            .await
            .map_err(|err| ToolError::internal(format!("writer task failed: {}", err)))??;
        self.logger.info("input closed, shutting down", None);
        Ok(())
    }
}

pub async fn run_stdio() -> Result<(), ToolError> {
    let app = App::initialize()?;
    McpServer::new(app).run_stdio().await
}
