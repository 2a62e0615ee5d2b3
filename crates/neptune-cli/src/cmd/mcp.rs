use crate::tools::{self, ToolCtx};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ToolContent {
    r#type: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct ToolCallResult {
    content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    is_error: bool,
}

const INSTRUCTIONS: &str = "Neptune deploys containerised projects. Describe the project in \
neptune.json (see 'get_project_schema'), declare resources with 'add_new_resource', then run \
'provision_resources' and 'deploy_project'. Use 'wait_for_deployment', 'get_deployment_status' \
and 'get_logs' to follow the rollout.";

impl JsonRpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

/// Serve JSON-RPC requests, one per line on stdin, until stdin closes.
pub fn run(ctx: &ToolCtx) -> anyhow::Result<()> {
    tracing::info!(dir = %ctx.dir.display(), "neptune MCP server started");
    let stdout = std::io::stdout();
    let tools = tools::all_tools();

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(response) = respond_to_line(&line, &tools, ctx) else {
            continue;
        };
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &response)?;
        writeln!(out)?;
        out.flush()?;
    }

    tracing::info!("stdin closed; MCP server exiting");
    Ok(())
}

/// `None` for notifications, which get no reply.
fn respond_to_line(
    line: &str,
    tools: &[Box<dyn tools::NeptuneTool>],
    ctx: &ToolCtx,
) -> Option<JsonRpcResponse> {
    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Some(JsonRpcResponse::err(None, PARSE_ERROR, format!("parse error: {e}"))),
    };
    if !raw.as_object().is_some_and(|o| o.contains_key("id")) {
        return None;
    }
    match serde_json::from_value::<JsonRpcRequest>(raw) {
        Ok(req) => Some(handle_request(&req, tools, ctx)),
        Err(e) => Some(JsonRpcResponse::err(
            None,
            INVALID_REQUEST,
            format!("invalid request: {e}"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Request dispatch
// ---------------------------------------------------------------------------

pub fn handle_request(
    req: &JsonRpcRequest,
    tools: &[Box<dyn tools::NeptuneTool>],
    ctx: &ToolCtx,
) -> JsonRpcResponse {
    let id = req.id.clone();
    match req.method.as_str() {
        "initialize" => JsonRpcResponse::ok(
            id,
            serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "neptune",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": INSTRUCTIONS
            }),
        ),

        "tools/list" => {
            let listed: Vec<Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name(),
                        "description": t.description(),
                        "inputSchema": t.schema()
                    })
                })
                .collect();
            JsonRpcResponse::ok(id, serde_json::json!({ "tools": listed }))
        }

        "tools/call" => {
            let Some(params) = &req.params else {
                return JsonRpcResponse::err(id, INVALID_PARAMS, "missing params");
            };
            let Some(tool_name) = params["name"].as_str() else {
                return JsonRpcResponse::err(id, INVALID_PARAMS, "missing tool name in params");
            };
            let Some(tool) = tools.iter().find(|t| t.name() == tool_name) else {
                return JsonRpcResponse::err(
                    id,
                    METHOD_NOT_FOUND,
                    format!("tool not found: {tool_name}"),
                );
            };

            let args = params.get("arguments").cloned().unwrap_or(Value::Null);
            tracing::info!(tool = tool_name, "tool call");
            let (text, is_error) = match tool.call(args, ctx) {
                Ok(v) => (
                    serde_json::to_string_pretty(&v)
                        .unwrap_or_else(|e| format!("serialization error: {e}")),
                    false,
                ),
                Err(e) => {
                    tracing::warn!(tool = tool_name, error = %e, "tool failed");
                    (e, true)
                }
            };
            let result = ToolCallResult {
                content: vec![ToolContent {
                    r#type: "text",
                    text,
                }],
                is_error,
            };
            JsonRpcResponse::ok(
                id,
                serde_json::to_value(&result)
                    .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() })),
            )
        }

        other => JsonRpcResponse::err(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
