//! Model Context Protocol server exposing the outage sources as tools.
//!
//! Speaks JSON-RPC 2.0 over newline-delimited messages, one request per
//! line. Requests without an `id` are notifications and get no reply.
//!
//! | Tool | Result text |
//! |------|-------------|
//! | `fetch_outage_data` | IODA signals as pretty JSON, `null` when unavailable |
//! | `fetch_news` | Matching articles as a pretty JSON array |
//! | `get_visualization_url` | IODA visualization link |
//! | `analyze_outage` | All of the above in one JSON object |
//!
//! Every tool takes `location` (required) and `window_hours` (trailing
//! window ending now, defaulting to the configured window).

use chrono::Utc;
use outage_sources::{IodaClient, NewsClient};
use report_core::TimeWindow;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::ReporterConfig;
use crate::coordinator::source_clients;
use crate::error::OrchestratorError;

/// Name reported in the `initialize` handshake.
pub const SERVER_NAME: &str = "outage-analyzer";

/// MCP revision this server implements.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct McpRequest {
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
    id: Value,
}

impl McpResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(json!({ "code": code, "message": message.into() })),
            id,
        }
    }
}

/// Arguments shared by every tool.
#[derive(Debug)]
struct ToolArgs {
    location: String,
    hours: Value,
    window: TimeWindow,
}

/// Answers MCP requests using the IODA and news clients.
#[derive(Debug, Clone)]
pub struct McpServer {
    ioda: IodaClient,
    news: NewsClient,
    default_window_hours: i64,
}

impl McpServer {
    pub fn new(ioda: IodaClient, news: NewsClient, default_window_hours: i64) -> Self {
        Self {
            ioda,
            news,
            default_window_hours,
        }
    }

    /// Build the source clients from `config`.
    pub fn from_config(config: &ReporterConfig) -> Self {
        let (ioda, news) = source_clients(config);
        Self::new(ioda, news, config.default_window_hours)
    }

    /// Serve requests from `reader` until end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), OrchestratorError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server '{}' ready", SERVER_NAME);
        let mut lines = reader.lines();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(OrchestratorError::Transport)?
        {
            let Some(reply) = self.handle_line(&line).await? else {
                continue;
            };
            writer
                .write_all(reply.as_bytes())
                .await
                .map_err(OrchestratorError::Transport)?;
            writer
                .write_all(b"\n")
                .await
                .map_err(OrchestratorError::Transport)?;
            writer.flush().await.map_err(OrchestratorError::Transport)?;
        }

        info!("MCP input closed, shutting down");
        Ok(())
    }

    /// Handle one line of input, returning the encoded reply if any.
    pub async fn handle_line(&self, line: &str) -> Result<Option<String>, OrchestratorError> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let response = match serde_json::from_str::<McpRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Unparsable MCP message: {}", e);
                Some(McpResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };

        response
            .map(|r| serde_json::to_string(&r))
            .transpose()
            .map_err(OrchestratorError::from)
    }

    async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        debug!("MCP request: {}", request.method);

        let Some(id) = request.id else {
            debug!("MCP notification '{}' acknowledged", request.method);
            return None;
        };

        Some(match request.method.as_str() {
            "initialize" => McpResponse::result(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => McpResponse::result(id, json!({})),
            "tools/list" => McpResponse::result(id, json!({ "tools": tool_definitions() })),
            "tools/call" => match request.params.get("name").and_then(Value::as_str) {
                Some(name) => {
                    let arguments = request.params.get("arguments").cloned().unwrap_or_default();
                    McpResponse::result(id, self.call_tool(name, &arguments).await)
                }
                None => McpResponse::error(id, INVALID_PARAMS, "tools/call requires a tool name"),
            },
            other => {
                McpResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        })
    }

    /// Run tool `name` and wrap its output as MCP tool content.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Value {
        let Some(tool) = Tool::from_name(name) else {
            warn!("Unknown MCP tool '{}'", name);
            return tool_content(format!("Unknown tool: {}", name), true);
        };

        let args = match self.parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return tool_content(format!("Error executing {}: {}", name, e), true),
        };
        info!(
            "MCP tool {} for '{}' ({} to {})",
            name,
            args.location,
            args.window.start_iso(),
            args.window.end_iso()
        );

        match self.run_tool(tool, &args).await {
            Ok(text) => tool_content(text, false),
            Err(e) => tool_content(format!("Error executing {}: {}", name, e), true),
        }
    }

    async fn run_tool(&self, tool: Tool, args: &ToolArgs) -> Result<String, serde_json::Error> {
        let location = args.location.as_str();
        match tool {
            Tool::FetchOutageData => {
                let data = self.ioda.fetch_outage_data(location, &args.window).await;
                serde_json::to_string_pretty(&data)
            }
            Tool::FetchNews => {
                let articles = self.news.fetch_news(location, &args.window).await;
                serde_json::to_string_pretty(&articles)
            }
            Tool::VisualizationUrl => Ok(self.ioda.visualization_url(location, &args.window)),
            Tool::AnalyzeOutage => {
                let data = self.ioda.fetch_outage_data(location, &args.window).await;
                let articles = self.news.fetch_news(location, &args.window).await;
                let analysis = json!({
                    "location": location,
                    "time_window": {
                        "start": args.window.start_iso(),
                        "end": args.window.end_iso(),
                        "hours": args.hours,
                    },
                    "outage_data": data,
                    "news_articles": articles,
                    "visualization_url": self.ioda.visualization_url(location, &args.window),
                });
                serde_json::to_string_pretty(&analysis)
            }
        }
    }

    fn parse_args(&self, arguments: &Value) -> Result<ToolArgs, String> {
        let location = arguments
            .get("location")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or("missing required argument 'location'")?;

        let hours = match arguments.get("window_hours") {
            None | Some(Value::Null) => Value::from(self.default_window_hours),
            Some(value) => value.clone(),
        };
        let window = window_from_hours(&hours)?;

        Ok(ToolArgs {
            location: location.to_string(),
            hours,
            window,
        })
    }
}

/// Trailing window ending now; fractional hours are honored to the millisecond.
fn window_from_hours(hours: &Value) -> Result<TimeWindow, String> {
    let invalid = || format!("window_hours must be a non-negative number, got {}", hours);

    let hours = hours.as_f64().filter(|h| h.is_finite() && *h >= 0.0).ok_or_else(invalid)?;
    let span = chrono::Duration::try_milliseconds((hours * 3_600_000.0).round() as i64)
        .ok_or_else(invalid)?;
    let end = Utc::now();
    let start = end.checked_sub_signed(span).ok_or_else(invalid)?;
    TimeWindow::new(start, end).map_err(|e| e.to_string())
}

fn tool_content(text: String, is_error: bool) -> Value {
    let mut content = json!({ "content": [{ "type": "text", "text": text }] });
    if is_error {
        content["isError"] = Value::Bool(true);
    }
    content
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    FetchOutageData,
    FetchNews,
    VisualizationUrl,
    AnalyzeOutage,
}

impl Tool {
    const ALL: [Tool; 4] = [
        Tool::FetchOutageData,
        Tool::FetchNews,
        Tool::VisualizationUrl,
        Tool::AnalyzeOutage,
    ];

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    fn name(self) -> &'static str {
        match self {
            Tool::FetchOutageData => "fetch_outage_data",
            Tool::FetchNews => "fetch_news",
            Tool::VisualizationUrl => "get_visualization_url",
            Tool::AnalyzeOutage => "analyze_outage",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Tool::FetchOutageData => {
                "Fetch internet outage signals (BGP, active probing, traffic) from IODA \
                 for a location and time window."
            }
            Tool::FetchNews => {
                "Fetch recent news articles about a location that may explain network \
                 disruptions in the time window."
            }
            Tool::VisualizationUrl => {
                "Get the IODA visualization link with connectivity graphs for a location \
                 and time window."
            }
            Tool::AnalyzeOutage => {
                "Gather outage signals, news and the visualization link for a location in \
                 one structured result."
            }
        }
    }
}

fn tool_definitions() -> Vec<Value> {
    Tool::ALL
        .into_iter()
        .map(|tool| {
            json!({
                "name": tool.name(),
                "description": tool.description(),
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "Location to analyze (e.g. 'Sanaa, Yemen')"
                        },
                        "window_hours": {
                            "type": "number",
                            "description": "Hours to look back from now",
                            "default": 4
                        }
                    },
                    "required": ["location"]
                }
            })
        })
        .collect()
}
