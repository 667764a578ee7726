//! The sandboxed tool registry (spec.md §4.2): built-in file/shell/network
//! tools plus JSON-document-driven dynamic `api_<name>` tools, dispatched
//! against a single [`Executor`].

pub mod api_adapter;
pub mod calculator;
pub mod error;
pub mod executor;
pub mod file_tools;
pub mod http_tools;
pub mod page_fetch;

use std::path::Path;
use std::time::SystemTime;

use serde_json::Value;

pub use error::ToolError;
pub use executor::{Executor, DEFAULT_ALLOWED_COMMANDS};
pub use page_fetch::PageRenderer;
#[cfg(feature = "browser")]
pub use page_fetch::HeadlessChromePageRenderer;

/// Everything a tool invocation needs beyond its own arguments: the
/// sandboxed filesystem/command environment, a shared HTTP client, the
/// page renderer, and the page-fetch cache directory (spec.md §4.2.2-3).
pub struct ToolContext<'a> {
    pub executor: &'a Executor,
    pub http_client: &'a reqwest::Client,
    pub page_renderer: &'a dyn PageRenderer,
    pub cache_dir: &'a Path,
    /// Root directory under which per-session state lives (spec.md §4.5),
    /// distinct from `executor.work_path()` which sandboxes file/shell tools.
    pub config_root: &'a Path,
    pub now_unix: i64,
}

/// JSON-schema descriptors for the built-in tool set (spec.md §4.2 table),
/// in the canonical `{type:"function", function:{name,description,parameters}}`
/// shape shared with dynamic API tools.
pub fn built_in_tool_schemas() -> Vec<Value> {
    vec![
        serde_json::json!({"type":"function","function":{"name":"read_file","description":"Read a file's contents.","parameters":{"type":"object","properties":{"path":{"type":"string"}},"required":["path"]}}}),
        serde_json::json!({"type":"function","function":{"name":"write_file","description":"Write content to a file, creating parent directories as needed.","parameters":{"type":"object","properties":{"path":{"type":"string"},"content":{"type":"string"}},"required":["path","content"]}}}),
        serde_json::json!({"type":"function","function":{"name":"patch_edit","description":"Replace the first occurrence of old_string with new_string in a file.","parameters":{"type":"object","properties":{"path":{"type":"string"},"old_string":{"type":"string"},"new_string":{"type":"string"}},"required":["path","old_string","new_string"]}}}),
        serde_json::json!({"type":"function","function":{"name":"list_files","description":"List directory entries, optionally recursive.","parameters":{"type":"object","properties":{"path":{"type":"string"},"recursive":{"type":"boolean"}},"required":["path"]}}}),
        serde_json::json!({"type":"function","function":{"name":"glob_files","description":"Find files under the work directory matching a glob pattern (supports **).","parameters":{"type":"object","properties":{"pattern":{"type":"string"}},"required":["pattern"]}}}),
        serde_json::json!({"type":"function","function":{"name":"search_content","description":"Regex search file contents under the work directory.","parameters":{"type":"object","properties":{"pattern":{"type":"string"},"file_pattern":{"type":"string"}},"required":["pattern"]}}}),
        serde_json::json!({"type":"function","function":{"name":"search_history","description":"Case-insensitive substring search over this session's prior turns.","parameters":{"type":"object","properties":{"keyword":{"type":"string"},"time_range":{"type":"string","enum":["1d","7d","1m","1y"]}},"required":["keyword"]}}}),
        serde_json::json!({"type":"function","function":{"name":"run_command","description":"Run an allow-listed shell command in the work directory.","parameters":{"type":"object","properties":{"command":{"type":"string"}},"required":["command"]}}}),
        serde_json::json!({"type":"function","function":{"name":"fetch_page","description":"Fetch a web page and return it as Markdown.","parameters":{"type":"object","properties":{"url":{"type":"string"}},"required":["url"]}}}),
        serde_json::json!({"type":"function","function":{"name":"fetch_yahoo_finance","description":"Fetch a ticker quote/candles from Yahoo Finance.","parameters":{"type":"object","properties":{"ticker":{"type":"string"},"bar_interval":{"type":"string"},"time_range":{"type":"string"}},"required":["ticker"]}}}),
        serde_json::json!({"type":"function","function":{"name":"fetch_google_rss","description":"Fetch Google News RSS results for a keyword.","parameters":{"type":"object","properties":{"keyword":{"type":"string"},"time_range":{"type":"string"},"language":{"type":"string"}},"required":["keyword"]}}}),
        serde_json::json!({"type":"function","function":{"name":"fetch_weather","description":"Fetch current weather for a location.","parameters":{"type":"object","properties":{"location":{"type":"string"}},"required":["location"]}}}),
        serde_json::json!({"type":"function","function":{"name":"search_web","description":"Search the web and return ranked results.","parameters":{"type":"object","properties":{"query":{"type":"string"},"time_range":{"type":"string"}},"required":["query"]}}}),
        serde_json::json!({"type":"function","function":{"name":"send_http_request","description":"Send a generic HTTP request.","parameters":{"type":"object","properties":{"url":{"type":"string"},"method":{"type":"string"},"headers":{"type":"object"},"body":{"type":"object"},"content_type":{"type":"string"},"timeout":{"type":"integer"}},"required":["url"]}}}),
        serde_json::json!({"type":"function","function":{"name":"calculate","description":"Evaluate a safe arithmetic expression.","parameters":{"type":"object","properties":{"expression":{"type":"string"}},"required":["expression"]}}}),
    ]
}

/// Built-in schemas plus the dynamic `api_<name>` schemas for whatever API
/// documents this executor loaded (spec.md §4.2.3).
pub fn tool_schemas(executor: &Executor) -> Vec<Value> {
    let mut schemas = built_in_tool_schemas();
    schemas.extend(executor.api_toolbox.iter().map(|doc| doc.tool_schema()));
    schemas
}

fn arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// Dispatch one tool call by name (spec.md §4.2, §4.6; ground truth:
/// `internal/tools/executor.go`'s `Execute` switch). Argument-parse
/// failures propagate as [`ToolError::ArgsParse`]; every other failure is
/// the caller's responsibility to fold into a `"no data"`-style tool
/// result, matching `toolCall.go`.
pub async fn execute(ctx: &ToolContext<'_>, name: &str, arguments: &str) -> Result<String, ToolError> {
    if let Some(key) = name.strip_prefix("api_") {
        if let Some(doc) = ctx.executor.api_toolbox.iter().find(|d| d.name == key) {
            return api_adapter::execute(ctx.http_client, doc, arguments).await;
        }
        return Err(ToolError::UnknownTool(name.to_string()));
    }

    let args: Value = if arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(arguments)?
    };

    match name {
        "read_file" => {
            let path = arg(&args, "path").unwrap_or_default();
            file_tools::read_file(ctx.executor, path)
        }
        "write_file" => {
            let path = arg(&args, "path").unwrap_or_default();
            let content = arg(&args, "content").unwrap_or_default();
            file_tools::write_file(ctx.executor, path, content)
        }
        "patch_edit" => {
            let path = arg(&args, "path").unwrap_or_default();
            let old_string = arg(&args, "old_string").unwrap_or_default();
            let new_string = arg(&args, "new_string").unwrap_or_default();
            file_tools::patch_edit(ctx.executor, path, old_string, new_string)
        }
        "list_files" => {
            let path = arg(&args, "path").unwrap_or(".");
            let recursive = args.get("recursive").and_then(|v| v.as_bool()).unwrap_or(false);
            file_tools::list_files(ctx.executor, path, recursive)
        }
        "glob_files" => {
            let pattern = arg(&args, "pattern").unwrap_or_default();
            file_tools::glob_files(ctx.executor, pattern)
        }
        "search_content" => {
            let pattern = arg(&args, "pattern").unwrap_or_default();
            let file_pattern = arg(&args, "file_pattern").unwrap_or_default();
            file_tools::search_content(ctx.executor, pattern, file_pattern)
        }
        "search_history" => {
            let keyword = arg(&args, "keyword").unwrap_or_default();
            let time_range = arg(&args, "time_range").unwrap_or_default();
            file_tools::search_history(
                ctx.config_root,
                &ctx.executor.session_id,
                keyword,
                time_range,
                ctx.now_unix,
            )
        }
        "run_command" => {
            let command = arg(&args, "command").unwrap_or_default();
            shell::run_command(ctx.executor, command).await
        }
        "fetch_page" => {
            let url = arg(&args, "url").unwrap_or_default();
            page_fetch::fetch_page(ctx.page_renderer, ctx.cache_dir, url, SystemTime::now()).await
        }
        "fetch_yahoo_finance" => {
            let ticker = arg(&args, "ticker").unwrap_or_default();
            let bar_interval = arg(&args, "bar_interval").unwrap_or_default();
            let time_range = arg(&args, "time_range").unwrap_or_default();
            http_tools::fetch_yahoo_finance(ctx.http_client, ticker, bar_interval, time_range).await
        }
        "fetch_google_rss" => {
            let keyword = arg(&args, "keyword").unwrap_or_default();
            let time_range = arg(&args, "time_range").unwrap_or_default();
            let language = arg(&args, "language").unwrap_or_default();
            http_tools::fetch_google_rss(ctx.http_client, keyword, time_range, language).await
        }
        "fetch_weather" => {
            let location = arg(&args, "location").unwrap_or_default();
            http_tools::fetch_weather(ctx.http_client, location).await
        }
        "search_web" => {
            let query = arg(&args, "query").unwrap_or_default();
            let time_range = arg(&args, "time_range").unwrap_or_default();
            http_tools::search_web(ctx.http_client, query, time_range).await
        }
        "send_http_request" => {
            let url = arg(&args, "url").unwrap_or_default();
            let method = arg(&args, "method").unwrap_or_default();
            let headers = args
                .get("headers")
                .and_then(|v| v.as_object())
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            let body = args
                .get("body")
                .and_then(|v| v.as_object())
                .map(|m| m.clone().into_iter().collect())
                .unwrap_or_default();
            let content_type = arg(&args, "content_type").unwrap_or_default();
            let timeout = args.get("timeout").and_then(|v| v.as_u64());
            http_tools::send_http_request(
                ctx.http_client,
                url,
                method,
                &headers,
                &body,
                content_type,
                timeout,
            )
            .await
        }
        "calculate" => {
            let expression = arg(&args, "expression").unwrap_or_default();
            calculator::calculate(expression)
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

mod shell;
