//! JSON-document-driven dynamic API tools (spec.md §4.2.3; ground truth:
//! `internal/tools/apiAdapter/{translator,translate,request,execute}.go`).

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiEndpoint {
    pub url: String,
    pub method: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_content_type() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct ApiAuth {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub env: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiParameter {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub r#enum: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ApiResponse {
    #[serde(default = "default_response_format")]
    pub format: String,
}

fn default_response_format() -> String {
    "json".to_string()
}

/// On-disk schema for one dynamic `api_<name>` tool (spec.md §4.2.3).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiDocument {
    pub name: String,
    pub description: String,
    pub endpoint: ApiEndpoint,
    #[serde(default)]
    pub auth: Option<ApiAuth>,
    #[serde(default)]
    pub parameters: HashMap<String, ApiParameter>,
    #[serde(default)]
    pub response: ApiResponse,
}

impl ApiDocument {
    fn validate(&mut self) -> Result<(), ToolError> {
        if self.name.is_empty() {
            return Err(ToolError::Message("name is required".into()));
        }
        if self.description.is_empty() {
            return Err(ToolError::Message("description is required".into()));
        }
        if self.endpoint.url.is_empty() {
            return Err(ToolError::Message("endpoint.url is required".into()));
        }
        self.endpoint.method = self.endpoint.method.to_uppercase();
        match self.endpoint.method.as_str() {
            "GET" | "POST" | "PUT" | "DELETE" | "PATCH" => {}
            other => return Err(ToolError::Message(format!("unsupported method: {other}"))),
        }
        Ok(())
    }

    /// Tool-call schema for this document, named `api_<name>`.
    pub fn tool_schema(&self) -> Value {
        let mut props = Map::new();
        let mut required = Vec::new();
        for (name, schema) in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::String(schema.kind.clone()));
            prop.insert("description".into(), Value::String(schema.description.clone()));
            if !schema.r#enum.is_empty() {
                prop.insert("enum".into(), Value::Array(schema.r#enum.clone()));
            }
            if let Some(default) = &schema.default {
                prop.insert("default".into(), default.clone());
            }
            props.insert(name.clone(), Value::Object(prop));
            if schema.required {
                required.push(Value::String(name.clone()));
            }
        }
        let mut params = Map::new();
        params.insert("type".into(), Value::String("object".into()));
        params.insert("properties".into(), Value::Object(props));
        if !required.is_empty() {
            params.insert("required".into(), Value::Array(required));
        }

        serde_json::json!({
            "type": "function",
            "function": {
                "name": format!("api_{}", self.name),
                "description": self.description,
                "parameters": Value::Object(params),
            }
        })
    }
}

/// Scan a directory for `*.json` API documents (spec.md §4.2.3). A missing
/// directory yields an empty list, matching the skill scanner's "missing
/// root is not an error" convention.
pub fn load_api_documents(dir: &Path) -> Vec<ApiDocument> {
    let entries = match std::fs::read_dir(dir) {
        Ok(iter) => iter,
        Err(_) => return Vec::new(),
    };
    let mut docs = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Ok(contents) = std::fs::read_to_string(&path) else { continue };
        let Ok(mut doc) = serde_json::from_str::<ApiDocument>(&contents) else { continue };
        if doc.validate().is_err() {
            continue;
        }
        docs.push(doc);
    }
    docs
}

/// Strip used `{key}` placeholders from `url`, substituting URL-escaped
/// values from `params` and removing any key it consumes. Remaining
/// placeholders (never supplied) are trimmed along with a preceding `/`.
fn substitute_placeholders(url: &str, params: &mut Map<String, Value>) -> String {
    let mut path = url.to_string();
    let keys: Vec<String> = params.keys().cloned().collect();
    for key in keys {
        let placeholder = format!("{{{key}}}");
        if path.contains(&placeholder) {
            let value = params.remove(&key).unwrap();
            let text = value_to_string(&value);
            if text.is_empty() {
                continue;
            }
            path = path.replace(&placeholder, &urlencoding::encode(&text));
        }
    }
    trim_unused(&path)
}

fn trim_unused(path: &str) -> String {
    let mut path = path.to_string();
    while let Some(start) = path.find('{') {
        let Some(end) = path.find('}') else { break };
        if end < start {
            break;
        }
        let mut new_start = start;
        if new_start > 0 && path.as_bytes()[new_start - 1] == b'/' {
            new_start -= 1;
        }
        path = format!("{}{}", &path[..new_start], &path[end + 1..]);
    }
    path
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn apply_defaults_and_check_required(
    doc: &ApiDocument,
    params: &mut Map<String, Value>,
) -> Result<(), ToolError> {
    for (name, schema) in &doc.parameters {
        if !params.contains_key(name) {
            if schema.required {
                return Err(ToolError::Message(format!("\"{name}\" is required")));
            }
            if let Some(default) = &schema.default {
                params.insert(name.clone(), default.clone());
            }
        }
    }
    Ok(())
}

fn inject_auth(
    builder: reqwest::RequestBuilder,
    auth: &ApiAuth,
) -> Result<reqwest::RequestBuilder, ToolError> {
    if auth.env.is_empty() {
        return Err(ToolError::Message("auth.env is required".into()));
    }
    let value = std::env::var(&auth.env)
        .map_err(|_| ToolError::Message(format!("\"{}\" not set", auth.env)))?;

    Ok(match auth.kind.as_str() {
        "bearer" => builder.header("Authorization", format!("Bearer {value}")),
        "apikey" => {
            let header = if auth.header.is_empty() { "X-API-Key" } else { &auth.header };
            builder.header(header, value)
        }
        "basic" => {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(value.as_bytes());
            builder.header("Authorization", format!("Basic {encoded}"))
        }
        other => return Err(ToolError::Message(format!("unsupported auth: {other}"))),
    })
}

/// Invoke the dynamic tool named `api_<doc.name>` (spec.md §4.2.3).
///
/// Non-2xx responses are a hard error here — the reasoning loop, not this
/// adapter, is responsible for swallowing tool errors into `"no data"`.
pub async fn execute(
    client: &reqwest::Client,
    doc: &ApiDocument,
    arguments: &str,
) -> Result<String, ToolError> {
    let mut params: Map<String, Value> = if arguments.trim().is_empty() {
        Map::new()
    } else {
        match serde_json::from_str(arguments)? {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    };
    apply_defaults_and_check_required(doc, &mut params)?;

    let url = substitute_placeholders(&doc.endpoint.url, &mut params);
    let method: reqwest::Method = doc
        .endpoint
        .method
        .parse()
        .map_err(|_| ToolError::Message(format!("unsupported method: {}", doc.endpoint.method)))?;

    let mut builder = client.request(method, &url);

    if doc.endpoint.method == "GET" {
        let mut query: Vec<(String, String)> = doc
            .endpoint
            .query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (k, v) in &params {
            query.push((k.clone(), value_to_string(v)));
        }
        builder = builder.query(&query);
    } else if doc.endpoint.content_type == "form" {
        let form: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect();
        builder = builder.form(&form);
    } else if !params.is_empty() {
        builder = builder.json(&params);
    }

    for (k, v) in &doc.endpoint.headers {
        builder = builder.header(k, v);
    }
    if let Some(auth) = &doc.auth {
        if *auth != ApiAuth::default() {
            builder = inject_auth(builder, auth)?;
        }
    }

    let timeout = doc.endpoint.timeout.unwrap_or(30);
    builder = builder.timeout(Duration::from_secs(timeout));

    let resp = builder.send().await?;
    let status = resp.status();
    let body = resp.text().await?;

    if status != reqwest::StatusCode::OK {
        return Err(ToolError::Message(format!("resp.StatusCode: {}", status.as_u16())));
    }

    if doc.response.format == "json" {
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            return Ok(serde_json::to_string(&value)?);
        }
    }
    Ok(body)
}
