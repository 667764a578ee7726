//! GitHub Copilot Chat provider (ground truth:
//! `internal/agents/provider/copilot/{new,login,refresh,send}.go`).
//!
//! Two token layers: a long-lived OAuth access token obtained once via
//! device-code flow and persisted to `copilot_token.json` (mode 0600), and
//! a short-lived session token exchanged from it before every chat call
//! (refreshed whenever it is absent or expires within 60s, SPEC_FULL.md
//! §4.3.1).

use std::path::{Path, PathBuf};
use std::time::Duration;

use ar_core::{ChatOutput, Message};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::agent::Agent;
use crate::common::send_chat_completions;
use crate::error::ProviderError;

const DEVICE_CODE_API: &str = "https://github.com/login/device/code";
const OAUTH_ACCESS_TOKEN_API: &str = "https://github.com/login/oauth/access_token";
const COPILOT_TOKEN_API: &str = "https://api.github.com/copilot_internal/v2/token";
const CHAT_API: &str = "https://api.githubcopilot.com/chat/completions";
const CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";
const EDITOR_VERSION: &str = "vscode/1.95.0";
const DEFAULT_MODEL: &str = "gpt-4o";
const MODEL_PREFIX: &str = "copilot@";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Clone)]
struct SessionToken {
    token: String,
    expires_at: i64,
}

pub struct CopilotAgent {
    client: reqwest::Client,
    token_path: PathBuf,
    oauth_token: OAuthToken,
    session_token: Mutex<Option<SessionToken>>,
    model: String,
}

impl CopilotAgent {
    /// Load the persisted OAuth token, or run the device-code login flow if
    /// none is cached yet.
    pub async fn new(config_root: &Path, model: Option<&str>) -> Result<Self, ProviderError> {
        let model = match model {
            Some(m) if m.starts_with(MODEL_PREFIX) => m.trim_start_matches(MODEL_PREFIX).to_string(),
            _ => DEFAULT_MODEL.to_string(),
        };
        let token_path = ar_config::paths::copilot_token_path(config_root);
        let client = reqwest::Client::new();

        let oauth_token = match std::fs::read_to_string(&token_path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| ProviderError::Auth(format!("copilot_token.json: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let token = device_code_login(&client).await?;
                persist_token(&token_path, &token)?;
                token
            }
            Err(e) => return Err(ProviderError::Io(e)),
        };

        Ok(Self {
            client,
            token_path,
            oauth_token,
            session_token: Mutex::new(None),
            model,
        })
    }

    /// Refresh the short-lived session token if absent or within 60s of
    /// expiry (spec.md §4.3.1).
    async fn session_token(&self) -> Result<String, ProviderError> {
        let mut guard = self.session_token.lock().await;
        let now = chrono::Utc::now().timestamp();
        let needs_refresh = match &*guard {
            Some(t) => now >= t.expires_at - 60,
            None => true,
        };
        if needs_refresh {
            *guard = Some(self.exchange_session_token().await?);
        }
        Ok(guard.as_ref().unwrap().token.clone())
    }

    async fn exchange_session_token(&self) -> Result<SessionToken, ProviderError> {
        #[derive(Deserialize)]
        struct Refresh {
            token: String,
            expires_at: i64,
        }

        let resp = self
            .client
            .get(COPILOT_TOKEN_API)
            .header("Authorization", format!("token {}", self.oauth_token.access_token))
            .header("Accept", "application/json")
            .header("Editor-Version", EDITOR_VERSION)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Auth("copilot session token: access token expired".into()));
        }
        if !status.is_success() {
            return Err(ProviderError::Auth(format!("copilot session token: http {status}")));
        }

        let refresh: Refresh = resp.json().await?;
        Ok(SessionToken { token: refresh.token, expires_at: refresh.expires_at })
    }
}

#[async_trait::async_trait]
impl Agent for CopilotAgent {
    async fn send(&self, messages: &[Message], tools: Option<&[Value]>) -> Result<ChatOutput, ProviderError> {
        let session_token = self.session_token().await?;
        send_chat_completions(
            &self.client,
            CHAT_API,
            &[
                ("Authorization", format!("Bearer {session_token}")),
                ("Editor-Version", EDITOR_VERSION.to_string()),
            ],
            &self.model,
            messages,
            tools,
        )
        .await
    }
}

#[derive(Deserialize)]
struct DeviceCode {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    interval: u64,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    error: Option<String>,
}

/// Device-code OAuth flow (spec.md §4.3.1): request a device code, print
/// the verification URL and user code, then poll the token endpoint at the
/// server-supplied interval until success, `authorization_pending`
/// exhaustion of `expires_in`, or deadline.
async fn device_code_login(client: &reqwest::Client) -> Result<OAuthToken, ProviderError> {
    let code: DeviceCode = client
        .post(DEVICE_CODE_API)
        .header("Accept", "application/json")
        .form(&[("client_id", CLIENT_ID)])
        .send()
        .await?
        .json()
        .await?;

    println!("[*] url:      {}", code.verification_uri);
    println!("[*] code:     {}", code.user_code);
    println!("[*] expires in {}s", code.expires_in);
    println!("[*] waiting for authorization (press Enter after visiting the URL)...");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(code.expires_in);
    let interval = Duration::from_secs(code.interval.max(1));

    loop {
        if tokio::time::Instant::now() >= deadline {
            return Err(ProviderError::Auth("device code expired".into()));
        }
        tokio::time::sleep(interval).await;

        let resp: AccessTokenResponse = client
            .post(OAUTH_ACCESS_TOKEN_API)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", CLIENT_ID),
                ("device_code", code.device_code.as_str()),
                ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
            ])
            .send()
            .await?
            .json()
            .await?;

        match resp.error.as_deref() {
            None => {
                return Ok(OAuthToken {
                    access_token: resp.access_token.unwrap_or_default(),
                    token_type: resp.token_type.unwrap_or_default(),
                    scope: resp.scope.unwrap_or_default(),
                });
            }
            Some("authorization_pending") => continue,
            Some(other) => return Err(ProviderError::Auth(other.to_string())),
        }
    }
}

fn persist_token(token_path: &Path, token: &OAuthToken) -> Result<(), ProviderError> {
    if let Some(parent) = token_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_vec_pretty(token)?;
    std::fs::write(token_path, body)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(token_path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
