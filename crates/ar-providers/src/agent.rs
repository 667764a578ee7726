use ar_core::{ChatOutput, Message};
use serde_json::Value;

use crate::error::ProviderError;

/// Shared send interface across providers (spec.md §3 `Agent`, §4.3).
///
/// `tools` is `None` for selector calls (spec.md §4.7: "the selector's
/// `Send` call passes `tools: None`") and `Some` for the reasoning loop's
/// turns.
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    async fn send(&self, messages: &[Message], tools: Option<&[Value]>) -> Result<ChatOutput, ProviderError>;
}
