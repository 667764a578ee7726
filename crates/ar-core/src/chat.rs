use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Normalised provider response (spec.md §3). Only `choices[0]` is ever
/// consumed by the reasoning loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatOutput {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ChatOutput {
    pub fn first_choice(&self) -> Option<&ChatChoice> {
        self.choices.first()
    }
}
