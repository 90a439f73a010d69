//! Outbound notification entities.

use serde::{Deserialize, Serialize};

/// A rendered email ready for the delivery provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    pub subject: String,
    pub body_html: String,
    /// Adaptive card payload embedded for actionable-email clients.
    pub adaptive_card: Option<serde_json::Value>,
}

impl EmailMessage {
    pub fn new(to: Vec<String>, subject: impl Into<String>, body_html: impl Into<String>) -> Self {
        Self {
            to,
            cc: Vec::new(),
            subject: subject.into(),
            body_html: body_html.into(),
            adaptive_card: None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.adaptive_card.is_some()
    }
}
