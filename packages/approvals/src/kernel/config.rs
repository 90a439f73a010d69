//! Environment-driven service configuration.
//!
//! Values come from the process environment (a `.env` file is honored in
//! development via dotenvy); every knob has a default so tests and local
//! runs need no setup.

use std::env;

/// Tunables for the business-logic layer.
#[derive(Debug, Clone)]
pub struct ApprovalsConfig {
    /// Fixed retry count for notification email sends.
    pub email_retry_count: u32,
    /// Max tenant batches dispatched concurrently during bulk actions.
    pub bulk_concurrency: usize,
    /// Flight name gating actionable (adaptive card) email.
    pub actionable_email_flight: String,
    /// Blob container holding cached attachment bytes.
    pub attachment_container: String,
}

impl Default for ApprovalsConfig {
    fn default() -> Self {
        Self {
            email_retry_count: 3,
            bulk_concurrency: 4,
            actionable_email_flight: "actionable-email".to_string(),
            attachment_container: "approvals-attachments".to_string(),
        }
    }
}

impl ApprovalsConfig {
    /// Loads configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            email_retry_count: env_parsed("APPROVALS_EMAIL_RETRY_COUNT")
                .unwrap_or(defaults.email_retry_count),
            bulk_concurrency: env_parsed("APPROVALS_BULK_CONCURRENCY")
                .unwrap_or(defaults.bulk_concurrency),
            actionable_email_flight: env::var("APPROVALS_ACTIONABLE_EMAIL_FLIGHT")
                .unwrap_or(defaults.actionable_email_flight),
            attachment_container: env::var("APPROVALS_ATTACHMENT_CONTAINER")
                .unwrap_or(defaults.attachment_container),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
