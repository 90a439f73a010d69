use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy for the approvals business-logic layer.
///
/// Orchestration boundaries catch these, log them with structured fields and
/// convert them into the client-facing error envelope. Everything that is not
/// an authorization, staleness or validation failure collapses into `Tenant`
/// (the LOB system said no) or `Internal` (we broke).
#[derive(Error, Debug)]
pub enum ApprovalsError {
    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    /// The client acted on an outdated copy of the document. The message is
    /// the tenant's configured stale-request text, placeholder-expanded.
    #[error("{message}")]
    StaleRequest { message: String },

    #[error("Invalid action payload: {0}")]
    Validation(String),

    /// Another action against the same document is still in flight.
    #[error("An action for document {0} is already being processed")]
    ActionInFlight(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The tenant system rejected or failed the action.
    #[error("Tenant error: {message}")]
    Tenant {
        code: Option<String>,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApprovalsError {
    /// Stable error-type discriminator surfaced to clients.
    pub fn error_type(&self) -> &'static str {
        match self {
            ApprovalsError::Unauthorized(_) => "unauthorized",
            ApprovalsError::StaleRequest { .. } => "staleRequest",
            ApprovalsError::Validation(_) => "validation",
            ApprovalsError::ActionInFlight(_) => "actionInFlight",
            ApprovalsError::NotFound(_) => "notFound",
            ApprovalsError::Tenant { .. } => "tenantFailure",
            ApprovalsError::Internal(_) => "internal",
        }
    }

    /// True if retrying the same payload can never succeed and the client
    /// should refresh its copy of the document first.
    pub fn requires_refresh(&self) -> bool {
        matches!(
            self,
            ApprovalsError::StaleRequest { .. } | ApprovalsError::ActionInFlight(_)
        )
    }

    /// Client-facing JSON error object.
    pub fn to_client_json(&self) -> serde_json::Value {
        let mut obj = json!({
            "errorType": self.error_type(),
            "errorMessage": self.to_string(),
        });
        if let ApprovalsError::Tenant { code: Some(code), .. } = self {
            obj["tenantErrorCode"] = json!(code);
        }
        obj
    }
}

/// Per-document error info embedded in action responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientErrorInfo {
    pub error_type: String,
    pub error_message: String,
}

impl From<&ApprovalsError> for ClientErrorInfo {
    fn from(err: &ApprovalsError) -> Self {
        Self {
            error_type: err.error_type().to_string(),
            error_message: err.to_string(),
        }
    }
}
