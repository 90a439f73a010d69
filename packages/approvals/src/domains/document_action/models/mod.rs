//! Action-side entities: the user-submitted approval request, the
//! per-document outcome, and the audit unit built during bulk
//! post-processing.

use crate::common::{Alias, ApprovalsError, ClientDevice, TenantId};
use crate::domains::summary::models::ApprovalIdentifier;
use crate::domains::tenant::models::TenantInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-entered action details (comment, justification, action date).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionDetails {
    pub comment: Option<String>,
    pub reason_code: Option<String>,
    pub reason_text: Option<String>,
    /// Stamped by the service when the action is dispatched.
    pub action_date: Option<DateTime<Utc>>,
}

/// Telemetry fields echoed between client, service and tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestTelemetry {
    pub business_process_name: Option<String>,
    pub xcv: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One user-submitted action (approve, reject, ...) against one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    #[serde(skip)]
    pub tenant_id: TenantId,
    pub approval_identifier: ApprovalIdentifier,
    pub action: String,
    #[serde(default)]
    pub action_details: ActionDetails,
    /// Version stamp from the copy of the document the client acted on.
    pub request_version: Option<String>,
    #[serde(default)]
    pub additional_data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub telemetry: RequestTelemetry,
}

impl ApprovalRequest {
    /// Parses one request out of a raw client payload.
    ///
    /// Shape errors surface as `Validation`; semantic checks live in the
    /// payload validator.
    pub fn from_payload(
        tenant_id: TenantId,
        payload: &serde_json::Value,
    ) -> Result<Self, ApprovalsError> {
        let mut request: ApprovalRequest = serde_json::from_value(payload.clone())
            .map_err(|e| ApprovalsError::Validation(format!("malformed action payload: {}", e)))?;
        request.tenant_id = tenant_id;
        Ok(request)
    }

    /// Parses a bulk payload: either a JSON array of requests or an object
    /// with an `approvalRequests` array.
    pub fn batch_from_payload(
        tenant_id: TenantId,
        payload: &serde_json::Value,
    ) -> Result<Vec<Self>, ApprovalsError> {
        let entries = match payload {
            serde_json::Value::Array(entries) => entries.as_slice(),
            serde_json::Value::Object(obj) => obj
                .get("approvalRequests")
                .and_then(|v| v.as_array())
                .map(|a| a.as_slice())
                .ok_or_else(|| {
                    ApprovalsError::Validation(
                        "bulk payload must be an array or contain approvalRequests".to_string(),
                    )
                })?,
            _ => {
                return Err(ApprovalsError::Validation(
                    "bulk payload must be an array or contain approvalRequests".to_string(),
                ))
            }
        };
        entries
            .iter()
            .map(|entry| Self::from_payload(tenant_id, entry))
            .collect()
    }

    pub fn document_number(&self) -> &str {
        self.approval_identifier.document_number.as_str()
    }
}

/// Error block on a tenant wire response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireErrorInfo {
    pub error_messages: Vec<String>,
    pub error_type: Option<String>,
    pub error_code: Option<String>,
}

impl WireErrorInfo {
    pub fn joined_message(&self) -> String {
        if self.error_messages.is_empty() {
            "tenant returned a failure without a message".to_string()
        } else {
            self.error_messages.join("; ")
        }
    }
}

/// Per-document outcome of an action, normalized from tenant wire JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub approval_identifier: Option<ApprovalIdentifier>,
    pub action_result: bool,
    pub error_info: Option<WireErrorInfo>,
    pub display_message: Option<String>,
    #[serde(default)]
    pub telemetry: serde_json::Map<String, serde_json::Value>,
}

impl ApprovalResponse {
    pub fn success(approval_identifier: ApprovalIdentifier) -> Self {
        Self {
            approval_identifier: Some(approval_identifier),
            action_result: true,
            error_info: None,
            display_message: None,
            telemetry: serde_json::Map::new(),
        }
    }

    /// Normalizes a tenant reply. Tenants disagree on field names, so this
    /// is deliberately tolerant: `actionResult` or `success` booleans, an
    /// `errorInfo` block, or a bare `errorMessage` string all count.
    pub fn from_tenant_json(value: &serde_json::Value) -> Self {
        let approval_identifier = value
            .get("approvalIdentifier")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .or_else(|| {
                value
                    .get("documentNumber")
                    .and_then(|v| v.as_str())
                    .map(ApprovalIdentifier::new)
            });

        let error_info: Option<WireErrorInfo> = value
            .get("errorInfo")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .or_else(|| {
                value.get("errorMessage").and_then(|v| v.as_str()).map(|m| WireErrorInfo {
                    error_messages: vec![m.to_string()],
                    ..Default::default()
                })
            });

        let action_result = value
            .get("actionResult")
            .and_then(|v| v.as_bool())
            .or_else(|| value.get("success").and_then(|v| v.as_bool()))
            .unwrap_or(error_info.is_none());

        Self {
            approval_identifier,
            action_result,
            error_info,
            display_message: value
                .get("displayMessage")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            telemetry: value
                .get("telemetry")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Classifies a failed response into the error taxonomy.
    ///
    /// Tenants signal authorization and staleness in free text more often
    /// than in a typed field, hence the substring checks.
    pub fn to_error(&self, tenant: &TenantInfo, document_number: &str) -> ApprovalsError {
        let info = self.error_info.clone().unwrap_or_default();
        let message = info.joined_message();
        let typed = info.error_type.as_deref().unwrap_or("").to_ascii_lowercase();
        let lowered = message.to_ascii_lowercase();

        if typed == "unauthorized" || lowered.contains("unauthorized") || lowered.contains("not authorized")
        {
            return ApprovalsError::Unauthorized(message);
        }
        if typed == "stalerequest"
            || lowered.contains("stale")
            || lowered.contains("version mismatch")
        {
            return ApprovalsError::StaleRequest {
                message: tenant.stale_message(document_number),
            };
        }
        ApprovalsError::Tenant {
            code: info.error_code,
            message,
        }
    }
}

/// Audit unit produced by bulk action post-processing, one per document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionAuditLogInfo {
    pub approval_identifier: ApprovalIdentifier,
    pub action: String,
    pub approver: Alias,
    pub client_device: ClientDevice,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}
