//! Details-side entities: persisted per-section detail rows and attachments.

use crate::common::{DocumentNumber, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known section names. Tenants may define others; these are the ones
/// this crate writes itself.
pub mod sections {
    /// Header section returned by most tenants.
    pub const HEADER: &str = "HDR";
    /// Line-item section.
    pub const LINE_ITEMS: &str = "LINE";
    /// Current approver chain, maintained by this service.
    pub const CURRENT_APPROVER: &str = "CurrentApprover";
    /// Action stamp written when a document leaves the approver's queue.
    pub const ACTION_TAKEN: &str = "ActionTaken";
}

/// One persisted details section for a document.
///
/// Details are stored section-by-section because tenants expose them as
/// separate operations and clients fetch them incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDetailsRow {
    pub tenant_id: TenantId,
    pub document_number: DocumentNumber,
    /// Section name, e.g. "HDR", "LINE", "CurrentApprover".
    pub operation: String,
    pub json: serde_json::Value,
    pub request_version: String,
    pub fetched_at: DateTime<Utc>,
}

impl ApprovalDetailsRow {
    pub fn new(
        tenant_id: TenantId,
        document_number: DocumentNumber,
        operation: impl Into<String>,
        json: serde_json::Value,
        request_version: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            document_number,
            operation: operation.into(),
            json,
            request_version: request_version.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Attachment metadata listed in document details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: Option<u64>,
}
