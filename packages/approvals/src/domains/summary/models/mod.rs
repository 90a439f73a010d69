//! Summary-side entities: the denormalized pending-approval row and the
//! client-facing summary JSON body carried inside it.

use crate::common::{Alias, DocumentNumber, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical key of one business document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalIdentifier {
    pub document_number: DocumentNumber,
    /// Number shown to users; falls back to `document_number` when the
    /// tenant does not distinguish the two.
    pub display_document_number: Option<DocumentNumber>,
    pub fiscal_year: Option<String>,
}

impl ApprovalIdentifier {
    pub fn new(document_number: impl Into<DocumentNumber>) -> Self {
        Self {
            document_number: document_number.into(),
            display_document_number: None,
            fiscal_year: None,
        }
    }

    /// The number to render for users.
    pub fn display_number(&self) -> &DocumentNumber {
        self.display_document_number
            .as_ref()
            .unwrap_or(&self.document_number)
    }
}

/// Submitter identity carried in the summary body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    pub alias: Alias,
    pub name: Option<String>,
}

/// One step of the document's approval chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalHierarchyStep {
    pub approvers: Vec<Alias>,
    pub level: i32,
    pub status: Option<String>,
}

/// The client-facing summary body, persisted serialized inside a summary row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryJson {
    pub approval_identifier: ApprovalIdentifier,
    pub title: String,
    pub submitted_date: Option<DateTime<Utc>>,
    pub submitter: Submitter,
    /// Headline amount for money-like documents.
    pub unit_value: Option<String>,
    pub unit_of_measure: Option<String>,
    /// Tenant-defined attribute surfaced in list views.
    pub custom_attribute: Option<String>,
    #[serde(default)]
    pub approval_hierarchy: Vec<ApprovalHierarchyStep>,
    /// Tenant-defined extra fields, passed through untouched.
    #[serde(default)]
    pub additional_data: serde_json::Map<String, serde_json::Value>,
}

impl SummaryJson {
    pub fn new(
        approval_identifier: ApprovalIdentifier,
        title: impl Into<String>,
        submitter: Submitter,
    ) -> Self {
        Self {
            approval_identifier,
            title: title.into(),
            submitted_date: None,
            submitter,
            unit_value: None,
            unit_of_measure: None,
            custom_attribute: None,
            approval_hierarchy: Vec::new(),
            additional_data: serde_json::Map::new(),
        }
    }
}

/// A persisted denormalized record of one pending approval awaiting action,
/// keyed by (approver, tenant, document number).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSummaryRow {
    pub approver: Alias,
    pub tenant_id: TenantId,
    pub document_number: DocumentNumber,
    pub summary_json: SummaryJson,
    /// Version stamp the client must echo back; a mismatch means the client
    /// acted on an outdated copy.
    pub request_version: String,
    /// Soft lock: set while an action against this document is in flight.
    pub pending_action: bool,
    pub last_failed: bool,
    pub last_failed_message: Option<String>,
    pub next_reminder_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalSummaryRow {
    pub fn new(
        approver: Alias,
        tenant_id: TenantId,
        summary_json: SummaryJson,
        request_version: impl Into<String>,
    ) -> Self {
        Self {
            approver,
            tenant_id,
            document_number: summary_json.approval_identifier.document_number.clone(),
            summary_json,
            request_version: request_version.into(),
            pending_action: false,
            last_failed: false,
            last_failed_message: None,
            next_reminder_at: None,
            created_at: Utc::now(),
        }
    }
}
