// Shared fixtures: a configured push tenant, summary rows and payloads.

use approvals_core::common::{Alias, TenantId};
use approvals_core::domains::summary::models::{
    ApprovalIdentifier, ApprovalSummaryRow, Submitter, SummaryJson,
};
use approvals_core::domains::tenant::models::TenantInfo;
use serde_json::json;

pub const APPROVER: &str = "jdoe";
pub const SUBMITTER: &str = "slee";

/// A push-class tenant with the default Approve/Reject actions.
pub fn push_tenant() -> TenantInfo {
    TenantInfo::new(TenantId::new(), "Contoso Invoices")
}

/// A pending row for `approver` on `document_number` at version `v1`.
pub fn pending_row(tenant: &TenantInfo, approver: &str, document_number: &str) -> ApprovalSummaryRow {
    let mut summary = SummaryJson::new(
        ApprovalIdentifier::new(document_number),
        format!("Invoice {}", document_number),
        Submitter {
            alias: Alias::new(SUBMITTER),
            name: Some("Sam Lee".to_string()),
        },
    );
    summary.unit_value = Some("950.00".to_string());
    summary.unit_of_measure = Some("USD".to_string());
    ApprovalSummaryRow::new(Alias::new(approver), tenant.id, summary, "v1")
}

/// The payload a client sends to approve one document at version `v1`.
pub fn approve_payload(document_number: &str) -> serde_json::Value {
    json!({
        "approvalIdentifier": { "documentNumber": document_number },
        "action": "Approve",
        "actionDetails": { "comment": "looks good" },
        "requestVersion": "v1",
    })
}

/// A bulk payload approving each document at version `v1`.
pub fn bulk_approve_payload(document_numbers: &[&str]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = document_numbers
        .iter()
        .map(|doc| approve_payload(doc))
        .collect();
    json!({ "approvalRequests": entries })
}
