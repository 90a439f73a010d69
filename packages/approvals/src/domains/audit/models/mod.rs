//! Audit history entities.

use crate::common::{Alias, ClientDevice, DocumentNumber, HistoryId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One attempted action against one document, successful or not.
///
/// History rows are append-only; they back the "past approvals" views and
/// authorize read access to documents that already left the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistory {
    pub id: HistoryId,
    pub tenant_id: TenantId,
    pub document_number: DocumentNumber,
    pub approver: Alias,
    /// Set when the action was taken on behalf of someone else.
    pub delegate_of: Option<Alias>,
    pub action_taken: String,
    pub action_date: DateTime<Utc>,
    pub client_device: ClientDevice,
    pub action_result: bool,
    pub failure_reason: Option<String>,
    /// Snapshot of the dispatched request, for investigation.
    pub json: serde_json::Value,
}

impl TransactionHistory {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        document_number: DocumentNumber,
        approver: Alias,
        action_taken: impl Into<String>,
        client_device: ClientDevice,
        action_result: bool,
        failure_reason: Option<String>,
        json: serde_json::Value,
    ) -> Self {
        Self {
            id: HistoryId::new(),
            tenant_id,
            document_number,
            approver,
            delegate_of: None,
            action_taken: action_taken.into(),
            action_date: Utc::now(),
            client_device,
            action_result,
            failure_reason,
            json,
        }
    }
}
