// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "take an action") lives in domain functions that use
// these traits.
//
// Naming convention: Base* for trait names (e.g., BaseSummaryStore)

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use crate::common::{Alias, DocumentNumber, TenantId};
use crate::domains::audit::models::TransactionHistory;
use crate::domains::details::models::ApprovalDetailsRow;
use crate::domains::document_action::models::ApprovalRequest;
use crate::domains::notifications::models::EmailMessage;
use crate::domains::summary::models::ApprovalSummaryRow;
use crate::domains::tenant::models::TenantInfo;

// =============================================================================
// Summary Store (pending-approval rows)
// =============================================================================

#[async_trait]
pub trait BaseSummaryStore: Send + Sync {
    /// All pending rows for an approver, across tenants.
    async fn rows_for_approver(&self, approver: &Alias) -> Result<Vec<ApprovalSummaryRow>>;

    /// One row by its (approver, tenant, document) key.
    async fn find_row(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Result<Option<ApprovalSummaryRow>>;

    /// Sets or clears the soft lock taken while an action is in flight.
    async fn set_pending(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
        pending: bool,
    ) -> Result<()>;

    /// Stamps the row with the latest failure so list views can surface it.
    async fn record_failure(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
        message: &str,
    ) -> Result<()>;

    /// Removes the row once the document has left the approver's queue.
    async fn remove_row(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Result<()>;
}

// =============================================================================
// Details Store (per-section document details)
// =============================================================================

#[async_trait]
pub trait BaseDetailsStore: Send + Sync {
    async fn sections(
        &self,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Result<Vec<ApprovalDetailsRow>>;

    async fn upsert_section(&self, row: &ApprovalDetailsRow) -> Result<()>;
}

// =============================================================================
// History Store (audit trail)
// =============================================================================

#[async_trait]
pub trait BaseHistoryStore: Send + Sync {
    async fn record(&self, history: &TransactionHistory) -> Result<()>;

    /// Batched variant used by bulk post-processing.
    async fn record_batch(&self, entries: &[TransactionHistory]) -> Result<()> {
        for entry in entries {
            self.record(entry).await?;
        }
        Ok(())
    }

    async fn for_document(
        &self,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Result<Vec<TransactionHistory>>;
}

// =============================================================================
// Tenant Store (tenant configuration lookup)
// =============================================================================

#[async_trait]
pub trait BaseTenantStore: Send + Sync {
    async fn tenant(&self, tenant_id: TenantId) -> Result<Option<TenantInfo>>;

    async fn all_tenants(&self) -> Result<Vec<TenantInfo>>;
}

// =============================================================================
// Tenant Adapter (HTTP calls into the LOB system)
// =============================================================================

#[async_trait]
pub trait BaseTenantAdapter: Send + Sync {
    /// Dispatches one document action; returns the tenant's raw reply JSON.
    async fn execute_action(
        &self,
        tenant: &TenantInfo,
        request: &ApprovalRequest,
    ) -> Result<serde_json::Value>;

    /// Dispatches a batch of actions in one call; returns the raw reply,
    /// expected to carry one entry per document (but not trusted to).
    async fn execute_bulk(
        &self,
        tenant: &TenantInfo,
        requests: &[ApprovalRequest],
    ) -> Result<serde_json::Value>;

    /// Fetches one details section from the tenant.
    async fn fetch_details(
        &self,
        tenant: &TenantInfo,
        document_number: &DocumentNumber,
        operation: &str,
    ) -> Result<serde_json::Value>;

    /// Pull tenants: the live pending-approvals list for an approver.
    async fn fetch_pending(
        &self,
        tenant: &TenantInfo,
        approver: &Alias,
    ) -> Result<serde_json::Value>;

    async fn download_attachment(
        &self,
        tenant: &TenantInfo,
        document_number: &DocumentNumber,
        attachment_id: &str,
    ) -> Result<Vec<u8>>;
}

// =============================================================================
// Notification Sender (email delivery)
// =============================================================================

#[async_trait]
pub trait BaseNotificationSender: Send + Sync {
    async fn send_email(&self, email: &EmailMessage) -> Result<()>;
}

// =============================================================================
// Template Store (notification templates)
// =============================================================================

#[async_trait]
pub trait BaseTemplateStore: Send + Sync {
    /// Template body for a tenant-scoped key, e.g. "contoso-invoice|approve".
    async fn template(&self, tenant_id: TenantId, key: &str) -> Result<Option<String>>;
}

// =============================================================================
// Blob Store (attachment bytes)
// =============================================================================

#[async_trait]
pub trait BaseBlobStore: Send + Sync {
    async fn get(&self, container: &str, path: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, container: &str, path: &str, bytes: &[u8]) -> Result<()>;
}

// =============================================================================
// Name Resolver (alias -> display name)
// =============================================================================

#[async_trait]
pub trait BaseNameResolver: Send + Sync {
    async fn display_name(&self, alias: &Alias) -> Result<Option<String>>;

    /// Batch resolution; aliases with no directory entry are omitted.
    async fn display_names(&self, aliases: &[Alias]) -> Result<HashMap<Alias, String>> {
        let mut names = HashMap::new();
        for alias in aliases {
            if let Some(name) = self.display_name(alias).await? {
                names.insert(alias.clone(), name);
            }
        }
        Ok(names)
    }
}

// =============================================================================
// Flighting Service (feature flags)
// =============================================================================

#[async_trait]
pub trait BaseFlightingService: Send + Sync {
    /// Whether a feature is enabled for a user.
    async fn is_enabled(&self, feature: &str, alias: &Alias) -> Result<bool>;
}
