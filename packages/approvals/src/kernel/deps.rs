//! Service dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! actions. All external services use trait abstractions to enable testing.

use std::sync::Arc;

use super::config::ApprovalsConfig;
use super::traits::{
    BaseBlobStore, BaseDetailsStore, BaseFlightingService, BaseHistoryStore, BaseNameResolver,
    BaseNotificationSender, BaseSummaryStore, BaseTemplateStore, BaseTenantAdapter,
    BaseTenantStore,
};
use crate::common::{ApprovalsError, TenantId};
use crate::domains::tenant::models::TenantInfo;

/// Dependencies accessible to domain actions (using traits for testability)
#[derive(Clone)]
pub struct ApprovalsDeps {
    pub summary_store: Arc<dyn BaseSummaryStore>,
    pub details_store: Arc<dyn BaseDetailsStore>,
    pub history_store: Arc<dyn BaseHistoryStore>,
    pub tenant_store: Arc<dyn BaseTenantStore>,
    pub tenant_adapter: Arc<dyn BaseTenantAdapter>,
    pub notification_sender: Arc<dyn BaseNotificationSender>,
    pub template_store: Arc<dyn BaseTemplateStore>,
    pub blob_store: Arc<dyn BaseBlobStore>,
    pub name_resolver: Arc<dyn BaseNameResolver>,
    pub flighting: Arc<dyn BaseFlightingService>,
    pub config: ApprovalsConfig,
}

impl ApprovalsDeps {
    /// Create new ApprovalsDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        summary_store: Arc<dyn BaseSummaryStore>,
        details_store: Arc<dyn BaseDetailsStore>,
        history_store: Arc<dyn BaseHistoryStore>,
        tenant_store: Arc<dyn BaseTenantStore>,
        tenant_adapter: Arc<dyn BaseTenantAdapter>,
        notification_sender: Arc<dyn BaseNotificationSender>,
        template_store: Arc<dyn BaseTemplateStore>,
        blob_store: Arc<dyn BaseBlobStore>,
        name_resolver: Arc<dyn BaseNameResolver>,
        flighting: Arc<dyn BaseFlightingService>,
        config: ApprovalsConfig,
    ) -> Self {
        Self {
            summary_store,
            details_store,
            history_store,
            tenant_store,
            tenant_adapter,
            notification_sender,
            template_store,
            blob_store,
            name_resolver,
            flighting,
            config,
        }
    }

    /// Loads a tenant's configuration or fails with `NotFound`.
    ///
    /// Every entry-point action starts here; an unknown tenant id is a
    /// client error, not an internal one.
    pub async fn require_tenant(&self, tenant_id: TenantId) -> Result<TenantInfo, ApprovalsError> {
        self.tenant_store
            .tenant(tenant_id)
            .await
            .map_err(ApprovalsError::Internal)?
            .ok_or_else(|| ApprovalsError::NotFound(format!("tenant {}", tenant_id)))
    }
}
