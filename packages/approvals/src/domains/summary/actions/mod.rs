//! Summary rendering.
//!
//! `get_summary` is the list view behind every client's home screen: the
//! approver's persisted pending rows, decorated with per-tenant client
//! actions and display fields. Pull-class tenants are not persisted; their
//! live queues are fetched and appended here so clients see one list.

use std::collections::HashMap;

use serde_json::json;
use tracing::{info, warn};

use crate::common::{Alias, ApprovalsError, ClientDevice, TenantId};
use crate::domains::document_action::client_actions::{client_actions, ClientAction};
use crate::domains::pull_tenant::actions::get_pull_summary;
use crate::domains::summary::models::SummaryJson;
use crate::domains::tenant::models::TenantInfo;
use crate::kernel::ApprovalsDeps;

/// Pending approvals for one approver, shaped for one device.
///
/// Soft-locked rows are omitted: an action against them is already in
/// flight and the client must not offer them again. Rows whose last action
/// attempt failed carry the failure message as a banner.
pub async fn get_summary(
    deps: &ApprovalsDeps,
    approver: &Alias,
    device: ClientDevice,
    tenant_filter: Option<TenantId>,
) -> Result<serde_json::Value, ApprovalsError> {
    let tenants: HashMap<TenantId, TenantInfo> = deps
        .tenant_store
        .all_tenants()
        .await
        .map_err(ApprovalsError::Internal)?
        .into_iter()
        .filter(|t| tenant_filter.map_or(true, |id| id == t.id))
        .map(|t| (t.id, t))
        .collect();

    let rows = deps
        .summary_store
        .rows_for_approver(approver)
        .await
        .map_err(ApprovalsError::Internal)?;

    let mut actions_by_tenant: HashMap<TenantId, Vec<ClientAction>> = HashMap::new();
    let mut entries = Vec::new();

    for row in rows {
        let Some(tenant) = tenants.get(&row.tenant_id) else {
            if tenant_filter.is_none() {
                warn!(
                    tenant_id = %row.tenant_id,
                    document_number = %row.document_number,
                    "Summary row references an unknown tenant, skipping"
                );
            }
            continue;
        };
        if row.pending_action {
            continue;
        }

        let actions =
            tenant_actions(deps, tenant, device, approver, &mut actions_by_tenant).await?;

        let mut summary = row.summary_json.clone();
        trim_for_device(&mut summary, device);

        let mut entry = json!({
            "tenantId": tenant.id,
            "tenantName": tenant.name,
            "documentNumber": summary.approval_identifier.display_number(),
            "requestVersion": row.request_version,
            "summary": summary,
            "actions": actions,
        });
        if row.last_failed {
            entry["lastFailed"] = json!(true);
            if let Some(message) = &row.last_failed_message {
                entry["lastFailedMessage"] = json!(message);
            }
        }
        entries.push(entry);
    }

    // Pull tenants have no persisted rows; their queue is live.
    for tenant in tenants.values().filter(|t| t.is_pull()) {
        let summaries = match get_pull_summary(deps, tenant, approver).await {
            Ok(summaries) => summaries,
            Err(e) => {
                // One tenant being down must not empty the whole list.
                warn!(tenant_name = %tenant.name, error = %e, "Pull summary fetch failed");
                continue;
            }
        };
        let actions =
            tenant_actions(deps, tenant, device, approver, &mut actions_by_tenant).await?;
        for mut summary in summaries {
            trim_for_device(&mut summary, device);
            entries.push(json!({
                "tenantId": tenant.id,
                "tenantName": tenant.name,
                "documentNumber": summary.approval_identifier.display_number(),
                "summary": summary,
                "actions": actions,
            }));
        }
    }

    info!(
        approver = %approver,
        client_device = %device,
        document_count = entries.len(),
        "Rendered approval summary"
    );

    Ok(json!({
        "approvalSummaries": entries,
        "clientDevice": device,
    }))
}

/// Client actions are per (tenant, device, approver); computed once per
/// tenant and reused across its rows.
async fn tenant_actions(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    device: ClientDevice,
    approver: &Alias,
    cache: &mut HashMap<TenantId, Vec<ClientAction>>,
) -> Result<Vec<ClientAction>, ApprovalsError> {
    if let Some(actions) = cache.get(&tenant.id) {
        return Ok(actions.clone());
    }
    let actions = client_actions(deps, tenant, device, approver)
        .await
        .map_err(ApprovalsError::Internal)?;
    cache.insert(tenant.id, actions.clone());
    Ok(actions)
}

/// Mobile payload budgets are tight; tenant-defined extra fields are list
/// decoration only and get dropped there.
fn trim_for_device(summary: &mut SummaryJson, device: ClientDevice) {
    if device.is_mobile() {
        summary.additional_data.clear();
    }
}
