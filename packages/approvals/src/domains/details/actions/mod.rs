//! Details rendering and attachment delivery.
//!
//! Details are served from the persisted section rows when possible; a miss
//! (or a tenant marked details-from-LOB) goes to the tenant adapter and the
//! fetched sections are persisted on the way out. Attachments are
//! cache-through against the blob store.

use std::collections::HashMap;

use serde_json::json;
use tracing::{info, warn};

use crate::common::{Alias, ApprovalsError, ClientDevice, DocumentNumber, TenantId};
use crate::domains::document_action::client_actions::client_actions;
use crate::domains::details::models::{sections, ApprovalDetailsRow, AttachmentInfo};
use crate::domains::pull_tenant::actions::{get_pull_details, get_pull_summary};
use crate::domains::tenant::models::TenantInfo;
use crate::kernel::ApprovalsDeps;

/// Full details for one document, shaped for one device.
///
/// Authorization: the caller is the current approver (the summary row for
/// push tenants, the live LOB queue for pull tenants) or has a completed
/// action in the document's transaction history. Anyone else gets
/// `Unauthorized`.
pub async fn get_details(
    deps: &ApprovalsDeps,
    tenant_id: TenantId,
    document_number: &DocumentNumber,
    approver: &Alias,
    device: ClientDevice,
) -> Result<serde_json::Value, ApprovalsError> {
    let tenant = deps.require_tenant(tenant_id).await?;

    let row = deps
        .summary_store
        .find_row(approver, tenant_id, document_number)
        .await
        .map_err(ApprovalsError::Internal)?;

    let in_queue =
        row.is_none() && in_pull_queue(deps, &tenant, document_number, approver).await;
    if row.is_none()
        && !in_queue
        && !was_participant(deps, tenant_id, document_number, approver).await?
    {
        return Err(ApprovalsError::Unauthorized(format!(
            "{} is not a participant on document {}",
            approver, document_number
        )));
    }

    info!(
        tenant_name = %tenant.name,
        document_number = %document_number,
        approver = %approver,
        client_device = %device,
        "Rendering document details"
    );

    let mut section_rows =
        load_sections(deps, &tenant, document_number, row.as_ref().map(|r| r.request_version.as_str()))
            .await?;

    // Mobile drops the tenant-configured heavy sections.
    if device.is_mobile() {
        section_rows.retain(|s| !tenant.mobile_trimmed_sections.contains(&s.operation));
    }

    let attachments = collect_attachments(&section_rows);

    let mut details = serde_json::Map::new();
    for section in &section_rows {
        details.insert(section.operation.clone(), section.json.clone());
    }

    let mut envelope = json!({
        "tenantId": tenant.id,
        "documentNumber": document_number,
        "details": details,
        "attachments": attachments,
        "clientDevice": device,
    });

    // Only the current approver gets actions and the live approver chain.
    if let Some(row) = row {
        let actions = client_actions(deps, &tenant, device, approver)
            .await
            .map_err(ApprovalsError::Internal)?;
        envelope["actions"] = json!(actions);
        envelope["requestVersion"] = json!(row.request_version);
        envelope["details"][sections::CURRENT_APPROVER] =
            approver_chain(deps, &row.summary_json.approval_hierarchy).await?;
    } else if in_queue {
        // Pull tenants have no persisted row or hierarchy, but a document in
        // the approver's live queue is still actionable.
        let actions = client_actions(deps, &tenant, device, approver)
            .await
            .map_err(ApprovalsError::Internal)?;
        envelope["actions"] = json!(actions);
    }

    Ok(envelope)
}

/// Attachment bytes, cache-through: blob hit, else tenant download + put.
pub async fn get_attachment(
    deps: &ApprovalsDeps,
    tenant_id: TenantId,
    document_number: &DocumentNumber,
    approver: &Alias,
    attachment_id: &str,
) -> Result<Vec<u8>, ApprovalsError> {
    let tenant = deps.require_tenant(tenant_id).await?;

    let row = deps
        .summary_store
        .find_row(approver, tenant_id, document_number)
        .await
        .map_err(ApprovalsError::Internal)?;
    if row.is_none()
        && !in_pull_queue(deps, &tenant, document_number, approver).await
        && !was_participant(deps, tenant_id, document_number, approver).await?
    {
        return Err(ApprovalsError::Unauthorized(format!(
            "{} is not a participant on document {}",
            approver, document_number
        )));
    }

    let container = deps.config.attachment_container.as_str();
    let path = format!("{}/{}/{}", tenant_id, document_number, attachment_id);

    if let Some(bytes) = deps
        .blob_store
        .get(container, &path)
        .await
        .map_err(ApprovalsError::Internal)?
    {
        return Ok(bytes);
    }

    let bytes = deps
        .tenant_adapter
        .download_attachment(&tenant, document_number, attachment_id)
        .await
        .map_err(|e| ApprovalsError::Tenant {
            code: None,
            message: e.to_string(),
        })?;

    if let Err(e) = deps.blob_store.put(container, &path, &bytes).await {
        // Serving the download matters more than caching it.
        warn!(path = %path, error = %e, "Failed to cache attachment blob");
    }

    Ok(bytes)
}

/// Pull tenants keep no summary rows; the live LOB queue decides who the
/// current approver is. A queue lookup failure falls through to the history
/// check rather than failing the read outright.
async fn in_pull_queue(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    document_number: &DocumentNumber,
    approver: &Alias,
) -> bool {
    if !tenant.is_pull() {
        return false;
    }
    match get_pull_summary(deps, tenant, approver).await {
        Ok(summaries) => summaries
            .iter()
            .any(|s| s.approval_identifier.document_number == *document_number),
        Err(e) => {
            warn!(
                tenant_name = %tenant.name,
                document_number = %document_number,
                error = %e,
                "Pull queue lookup failed during authorization"
            );
            false
        }
    }
}

/// Past participants keep read access through the audit trail.
///
/// Only completed actions count: the trail also records rejected attempts
/// (wrong approver, stale version), and a denied request must not become a
/// read grant. An approver whose action failed downstream still holds the
/// summary row, so the row check covers them.
async fn was_participant(
    deps: &ApprovalsDeps,
    tenant_id: TenantId,
    document_number: &DocumentNumber,
    approver: &Alias,
) -> Result<bool, ApprovalsError> {
    let history = deps
        .history_store
        .for_document(tenant_id, document_number)
        .await
        .map_err(ApprovalsError::Internal)?;
    Ok(history
        .iter()
        .any(|h| &h.approver == approver && h.action_result))
}

/// Persisted sections, refreshed from the tenant when missing or when the
/// tenant always serves details live.
async fn load_sections(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    document_number: &DocumentNumber,
    request_version: Option<&str>,
) -> Result<Vec<ApprovalDetailsRow>, ApprovalsError> {
    let persisted = deps
        .details_store
        .sections(tenant.id, document_number)
        .await
        .map_err(ApprovalsError::Internal)?;

    let operations = tenant_operations(tenant);
    let have_all = operations
        .iter()
        .all(|op| persisted.iter().any(|s| s.operation == *op));
    if !tenant.details_from_lob && have_all {
        return Ok(persisted);
    }

    let mut by_operation: HashMap<String, ApprovalDetailsRow> = persisted
        .into_iter()
        .map(|s| (s.operation.clone(), s))
        .collect();

    for operation in operations {
        let fetched = if tenant.is_pull() {
            get_pull_details(deps, tenant, document_number, operation).await
        } else {
            deps.tenant_adapter
                .fetch_details(tenant, document_number, operation)
                .await
                .map_err(|e| ApprovalsError::Tenant {
                    code: None,
                    message: e.to_string(),
                })
        };
        match fetched {
            Ok(value) => {
                let section = ApprovalDetailsRow::new(
                    tenant.id,
                    document_number.clone(),
                    operation,
                    value,
                    request_version.unwrap_or_default(),
                );
                if let Err(e) = deps.details_store.upsert_section(&section).await {
                    warn!(operation = operation, error = %e, "Failed to persist details section");
                }
                by_operation.insert(operation.to_string(), section);
            }
            Err(e) => {
                // A stale persisted copy beats an error page.
                if by_operation.contains_key(operation) {
                    warn!(
                        operation = operation,
                        error = %e,
                        "Details refresh failed, serving persisted copy"
                    );
                } else {
                    return Err(e);
                }
            }
        }
    }

    let mut sections: Vec<ApprovalDetailsRow> = by_operation.into_values().collect();
    sections.sort_by(|a, b| a.operation.cmp(&b.operation));
    Ok(sections)
}

/// The sections a tenant serves. Pull tenants configure their own operation
/// names; push tenants get the standard header and line sections.
fn tenant_operations(tenant: &TenantInfo) -> Vec<&str> {
    if tenant.is_pull() {
        tenant.pull_operations.keys().map(String::as_str).collect()
    } else {
        vec![sections::HEADER, sections::LINE_ITEMS]
    }
}

/// Attachment lists ride inside section JSON under an `attachments` array.
fn collect_attachments(section_rows: &[ApprovalDetailsRow]) -> Vec<AttachmentInfo> {
    let mut attachments = Vec::new();
    for section in section_rows {
        if let Some(items) = section.json.get("attachments").and_then(|v| v.as_array()) {
            for item in items {
                if let Ok(info) = serde_json::from_value::<AttachmentInfo>(item.clone()) {
                    attachments.push(info);
                }
            }
        }
    }
    attachments
}

/// Current approver chain with display names resolved in one batch.
async fn approver_chain(
    deps: &ApprovalsDeps,
    hierarchy: &[crate::domains::summary::models::ApprovalHierarchyStep],
) -> Result<serde_json::Value, ApprovalsError> {
    let aliases: Vec<Alias> = hierarchy
        .iter()
        .flat_map(|step| step.approvers.iter().cloned())
        .collect();
    let names = deps
        .name_resolver
        .display_names(&aliases)
        .await
        .map_err(ApprovalsError::Internal)?;

    let steps: Vec<serde_json::Value> = hierarchy
        .iter()
        .map(|step| {
            json!({
                "level": step.level,
                "status": step.status,
                "approvers": step
                    .approvers
                    .iter()
                    .map(|alias| {
                        json!({
                            "alias": alias,
                            "name": names.get(alias),
                        })
                    })
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    Ok(json!(steps))
}
