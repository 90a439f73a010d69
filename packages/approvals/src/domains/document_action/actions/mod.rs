//! Single-document action pipeline.
//!
//! Entry-point actions are called directly from the upstream API controllers.
//! They do the work synchronously and return the client response envelope.
//!
//! Flow:
//! - parse and validate the payload against the approver's summary row
//! - soft-lock the row, enrich the request from the persisted summary
//! - dispatch to the tenant adapter and classify the reply
//! - on success: remove the row, stamp details, record history, notify
//! - on failure: clear the lock, stamp the failure, record history
//!
//! Every attempt that names a document leaves a transaction-history record,
//! successful or not.

use serde_json::json;
use tracing::{error, info, warn};

use crate::common::{Alias, ApprovalsError, ClientDevice, TenantId};
use crate::domains::audit::models::TransactionHistory;
use crate::domains::details::models::{sections, ApprovalDetailsRow};
use crate::domains::notifications::actions::send_action_notification;
use crate::domains::pull_tenant::actions::submit_pull_action;
use crate::domains::summary::models::SummaryJson;
use crate::domains::tenant::models::TenantInfo;
use crate::kernel::ApprovalsDeps;

use super::models::{ApprovalRequest, ApprovalResponse};
use super::validation::validate_request;

/// Internal result of a dispatched action, before envelope shaping.
struct ActionSuccess {
    summary: SummaryJson,
    display_message: Option<String>,
    target_page: Option<String>,
}

/// Takes one action against one document and returns the client envelope.
///
/// This function never fails: every error is logged and converted into a
/// client-facing error payload.
pub async fn take_action(
    deps: &ApprovalsDeps,
    tenant_id: TenantId,
    approver: &Alias,
    device: ClientDevice,
    payload: &serde_json::Value,
) -> serde_json::Value {
    let request = match ApprovalRequest::from_payload(tenant_id, payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(tenant_id = %tenant_id, error = %e, "Rejected malformed action payload");
            return error_envelope(None, device, &e);
        }
    };

    let tenant = match deps.require_tenant(tenant_id).await {
        Ok(tenant) => tenant,
        Err(e) => {
            warn!(tenant_id = %tenant_id, error = %e, "Action against unknown tenant");
            return error_envelope(Some(&request), device, &e);
        }
    };

    // Pull-class tenants hold their own pending queue; the action goes
    // straight to the LOB system.
    if tenant.is_pull() {
        return submit_pull_action(deps, &tenant, approver, device, &request).await;
    }

    info!(
        tenant_name = %tenant.name,
        document_number = %request.document_number(),
        action = %request.action,
        approver = %approver,
        client_device = %device,
        "Taking document action"
    );

    let mut request = request;
    let result = dispatch_action(deps, &tenant, &mut request, approver).await;

    record_history(deps, &tenant, &request, approver, device, &result).await;

    match result {
        Ok(success) => {
            send_action_notification(deps, &tenant, &success.summary, &request, approver).await;
            success_envelope(&request, device, &success)
        }
        Err(e) => {
            warn!(
                document_number = %request.document_number(),
                error_type = e.error_type(),
                error = %e,
                "Document action failed"
            );
            error_envelope(Some(&request), device, &e)
        }
    }
}

/// Loads the approver's row, validates the request against it, enriches the
/// request from the persisted summary and takes the soft lock.
///
/// Shared by the single and bulk pipelines; a request that comes back `Ok`
/// is locked and ready to dispatch.
pub(crate) async fn prepare_request(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    request: &mut ApprovalRequest,
    approver: &Alias,
) -> Result<crate::domains::summary::models::ApprovalSummaryRow, ApprovalsError> {
    let document_number = request.approval_identifier.document_number.clone();

    let row = deps
        .summary_store
        .find_row(approver, tenant.id, &document_number)
        .await
        .map_err(ApprovalsError::Internal)?
        .ok_or_else(|| {
            ApprovalsError::Unauthorized(format!(
                "{} has no pending approval for document {}",
                approver, document_number
            ))
        })?;

    validate_request(request, tenant, &row, approver)?;

    // Enrich the request from the persisted summary: the client only sends
    // the bare document key, the tenant expects the full identifier.
    request.approval_identifier = row.summary_json.approval_identifier.clone();
    request.action_details.action_date = Some(chrono::Utc::now());
    request.additional_data.insert(
        "submitter".to_string(),
        json!(row.summary_json.submitter.alias),
    );

    deps.summary_store
        .set_pending(approver, tenant.id, &document_number, true)
        .await
        .map_err(ApprovalsError::Internal)?;

    Ok(row)
}

/// Validates, locks, dispatches and settles one action.
async fn dispatch_action(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    request: &mut ApprovalRequest,
    approver: &Alias,
) -> Result<ActionSuccess, ApprovalsError> {
    let row = prepare_request(deps, tenant, request, approver).await?;
    let document_number = request.approval_identifier.document_number.clone();

    let reply = deps.tenant_adapter.execute_action(tenant, request).await;

    let outcome = match reply {
        Ok(value) => {
            let response = ApprovalResponse::from_tenant_json(&value);
            if response.action_result {
                Ok(response)
            } else {
                Err(response.to_error(tenant, document_number.as_str()))
            }
        }
        Err(e) => Err(ApprovalsError::Tenant {
            code: None,
            message: e.to_string(),
        }),
    };

    match outcome {
        Ok(response) => {
            settle_success(deps, tenant, request, approver).await?;
            Ok(ActionSuccess {
                summary: row.summary_json,
                display_message: response.display_message,
                target_page: tenant
                    .find_action(&request.action)
                    .and_then(|a| a.target_page.clone()),
            })
        }
        Err(e) => {
            settle_failure(deps, tenant, request, approver, &e).await;
            Err(e)
        }
    }
}

/// The document left the approver's queue: drop the row and stamp details.
pub(crate) async fn settle_success(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    request: &ApprovalRequest,
    approver: &Alias,
) -> Result<(), ApprovalsError> {
    let document_number = &request.approval_identifier.document_number;

    deps.summary_store
        .remove_row(approver, tenant.id, document_number)
        .await
        .map_err(ApprovalsError::Internal)?;

    let stamp = ApprovalDetailsRow::new(
        tenant.id,
        document_number.clone(),
        sections::ACTION_TAKEN,
        json!({
            "action": request.action,
            "approver": approver,
            "actionDate": request.action_details.action_date,
            "comment": request.action_details.comment,
        }),
        request.request_version.clone().unwrap_or_default(),
    );
    deps.details_store
        .upsert_section(&stamp)
        .await
        .map_err(ApprovalsError::Internal)?;

    Ok(())
}

/// The action failed after the lock was taken: restore the row state.
pub(crate) async fn settle_failure(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    request: &ApprovalRequest,
    approver: &Alias,
    error: &ApprovalsError,
) {
    let document_number = &request.approval_identifier.document_number;

    if let Err(e) = deps
        .summary_store
        .set_pending(approver, tenant.id, document_number, false)
        .await
    {
        error!(document_number = %document_number, error = %e, "Failed to clear action lock");
    }
    if let Err(e) = deps
        .summary_store
        .record_failure(approver, tenant.id, document_number, &error.to_string())
        .await
    {
        error!(document_number = %document_number, error = %e, "Failed to stamp row failure");
    }
}

/// Appends the attempt to the transaction history. Best effort.
async fn record_history(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    request: &ApprovalRequest,
    approver: &Alias,
    device: ClientDevice,
    result: &Result<ActionSuccess, ApprovalsError>,
) {
    // Pre-validation failures that never touched the row still get audited;
    // anything with a document number is worth a trace.
    let history = TransactionHistory::new(
        tenant.id,
        request.approval_identifier.document_number.clone(),
        approver.clone(),
        request.action.clone(),
        device,
        result.is_ok(),
        result.as_ref().err().map(|e| e.to_string()),
        serde_json::to_value(request).unwrap_or(serde_json::Value::Null),
    );
    if let Err(e) = deps.history_store.record(&history).await {
        error!(
            document_number = %history.document_number,
            error = %e,
            "Failed to record transaction history"
        );
    }
}

/// Client envelope for a successful action.
fn success_envelope(
    request: &ApprovalRequest,
    device: ClientDevice,
    success: &ActionSuccess,
) -> serde_json::Value {
    let mut envelope = json!({
        "actionResult": true,
        "documentNumber": request.approval_identifier.display_number(),
        "action": request.action,
        "clientDevice": device,
    });
    if let Some(message) = &success.display_message {
        envelope["displayMessage"] = json!(message);
    }
    // Navigation targets only make sense on interactive surfaces.
    if matches!(device, ClientDevice::Web | ClientDevice::Teams) {
        if let Some(page) = &success.target_page {
            envelope["targetPage"] = json!(page);
        }
    }
    if device == ClientDevice::ActionableEmail {
        envelope["refreshCard"] = json!(true);
    }
    envelope
}

/// Client envelope for a failed action.
pub(crate) fn error_envelope(
    request: Option<&ApprovalRequest>,
    device: ClientDevice,
    error: &ApprovalsError,
) -> serde_json::Value {
    let mut envelope = json!({
        "actionResult": false,
        "clientDevice": device,
        "errorInfo": error.to_client_json(),
        "requiresRefresh": error.requires_refresh(),
    });
    if let Some(request) = request {
        envelope["documentNumber"] = json!(request.approval_identifier.display_number());
        envelope["action"] = json!(request.action);
    }
    envelope
}
