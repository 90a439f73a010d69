//! Pull-model tenants.
//!
//! Pull tenants keep their own pending queue: there are no persisted summary
//! rows, so summaries and details are fetched live from the LOB system and
//! actions post straight through. The field-mapping table on `TenantInfo`
//! translates the tenant's external JSON into the client summary shape.

use serde_json::json;
use tracing::{error, info, warn};

use crate::common::{Alias, ApprovalsError, ClientDevice, DocumentNumber};
use crate::domains::audit::models::TransactionHistory;
use crate::domains::document_action::actions::error_envelope;
use crate::domains::document_action::models::{ApprovalRequest, ApprovalResponse};
use crate::domains::summary::models::{ApprovalIdentifier, Submitter, SummaryJson};
use crate::domains::tenant::models::TenantInfo;
use crate::kernel::ApprovalsDeps;

/// Live pending-approvals list for an approver, mapped into summary rows.
pub async fn get_pull_summary(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    approver: &Alias,
) -> Result<Vec<SummaryJson>, ApprovalsError> {
    let reply = deps
        .tenant_adapter
        .fetch_pending(tenant, approver)
        .await
        .map_err(|e| ApprovalsError::Tenant {
            code: None,
            message: e.to_string(),
        })?;

    let items: Vec<&serde_json::Value> = match &reply {
        serde_json::Value::Array(items) => items.iter().collect(),
        serde_json::Value::Object(obj) => obj
            .get("approvalSummaries")
            .or_else(|| obj.get("items"))
            .and_then(|v| v.as_array())
            .map(|a| a.iter().collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut summaries = Vec::with_capacity(items.len());
    for item in items {
        match map_summary(tenant, item) {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                // One unmappable entry must not hide the rest of the queue.
                warn!(
                    tenant_name = %tenant.name,
                    error = %e,
                    "Skipping unmappable pull summary entry"
                );
            }
        }
    }

    info!(
        tenant_name = %tenant.name,
        approver = %approver,
        document_count = summaries.len(),
        "Fetched pull-tenant summary"
    );
    Ok(summaries)
}

/// Fetches one named details operation from the LOB system.
///
/// Operation names are allow-listed by the tenant configuration so a client
/// cannot probe arbitrary endpoints.
pub async fn get_pull_details(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    document_number: &DocumentNumber,
    operation: &str,
) -> Result<serde_json::Value, ApprovalsError> {
    if !tenant.pull_operations.contains_key(operation) {
        return Err(ApprovalsError::Validation(format!(
            "unknown details operation '{}' for tenant {}",
            operation, tenant.name
        )));
    }

    deps.tenant_adapter
        .fetch_details(tenant, document_number, operation)
        .await
        .map_err(|e| ApprovalsError::Tenant {
            code: None,
            message: e.to_string(),
        })
}

/// Posts one action to the LOB system and returns the client envelope.
///
/// There is no summary row to lock or remove; the tenant's own queue is the
/// source of truth. Every attempt is still recorded in transaction history.
pub async fn submit_pull_action(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    approver: &Alias,
    device: ClientDevice,
    request: &ApprovalRequest,
) -> serde_json::Value {
    info!(
        tenant_name = %tenant.name,
        document_number = %request.document_number(),
        action = %request.action,
        approver = %approver,
        client_device = %device,
        "Submitting pull-tenant action"
    );

    if tenant.find_action(&request.action).is_none() {
        let e = ApprovalsError::Validation(format!(
            "action '{}' is not defined for tenant {}",
            request.action, tenant.name
        ));
        return error_envelope(Some(request), device, &e);
    }

    let reply = deps.tenant_adapter.execute_action(tenant, request).await;

    let outcome = match reply {
        Ok(value) => {
            let response = ApprovalResponse::from_tenant_json(&value);
            if response.action_result {
                Ok(response)
            } else {
                Err(response.to_error(tenant, request.document_number()))
            }
        }
        Err(e) => Err(ApprovalsError::Tenant {
            code: None,
            message: e.to_string(),
        }),
    };

    let history = TransactionHistory::new(
        tenant.id,
        request.approval_identifier.document_number.clone(),
        approver.clone(),
        request.action.clone(),
        device,
        outcome.is_ok(),
        outcome.as_ref().err().map(|e| e.to_string()),
        serde_json::to_value(request).unwrap_or(serde_json::Value::Null),
    );
    if let Err(e) = deps.history_store.record(&history).await {
        error!(
            document_number = %history.document_number,
            error = %e,
            "Failed to record pull-tenant transaction history"
        );
    }

    match outcome {
        Ok(response) => {
            let mut envelope = json!({
                "actionResult": true,
                "documentNumber": request.approval_identifier.display_number(),
                "action": request.action,
                "clientDevice": device,
            });
            if let Some(message) = response.display_message {
                envelope["displayMessage"] = json!(message);
            }
            envelope
        }
        Err(e) => {
            warn!(
                document_number = %request.document_number(),
                error_type = e.error_type(),
                error = %e,
                "Pull-tenant action failed"
            );
            error_envelope(Some(request), device, &e)
        }
    }
}

/// Maps one external summary entry through the tenant's field-mapping table.
///
/// Mapping keys are external field names, values the summary field they feed.
/// Mapped fields without a known target land in `additional_data`; with an
/// empty table the entry is expected to already be in the summary shape.
fn map_summary(tenant: &TenantInfo, item: &serde_json::Value) -> anyhow::Result<SummaryJson> {
    if tenant.pull_field_mapping.is_empty() {
        return Ok(serde_json::from_value(item.clone())?);
    }

    let mut document_number: Option<String> = None;
    let mut display_document_number: Option<String> = None;
    let mut fiscal_year: Option<String> = None;
    let mut title: Option<String> = None;
    let mut submitter_alias: Option<String> = None;
    let mut submitter_name: Option<String> = None;
    let mut summary = SummaryJson::new(
        ApprovalIdentifier::new(""),
        "",
        Submitter {
            alias: Alias::new(""),
            name: None,
        },
    );

    for (external, target) in &tenant.pull_field_mapping {
        let Some(value) = item.get(external) else {
            continue;
        };
        let text = || match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        };
        match target.as_str() {
            "documentNumber" => document_number = text(),
            "displayDocumentNumber" => display_document_number = text(),
            "fiscalYear" => fiscal_year = text(),
            "title" => title = text(),
            "submittedDate" => {
                summary.submitted_date = serde_json::from_value(value.clone()).ok();
            }
            "submitterAlias" => submitter_alias = text(),
            "submitterName" => submitter_name = text(),
            "unitValue" => summary.unit_value = text(),
            "unitOfMeasure" => summary.unit_of_measure = text(),
            "customAttribute" => summary.custom_attribute = text(),
            other => {
                summary
                    .additional_data
                    .insert(other.to_string(), value.clone());
            }
        }
    }

    let document_number = document_number
        .ok_or_else(|| anyhow::anyhow!("mapped entry is missing a document number"))?;
    summary.approval_identifier = ApprovalIdentifier::new(document_number);
    summary.approval_identifier.display_document_number =
        display_document_number.map(DocumentNumber::from);
    summary.approval_identifier.fiscal_year = fiscal_year;
    summary.title = title.unwrap_or_default();
    summary.submitter = Submitter {
        alias: Alias::new(submitter_alias.unwrap_or_default()),
        name: submitter_name,
    };
    Ok(summary)
}
