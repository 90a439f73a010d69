//! Bulk action pipeline.
//!
//! A bulk submission is validated per document, chunked to the tenant's
//! batch size, dispatched concurrently, and post-processed: each per-document
//! reply is matched back to the request it answers, audit records are built
//! for the whole batch, and storage rows are settled in one pass.
//!
//! The contract with clients: the response carries exactly one entry per
//! input document, in input order, no matter what the tenant returned.

use futures::StreamExt;
use serde_json::json;
use tracing::{error, info, warn};

use crate::common::{Alias, ApprovalsError, ClientDevice, TenantId};
use crate::domains::audit::models::TransactionHistory;
use crate::domains::tenant::models::TenantInfo;
use crate::kernel::ApprovalsDeps;

use super::actions::{prepare_request, settle_failure, settle_success};
use super::models::{ActionAuditLogInfo, ApprovalRequest, ApprovalResponse};

/// Takes a batch of actions and returns the client envelope.
///
/// Never fails: parse errors produce an empty-batch error envelope, and
/// per-document problems become per-document entries.
pub async fn take_bulk_action(
    deps: &ApprovalsDeps,
    tenant_id: TenantId,
    approver: &Alias,
    device: ClientDevice,
    payload: &serde_json::Value,
) -> serde_json::Value {
    let requests = match ApprovalRequest::batch_from_payload(tenant_id, payload) {
        Ok(requests) if !requests.is_empty() => requests,
        Ok(_) => {
            return batch_error_envelope(&ApprovalsError::Validation(
                "bulk payload contains no approval requests".to_string(),
            ))
        }
        Err(e) => {
            warn!(tenant_id = %tenant_id, error = %e, "Rejected malformed bulk payload");
            return batch_error_envelope(&e);
        }
    };

    let tenant = match deps.require_tenant(tenant_id).await {
        Ok(tenant) => tenant,
        Err(e) => return batch_error_envelope(&e),
    };

    info!(
        tenant_name = %tenant.name,
        approver = %approver,
        client_device = %device,
        document_count = requests.len(),
        "Taking bulk document action"
    );

    let total = requests.len();
    let mut entries: Vec<Option<serde_json::Value>> = vec![None; total];
    let mut audits: Vec<(ActionAuditLogInfo, serde_json::Value)> = Vec::with_capacity(total);

    // Phase 1: per-document validation and locking. Failures settle
    // immediately into their response slot.
    let mut accepted: Vec<(usize, ApprovalRequest)> = Vec::with_capacity(total);
    for (index, mut request) in requests.into_iter().enumerate() {
        match prepare_request(deps, &tenant, &mut request, approver).await {
            Ok(_) => accepted.push((index, request)),
            Err(e) => {
                entries[index] = Some(document_entry(&request, Err(&e)));
                audits.push(audit_for(&request, approver, device, Err(&e)));
            }
        }
    }

    // Phase 2: chunked concurrent dispatch to the tenant.
    let chunks: Vec<Vec<(usize, ApprovalRequest)>> = accepted
        .chunks(tenant.bulk_batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect();

    let dispatched: Vec<(Vec<(usize, ApprovalRequest)>, anyhow::Result<serde_json::Value>)> =
        futures::stream::iter(chunks.into_iter().map(|chunk| {
            let deps = deps.clone();
            let tenant = tenant.clone();
            async move {
                let batch: Vec<ApprovalRequest> =
                    chunk.iter().map(|(_, request)| request.clone()).collect();
                let reply = deps.tenant_adapter.execute_bulk(&tenant, &batch).await;
                (chunk, reply)
            }
        }))
        .buffer_unordered(deps.config.bulk_concurrency.max(1))
        .collect()
        .await;

    // Phase 3: match replies back to requests and settle storage.
    for (chunk, reply) in dispatched {
        match reply {
            Ok(value) => {
                let responses = parse_bulk_responses(&value);
                let mut used = vec![false; responses.len()];
                for (index, request) in &chunk {
                    let outcome = match match_response(request, &responses, &mut used) {
                        Some(i) if responses[i].action_result => Ok(&responses[i]),
                        Some(i) => {
                            Err(responses[i].to_error(&tenant, request.document_number()))
                        }
                        None => Err(ApprovalsError::Tenant {
                            code: None,
                            message: format!(
                                "tenant response did not include document {}",
                                request.document_number()
                            ),
                        }),
                    };
                    settle_and_record(
                        deps,
                        &tenant,
                        request,
                        approver,
                        device,
                        outcome,
                        &mut entries[*index],
                        &mut audits,
                    )
                    .await;
                }
            }
            Err(e) => {
                // Whole chunk failed at the transport level: every document
                // in it gets the same tenant failure.
                warn!(
                    tenant_name = %tenant.name,
                    chunk_size = chunk.len(),
                    error = %e,
                    "Bulk chunk dispatch failed"
                );
                for (index, request) in &chunk {
                    let err = ApprovalsError::Tenant {
                        code: None,
                        message: e.to_string(),
                    };
                    settle_and_record(
                        deps,
                        &tenant,
                        request,
                        approver,
                        device,
                        Err(err),
                        &mut entries[*index],
                        &mut audits,
                    )
                    .await;
                }
            }
        }
    }

    // Phase 4: batched audit write.
    let histories: Vec<TransactionHistory> = audits
        .iter()
        .map(|(audit, request_json)| history_from_audit(tenant.id, audit, request_json.clone()))
        .collect();
    if let Err(e) = deps.history_store.record_batch(&histories).await {
        error!(error = %e, "Failed to record bulk transaction history");
    }

    let succeeded = audits.iter().filter(|(audit, _)| audit.success).count();
    info!(
        tenant_name = %tenant.name,
        document_count = total,
        succeeded = succeeded,
        failed = total - succeeded,
        "Bulk document action complete"
    );

    let entries: Vec<serde_json::Value> = entries
        .into_iter()
        .map(|entry| {
            // Every slot is filled by phase 1 or phase 3; a hole would be a
            // bug, surface it as a failure entry rather than panicking.
            entry.unwrap_or_else(|| {
                json!({
                    "actionResult": false,
                    "errorInfo": {
                        "errorType": "internal",
                        "errorMessage": "no outcome recorded for this document",
                    },
                })
            })
        })
        .collect();

    json!({
        "approvalResponses": entries,
        "clientDevice": device,
        "documentCount": total,
    })
}

/// Settles one matched outcome into storage, its response slot and the
/// audit list.
#[allow(clippy::too_many_arguments)]
async fn settle_and_record(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    request: &ApprovalRequest,
    approver: &Alias,
    device: ClientDevice,
    outcome: Result<&ApprovalResponse, ApprovalsError>,
    entry: &mut Option<serde_json::Value>,
    audits: &mut Vec<(ActionAuditLogInfo, serde_json::Value)>,
) {
    match outcome {
        Ok(response) => {
            if let Err(e) = settle_success(deps, tenant, request, approver).await {
                // Storage settlement failed after the tenant accepted the
                // action; report the document failed so the client retries
                // against the (still present) row.
                error!(
                    document_number = %request.document_number(),
                    error = %e,
                    "Failed to settle successful bulk entry"
                );
                settle_failure(deps, tenant, request, approver, &e).await;
                *entry = Some(document_entry(request, Err(&e)));
                audits.push(audit_for(request, approver, device, Err(&e)));
                return;
            }
            *entry = Some(document_entry(request, Ok(response)));
            audits.push(audit_for(request, approver, device, Ok(())));
        }
        Err(e) => {
            settle_failure(deps, tenant, request, approver, &e).await;
            *entry = Some(document_entry(request, Err(&e)));
            audits.push(audit_for(request, approver, device, Err(&e)));
        }
    }
}

/// Extracts per-document responses from whatever shape the tenant returned:
/// an `approvalResponses` array, a bare array, or a single object.
fn parse_bulk_responses(value: &serde_json::Value) -> Vec<ApprovalResponse> {
    let items: Vec<&serde_json::Value> = match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        serde_json::Value::Object(obj) => match obj.get("approvalResponses") {
            Some(serde_json::Value::Array(items)) => items.iter().collect(),
            _ => vec![value],
        },
        _ => Vec::new(),
    };
    items.iter().map(|v| ApprovalResponse::from_tenant_json(v)).collect()
}

/// Matches a reply entry back to the request it answers and marks it used,
/// so one entry never answers two requests.
///
/// Precedence: document keys, then the telemetry echo, then a token-bounded
/// mention in the failure text as the last resort (some tenants only name
/// the document inside the error message).
fn match_response(
    request: &ApprovalRequest,
    responses: &[ApprovalResponse],
    used: &mut [bool],
) -> Option<usize> {
    let document_number = request.document_number();

    let matched = responses
        .iter()
        .enumerate()
        .position(|(i, r)| {
            !used[i]
                && r.approval_identifier
                    .as_ref()
                    .map(|id| id.document_number.as_str() == document_number)
                    .unwrap_or(false)
        })
        .or_else(|| {
            responses.iter().enumerate().position(|(i, r)| {
                !used[i]
                    && r.telemetry.get("documentNumber").and_then(|v| v.as_str())
                        == Some(document_number)
            })
        })
        .or_else(|| {
            responses.iter().enumerate().position(|(i, r)| {
                !used[i]
                    && r.error_info
                        .as_ref()
                        .map(|e| {
                            e.error_messages
                                .iter()
                                .any(|m| names_document(m, document_number))
                        })
                        .unwrap_or(false)
            })
        });

    if let Some(i) = matched {
        used[i] = true;
    }
    matched
}

/// Whether a message names the document as a whole token. A bare substring
/// test would let "INV-10 is locked" claim the request for INV-1.
fn names_document(message: &str, document_number: &str) -> bool {
    if document_number.is_empty() {
        return false;
    }
    let is_boundary = |c: Option<char>| {
        c.map_or(true, |c| {
            !c.is_ascii_alphanumeric() && c != '-' && c != '_'
        })
    };

    let mut start = 0;
    while let Some(offset) = message[start..].find(document_number) {
        let begin = start + offset;
        let end = begin + document_number.len();
        if is_boundary(message[..begin].chars().next_back())
            && is_boundary(message[end..].chars().next())
        {
            return true;
        }
        start = end;
    }
    false
}

/// One response entry for one input document.
fn document_entry(
    request: &ApprovalRequest,
    outcome: Result<&ApprovalResponse, &ApprovalsError>,
) -> serde_json::Value {
    let mut entry = json!({
        "documentNumber": request.approval_identifier.display_number(),
        "action": request.action,
        "actionResult": outcome.is_ok(),
    });
    match outcome {
        Ok(response) => {
            if let Some(message) = &response.display_message {
                entry["displayMessage"] = json!(message);
            }
        }
        Err(e) => {
            entry["errorInfo"] = e.to_client_json();
            entry["requiresRefresh"] = json!(e.requires_refresh());
        }
    }
    entry
}

fn audit_for(
    request: &ApprovalRequest,
    approver: &Alias,
    device: ClientDevice,
    outcome: Result<(), &ApprovalsError>,
) -> (ActionAuditLogInfo, serde_json::Value) {
    let audit = ActionAuditLogInfo {
        approval_identifier: request.approval_identifier.clone(),
        action: request.action.clone(),
        approver: approver.clone(),
        client_device: device,
        success: outcome.is_ok(),
        failure_reason: outcome.err().map(|e| e.to_string()),
        timestamp: chrono::Utc::now(),
    };
    let snapshot = serde_json::to_value(request).unwrap_or(serde_json::Value::Null);
    (audit, snapshot)
}

fn history_from_audit(
    tenant_id: TenantId,
    audit: &ActionAuditLogInfo,
    request_json: serde_json::Value,
) -> TransactionHistory {
    TransactionHistory::new(
        tenant_id,
        audit.approval_identifier.document_number.clone(),
        audit.approver.clone(),
        audit.action.clone(),
        audit.client_device,
        audit.success,
        audit.failure_reason.clone(),
        request_json,
    )
}

/// Envelope for failures that prevent any document from being processed.
fn batch_error_envelope(error: &ApprovalsError) -> serde_json::Value {
    json!({
        "approvalResponses": [],
        "errorInfo": error.to_client_json(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::summary::models::ApprovalIdentifier;

    fn request(doc: &str) -> ApprovalRequest {
        ApprovalRequest::from_payload(
            TenantId::new(),
            &json!({
                "approvalIdentifier": { "documentNumber": doc },
                "action": "Approve",
            }),
        )
        .unwrap()
    }

    fn response_with_identifier(doc: &str, ok: bool) -> ApprovalResponse {
        let mut response = ApprovalResponse::success(ApprovalIdentifier::new(doc));
        response.action_result = ok;
        response
    }

    #[test]
    fn matches_by_document_keys_first() {
        let responses = vec![
            response_with_identifier("INV-2", true),
            response_with_identifier("INV-1", false),
        ];
        let mut used = vec![false; responses.len()];
        let matched = match_response(&request("INV-1"), &responses, &mut used).unwrap();
        assert!(!responses[matched].action_result);
    }

    #[test]
    fn falls_back_to_telemetry_echo() {
        let mut response = ApprovalResponse::from_tenant_json(&json!({
            "actionResult": true,
            "telemetry": { "documentNumber": "INV-3" },
        }));
        response.approval_identifier = None;
        let responses = vec![response];
        let mut used = vec![false; responses.len()];
        assert!(match_response(&request("INV-4"), &responses, &mut used).is_none());
        assert!(match_response(&request("INV-3"), &responses, &mut used).is_some());
    }

    #[test]
    fn falls_back_to_error_message_mention() {
        let response = ApprovalResponse::from_tenant_json(&json!({
            "actionResult": false,
            "errorInfo": { "errorMessages": ["Document INV-9 is locked by another workflow"] },
        }));
        let responses = vec![response];
        let mut used = vec![false; responses.len()];
        assert!(match_response(&request("INV-10"), &responses, &mut used).is_none());
        assert!(match_response(&request("INV-9"), &responses, &mut used).is_some());
    }

    #[test]
    fn error_message_match_requires_a_whole_token() {
        let response = ApprovalResponse::from_tenant_json(&json!({
            "actionResult": false,
            "errorInfo": { "errorMessages": ["Document INV-10 is locked by another workflow"] },
        }));
        let responses = vec![response];
        let mut used = vec![false; responses.len()];
        // INV-1 is a prefix of INV-10 but not a mention of it.
        assert!(match_response(&request("INV-1"), &responses, &mut used).is_none());
        assert!(match_response(&request("INV-10"), &responses, &mut used).is_some());
    }

    #[test]
    fn a_response_entry_answers_at_most_one_request() {
        let responses = vec![response_with_identifier("INV-1", true)];
        let mut used = vec![false; responses.len()];
        assert!(match_response(&request("INV-1"), &responses, &mut used).is_some());
        assert!(match_response(&request("INV-1"), &responses, &mut used).is_none());
    }

    #[test]
    fn parses_wrapped_and_bare_response_arrays() {
        let wrapped = json!({ "approvalResponses": [ { "documentNumber": "A" } ] });
        let bare = json!([ { "documentNumber": "A" }, { "documentNumber": "B" } ]);
        let single = json!({ "documentNumber": "A", "actionResult": false, "errorMessage": "no" });

        assert_eq!(parse_bulk_responses(&wrapped).len(), 1);
        assert_eq!(parse_bulk_responses(&bare).len(), 2);
        let single_parsed = parse_bulk_responses(&single);
        assert_eq!(single_parsed.len(), 1);
        assert!(!single_parsed[0].action_result);
    }
}
