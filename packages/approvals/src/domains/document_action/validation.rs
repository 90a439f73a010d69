//! Payload validation for incoming action requests.
//!
//! Validation runs before anything touches the tenant: an invalid payload
//! must never cause a LOB call or a storage write. The checks are ordered so
//! the most actionable error wins (unknown action before staleness, staleness
//! before comment rules).

use crate::common::{Alias, ApprovalsError};
use crate::domains::summary::models::ApprovalSummaryRow;
use crate::domains::tenant::models::TenantInfo;

use super::models::ApprovalRequest;

/// Validates one request against the tenant configuration and the approver's
/// summary row.
pub fn validate_request(
    request: &ApprovalRequest,
    tenant: &TenantInfo,
    row: &ApprovalSummaryRow,
    approver: &Alias,
) -> Result<(), ApprovalsError> {
    let document_number = request.document_number();

    if document_number.is_empty() {
        return Err(ApprovalsError::Validation(
            "document number is required".to_string(),
        ));
    }

    let action = tenant.find_action(&request.action).ok_or_else(|| {
        ApprovalsError::Validation(format!(
            "action '{}' is not supported by tenant {}",
            request.action, tenant.name
        ))
    })?;
    if !action.is_enabled {
        return Err(ApprovalsError::Validation(format!(
            "action '{}' is currently disabled for tenant {}",
            request.action, tenant.name
        )));
    }

    if row.document_number.as_str() != document_number {
        return Err(ApprovalsError::Validation(format!(
            "payload document {} does not match the pending approval {}",
            document_number, row.document_number
        )));
    }

    // Row ownership is the current-approver convention: whoever holds the
    // summary row is the one allowed to act.
    if &row.approver != approver {
        return Err(ApprovalsError::Unauthorized(format!(
            "{} is not the current approver for document {}",
            approver, document_number
        )));
    }

    if row.pending_action {
        return Err(ApprovalsError::ActionInFlight(document_number.to_string()));
    }

    match request.request_version.as_deref() {
        Some(version) if version == row.request_version => {}
        _ => {
            return Err(ApprovalsError::StaleRequest {
                message: tenant.stale_message(document_number),
            });
        }
    }

    let comment = request
        .action_details
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    if action.comment_mandatory && comment.is_none() {
        return Err(ApprovalsError::Validation(format!(
            "a comment is required for action '{}'",
            action.name
        )));
    }
    if let (Some(max), Some(comment)) = (action.comment_max_length, comment) {
        if comment.len() > max {
            return Err(ApprovalsError::Validation(format!(
                "comment exceeds the maximum length of {} characters",
                max
            )));
        }
    }

    Ok(())
}
