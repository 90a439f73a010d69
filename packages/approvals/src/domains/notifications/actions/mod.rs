//! Notification orchestration.
//!
//! Entry-point: `send_action_notification`, called by the action pipelines
//! after an action completes. Notification delivery is best-effort by
//! contract: a lost email must never change the outcome of an approval, so
//! this module logs failures instead of returning them.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::common::Alias;
use crate::domains::document_action::models::ApprovalRequest;
use crate::domains::notifications::adaptive_card;
use crate::domains::notifications::models::EmailMessage;
use crate::domains::notifications::templates::{flatten_json, render_template};
use crate::domains::summary::models::SummaryJson;
use crate::domains::tenant::models::TenantInfo;
use crate::kernel::ApprovalsDeps;

/// Renders and sends the "action taken" email for one document.
///
/// Recipients are aliases; the delivery provider owns address resolution.
/// Returns `true` when the email was handed to the provider.
pub async fn send_action_notification(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    summary: &SummaryJson,
    request: &ApprovalRequest,
    approver: &Alias,
) -> bool {
    let key = tenant.notification_key(&request.action);
    let template = match deps.template_store.template(tenant.id, &key).await {
        Ok(Some(template)) => template,
        Ok(None) => {
            debug!(
                tenant_name = %tenant.name,
                template_key = %key,
                "No notification template configured, skipping email"
            );
            return false;
        }
        Err(e) => {
            error!(template_key = %key, error = %e, "Template store lookup failed");
            return false;
        }
    };

    let email = match render_email(deps, tenant, summary, request, approver, &template).await {
        Ok(email) => email,
        Err(e) => {
            error!(
                document_number = %request.document_number(),
                error = %e,
                "Failed to render notification email"
            );
            return false;
        }
    };

    // Fixed-count retry; delivery hiccups are common enough that one attempt
    // is not acceptable, and anything beyond a few is the provider's problem.
    let attempts = deps.config.email_retry_count.max(1);
    for attempt in 1..=attempts {
        match deps.notification_sender.send_email(&email).await {
            Ok(()) => {
                info!(
                    document_number = %request.document_number(),
                    template_key = %key,
                    actionable = email.is_actionable(),
                    "Notification email sent"
                );
                return true;
            }
            Err(e) => {
                warn!(
                    document_number = %request.document_number(),
                    attempt = attempt,
                    error = %e,
                    "Notification email send failed"
                );
            }
        }
    }

    error!(
        document_number = %request.document_number(),
        attempts = attempts,
        "Giving up on notification email"
    );
    false
}

async fn render_email(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    summary: &SummaryJson,
    request: &ApprovalRequest,
    approver: &Alias,
    template: &str,
) -> anyhow::Result<EmailMessage> {
    let mut values = HashMap::new();
    flatten_json(&serde_json::to_value(summary)?, &mut values);

    let approver_name = deps
        .name_resolver
        .display_name(approver)
        .await?
        .unwrap_or_else(|| approver.to_string());

    let display_number = summary.approval_identifier.display_number();
    values.insert("Action".to_string(), request.action.clone());
    values.insert("ApproverName".to_string(), approver_name);
    values.insert(
        "Comment".to_string(),
        request.action_details.comment.clone().unwrap_or_default(),
    );
    values.insert("DocumentNumber".to_string(), display_number.to_string());
    values.insert("TenantName".to_string(), tenant.name.clone());

    let body = render_template(template, &values);
    let subject = format!("{}: {} {}", tenant.name, request.action, display_number);

    let mut email = EmailMessage::new(vec![summary.submitter.alias.to_string()], subject, body);

    if tenant.actionable_email_enabled
        && deps
            .flighting
            .is_enabled(&deps.config.actionable_email_flight, approver)
            .await?
    {
        email.adaptive_card = Some(adaptive_card::approval_card(tenant, summary));
    }

    Ok(email)
}
