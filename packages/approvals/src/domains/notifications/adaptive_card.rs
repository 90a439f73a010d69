//! Adaptive-card JSON for actionable email.
//!
//! Actionable mail clients render the card inline and post the chosen action
//! back through the upstream controllers; the card payload itself only
//! carries enough data to rebuild an action request.

use serde_json::json;

use crate::domains::summary::models::SummaryJson;
use crate::domains::tenant::models::TenantInfo;

/// Card shown for a pending approval, with one submit action per enabled
/// tenant action.
pub fn approval_card(tenant: &TenantInfo, summary: &SummaryJson) -> serde_json::Value {
    let identifier = &summary.approval_identifier;

    let facts = [
        Some(("Document", identifier.display_number().as_str().to_string())),
        Some(("Submitter", summary
            .submitter
            .name
            .clone()
            .unwrap_or_else(|| summary.submitter.alias.to_string()))),
        summary.unit_value.as_ref().map(|v| {
            let uom = summary.unit_of_measure.as_deref().unwrap_or("");
            ("Amount", format!("{} {}", v, uom).trim().to_string())
        }),
    ];

    let actions: Vec<serde_json::Value> = tenant
        .actions
        .iter()
        .filter(|a| a.is_enabled)
        .map(|a| {
            json!({
                "type": "Action.Submit",
                "title": a.display_text,
                "data": {
                    "action": a.name,
                    "tenantId": tenant.id,
                    "documentNumber": identifier.document_number,
                    "commentMandatory": a.comment_mandatory,
                }
            })
        })
        .collect();

    json!({
        "type": "AdaptiveCard",
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "version": "1.2",
        "body": [
            {
                "type": "TextBlock",
                "size": "Medium",
                "weight": "Bolder",
                "text": summary.title,
            },
            {
                "type": "FactSet",
                "facts": facts
                    .iter()
                    .flatten()
                    .map(|(title, value)| json!({ "title": title, "value": value }))
                    .collect::<Vec<_>>(),
            }
        ],
        "actions": actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Alias, TenantId};
    use crate::domains::summary::models::{ApprovalIdentifier, Submitter};

    #[test]
    fn card_carries_one_action_per_enabled_tenant_action() {
        let mut tenant = TenantInfo::new(TenantId::new(), "Contoso Invoices");
        tenant.actions[1].is_enabled = false; // disable Reject

        let summary = SummaryJson::new(
            ApprovalIdentifier::new("INV-1"),
            "Laptop purchase",
            Submitter {
                alias: Alias::new("slee"),
                name: Some("Sam Lee".to_string()),
            },
        );

        let card = approval_card(&tenant, &summary);
        assert_eq!(card["type"], "AdaptiveCard");
        let actions = card["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0]["data"]["action"], "Approve");
        assert_eq!(actions[0]["data"]["documentNumber"], "INV-1");
    }
}
