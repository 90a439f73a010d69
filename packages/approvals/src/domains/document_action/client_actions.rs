//! Per-device client action shaping.
//!
//! Turns a tenant's configured action definitions into the action objects a
//! client renders: device visibility filtering, per-user flight checks and
//! the input metadata (comments, justifications, navigation target).

use anyhow::Result;
use serde::Serialize;

use crate::common::{Alias, ClientDevice};
use crate::domains::tenant::models::TenantInfo;
use crate::kernel::ApprovalsDeps;

/// One action as rendered by a client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAction {
    pub name: String,
    pub display_text: String,
    pub comment_mandatory: bool,
    pub comment_max_length: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub justifications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_page: Option<String>,
}

/// Actions available to one approver on one device.
///
/// Configuration order is preserved; clients render actions in the order the
/// tenant configured them.
pub async fn client_actions(
    deps: &ApprovalsDeps,
    tenant: &TenantInfo,
    device: ClientDevice,
    approver: &Alias,
) -> Result<Vec<ClientAction>> {
    let mut actions = Vec::new();
    for definition in &tenant.actions {
        if !definition.is_enabled || !definition.supports_device(device) {
            continue;
        }
        if let Some(flight) = &definition.flight_name {
            if !deps.flighting.is_enabled(flight, approver).await? {
                continue;
            }
        }
        actions.push(ClientAction {
            name: definition.name.clone(),
            display_text: definition.display_text.clone(),
            comment_mandatory: definition.comment_mandatory,
            comment_max_length: definition.comment_max_length,
            justifications: definition.justifications.clone(),
            target_page: definition.target_page.clone(),
        });
    }
    Ok(actions)
}
