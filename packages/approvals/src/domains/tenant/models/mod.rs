//! Tenant configuration entities.
//!
//! A tenant is a line-of-business system whose approval documents are routed
//! through this service. Everything tenant-specific (endpoints, supported
//! actions, message templates, payload shaping rules) lives here as plain
//! configuration data served by the tenant store.

use crate::common::{ClientDevice, TenantId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a tenant's pending approvals reach this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TenantClass {
    /// The tenant pushes approval requests; summary rows are persisted here.
    Push,
    /// Summaries, details and actions go straight to the LOB system.
    Pull,
}

/// One action a tenant supports (approve, reject, needs-more-info, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    /// Canonical action name sent to the tenant (e.g. "Approve").
    pub name: String,
    /// Button/menu text shown to the user.
    pub display_text: String,
    pub comment_mandatory: bool,
    pub comment_max_length: Option<usize>,
    /// Preset justification choices, empty when free-text only.
    #[serde(default)]
    pub justifications: Vec<String>,
    /// Client page to navigate to after the action, if any.
    pub target_page: Option<String>,
    /// Devices the action is visible on. `None` means all devices.
    pub devices: Option<Vec<ClientDevice>>,
    /// Flight gating this action, checked per user at render time.
    pub flight_name: Option<String>,
    pub is_enabled: bool,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_text: display_text.into(),
            comment_mandatory: false,
            comment_max_length: None,
            justifications: Vec::new(),
            target_page: None,
            devices: None,
            flight_name: None,
            is_enabled: true,
        }
    }

    /// Whether the action is visible on the given device.
    pub fn supports_device(&self, device: ClientDevice) -> bool {
        match &self.devices {
            None => true,
            Some(devices) => devices.contains(&device),
        }
    }
}

/// Per-tenant configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    pub id: TenantId,
    pub name: String,
    pub class: TenantClass,

    /// Endpoint template for single-document actions.
    /// Placeholders: `{documentNumber}`, `{action}`.
    pub action_endpoint: String,
    /// Endpoint for batched actions; absent when the tenant only takes
    /// single-document calls.
    pub bulk_action_endpoint: Option<String>,
    /// Endpoint template for details sections.
    /// Placeholders: `{documentNumber}`, `{operation}`.
    pub details_endpoint: String,
    /// Pending-approvals endpoint for pull tenants.
    /// Placeholder: `{alias}`.
    pub summary_endpoint: Option<String>,
    /// Attachment download endpoint template.
    /// Placeholders: `{documentNumber}`, `{attachmentId}`.
    pub attachment_endpoint: Option<String>,

    /// Maximum documents per bulk call to the tenant.
    pub bulk_batch_size: usize,
    /// Tenants that require a fresh LOB call for details on every read.
    pub details_from_lob: bool,

    pub actions: Vec<ActionDefinition>,

    /// Stale-version message template.
    /// Placeholders: `#DocumentNumber#`, `#TenantName#`.
    pub stale_request_message: String,
    pub actionable_email_enabled: bool,
    /// Base template key; the action outcome is appended
    /// (e.g. "contoso-invoice" + "|approve").
    pub notification_template_key: String,
    /// Details sections dropped from mobile payloads.
    #[serde(default)]
    pub mobile_trimmed_sections: Vec<String>,

    /// Pull tenants: external summary field -> SummaryJson field.
    #[serde(default)]
    pub pull_field_mapping: HashMap<String, String>,
    /// Pull tenants: named details operation -> endpoint path template.
    #[serde(default)]
    pub pull_operations: HashMap<String, String>,
}

impl TenantInfo {
    /// A push-class tenant with sane defaults; fields are public, tests and
    /// fixtures tweak them directly.
    pub fn new(id: TenantId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            name: name.clone(),
            class: TenantClass::Push,
            action_endpoint: String::new(),
            bulk_action_endpoint: None,
            details_endpoint: String::new(),
            summary_endpoint: None,
            attachment_endpoint: None,
            bulk_batch_size: 25,
            details_from_lob: false,
            actions: vec![
                ActionDefinition::new("Approve", "Approve"),
                ActionDefinition::new("Reject", "Reject"),
            ],
            stale_request_message:
                "Document #DocumentNumber# has changed in #TenantName#. Refresh and try again."
                    .to_string(),
            actionable_email_enabled: false,
            notification_template_key: name.to_ascii_lowercase().replace(' ', "-"),
            mobile_trimmed_sections: Vec::new(),
            pull_field_mapping: HashMap::new(),
            pull_operations: HashMap::new(),
        }
    }

    pub fn is_pull(&self) -> bool {
        self.class == TenantClass::Pull
    }

    /// Looks up an action definition by name, case-insensitively.
    pub fn find_action(&self, name: &str) -> Option<&ActionDefinition> {
        self.actions
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Expands the tenant's stale-request message for one document.
    pub fn stale_message(&self, document_number: &str) -> String {
        self.stale_request_message
            .replace("#DocumentNumber#", document_number)
            .replace("#TenantName#", &self.name)
    }

    /// Template key for a notification about the given action outcome.
    pub fn notification_key(&self, action: &str) -> String {
        format!(
            "{}|{}",
            self.notification_template_key,
            action.to_ascii_lowercase()
        )
    }
}
