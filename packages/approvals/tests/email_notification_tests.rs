//! Integration tests for action notification emails.
//!
//! Delivery is best-effort by contract: a failing provider must never fail
//! the approval, and the retry loop runs exactly the configured count.

mod common;

use crate::common::{approve_payload, pending_row, push_tenant, APPROVER, SUBMITTER};
use approvals_core::common::{Alias, ClientDevice, DocumentNumber};
use approvals_core::domains::document_action::take_action;
use approvals_core::kernel::test_dependencies::{
    MockFlightingService, MockNameResolver, MockNotificationSender, MockSummaryStore,
    MockTemplateStore, MockTenantStore, TestDependencies,
};
use approvals_core::kernel::ApprovalsConfig;
use serde_json::json;

fn deps_with_template(
    tenant: &approvals_core::domains::tenant::models::TenantInfo,
    sender: MockNotificationSender,
) -> TestDependencies {
    TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(MockSummaryStore::new().with_row(pending_row(tenant, APPROVER, "INV-100")))
        .mock_template_store(MockTemplateStore::new().with_template(
            tenant.id,
            &tenant.notification_key("Approve"),
            "<p>#ApproverName# took action #Action# on #DocumentNumber# (#Title#)</p>",
        ))
        .mock_notification_sender(sender)
        .mock_name_resolver(MockNameResolver::new().with_name(APPROVER, "Jane Doe"))
}

#[tokio::test]
async fn placeholders_render_from_summary_and_action_context() {
    common::init_tracing();
    let tenant = push_tenant();
    let test_deps = deps_with_template(&tenant, MockNotificationSender::new());
    let deps = test_deps.deps();

    take_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &approve_payload("INV-100"),
    )
    .await;

    let emails = test_deps.notification_sender.sent_emails();
    assert_eq!(emails.len(), 1);
    let email = &emails[0];
    assert_eq!(
        email.body_html,
        "<p>Jane Doe took action Approve on INV-100 (Invoice INV-100)</p>"
    );
    assert_eq!(email.subject, "Contoso Invoices: Approve INV-100");
    assert_eq!(email.to, vec![SUBMITTER.to_string()]);
    assert!(email.adaptive_card.is_none());
}

#[tokio::test]
async fn transient_delivery_failures_are_retried() {
    common::init_tracing();
    let tenant = push_tenant();
    // Default retry count is 3; two failures still end in a delivery.
    let test_deps = deps_with_template(&tenant, MockNotificationSender::new().with_failures(2));
    let deps = test_deps.deps();

    let envelope = take_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &approve_payload("INV-100"),
    )
    .await;

    assert_eq!(envelope["actionResult"], json!(true));
    assert_eq!(test_deps.notification_sender.attempt_count(), 3);
    assert_eq!(test_deps.notification_sender.sent_emails().len(), 1);
}

#[tokio::test]
async fn exhausted_retries_never_fail_the_action() {
    common::init_tracing();
    let tenant = push_tenant();
    let config = ApprovalsConfig {
        email_retry_count: 2,
        ..ApprovalsConfig::default()
    };
    let test_deps = deps_with_template(&tenant, MockNotificationSender::new().with_failures(5))
        .with_config(config);
    let deps = test_deps.deps();
    let approver = Alias::new(APPROVER);

    let envelope = take_action(
        &deps,
        tenant.id,
        &approver,
        ClientDevice::Web,
        &approve_payload("INV-100"),
    )
    .await;

    // The approval still succeeded and settled
    assert_eq!(envelope["actionResult"], json!(true));
    assert!(test_deps.summary_store.was_removed(
        &approver,
        tenant.id,
        &DocumentNumber::new("INV-100")
    ));

    // Exactly the configured attempts, no delivery
    assert_eq!(test_deps.notification_sender.attempt_count(), 2);
    assert!(test_deps.notification_sender.sent_emails().is_empty());
}

#[tokio::test]
async fn missing_template_skips_the_email() {
    common::init_tracing();
    let tenant = push_tenant();
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(MockSummaryStore::new().with_row(pending_row(&tenant, APPROVER, "INV-100")));
    let deps = test_deps.deps();

    let envelope = take_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &approve_payload("INV-100"),
    )
    .await;

    assert_eq!(envelope["actionResult"], json!(true));
    assert_eq!(test_deps.notification_sender.attempt_count(), 0);
}

#[tokio::test]
async fn actionable_card_requires_tenant_flag_and_flight() {
    common::init_tracing();
    let mut tenant = push_tenant();
    tenant.actionable_email_enabled = true;

    // Flight dark: plain email
    let dark = deps_with_template(&tenant, MockNotificationSender::new());
    take_action(
        &dark.deps(),
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &approve_payload("INV-100"),
    )
    .await;
    assert!(dark.notification_sender.sent_emails()[0].adaptive_card.is_none());

    // Flight lit: the card rides along
    let lit = deps_with_template(&tenant, MockNotificationSender::new())
        .mock_flighting(MockFlightingService::new().with_enabled("actionable-email"));
    take_action(
        &lit.deps(),
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &approve_payload("INV-100"),
    )
    .await;
    let card = lit.notification_sender.sent_emails()[0]
        .adaptive_card
        .clone()
        .expect("adaptive card expected");
    assert_eq!(card["type"], json!("AdaptiveCard"));
}
