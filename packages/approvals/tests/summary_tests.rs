//! Integration tests for summary rendering.

mod common;

use crate::common::{pending_row, push_tenant, APPROVER};
use approvals_core::common::{Alias, ClientDevice, TenantId};
use approvals_core::domains::summary::get_summary;
use approvals_core::domains::tenant::models::{TenantClass, TenantInfo};
use approvals_core::kernel::test_dependencies::{
    MockSummaryStore, MockTenantAdapter, MockTenantStore, TestDependencies,
};
use serde_json::json;

#[tokio::test]
async fn locked_rows_are_omitted_and_failures_surface() {
    common::init_tracing();
    // Arrange: one clean row, one soft-locked, one with a failed last attempt
    let tenant = push_tenant();
    let clean = pending_row(&tenant, APPROVER, "INV-1");
    let mut locked = pending_row(&tenant, APPROVER, "INV-2");
    locked.pending_action = true;
    let mut failed = pending_row(&tenant, APPROVER, "INV-3");
    failed.last_failed = true;
    failed.last_failed_message = Some("posting period closed".to_string());

    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(
            MockSummaryStore::new()
                .with_row(clean)
                .with_row(locked)
                .with_row(failed),
        );
    let deps = test_deps.deps();

    // Act
    let envelope = get_summary(&deps, &Alias::new(APPROVER), ClientDevice::Web, None)
        .await
        .unwrap();

    // Assert: INV-2 is not offered, INV-3 carries the banner
    let entries = envelope["approvalSummaries"].as_array().unwrap();
    let mut docs: Vec<&str> = entries
        .iter()
        .map(|e| e["documentNumber"].as_str().unwrap())
        .collect();
    docs.sort_unstable();
    assert_eq!(docs, vec!["INV-1", "INV-3"]);

    let failed_entry = entries.iter().find(|e| e["documentNumber"] == "INV-3").unwrap();
    assert_eq!(failed_entry["lastFailed"], json!(true));
    assert_eq!(
        failed_entry["lastFailedMessage"],
        json!("posting period closed")
    );
    let clean_entry = entries.iter().find(|e| e["documentNumber"] == "INV-1").unwrap();
    assert!(clean_entry.get("lastFailed").is_none());
}

#[tokio::test]
async fn entries_carry_client_actions_and_version() {
    common::init_tracing();
    let tenant = push_tenant();
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(MockSummaryStore::new().with_row(pending_row(&tenant, APPROVER, "INV-1")));
    let deps = test_deps.deps();

    let envelope = get_summary(&deps, &Alias::new(APPROVER), ClientDevice::Web, None)
        .await
        .unwrap();

    let entry = &envelope["approvalSummaries"][0];
    assert_eq!(entry["requestVersion"], json!("v1"));
    let actions: Vec<&str> = entry["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["Approve", "Reject"]);
}

#[tokio::test]
async fn display_document_number_wins_when_present() {
    common::init_tracing();
    let tenant = push_tenant();
    let mut row = pending_row(&tenant, APPROVER, "1000000042");
    row.summary_json.approval_identifier.display_document_number = Some("INV-42".into());
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(MockSummaryStore::new().with_row(row));
    let deps = test_deps.deps();

    let envelope = get_summary(&deps, &Alias::new(APPROVER), ClientDevice::Web, None)
        .await
        .unwrap();

    assert_eq!(
        envelope["approvalSummaries"][0]["documentNumber"],
        json!("INV-42")
    );
}

#[tokio::test]
async fn mobile_drops_additional_data() {
    common::init_tracing();
    let tenant = push_tenant();
    let mut row = pending_row(&tenant, APPROVER, "INV-1");
    row.summary_json
        .additional_data
        .insert("costCenter".to_string(), json!("CC-100"));
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(MockSummaryStore::new().with_row(row));
    let deps = test_deps.deps();
    let approver = Alias::new(APPROVER);

    let web = get_summary(&deps, &approver, ClientDevice::Web, None).await.unwrap();
    assert_eq!(
        web["approvalSummaries"][0]["summary"]["additionalData"]["costCenter"],
        json!("CC-100")
    );

    let mobile = get_summary(&deps, &approver, ClientDevice::Mobile, None)
        .await
        .unwrap();
    let additional = mobile["approvalSummaries"][0]["summary"]["additionalData"]
        .as_object()
        .unwrap();
    assert!(additional.is_empty());
}

#[tokio::test]
async fn tenant_filter_narrows_the_list() {
    common::init_tracing();
    let tenant_a = push_tenant();
    let mut tenant_b = TenantInfo::new(TenantId::new(), "Contoso Expenses");
    tenant_b.bulk_batch_size = 10;
    let test_deps = TestDependencies::new()
        .mock_tenant_store(
            MockTenantStore::new()
                .with_tenant(tenant_a.clone())
                .with_tenant(tenant_b.clone()),
        )
        .mock_summary_store(
            MockSummaryStore::new()
                .with_row(pending_row(&tenant_a, APPROVER, "INV-1"))
                .with_row(pending_row(&tenant_b, APPROVER, "EXP-1")),
        );
    let deps = test_deps.deps();

    let envelope = get_summary(
        &deps,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        Some(tenant_b.id),
    )
    .await
    .unwrap();

    let entries = envelope["approvalSummaries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["documentNumber"], json!("EXP-1"));
}

#[tokio::test]
async fn pull_tenant_queue_is_fetched_live() {
    common::init_tracing();
    // Arrange: a pull tenant whose external fields map into the summary shape
    let mut tenant = TenantInfo::new(TenantId::new(), "Contoso Expenses");
    tenant.class = TenantClass::Pull;
    tenant
        .pull_field_mapping
        .insert("ReportId".to_string(), "documentNumber".to_string());
    tenant
        .pull_field_mapping
        .insert("ReportName".to_string(), "title".to_string());
    tenant
        .pull_field_mapping
        .insert("SubmittedBy".to_string(), "submitterAlias".to_string());

    let pending = json!([
        { "ReportId": "EXP-7", "ReportName": "Travel", "SubmittedBy": "slee" },
    ]);
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_tenant_adapter(MockTenantAdapter::new().with_pending_response(pending));
    let deps = test_deps.deps();

    // Act
    let envelope = get_summary(&deps, &Alias::new(APPROVER), ClientDevice::Web, None)
        .await
        .unwrap();

    // Assert
    let entries = envelope["approvalSummaries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["documentNumber"], json!("EXP-7"));
    assert_eq!(entries[0]["summary"]["title"], json!("Travel"));
    assert_eq!(entries[0]["tenantName"], json!("Contoso Expenses"));
}

#[tokio::test]
async fn pull_tenant_outage_does_not_empty_the_list() {
    common::init_tracing();
    let push = push_tenant();
    let mut pull = TenantInfo::new(TenantId::new(), "Contoso Expenses");
    pull.class = TenantClass::Pull;

    let test_deps = TestDependencies::new()
        .mock_tenant_store(
            MockTenantStore::new()
                .with_tenant(push.clone())
                .with_tenant(pull),
        )
        .mock_summary_store(MockSummaryStore::new().with_row(pending_row(&push, APPROVER, "INV-1")))
        .mock_tenant_adapter(MockTenantAdapter::new().with_transport_failure());
    let deps = test_deps.deps();

    let envelope = get_summary(&deps, &Alias::new(APPROVER), ClientDevice::Web, None)
        .await
        .unwrap();

    let entries = envelope["approvalSummaries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["documentNumber"], json!("INV-1"));
}
