//! Integration tests for the bulk action pipeline.
//!
//! The load-bearing invariant: the response carries exactly one entry per
//! input document, in input order, regardless of validation failures,
//! tenant reply shape or transport errors.

mod common;

use crate::common::{bulk_approve_payload, pending_row, push_tenant, APPROVER};
use approvals_core::common::{Alias, ClientDevice, DocumentNumber};
use approvals_core::domains::document_action::take_bulk_action;
use approvals_core::kernel::test_dependencies::{
    MockSummaryStore, MockTenantAdapter, MockTenantStore, TestDependencies,
};
use serde_json::json;

fn entry_docs(envelope: &serde_json::Value) -> Vec<String> {
    envelope["approvalResponses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["documentNumber"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Shape Invariants
// =============================================================================

#[tokio::test]
async fn one_entry_per_document_in_input_order() {
    common::init_tracing();
    let tenant = push_tenant();
    let mut store = MockSummaryStore::new();
    for doc in ["INV-1", "INV-2", "INV-3"] {
        store = store.with_row(pending_row(&tenant, APPROVER, doc));
    }
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(store);
    let deps = test_deps.deps();

    let envelope = take_bulk_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &bulk_approve_payload(&["INV-1", "INV-2", "INV-3"]),
    )
    .await;

    assert_eq!(entry_docs(&envelope), vec!["INV-1", "INV-2", "INV-3"]);
    assert!(envelope["approvalResponses"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["actionResult"] == json!(true)));
    assert_eq!(envelope["documentCount"], json!(3));
}

#[tokio::test]
async fn validation_failures_keep_their_slot() {
    common::init_tracing();
    let tenant = push_tenant();
    // No row for INV-2: it fails validation, the others dispatch.
    let store = MockSummaryStore::new()
        .with_row(pending_row(&tenant, APPROVER, "INV-1"))
        .with_row(pending_row(&tenant, APPROVER, "INV-3"));
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(store);
    let deps = test_deps.deps();

    let envelope = take_bulk_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &bulk_approve_payload(&["INV-1", "INV-2", "INV-3"]),
    )
    .await;

    let entries = envelope["approvalResponses"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["actionResult"], json!(true));
    assert_eq!(entries[1]["actionResult"], json!(false));
    assert_eq!(entries[1]["errorInfo"]["errorType"], json!("unauthorized"));
    assert_eq!(entries[2]["actionResult"], json!(true));

    // Only the two valid documents went to the tenant
    let dispatched: usize = test_deps
        .tenant_adapter
        .bulk_calls()
        .iter()
        .map(|c| c.len())
        .sum();
    assert_eq!(dispatched, 2);
}

// =============================================================================
// Chunking and Transport
// =============================================================================

#[tokio::test]
async fn dispatch_is_chunked_by_tenant_batch_size() {
    common::init_tracing();
    let mut tenant = push_tenant();
    tenant.bulk_batch_size = 2;
    let docs = ["INV-1", "INV-2", "INV-3", "INV-4", "INV-5"];
    let mut store = MockSummaryStore::new();
    for doc in docs {
        store = store.with_row(pending_row(&tenant, APPROVER, doc));
    }
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(store);
    let deps = test_deps.deps();

    let envelope = take_bulk_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &bulk_approve_payload(&docs),
    )
    .await;

    assert_eq!(envelope["approvalResponses"].as_array().unwrap().len(), 5);
    let mut chunk_sizes: Vec<usize> = test_deps
        .tenant_adapter
        .bulk_calls()
        .iter()
        .map(|c| c.len())
        .collect();
    chunk_sizes.sort_unstable();
    assert_eq!(chunk_sizes, vec![1, 2, 2]);
}

#[tokio::test]
async fn transport_failure_fails_the_chunk_and_restores_rows() {
    common::init_tracing();
    let tenant = push_tenant();
    let store = MockSummaryStore::new()
        .with_row(pending_row(&tenant, APPROVER, "INV-1"))
        .with_row(pending_row(&tenant, APPROVER, "INV-2"));
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(store)
        .mock_tenant_adapter(MockTenantAdapter::new().with_transport_failure());
    let deps = test_deps.deps();
    let approver = Alias::new(APPROVER);

    let envelope = take_bulk_action(
        &deps,
        tenant.id,
        &approver,
        ClientDevice::Web,
        &bulk_approve_payload(&["INV-1", "INV-2"]),
    )
    .await;

    let entries = envelope["approvalResponses"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    for (entry, doc) in entries.iter().zip(["INV-1", "INV-2"]) {
        assert_eq!(entry["actionResult"], json!(false));
        assert_eq!(entry["errorInfo"]["errorType"], json!("tenantFailure"));
        let row = test_deps
            .summary_store
            .row(&approver, tenant.id, &DocumentNumber::new(doc))
            .unwrap();
        assert!(!row.pending_action);
        assert!(row.last_failed);
    }
}

// =============================================================================
// Response Matching
// =============================================================================

#[tokio::test]
async fn responses_match_by_keys_then_telemetry_then_error_text() {
    common::init_tracing();
    let tenant = push_tenant();
    let store = MockSummaryStore::new()
        .with_row(pending_row(&tenant, APPROVER, "INV-1"))
        .with_row(pending_row(&tenant, APPROVER, "INV-2"))
        .with_row(pending_row(&tenant, APPROVER, "INV-3"));
    // INV-1 answered by document key, INV-2 only via the telemetry echo,
    // INV-3 only named inside the failure text.
    let reply = json!({ "approvalResponses": [
        { "documentNumber": "INV-1", "actionResult": true },
        { "actionResult": true, "telemetry": { "documentNumber": "INV-2" } },
        { "actionResult": false,
          "errorInfo": { "errorMessages": ["INV-3 is locked by another workflow"] } },
    ]});
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(store)
        .mock_tenant_adapter(MockTenantAdapter::new().with_bulk_response(reply));
    let deps = test_deps.deps();

    let envelope = take_bulk_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &bulk_approve_payload(&["INV-1", "INV-2", "INV-3"]),
    )
    .await;

    let entries = envelope["approvalResponses"].as_array().unwrap();
    assert_eq!(entries[0]["actionResult"], json!(true));
    assert_eq!(entries[1]["actionResult"], json!(true));
    assert_eq!(entries[2]["actionResult"], json!(false));
    assert!(entries[2]["errorInfo"]["errorMessage"]
        .as_str()
        .unwrap()
        .contains("locked"));
}

#[tokio::test]
async fn unmatched_documents_get_a_synthesized_failure() {
    common::init_tracing();
    let tenant = push_tenant();
    let store = MockSummaryStore::new()
        .with_row(pending_row(&tenant, APPROVER, "INV-1"))
        .with_row(pending_row(&tenant, APPROVER, "INV-2"));
    // The tenant only answers for INV-1.
    let reply = json!({ "approvalResponses": [
        { "documentNumber": "INV-1", "actionResult": true },
    ]});
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(store)
        .mock_tenant_adapter(MockTenantAdapter::new().with_bulk_response(reply));
    let deps = test_deps.deps();
    let approver = Alias::new(APPROVER);

    let envelope = take_bulk_action(
        &deps,
        tenant.id,
        &approver,
        ClientDevice::Web,
        &bulk_approve_payload(&["INV-1", "INV-2"]),
    )
    .await;

    let entries = envelope["approvalResponses"].as_array().unwrap();
    assert_eq!(entries[0]["actionResult"], json!(true));
    assert_eq!(entries[1]["actionResult"], json!(false));
    assert!(entries[1]["errorInfo"]["errorMessage"]
        .as_str()
        .unwrap()
        .contains("INV-2"));

    // The unanswered document's row survives
    assert!(test_deps
        .summary_store
        .row(&approver, tenant.id, &DocumentNumber::new("INV-2"))
        .is_some());
    assert!(test_deps
        .summary_store
        .was_removed(&approver, tenant.id, &DocumentNumber::new("INV-1")));
}

#[tokio::test]
async fn error_text_matching_does_not_cross_prefix_colliding_documents() {
    common::init_tracing();
    let tenant = push_tenant();
    let store = MockSummaryStore::new()
        .with_row(pending_row(&tenant, APPROVER, "INV-1"))
        .with_row(pending_row(&tenant, APPROVER, "INV-10"));
    // A single failure entry naming INV-10 must not be claimed by INV-1.
    let reply = json!({ "approvalResponses": [
        { "actionResult": false,
          "errorInfo": { "errorMessages": ["Document INV-10 is locked by another workflow"] } },
    ]});
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(store)
        .mock_tenant_adapter(MockTenantAdapter::new().with_bulk_response(reply));
    let deps = test_deps.deps();

    let envelope = take_bulk_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Web,
        &bulk_approve_payload(&["INV-1", "INV-10"]),
    )
    .await;

    let entries = envelope["approvalResponses"].as_array().unwrap();
    assert_eq!(entries[0]["documentNumber"], json!("INV-1"));
    assert!(entries[0]["errorInfo"]["errorMessage"]
        .as_str()
        .unwrap()
        .contains("did not include document INV-1"));
    assert_eq!(entries[1]["documentNumber"], json!("INV-10"));
    assert!(entries[1]["errorInfo"]["errorMessage"]
        .as_str()
        .unwrap()
        .contains("INV-10 is locked"));
}

// =============================================================================
// Audit
// =============================================================================

#[tokio::test]
async fn every_document_leaves_a_history_record() {
    common::init_tracing();
    let tenant = push_tenant();
    let store = MockSummaryStore::new()
        .with_row(pending_row(&tenant, APPROVER, "INV-1"))
        .with_row(pending_row(&tenant, APPROVER, "INV-3"));
    let test_deps = TestDependencies::new()
        .mock_tenant_store(MockTenantStore::new().with_tenant(tenant.clone()))
        .mock_summary_store(store);
    let deps = test_deps.deps();

    take_bulk_action(
        &deps,
        tenant.id,
        &Alias::new(APPROVER),
        ClientDevice::Teams,
        &bulk_approve_payload(&["INV-1", "INV-2", "INV-3"]),
    )
    .await;

    let records = test_deps.history_store.records();
    assert_eq!(records.len(), 3);
    let mut docs: Vec<&str> = records.iter().map(|r| r.document_number.as_str()).collect();
    docs.sort_unstable();
    assert_eq!(docs, vec!["INV-1", "INV-2", "INV-3"]);
    assert_eq!(records.iter().filter(|r| !r.action_result).count(), 1);
}
