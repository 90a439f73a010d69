// TestDependencies - mock implementations for testing
//
// Provides mock collaborators that can be injected into ApprovalsDeps for
// tests. Every mock records its calls and serves queued responses, falling
// back to a sensible default when the queue is empty.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::config::ApprovalsConfig;
use super::deps::ApprovalsDeps;
use super::traits::{
    BaseBlobStore, BaseDetailsStore, BaseFlightingService, BaseHistoryStore, BaseNameResolver,
    BaseNotificationSender, BaseSummaryStore, BaseTemplateStore, BaseTenantAdapter,
    BaseTenantStore,
};
use crate::common::{Alias, DocumentNumber, TenantId};
use crate::domains::audit::models::TransactionHistory;
use crate::domains::details::models::ApprovalDetailsRow;
use crate::domains::document_action::models::ApprovalRequest;
use crate::domains::notifications::models::EmailMessage;
use crate::domains::summary::models::ApprovalSummaryRow;
use crate::domains::tenant::models::TenantInfo;

type RowKey = (Alias, TenantId, String);

fn row_key(approver: &Alias, tenant_id: TenantId, document_number: &DocumentNumber) -> RowKey {
    (
        approver.clone(),
        tenant_id,
        document_number.as_str().to_string(),
    )
}

// =============================================================================
// Mock Summary Store
// =============================================================================

#[derive(Default)]
pub struct MockSummaryStore {
    rows: Mutex<HashMap<RowKey, ApprovalSummaryRow>>,
    removed: Mutex<Vec<RowKey>>,
}

impl MockSummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(self, row: ApprovalSummaryRow) -> Self {
        let key = row_key(&row.approver, row.tenant_id, &row.document_number);
        self.rows.lock().unwrap().insert(key, row);
        self
    }

    /// Current state of a row, if it still exists.
    pub fn row(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Option<ApprovalSummaryRow> {
        self.rows
            .lock()
            .unwrap()
            .get(&row_key(approver, tenant_id, document_number))
            .cloned()
    }

    /// Whether a row was removed via `remove_row`.
    pub fn was_removed(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> bool {
        self.removed
            .lock()
            .unwrap()
            .contains(&row_key(approver, tenant_id, document_number))
    }
}

#[async_trait]
impl BaseSummaryStore for MockSummaryStore {
    async fn rows_for_approver(&self, approver: &Alias) -> Result<Vec<ApprovalSummaryRow>> {
        let mut rows: Vec<ApprovalSummaryRow> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| &r.approver == approver)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn find_row(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Result<Option<ApprovalSummaryRow>> {
        Ok(self.row(approver, tenant_id, document_number))
    }

    async fn set_pending(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
        pending: bool,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&row_key(approver, tenant_id, document_number)) {
            Some(row) => {
                row.pending_action = pending;
                Ok(())
            }
            None => bail!("no summary row for {}", document_number),
        }
    }

    async fn record_failure(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
        message: &str,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(&row_key(approver, tenant_id, document_number)) {
            row.last_failed = true;
            row.last_failed_message = Some(message.to_string());
        }
        Ok(())
    }

    async fn remove_row(
        &self,
        approver: &Alias,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Result<()> {
        let key = row_key(approver, tenant_id, document_number);
        self.rows.lock().unwrap().remove(&key);
        self.removed.lock().unwrap().push(key);
        Ok(())
    }
}

// =============================================================================
// Mock Details Store
// =============================================================================

#[derive(Default)]
pub struct MockDetailsStore {
    rows: Mutex<Vec<ApprovalDetailsRow>>,
}

impl MockDetailsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(self, row: ApprovalDetailsRow) -> Self {
        self.rows.lock().unwrap().push(row);
        self
    }

    /// All sections currently stored for a document.
    pub fn stored_sections(
        &self,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Vec<ApprovalDetailsRow> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tenant_id == tenant_id && &r.document_number == document_number)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BaseDetailsStore for MockDetailsStore {
    async fn sections(
        &self,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Result<Vec<ApprovalDetailsRow>> {
        Ok(self.stored_sections(tenant_id, document_number))
    }

    async fn upsert_section(&self, row: &ApprovalDetailsRow) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|r| {
            !(r.tenant_id == row.tenant_id
                && r.document_number == row.document_number
                && r.operation == row.operation)
        });
        rows.push(row.clone());
        Ok(())
    }
}

// =============================================================================
// Mock History Store
// =============================================================================

#[derive(Default)]
pub struct MockHistoryStore {
    records: Mutex<Vec<TransactionHistory>>,
}

impl MockHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: TransactionHistory) -> Self {
        self.records.lock().unwrap().push(record);
        self
    }

    pub fn records(&self) -> Vec<TransactionHistory> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseHistoryStore for MockHistoryStore {
    async fn record(&self, history: &TransactionHistory) -> Result<()> {
        self.records.lock().unwrap().push(history.clone());
        Ok(())
    }

    async fn for_document(
        &self,
        tenant_id: TenantId,
        document_number: &DocumentNumber,
    ) -> Result<Vec<TransactionHistory>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tenant_id == tenant_id && &r.document_number == document_number)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Mock Tenant Store
// =============================================================================

#[derive(Default)]
pub struct MockTenantStore {
    tenants: Mutex<Vec<TenantInfo>>,
}

impl MockTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(self, tenant: TenantInfo) -> Self {
        self.tenants.lock().unwrap().push(tenant);
        self
    }
}

#[async_trait]
impl BaseTenantStore for MockTenantStore {
    async fn tenant(&self, tenant_id: TenantId) -> Result<Option<TenantInfo>> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == tenant_id)
            .cloned())
    }

    async fn all_tenants(&self) -> Result<Vec<TenantInfo>> {
        Ok(self.tenants.lock().unwrap().clone())
    }
}

// =============================================================================
// Mock Tenant Adapter
// =============================================================================

pub struct MockTenantAdapter {
    action_responses: Mutex<Vec<serde_json::Value>>,
    bulk_responses: Mutex<Vec<serde_json::Value>>,
    details_responses: Mutex<Vec<serde_json::Value>>,
    pending_responses: Mutex<Vec<serde_json::Value>>,
    attachments: Mutex<HashMap<String, Vec<u8>>>,
    action_calls: Mutex<Vec<ApprovalRequest>>,
    bulk_calls: Mutex<Vec<Vec<ApprovalRequest>>>,
    details_calls: Mutex<Vec<(String, String)>>,
    fail_transport: Mutex<bool>,
}

impl MockTenantAdapter {
    pub fn new() -> Self {
        Self {
            action_responses: Mutex::new(Vec::new()),
            bulk_responses: Mutex::new(Vec::new()),
            details_responses: Mutex::new(Vec::new()),
            pending_responses: Mutex::new(Vec::new()),
            attachments: Mutex::new(HashMap::new()),
            action_calls: Mutex::new(Vec::new()),
            bulk_calls: Mutex::new(Vec::new()),
            details_calls: Mutex::new(Vec::new()),
            fail_transport: Mutex::new(false),
        }
    }

    /// Queue a raw reply for the next single-document action.
    pub fn with_action_response(self, response: serde_json::Value) -> Self {
        self.action_responses.lock().unwrap().push(response);
        self
    }

    /// Queue a raw reply for the next bulk call.
    pub fn with_bulk_response(self, response: serde_json::Value) -> Self {
        self.bulk_responses.lock().unwrap().push(response);
        self
    }

    /// Queue a raw reply for the next details fetch.
    pub fn with_details_response(self, response: serde_json::Value) -> Self {
        self.details_responses.lock().unwrap().push(response);
        self
    }

    /// Queue a raw reply for the next pending-approvals fetch.
    pub fn with_pending_response(self, response: serde_json::Value) -> Self {
        self.pending_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_attachment(self, attachment_id: &str, bytes: Vec<u8>) -> Self {
        self.attachments
            .lock()
            .unwrap()
            .insert(attachment_id.to_string(), bytes);
        self
    }

    /// Make every adapter call fail at the transport level.
    pub fn with_transport_failure(self) -> Self {
        *self.fail_transport.lock().unwrap() = true;
        self
    }

    pub fn action_calls(&self) -> Vec<ApprovalRequest> {
        self.action_calls.lock().unwrap().clone()
    }

    pub fn bulk_calls(&self) -> Vec<Vec<ApprovalRequest>> {
        self.bulk_calls.lock().unwrap().clone()
    }

    /// (document number, operation) pairs fetched from the tenant.
    pub fn details_calls(&self) -> Vec<(String, String)> {
        self.details_calls.lock().unwrap().clone()
    }

    fn check_transport(&self) -> Result<()> {
        if *self.fail_transport.lock().unwrap() {
            bail!("simulated tenant transport failure");
        }
        Ok(())
    }
}

impl Default for MockTenantAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseTenantAdapter for MockTenantAdapter {
    async fn execute_action(
        &self,
        _tenant: &TenantInfo,
        request: &ApprovalRequest,
    ) -> Result<serde_json::Value> {
        self.action_calls.lock().unwrap().push(request.clone());
        self.check_transport()?;

        let mut responses = self.action_responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            // Default: the tenant accepted the action
            Ok(serde_json::json!({
                "actionResult": true,
                "documentNumber": request.document_number(),
            }))
        }
    }

    async fn execute_bulk(
        &self,
        _tenant: &TenantInfo,
        requests: &[ApprovalRequest],
    ) -> Result<serde_json::Value> {
        self.bulk_calls.lock().unwrap().push(requests.to_vec());
        self.check_transport()?;

        let mut responses = self.bulk_responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            // Default: one success entry per document
            let entries: Vec<serde_json::Value> = requests
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "actionResult": true,
                        "documentNumber": r.document_number(),
                    })
                })
                .collect();
            Ok(serde_json::json!({ "approvalResponses": entries }))
        }
    }

    async fn fetch_details(
        &self,
        _tenant: &TenantInfo,
        document_number: &DocumentNumber,
        operation: &str,
    ) -> Result<serde_json::Value> {
        self.details_calls
            .lock()
            .unwrap()
            .push((document_number.as_str().to_string(), operation.to_string()));
        self.check_transport()?;

        let mut responses = self.details_responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            Ok(serde_json::json!({
                "documentNumber": document_number.as_str(),
                "operation": operation,
            }))
        }
    }

    async fn fetch_pending(
        &self,
        _tenant: &TenantInfo,
        _approver: &Alias,
    ) -> Result<serde_json::Value> {
        self.check_transport()?;

        let mut responses = self.pending_responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            Ok(serde_json::json!([]))
        }
    }

    async fn download_attachment(
        &self,
        _tenant: &TenantInfo,
        _document_number: &DocumentNumber,
        attachment_id: &str,
    ) -> Result<Vec<u8>> {
        self.check_transport()?;
        match self.attachments.lock().unwrap().get(attachment_id) {
            Some(bytes) => Ok(bytes.clone()),
            None => bail!("no such attachment: {}", attachment_id),
        }
    }
}

// =============================================================================
// Mock Notification Sender
// =============================================================================

#[derive(Default)]
pub struct MockNotificationSender {
    sent: Mutex<Vec<EmailMessage>>,
    attempts: Mutex<u32>,
    failures_before_success: Mutex<u32>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` send attempts, then succeed.
    pub fn with_failures(self, n: u32) -> Self {
        *self.failures_before_success.lock().unwrap() = n;
        self
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Total send attempts, including failed ones.
    pub fn attempt_count(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl BaseNotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<()> {
        let mut attempts = self.attempts.lock().unwrap();
        *attempts += 1;
        let mut failures = self.failures_before_success.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            bail!("simulated email delivery failure");
        }
        drop(failures);
        drop(attempts);

        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// =============================================================================
// Mock Template Store
// =============================================================================

#[derive(Default)]
pub struct MockTemplateStore {
    templates: Mutex<HashMap<(TenantId, String), String>>,
}

impl MockTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(self, tenant_id: TenantId, key: &str, body: &str) -> Self {
        self.templates
            .lock()
            .unwrap()
            .insert((tenant_id, key.to_string()), body.to_string());
        self
    }
}

#[async_trait]
impl BaseTemplateStore for MockTemplateStore {
    async fn template(&self, tenant_id: TenantId, key: &str) -> Result<Option<String>> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .get(&(tenant_id, key.to_string()))
            .cloned())
    }
}

// =============================================================================
// Mock Blob Store
// =============================================================================

#[derive(Default)]
pub struct MockBlobStore {
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, container: &str, path: &str, bytes: Vec<u8>) -> Self {
        self.blobs
            .lock()
            .unwrap()
            .insert((container.to_string(), path.to_string()), bytes);
        self
    }

    pub fn blob(&self, container: &str, path: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(&(container.to_string(), path.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BaseBlobStore for MockBlobStore {
    async fn get(&self, container: &str, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blob(container, path))
    }

    async fn put(&self, container: &str, path: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert((container.to_string(), path.to_string()), bytes.to_vec());
        Ok(())
    }
}

// =============================================================================
// Mock Name Resolver
// =============================================================================

#[derive(Default)]
pub struct MockNameResolver {
    names: Mutex<HashMap<Alias, String>>,
}

impl MockNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(self, alias: &str, name: &str) -> Self {
        self.names
            .lock()
            .unwrap()
            .insert(Alias::new(alias), name.to_string());
        self
    }
}

#[async_trait]
impl BaseNameResolver for MockNameResolver {
    async fn display_name(&self, alias: &Alias) -> Result<Option<String>> {
        Ok(self.names.lock().unwrap().get(alias).cloned())
    }
}

// =============================================================================
// Mock Flighting Service
// =============================================================================

#[derive(Default)]
pub struct MockFlightingService {
    enabled: Mutex<Vec<String>>,
}

impl MockFlightingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a feature for all users.
    pub fn with_enabled(self, feature: &str) -> Self {
        self.enabled.lock().unwrap().push(feature.to_string());
        self
    }
}

#[async_trait]
impl BaseFlightingService for MockFlightingService {
    async fn is_enabled(&self, feature: &str, _alias: &Alias) -> Result<bool> {
        Ok(self.enabled.lock().unwrap().iter().any(|f| f == feature))
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub summary_store: Arc<MockSummaryStore>,
    pub details_store: Arc<MockDetailsStore>,
    pub history_store: Arc<MockHistoryStore>,
    pub tenant_store: Arc<MockTenantStore>,
    pub tenant_adapter: Arc<MockTenantAdapter>,
    pub notification_sender: Arc<MockNotificationSender>,
    pub template_store: Arc<MockTemplateStore>,
    pub blob_store: Arc<MockBlobStore>,
    pub name_resolver: Arc<MockNameResolver>,
    pub flighting: Arc<MockFlightingService>,
    pub config: ApprovalsConfig,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            summary_store: Arc::new(MockSummaryStore::new()),
            details_store: Arc::new(MockDetailsStore::new()),
            history_store: Arc::new(MockHistoryStore::new()),
            tenant_store: Arc::new(MockTenantStore::new()),
            tenant_adapter: Arc::new(MockTenantAdapter::new()),
            notification_sender: Arc::new(MockNotificationSender::new()),
            template_store: Arc::new(MockTemplateStore::new()),
            blob_store: Arc::new(MockBlobStore::new()),
            name_resolver: Arc::new(MockNameResolver::new()),
            flighting: Arc::new(MockFlightingService::new()),
            config: ApprovalsConfig::default(),
        }
    }

    pub fn mock_summary_store(mut self, store: MockSummaryStore) -> Self {
        self.summary_store = Arc::new(store);
        self
    }

    pub fn mock_details_store(mut self, store: MockDetailsStore) -> Self {
        self.details_store = Arc::new(store);
        self
    }

    pub fn mock_history_store(mut self, store: MockHistoryStore) -> Self {
        self.history_store = Arc::new(store);
        self
    }

    pub fn mock_tenant_store(mut self, store: MockTenantStore) -> Self {
        self.tenant_store = Arc::new(store);
        self
    }

    pub fn mock_tenant_adapter(mut self, adapter: MockTenantAdapter) -> Self {
        self.tenant_adapter = Arc::new(adapter);
        self
    }

    pub fn mock_notification_sender(mut self, sender: MockNotificationSender) -> Self {
        self.notification_sender = Arc::new(sender);
        self
    }

    pub fn mock_template_store(mut self, store: MockTemplateStore) -> Self {
        self.template_store = Arc::new(store);
        self
    }

    pub fn mock_blob_store(mut self, store: MockBlobStore) -> Self {
        self.blob_store = Arc::new(store);
        self
    }

    pub fn mock_name_resolver(mut self, resolver: MockNameResolver) -> Self {
        self.name_resolver = Arc::new(resolver);
        self
    }

    pub fn mock_flighting(mut self, flighting: MockFlightingService) -> Self {
        self.flighting = Arc::new(flighting);
        self
    }

    pub fn with_config(mut self, config: ApprovalsConfig) -> Self {
        self.config = config;
        self
    }

    /// Build an ApprovalsDeps sharing the mock handles, so tests keep their
    /// references for assertions.
    pub fn deps(&self) -> ApprovalsDeps {
        ApprovalsDeps::new(
            self.summary_store.clone(),
            self.details_store.clone(),
            self.history_store.clone(),
            self.tenant_store.clone(),
            self.tenant_adapter.clone(),
            self.notification_sender.clone(),
            self.template_store.clone(),
            self.blob_store.clone(),
            self.name_resolver.clone(),
            self.flighting.clone(),
            self.config.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
