//! Default HTTP implementation of the tenant adapter.
//!
//! Tenants expose their approval endpoints as plain JSON-over-HTTP; each
//! tenant's `TenantInfo` carries endpoint templates and this client expands
//! them per call. Anything smarter (auth handshakes, SOAP bridges) belongs in
//! a dedicated adapter implementing the same trait.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::traits::BaseTenantAdapter;
use crate::common::{Alias, DocumentNumber};
use crate::domains::document_action::models::ApprovalRequest;
use crate::domains::tenant::models::TenantInfo;

/// JSON-over-HTTP tenant adapter.
pub struct HttpTenantAdapter {
    client: reqwest::Client,
}

impl HttpTenantAdapter {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        let status = response.status();
        let json: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("POST {} returned non-JSON body", url))?;

        // Tenants report business failures inside a 200 body; transport-level
        // failures are the only thing surfaced as errors here.
        if status.is_server_error() {
            bail!("POST {} returned {}: {}", url, status, json);
        }
        Ok(json)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        response
            .json()
            .await
            .with_context(|| format!("GET {} returned non-JSON body", url))
    }
}

/// Expands `{placeholder}` segments in an endpoint template.
fn expand_endpoint(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut url = template.to_string();
    for (key, value) in pairs {
        url = url.replace(&format!("{{{}}}", key), value);
    }
    url
}

#[async_trait]
impl BaseTenantAdapter for HttpTenantAdapter {
    async fn execute_action(
        &self,
        tenant: &TenantInfo,
        request: &ApprovalRequest,
    ) -> Result<serde_json::Value> {
        let url = expand_endpoint(
            &tenant.action_endpoint,
            &[
                ("documentNumber", request.document_number()),
                ("action", &request.action),
            ],
        );
        let body = serde_json::to_value(request).context("Failed to serialize action request")?;
        self.post_json(&url, &body).await
    }

    async fn execute_bulk(
        &self,
        tenant: &TenantInfo,
        requests: &[ApprovalRequest],
    ) -> Result<serde_json::Value> {
        let endpoint = tenant
            .bulk_action_endpoint
            .as_deref()
            .context("Tenant has no bulk action endpoint")?;
        let body = serde_json::json!({ "approvalRequests": requests });
        self.post_json(endpoint, &body).await
    }

    async fn fetch_details(
        &self,
        tenant: &TenantInfo,
        document_number: &DocumentNumber,
        operation: &str,
    ) -> Result<serde_json::Value> {
        let url = expand_endpoint(
            &tenant.details_endpoint,
            &[
                ("documentNumber", document_number.as_str()),
                ("operation", operation),
            ],
        );
        self.get_json(&url).await
    }

    async fn fetch_pending(
        &self,
        tenant: &TenantInfo,
        approver: &Alias,
    ) -> Result<serde_json::Value> {
        let endpoint = tenant
            .summary_endpoint
            .as_deref()
            .context("Tenant has no pending-approvals endpoint")?;
        let url = expand_endpoint(endpoint, &[("alias", approver.as_str())]);
        self.get_json(&url).await
    }

    async fn download_attachment(
        &self,
        tenant: &TenantInfo,
        document_number: &DocumentNumber,
        attachment_id: &str,
    ) -> Result<Vec<u8>> {
        let endpoint = tenant
            .attachment_endpoint
            .as_deref()
            .context("Tenant has no attachment endpoint")?;
        let url = expand_endpoint(
            endpoint,
            &[
                ("documentNumber", document_number.as_str()),
                ("attachmentId", attachment_id),
            ],
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_all_placeholders() {
        let url = expand_endpoint(
            "https://lob.example.com/api/{documentNumber}/{operation}",
            &[("documentNumber", "INV-1"), ("operation", "HDR")],
        );
        assert_eq!(url, "https://lob.example.com/api/INV-1/HDR");
    }

    #[test]
    fn leaves_unknown_placeholders_alone() {
        let url = expand_endpoint("https://lob.example.com/{other}", &[("alias", "jdoe")]);
        assert_eq!(url, "https://lob.example.com/{other}");
    }
}
