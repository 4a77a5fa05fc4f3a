//! CMDB Client
//!
//! List, get and update server records through the ServiceNow Table API.

use super::error::{CmdbError, CmdbResult};
use super::http::{ApiRequest, ApiResponse, HttpBackend, ReqwestBackend};
use super::models::{Server, ServerList, SingleServer, UpdatePayload};
use crate::config::Config;

/// Main CMDB client
pub struct CmdbClient<B = ReqwestBackend> {
    backend: B,
    table_url: String,
}

impl CmdbClient<ReqwestBackend> {
    /// Create a client backed by reqwest with the configured credentials
    pub fn new(config: &Config) -> CmdbResult<Self> {
        let backend = ReqwestBackend::new(config.credentials.clone())?;
        Ok(Self::with_backend(backend, config))
    }
}

impl<B: HttpBackend> CmdbClient<B> {
    pub fn with_backend(backend: B, config: &Config) -> Self {
        Self {
            backend,
            table_url: config.table_url(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Collection endpoint for the configured table
    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    /// Endpoint for a single record
    pub fn record_url(&self, sys_id: &str) -> String {
        format!("{}/{}", self.table_url, urlencoding::encode(sys_id))
    }

    /// Execute a request, failing on anything other than 200 OK
    async fn send_checked(&self, request: ApiRequest) -> CmdbResult<ApiResponse> {
        let url = request.url.clone();
        let response = self.backend.execute(request).await?;

        if response.status != 200 {
            tracing::debug!("{} returned status {}", url, response.status);
            return Err(CmdbError::Status {
                status: response.status,
                reason: response.reason,
                url,
            });
        }

        Ok(response)
    }

    /// List every server record in the table, in server order
    pub async fn list_servers(&self) -> CmdbResult<Vec<Server>> {
        let response = self.send_checked(ApiRequest::get(self.table_url.as_str())).await?;
        let list: ServerList = serde_json::from_str(&response.body)?;

        tracing::debug!("Fetched {} servers", list.result.len());
        Ok(list.result)
    }

    /// Fetch one server record by sys_id
    pub async fn get_server(&self, sys_id: &str) -> CmdbResult<Server> {
        if sys_id.is_empty() {
            return Err(CmdbError::MissingSysId);
        }

        let response = self.send_checked(ApiRequest::get(self.record_url(sys_id))).await?;
        let server: SingleServer = serde_json::from_str(&response.body)?;
        Ok(server.into())
    }

    /// Update the populated fields of one server record.
    ///
    /// The response body is not inspected; a 200 status is success.
    pub async fn update_server(&self, sys_id: &str, payload: &UpdatePayload) -> CmdbResult<()> {
        if sys_id.is_empty() {
            return Err(CmdbError::MissingSysId);
        }
        if payload.is_empty() {
            return Err(CmdbError::EmptyUpdate);
        }

        let body = serde_json::to_value(payload).map_err(CmdbError::Encode)?;
        self.send_checked(ApiRequest::put(self.record_url(sys_id), body))
            .await?;

        tracing::info!("Updated server {}", sys_id);
        Ok(())
    }
}
