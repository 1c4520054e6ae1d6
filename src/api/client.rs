use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::ApiError;
use super::types::{
    AddMigrationRequest, AddStorageAccountRequest, AuthenticationRequest, AuthenticationResponse,
    IdResponse, Migration, ServiceFault, StorageProvider,
};

const DEFAULT_BASE_URL: &str = "https://api.flexify.io";

/// Status code the service uses for structured faults.
const FAULT_STATUS: u16 = 422;

/// Where to reach the service and how to authenticate.
///
/// Passed explicitly to [`ApiClient::new`]; there is no shared default client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token sent as `Authorization: Bearer <token>`.
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
        }
    }
}

/// Operations of the management API this crate relies on.
#[allow(async_fn_in_trait)]
pub trait MigrationApi {
    async fn list_providers(&self) -> Result<Vec<StorageProvider>, ApiError>;

    /// Register a storage account and return its id.
    async fn add_storage_account(&self, req: &AddStorageAccountRequest) -> Result<i64, ApiError>;

    /// Create a migration and return its id.
    async fn add_migration(&self, req: &AddMigrationRequest) -> Result<i64, ApiError>;

    async fn get_migration(&self, id: i64) -> Result<Migration, ApiError>;
}

pub struct ApiClient {
    config: ApiConfig,
    client: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Replace the bearer token, e.g. after [`authenticate`](Self::authenticate).
    pub fn with_token(mut self, token: String) -> Self {
        self.config.token = Some(token);
        self
    }

    /// Exchange username and password for an API token.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let req = AuthenticationRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp: AuthenticationResponse = self
            .send(self.client.post(self.url("auth/token")).json(&req))
            .await?;
        Ok(resp.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let builder = match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Map a non-2xx response to an [`ApiError`], preferring the structured fault
/// when the body carries one.
fn error_from_body(status: u16, body: String) -> ApiError {
    if status == FAULT_STATUS {
        match serde_json::from_str::<ServiceFault>(&body) {
            Ok(fault) => return ApiError::Fault { status, fault },
            Err(e) => warn!(status, error = %e, "cannot parse service fault body"),
        }
    }
    ApiError::Status { status, body }
}

impl MigrationApi for ApiClient {
    async fn list_providers(&self) -> Result<Vec<StorageProvider>, ApiError> {
        self.send(self.client.get(self.url("storage-providers")))
            .await
    }

    async fn add_storage_account(&self, req: &AddStorageAccountRequest) -> Result<i64, ApiError> {
        let resp: IdResponse = self
            .send(self.client.post(self.url("storage-accounts")).json(req))
            .await?;
        debug!(id = resp.id, "storage account created");
        Ok(resp.id)
    }

    async fn add_migration(&self, req: &AddMigrationRequest) -> Result<i64, ApiError> {
        let resp: IdResponse = self
            .send(self.client.post(self.url("migrations")).json(req))
            .await?;
        debug!(id = resp.id, "migration created");
        Ok(resp.id)
    }

    async fn get_migration(&self, id: i64) -> Result<Migration, ApiError> {
        self.send(self.client.get(self.url(&format!("migrations/{id}"))))
            .await
    }
}
