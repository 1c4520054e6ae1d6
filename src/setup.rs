//! Idempotent registration of storage accounts.
//!
//! Creating an account that already exists is answered by the service with
//! a structured `STORAGE_ACCOUNT_ALREADY_EXISTS` fault carrying the existing
//! id. [`Registration`] makes that case explicit instead of treating it as
//! an error.

use thiserror::Error;
use tracing::info;

use crate::api::types::STORAGE_ACCOUNT_ALREADY_EXISTS;
use crate::api::{
    AddStorageAccountRequest, ApiError, MigrationApi, NewStorageAccount, StorageAccountSettings,
};
use crate::config::AccountConfig;

/// Result of a create-resource call.
#[derive(Debug)]
pub enum Registration {
    Created(i64),
    /// The resource already existed; carries its id.
    Conflict(i64),
    Failed(ApiError),
}

impl Registration {
    /// Decide the outcome of a create call by inspecting the structured fault.
    ///
    /// A conflict fault without a recoverable id stays a failure.
    pub fn from_result(result: Result<i64, ApiError>, conflict_code: &str) -> Self {
        match result {
            Ok(id) => Registration::Created(id),
            Err(err) => {
                let existing = err
                    .fault()
                    .filter(|fault| fault.message == conflict_code)
                    .and_then(|fault| fault.resource_id());
                match existing {
                    Some(id) => Registration::Conflict(id),
                    None => Registration::Failed(err),
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no storage provider with endpoint {0}")]
    ProviderNotFound(String),

    #[error("account {0} needs either provider_id or provider_endpoint")]
    MissingProvider(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Register a storage account, treating "already exists" as success.
pub async fn register_storage_account(
    api: &impl MigrationApi,
    req: &AddStorageAccountRequest,
) -> Registration {
    Registration::from_result(
        api.add_storage_account(req).await,
        STORAGE_ACCOUNT_ALREADY_EXISTS,
    )
}

/// Resolve the provider id for an account, looking it up by endpoint when
/// no explicit id is configured.
pub async fn resolve_provider(
    api: &impl MigrationApi,
    account: &AccountConfig,
) -> Result<i64, SetupError> {
    if let Some(id) = account.provider_id {
        return Ok(id);
    }
    let endpoint = account
        .provider_endpoint
        .as_deref()
        .ok_or_else(|| SetupError::MissingProvider(account.identity.clone()))?;

    api.list_providers()
        .await?
        .into_iter()
        .find(|p| p.endpoint.as_deref() == Some(endpoint))
        .map(|p| p.id)
        .ok_or_else(|| SetupError::ProviderNotFound(endpoint.to_string()))
}

/// Make sure the account exists and return its id.
pub async fn ensure_storage_account(
    api: &impl MigrationApi,
    account: &AccountConfig,
    verify_keys: bool,
) -> Result<i64, SetupError> {
    let provider_id = resolve_provider(api, account).await?;
    let req = AddStorageAccountRequest {
        storage_account: NewStorageAccount {
            provider_id,
            settings: StorageAccountSettings {
                identity: account.identity.clone(),
                credential: account.credential.clone(),
                use_ssl: account.use_ssl,
            },
        },
        verify_keys,
    };

    match register_storage_account(api, &req).await {
        Registration::Created(id) => {
            info!(id, identity = %account.identity, "storage account registered");
            Ok(id)
        }
        Registration::Conflict(id) => {
            info!(id, identity = %account.identity, "storage account already exists, reusing");
            Ok(id)
        }
        Registration::Failed(err) => Err(err.into()),
    }
}
