use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{
    AddMigrationRequest, MigrationApi, MigrationMapping, MigrationSettings,
};
use crate::config::{AccountConfig, FlexConfig, MigrationConfig};
use crate::error::FlexError;
use crate::poller::{ApiStatusSource, PollError, PollOutcome, StatusObserver, StatusPoller};
use crate::setup::ensure_storage_account;

/// Drives the full flow: register accounts, start a migration, watch it.
pub struct MigrationRunner<'a, A> {
    api: &'a A,
    poller: StatusPoller,
}

/// Build the request for a single source → destination bucket mapping.
pub fn build_migration_request(
    settings: &MigrationConfig,
    source: &AccountConfig,
    source_account_id: i64,
    destination: &AccountConfig,
    destination_account_id: i64,
) -> AddMigrationRequest {
    AddMigrationRequest {
        settings: MigrationSettings {
            name: settings.name.clone(),
            migration_mode: settings.mode,
            slots_per_mapping: settings.slots_per_mapping,
        },
        mappings: vec![MigrationMapping {
            source_storage_account_id: source_account_id,
            source_bucket_name: source.bucket.clone(),
            dest_storage_account_id: destination_account_id,
            dest_bucket_name: destination.bucket.clone(),
        }],
    }
}

impl<'a, A: MigrationApi> MigrationRunner<'a, A> {
    pub fn new(api: &'a A, poller: StatusPoller) -> Self {
        Self { api, poller }
    }

    /// Register both storage accounts (reusing existing ones) and create the
    /// migration. Returns the new migration id.
    pub async fn start(&self, config: &FlexConfig) -> Result<i64, FlexError> {
        let source = config
            .source
            .as_ref()
            .ok_or(FlexError::MissingAccount("source"))?;
        let destination = config
            .destination
            .as_ref()
            .ok_or(FlexError::MissingAccount("destination"))?;

        let verify_keys = config.migration.verify_keys;
        let source_id = ensure_storage_account(self.api, source, verify_keys).await?;
        let destination_id = ensure_storage_account(self.api, destination, verify_keys).await?;

        let req = build_migration_request(
            &config.migration,
            source,
            source_id,
            destination,
            destination_id,
        );
        let id = self.api.add_migration(&req).await?;
        info!(
            id,
            source = %source.bucket,
            destination = %destination.bucket,
            "migration started"
        );
        Ok(id)
    }

    /// Poll an existing migration until it reaches a terminal state.
    pub async fn watch<O: StatusObserver>(
        &self,
        id: i64,
        observer: &mut O,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PollError> {
        self.poller
            .poll(id, &ApiStatusSource(self.api), observer, cancel)
            .await
    }
}
