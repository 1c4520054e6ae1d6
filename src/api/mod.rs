pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, ApiConfig, MigrationApi};
pub use error::ApiError;
pub use types::{
    AddMigrationRequest, AddStorageAccountRequest, MigrationMapping, MigrationMode,
    MigrationSettings, NewStorageAccount, StorageAccountSettings,
};
