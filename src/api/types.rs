//! Tipos de dados trocados com a API de gerenciamento de migrações.
//!
//! Apenas os campos usados por este cliente são modelados; campos extras
//! enviados pelo serviço são ignorados na desserialização. O JSON do
//! serviço usa `camelCase`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::state_machine::{JobStatus, MigrationState};

/// Código de falha devolvido quando a conta de armazenamento já existe.
pub const STORAGE_ACCOUNT_ALREADY_EXISTS: &str = "STORAGE_ACCOUNT_ALREADY_EXISTS";

/// Credenciais para obter um token de acesso.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationResponse {
    pub token: String,
}

/// Um provedor de armazenamento suportado (Amazon S3, Azure Blob, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProvider {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Endpoint do provedor, ex.: `s3.amazonaws.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Corpo do `POST /storage-accounts`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStorageAccountRequest {
    pub storage_account: NewStorageAccount,
    pub verify_keys: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStorageAccount {
    pub provider_id: i64,
    pub settings: StorageAccountSettings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountSettings {
    pub identity: String,
    pub credential: String,
    pub use_ssl: bool,
}

/// Modo de migração: copiar mantém os objetos na origem, mover os remove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MigrationMode {
    #[default]
    Copy,
    Move,
}

/// Corpo do `POST /migrations`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMigrationRequest {
    pub settings: MigrationSettings,
    pub mappings: Vec<MigrationMapping>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSettings {
    pub name: String,
    pub migration_mode: MigrationMode,
    pub slots_per_mapping: u32,
}

/// Um par origem/destino dentro de uma migração.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationMapping {
    pub source_storage_account_id: i64,
    pub source_bucket_name: String,
    pub dest_storage_account_id: i64,
    pub dest_bucket_name: String,
}

/// Resposta das operações de criação.
#[derive(Debug, Clone, Deserialize)]
pub struct IdResponse {
    pub id: i64,
}

/// Migração retornada por `GET /migrations/{id}`.
///
/// Só as estatísticas interessam ao poller; `id` e os demais campos são
/// ignorados.
#[derive(Debug, Clone, Deserialize)]
pub struct Migration {
    pub stat: MigrationStat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStat {
    /// Estado ausente, nulo ou não textual vira [`MigrationState::Unknown`].
    #[serde(default = "unreported_state", deserialize_with = "lenient_state")]
    pub state: MigrationState,
    #[serde(default)]
    pub bytes_processed: Option<u64>,
    #[serde(default)]
    pub objects_failed: Option<u64>,
}

fn unreported_state() -> MigrationState {
    MigrationState::Unknown("null".to_string())
}

fn lenient_state<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MigrationState, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(raw) => MigrationState::from_wire(&raw),
        serde_json::Value::Null => unreported_state(),
        other => MigrationState::Unknown(other.to_string()),
    })
}

impl Migration {
    /// Converte as estatísticas da migração em um [`JobStatus`] novo.
    pub fn status(&self) -> JobStatus {
        JobStatus {
            state: self.stat.state.clone(),
            bytes_processed: self.stat.bytes_processed,
            objects_failed: self.stat.objects_failed,
        }
    }
}

/// Corpo estruturado de erro que o serviço envia com HTTP 422.
///
/// `message` é um código legível por máquina; `id` e `args` carregam
/// dados associados (ex.: o id da conta já existente).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFault {
    #[serde(default)]
    pub id: Option<i64>,
    pub message: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl ServiceFault {
    /// Id do recurso referenciado pela falha: `id` quando presente,
    /// senão o primeiro argumento (número ou string numérica).
    pub fn resource_id(&self) -> Option<i64> {
        if let Some(id) = self.id {
            return Some(id);
        }
        match self.args.first()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
