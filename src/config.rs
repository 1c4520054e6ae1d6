//! Configuração do flexmig carregada a partir de `flexmig.toml`.
//!
//! A struct [`FlexConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `FLEXIFY_*` têm precedência sobre o arquivo,
//! e as flags da CLI têm precedência sobre ambos.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::api::{ApiConfig, MigrationMode};
use crate::error::FlexError;
use crate::poller::{PollError, PollerConfig};
use crate::state_machine::Classifier;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "flexmig.toml";

/// Configuração de nível superior carregada de `flexmig.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FlexConfig {
    /// URL base da API de gerenciamento.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chave da API (token Bearer). Vazia quando se usa login.
    #[serde(default)]
    pub api_key: String,

    /// Usuário para obter um token quando não há chave da API.
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Intervalo entre consultas de status, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Falhas consecutivas toleradas antes de abortar o polling.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Trata `NO_CONNECTION_TO_ENGINE` como estado final.
    #[serde(default = "default_true")]
    pub no_connection_is_terminal: bool,

    #[serde(default)]
    pub source: Option<AccountConfig>,

    #[serde(default)]
    pub destination: Option<AccountConfig>,

    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Conta de armazenamento e bucket de um dos lados da migração.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Id do provedor (1 = Amazon S3, 2 = Azure Blob Storage).
    #[serde(default)]
    pub provider_id: Option<i64>,

    /// Endpoint do provedor, usado quando `provider_id` não é informado.
    #[serde(default)]
    pub provider_endpoint: Option<String>,

    pub identity: String,
    pub credential: String,
    pub bucket: String,

    #[serde(default = "default_true")]
    pub use_ssl: bool,
}

/// Parâmetros da migração criada pelo comando `run`.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    #[serde(default = "default_migration_name")]
    pub name: String,

    #[serde(default)]
    pub mode: MigrationMode,

    #[serde(default = "default_slots_per_mapping")]
    pub slots_per_mapping: u32,

    /// Pede ao serviço para validar as credenciais ao registrar a conta.
    #[serde(default = "default_true")]
    pub verify_keys: bool,
}

// Valor padrão para a URL base.
fn default_base_url() -> String {
    "https://api.flexify.io".to_string()
}

// Valor padrão para o intervalo de polling: 5s.
fn default_poll_interval_ms() -> u64 {
    5000
}

// Valor padrão para falhas consecutivas: 3.
fn default_max_consecutive_failures() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_migration_name() -> String {
    "Demo Migration".to_string()
}

fn default_slots_per_mapping() -> u32 {
    8
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            name: default_migration_name(),
            mode: MigrationMode::default(),
            slots_per_mapping: default_slots_per_mapping(),
            verify_keys: true,
        }
    }
}

impl Default for FlexConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            username: None,
            password: None,
            poll_interval_ms: default_poll_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            no_connection_is_terminal: true,
            source: None,
            destination: None,
            migration: MigrationConfig::default(),
        }
    }
}

impl FlexConfig {
    /// Carrega `flexmig.toml` do diretório atual e aplica as variáveis de
    /// ambiente. Sem o arquivo, usa os defaults.
    pub fn load() -> Result<Self, FlexError> {
        Self::load_or_default(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de `path`, que precisa existir.
    pub fn load_from(path: &Path) -> Result<Self, FlexError> {
        if !path.exists() {
            return Err(FlexError::ConfigNotFound(path.to_path_buf()));
        }
        Self::load_or_default(path)
    }

    fn load_or_default(path: &Path) -> Result<Self, FlexError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<FlexConfig>(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Variáveis de ambiente têm precedência sobre o arquivo de configuração.
    /// Valores vazios são ignorados.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(url) = get("FLEXIFY_BASE_URL") {
            self.base_url = url;
        }
        if let Some(key) = get("FLEXIFY_API_KEY") {
            self.api_key = key;
        }
        if let Some(user) = get("FLEXIFY_USERNAME") {
            self.username = Some(user);
        }
        if let Some(pass) = get("FLEXIFY_PASSWORD") {
            self.password = Some(pass);
        }
    }

    /// Configuração explícita do cliente HTTP.
    pub fn api_config(&self) -> ApiConfig {
        let token = if self.api_key.is_empty() {
            None
        } else {
            Some(self.api_key.clone())
        };
        ApiConfig::new(self.base_url.clone(), token)
    }

    /// Usuário e senha, se ambos estiverem configurados.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }

    pub fn poller_config(&self) -> Result<PollerConfig, PollError> {
        PollerConfig::new(
            Duration::from_millis(self.poll_interval_ms),
            self.max_consecutive_failures,
        )
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.no_connection_is_terminal)
    }
}
