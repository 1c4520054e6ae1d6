//! Tipos de erro para o cliente da API de gerenciamento.
//!
//! Define [`ApiError`] com variantes para falhas de transporte, respostas
//! HTTP de erro, falhas estruturadas do serviço e corpos inválidos.

use thiserror::Error;

use super::types::ServiceFault;

/// Erros que podem ocorrer ao interagir com a API.
///
/// - [`Transport`](ApiError::Transport): falha de rede (DNS, conexão, timeout)
/// - [`Status`](ApiError::Status): resposta HTTP 4xx/5xx sem falha estruturada
/// - [`Fault`](ApiError::Fault): HTTP 422 com corpo [`ServiceFault`]
/// - [`Decode`](ApiError::Decode): corpo de sucesso que não pôde ser lido
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("service fault (status {status}): {}", .fault.message)]
    Fault { status: u16, fault: ServiceFault },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Verdadeiro para falhas que podem desaparecer numa nova tentativa:
    /// rede, 5xx, 408 e 429.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            ApiError::Fault { .. } | ApiError::Decode(_) => false,
        }
    }

    /// Falha estruturada do serviço, se houver.
    pub fn fault(&self) -> Option<&ServiceFault> {
        match self {
            ApiError::Fault { fault, .. } => Some(fault),
            _ => None,
        }
    }
}
