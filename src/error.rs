use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;
use crate::setup::SetupError;

#[derive(Debug, Error)]
pub enum FlexError {
    #[error("Missing [{0}] section in configuration")]
    MissingAccount(&'static str),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
