use crate::auth::error::AuthenticationError;
use polars::error::PolarsError;
use std::env::VarError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetatmoError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed building temperature frame")]
    Frame(#[from] PolarsError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is not set")]
    MissingVar(&'static str, #[source] VarError),

    #[error("Environment variable '{0}' is empty")]
    EmptyVar(&'static str),
}
