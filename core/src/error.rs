//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Problems found *inside* a document graph (broken `$ref`s, cycles) are not
//! `AppError`s; the resolver records them as `ResolvingError` entries. This
//! enum covers the infrastructure around a pass: parsing, registration and
//! configuration.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A document could not be parsed as YAML or JSON.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// The document registry rejected a registration.
    #[from(ignore)]
    #[display("Registry Error: {_0}")]
    Registry(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
