//! Error types for the routine builder
//!
//! Every pipeline-level error ends up as user-facing text; none of them
//! escape the handler that triggered the work.

use thiserror::Error;

/// Failure loading the static product catalog.
///
/// Cloneable because the first failure is cached and handed to every
/// later caller of `CatalogStore::load`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogLoadError {
    #[error("could not fetch product catalog: {0}")]
    Fetch(String),

    #[error("could not parse product catalog: {0}")]
    Parse(String),
}

/// Instant-answer lookup failure. Always recovered inside `backend::citations`.
#[derive(Error, Debug)]
pub enum CitationLookupError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The backend proxy could not produce a routine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("backend returned an error: {0}")]
    Reported(String),

    #[error("backend response had no routine text")]
    Empty,
}

/// Direct chat-completion call failed at the network or parse level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackError {
    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion response was not valid JSON: {0}")]
    Parse(String),
}

/// Errors surfaced by a routine generation attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutineError {
    /// Fallback needed but no client credential is configured. Carries the
    /// raw backend response so the user can see why generation failed.
    #[error("Error from worker: {backend_response}\n\nSet OPENAI_API_KEY to enable the direct fallback.")]
    MissingCredential { backend_response: String },

    #[error("Error generating routine: {0}")]
    Fallback(#[from] FallbackError),

    #[error("Error generating routine: {0}")]
    Catalog(#[from] CatalogLoadError),
}

/// Configuration file problems.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
