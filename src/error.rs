//! Error types for tg-nav.

use std::io;

/// Errors produced by hosts and loaders.
///
/// None of these reach the user: the overlay logs them and degrades to
/// inaction.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("unsupported capability: {0}")]
    Unsupported(String),

    #[error("host refused: {0}")]
    Refused(String),

    #[error("route payload error: {0}")]
    RoutePayload(#[from] serde_json::Error),

    #[error("invalid routes: {0}")]
    InvalidRoutes(String),

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, NavError>;
