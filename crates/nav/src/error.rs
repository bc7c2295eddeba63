//! Error types for the navigation pipeline
//!
//! Expected absences (self-reference, missing fragment) are not errors;
//! they are [`Outcome`](crate::injector::Outcome) values.

use dom::DomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavError>;

/// Boxed transport error from a fragment source
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("Invalid page location '{url}': {reason}")]
    InvalidLocation { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Fetching {url} failed: {source}")]
    Fetch { url: String, source: SourceError },

    #[error("Fragment has no element matching '{selector}'")]
    FragmentShape { selector: &'static str },

    #[error("Page has no element matching '{selector}'")]
    MissingHeader { selector: &'static str },

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

impl NavError {
    /// Structural failures: the site is misconfigured, the page is untouched
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            NavError::FragmentShape { .. } | NavError::MissingHeader { .. }
        )
    }
}
