use thiserror::Error;

/// Request-level failure taxonomy. Display strings are short, free of
/// internal detail, and safe to hand straight to a UI; the full causes
/// are logged server-side where they occur.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Plex access token is not configured. Set PLEX_TOKEN (or PLEX_TOKEN_FILE) and try again.")]
    MissingCredentials,

    #[error("No Plex server address is configured.")]
    NotConfigured,

    #[error("No configured Plex server could be reached.")]
    Unreachable,

    #[error("Something went wrong while reading the Plex library.")]
    Internal(#[source] anyhow::Error),
}

impl AggregateError {
    /// Configuration and connectivity problems are service-unavailable
    /// conditions; everything else is an internal error.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            AggregateError::MissingCredentials
                | AggregateError::NotConfigured
                | AggregateError::Unreachable
        )
    }
}
