use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::warn;

/// Source of the Plex access token. The proxy only needs a non-empty
/// string back; how the provider stores or refreshes it is its own
/// business. The token is a capability and must never be logged.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

/// Reads the token from `PLEX_TOKEN`, falling back to the file named by
/// `PLEX_TOKEN_FILE` (the usual Docker-secret arrangement).
#[derive(Debug, Default)]
pub struct EnvTokenProvider;

impl EnvTokenProvider {
    pub fn new() -> Self {
        Self
    }

    fn read_token_file(path: PathBuf) -> Result<String> {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        Ok(raw.trim().to_string())
    }
}

#[async_trait]
impl AccessTokenProvider for EnvTokenProvider {
    async fn access_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var("PLEX_TOKEN") {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Some(token);
            }
        }

        if let Ok(path) = std::env::var("PLEX_TOKEN_FILE") {
            match Self::read_token_file(PathBuf::from(path)) {
                Ok(token) if !token.is_empty() => return Some(token),
                Ok(_) => warn!("Plex token file exists but is empty"),
                Err(err) => warn!("Plex token file unreadable: {:#}", err),
            }
        }

        None
    }
}

/// Fixed token, for tests and one-off tooling.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn missing() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}
