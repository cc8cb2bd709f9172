//! Service configuration.
//!
//! The binary fills this in from command-line flags and environment
//! variables (see `src/bin/emorec-server.rs`); library users can build it
//! directly.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::EmoRecError;

/// Which text-embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingProvider {
    /// Local feature-hashing embedder; needs no network.
    #[default]
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

impl FromStr for EmbeddingProvider {
    type Err = EmoRecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hashing" | "local" => Ok(EmbeddingProvider::Hashing),
            "openai" | "openai-compatible" => Ok(EmbeddingProvider::OpenAi),
            other => Err(EmoRecError::InvalidRequest(format!(
                "Unknown embedding provider: {}",
                other
            ))),
        }
    }
}

/// Embedding backend configuration.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Full embeddings endpoint URL (OpenAI provider only).
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Vector width of the hashing embedder.
    pub dimensions: usize,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            api_url: "https://api.openai.com/v1/embeddings".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    /// Market used for artist top tracks.
    pub spotify_market: String,
    pub genius_access_token: Option<String>,
    pub embedding: EmbeddingConfig,
    pub collage_width: u32,
    pub collage_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            spotify_client_id: None,
            spotify_client_secret: None,
            spotify_market: "US".to_string(),
            genius_access_token: None,
            embedding: EmbeddingConfig::default(),
            collage_width: 800,
            collage_height: 600,
        }
    }
}

impl Config {
    /// Socket address to bind the HTTP server to.
    pub fn bind_addr(&self) -> Result<SocketAddr, EmoRecError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| EmoRecError::InvalidRequest(format!("Invalid bind address: {}", e)))
    }

    /// Spotify credentials, when both halves are present and non-empty.
    pub fn spotify_credentials(&self) -> Option<(&str, &str)> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }

    /// Genius token, when present and non-empty.
    pub fn genius_token(&self) -> Option<&str> {
        self.genius_access_token
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_spotify_credentials_need_both_halves() {
        let mut config = Config::default();
        assert!(config.spotify_credentials().is_none());

        config.spotify_client_id = Some("id".to_string());
        assert!(config.spotify_credentials().is_none());

        config.spotify_client_secret = Some(String::new());
        assert!(config.spotify_credentials().is_none());

        config.spotify_client_secret = Some("secret".to_string());
        assert_eq!(config.spotify_credentials(), Some(("id", "secret")));
    }

    #[test]
    fn test_embedding_provider_from_str() {
        assert_eq!("OpenAI".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::OpenAi);
        assert_eq!("hashing".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Hashing);
        assert!("bert".parse::<EmbeddingProvider>().is_err());
    }
}
