//! OpenAI-compatible embeddings client.
//!
//! Posts `{"model": ..., "input": [...]}` to a configurable `/embeddings`
//! endpoint and returns one vector per input, in input order.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::EmbeddingConfig;
use crate::error::{EmoRecError, Result};

/// Remote embedder speaking the OpenAI embeddings wire format.
#[derive(Debug, Clone)]
pub struct RemoteEmbedder {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl RemoteEmbedder {
    /// Create a client from embedding configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmoRecError::EmbeddingError(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Embed a batch of texts.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("POST {} ({} inputs, model {})", self.api_url, texts.len(), self.model);

        let mut request = self
            .client
            .post(&self.api_url)
            .json(&json!({ "model": self.model, "input": texts }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let data: Value = response.json().await?;

        if !status.is_success() {
            let message = data
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            error!("Embedding API error ({}): {}", status, message);
            return Err(EmoRecError::EmbeddingError(format!("{}: {}", status, message)));
        }

        parse_embeddings(&data, texts.len())
    }
}

/// Extract vectors from an embeddings response, ordered by `index`.
fn parse_embeddings(data: &Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let items = data
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| EmoRecError::EmbeddingError("Response has no data array".to_string()))?;

    let mut indexed: Vec<(u64, Vec<f32>)> = items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let index = item
                .get("index")
                .and_then(|i| i.as_u64())
                .unwrap_or(position as u64);
            let vector = item
                .get("embedding")
                .and_then(|e| e.as_array())
                .map(|arr| arr.iter().filter_map(|x| x.as_f64()).map(|x| x as f32).collect())
                .unwrap_or_default();
            (index, vector)
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);

    let vectors: Vec<Vec<f32>> = indexed.into_iter().map(|(_, v)| v).collect();
    if vectors.len() != expected || vectors.iter().any(|v| v.is_empty()) {
        return Err(EmoRecError::EmbeddingError(format!(
            "Expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embeddings_orders_by_index() {
        let data = json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vectors = parse_embeddings(&data, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_parse_embeddings_rejects_short_response() {
        let data = json!({"data": [{"index": 0, "embedding": [1.0]}]});
        assert!(parse_embeddings(&data, 2).is_err());
        assert!(parse_embeddings(&json!({}), 1).is_err());
    }
}
