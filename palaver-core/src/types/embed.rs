//! Embedding request and response types for `/api/embed`

use crate::types::request::Model;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request for embeddings of one or more inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// The embedding model
    pub model: Model,
    /// Texts to embed
    pub input: Vec<String>,
    /// How long the model stays loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    /// Model options
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl EmbedRequest {
    /// Create a request for the given inputs
    pub fn new(input: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            input: input.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.model = model.into();
        self
    }

    /// Add another input
    pub fn input(mut self, text: impl Into<String>) -> Self {
        self.input.push(text.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options
            .insert("temperature".to_string(), Value::from(temperature));
        self
    }

    /// Set how long the model stays loaded
    pub fn keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.keep_alive = Some(duration.into());
        self
    }
}

/// Embeddings in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// Model that produced the embeddings
    #[serde(default)]
    pub model: String,
    /// One vector per input
    pub embeddings: Vec<Vec<f32>>,
    /// Total time spent, in nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    /// Time spent loading the model, in nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    /// Tokens in the inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
}
