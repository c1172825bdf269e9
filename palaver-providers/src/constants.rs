//! Constants for the Ollama transport

/// Default Ollama host
pub const OLLAMA_DEFAULT_HOST: &str = "http://localhost:11434";

/// Default Ollama model, used when a request names none
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.2";

/// Environment variable overriding the host
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// Environment variable overriding the default model
pub const OLLAMA_MODEL_ENV: &str = "OLLAMA_MODEL";

/// Default request timeout in seconds; local models can be slow to load
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Chat endpoint path
pub const CHAT_PATH: &str = "/api/chat";

/// Embedding endpoint path
pub const EMBED_PATH: &str = "/api/embed";
