//! Configuration for the document QA service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocQaConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Semantic chunking configuration
    pub chunking: ChunkingConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Document loader configuration (OCR, legacy conversion)
    pub loader: LoaderConfig,
}

impl DocQaConfig {
    /// Load configuration from an optional TOML file, then apply
    /// `DOCQA_*` environment overrides.
    ///
    /// When `path` is `None`, `DOCQA_CONFIG` is consulted; with neither set the
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("DOCQA_CONFIG").map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides through `lookup` (injected so tests do not
    /// touch the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DOCQA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DOCQA_PORT") {
            self.server.port = parse_env("DOCQA_PORT", &port)?;
        }
        if let Some(url) = lookup("DOCQA_WEAVIATE_URL") {
            self.vector_db.url = url;
        }
        if let Some(collection) = lookup("DOCQA_COLLECTION") {
            self.vector_db.collection = collection;
        }
        if let Some(url) = lookup("DOCQA_OLLAMA_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("DOCQA_DEFAULT_MODEL") {
            self.llm.default_model = model;
        }
        if let Some(backend) = lookup("DOCQA_EMBEDDING_BACKEND") {
            self.embeddings.backend = match backend.to_lowercase().as_str() {
                "onnx" => EmbeddingBackend::Onnx,
                "ollama" => EmbeddingBackend::Ollama,
                other => {
                    return Err(Error::Config(format!(
                        "DOCQA_EMBEDDING_BACKEND must be 'onnx' or 'ollama', got '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(model) = lookup("DOCQA_EMBED_MODEL") {
            self.llm.embed_model = model;
        }
        if let Some(dims) = lookup("DOCQA_EMBEDDING_DIMENSIONS") {
            let dims = parse_env("DOCQA_EMBEDDING_DIMENSIONS", &dims)?;
            match self.embeddings.backend {
                EmbeddingBackend::Onnx => self.embeddings.dimensions = dims,
                EmbeddingBackend::Ollama => self.llm.embed_dimensions = dims,
            }
        }
        if let Some(top_k) = lookup("DOCQA_TOP_K") {
            self.retrieval.top_k = parse_env("DOCQA_TOP_K", &top_k)?;
        }
        if let Some(lang) = lookup("DOCQA_OCR_LANGUAGE") {
            self.loader.ocr_language = lang;
        }
        Ok(())
    }

    /// Vector size produced by the selected embedding backend
    pub fn embedding_dimensions(&self) -> usize {
        match self.embeddings.backend {
            EmbeddingBackend::Onnx => self.embeddings.dimensions,
            EmbeddingBackend::Ollama => self.llm.embed_dimensions,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", key, value, e)))
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Which embedder implementation to build at startup
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX Runtime inference
    #[default]
    Onnx,
    /// Ollama embeddings endpoint
    Ollama,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedder implementation
    pub backend: EmbeddingBackend,
    /// Hugging Face model id (ONNX backend)
    pub model: String,
    /// Embedding dimensions of the ONNX model (384 for the multilingual MiniLM)
    pub dimensions: usize,
    /// Batch size for embedding generation
    pub batch_size: usize,
    /// Maximum sequence length in tokens
    pub max_length: usize,
    /// Intra-op threads for the ONNX session
    pub threads: usize,
    /// Cache directory for downloaded models
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Onnx,
            model: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            dimensions: 384,
            batch_size: 32,
            max_length: 128,
            threads: 4,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("docqa")
                .join("models"),
        }
    }
}

/// Semantic chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Percentile of sentence distances above which a breakpoint is placed
    pub breakpoint_percentile: f32,
    /// Neighbouring sentences on each side combined before embedding
    pub buffer_size: usize,
    /// Groups shorter than this (in characters) are merged forward
    pub min_chunk_size: Option<usize>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            breakpoint_percentile: 95.0,
            buffer_size: 1,
            min_chunk_size: None,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Embedding model name (Ollama embedding backend only)
    pub embed_model: String,
    /// Vector size of `embed_model` (768 for nomic-embed-text)
    pub embed_dimensions: usize,
    /// Temperature for generation; `None` keeps the model's default
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            default_model: "llama3.2".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            embed_dimensions: 768,
            temperature: None,
            timeout_secs: 300,
            max_retries: 0,
        }
    }
}

/// Which vector store implementation to build at startup
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Weaviate over REST/GraphQL
    #[default]
    Weaviate,
    /// Process-local store, lost on restart
    Memory,
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Store implementation
    pub backend: VectorBackend,
    /// Weaviate base URL
    pub url: String,
    /// Collection holding the document corpus
    pub collection: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Weaviate,
            url: "http://localhost:8080".to_string(),
            collection: "qwanza_docs".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks fed to the model
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Document loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Run OCR on slide images
    pub ocr_enabled: bool,
    /// Tesseract language
    pub ocr_language: String,
    /// Tesseract executable
    pub tesseract_cmd: String,
    /// LibreOffice executable used to convert legacy `.ppt`
    pub libreoffice_cmd: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            ocr_language: "fra".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            libreoffice_cmd: "libreoffice".to_string(),
        }
    }
}
