//! Weaviate vector store over the REST and GraphQL APIs
//!
//! Vectors are computed client-side (`vectorizer: none`). Class names follow
//! Weaviate's rule of an upper-case first letter, so the collection
//! `qwanza_docs` is stored as class `Qwanza_docs`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::embedding::EmbeddingProvider;
use super::vector_store::VectorStoreProvider;
use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, StoredRecord};

/// Weaviate-backed store for one collection
pub struct WeaviateStore {
    client: Client,
    base_url: String,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    /// Serialises schema creation and batch writes
    write_lock: Mutex<()>,
    closed: AtomicBool,
}

#[derive(Serialize)]
struct BatchObject<'a> {
    id: Uuid,
    class: &'a str,
    properties: ObjectProperties<'a>,
    vector: Vec<f32>,
}

#[derive(Serialize)]
struct ObjectProperties<'a> {
    content: &'a str,
    source: &'a str,
    page: u32,
}

#[derive(Deserialize)]
struct BatchResult {
    #[serde(default)]
    result: Option<BatchResultDetail>,
}

#[derive(Deserialize)]
struct BatchResultDetail {
    #[serde(default)]
    errors: Option<BatchErrors>,
}

#[derive(Deserialize)]
struct BatchErrors {
    #[serde(default)]
    error: Vec<BatchErrorMessage>,
}

#[derive(Deserialize)]
struct BatchErrorMessage {
    message: String,
}

#[derive(Deserialize)]
struct ObjectList {
    #[serde(default)]
    objects: Vec<ObjectEntry>,
}

#[derive(Deserialize)]
struct ObjectEntry {
    #[serde(default)]
    properties: Value,
}

impl WeaviateStore {
    /// Create a client for `config.url`; no request is made until first use
    pub fn new(config: &VectorDbConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            embedder,
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    /// Weaviate class name for a collection
    pub fn class_name(collection: &str) -> String {
        let mut chars = collection.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::vector_db("Weaviate client is closed"));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("GET {} failed: {}", url, e)))?;
        decode(resp, "GET", &url).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("POST {} failed: {}", url, e)))?;
        decode(resp, "POST", &url).await
    }

    /// Run a GraphQL query and return its `data` member
    async fn graphql(&self, query: String) -> Result<Value> {
        let response: Value = self.post_json("/v1/graphql", &json!({ "query": query })).await?;

        if let Some(errors) = response.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect();
                return Err(Error::vector_db(format!(
                    "GraphQL error: {}",
                    messages.join("; ")
                )));
            }
        }

        response
            .get("data")
            .cloned()
            .ok_or_else(|| Error::vector_db("GraphQL response has no data"))
    }

    async fn class_exists(&self, class: &str) -> Result<bool> {
        let url = self.url(&format!("/v1/schema/{}", class));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("GET {} failed: {}", url, e)))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => {
                let text = resp.text().await.unwrap_or_default();
                Err(Error::vector_db(format!("GET {} failed: {} {}", url, status, text)))
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response, method: &str, url: &str) -> Result<T> {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(Error::vector_db(format!(
            "{} {} failed: {} {}",
            method, url, status, text
        )));
    }
    serde_json::from_str::<T>(&text).map_err(|e| {
        Error::vector_db(format!("{} {} decode failed: {} | {}", method, url, e, text))
    })
}

fn record_from_properties(properties: &Value, distance: Option<f32>) -> StoredRecord {
    StoredRecord {
        content: properties
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        source: properties
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        page: properties
            .get("page")
            .and_then(Value::as_f64)
            .map(|p| p.max(0.0) as u32)
            .unwrap_or(0),
        distance,
    }
}

#[async_trait]
impl VectorStoreProvider for WeaviateStore {
    async fn ensure_collection(&self, name: &str) -> Result<bool> {
        self.check_open()?;
        let class = Self::class_name(name);
        let _guard = self.write_lock.lock().await;

        if self.class_exists(&class).await? {
            tracing::debug!("Weaviate class {} already exists", class);
            return Ok(false);
        }

        let schema = json!({
            "class": class,
            "vectorizer": "none",
            "properties": [
                { "name": "content", "dataType": ["text"] },
                { "name": "source", "dataType": ["text"] },
                { "name": "page", "dataType": ["number"] },
            ],
        });
        let _: Value = self.post_json("/v1/schema", &schema).await?;

        tracing::info!("Created Weaviate class {}", class);
        Ok(true)
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.check_open()?;
        self.class_exists(&Self::class_name(name)).await
    }

    async fn add(&self, chunks: Vec<Chunk>) -> Result<usize> {
        self.check_open()?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let class = Self::class_name(&self.collection);
        let objects: Vec<BatchObject<'_>> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| BatchObject {
                id: Uuid::new_v4(),
                class: &class,
                properties: ObjectProperties {
                    content: &chunk.content,
                    source: &chunk.metadata.source,
                    page: chunk.metadata.page,
                },
                vector,
            })
            .collect();

        let _guard = self.write_lock.lock().await;
        let results: Vec<BatchResult> = self
            .post_json("/v1/batch/objects", &json!({ "objects": objects }))
            .await?;

        let errors: Vec<String> = results
            .into_iter()
            .filter_map(|r| r.result?.errors)
            .flat_map(|e| e.error.into_iter().map(|m| m.message))
            .collect();
        if !errors.is_empty() {
            return Err(Error::vector_db(format!(
                "{} of {} objects rejected: {}",
                errors.len(),
                chunks.len(),
                errors.join("; ")
            )));
        }

        tracing::info!("Stored {} chunks in {}", chunks.len(), class);
        Ok(chunks.len())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<StoredRecord>> {
        self.check_open()?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;
        let class = Self::class_name(&self.collection);
        let gql = format!(
            "{{ Get {{ {class}(nearVector: {{vector: {vector}}}, limit: {k}) {{ content source page _additional {{ distance }} }} }} }}",
            class = class,
            vector = serde_json::to_string(&vector)?,
            k = k,
        );

        let data = self.graphql(gql).await?;
        let hits = data
            .get("Get")
            .and_then(|g| g.get(&class))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(hits
            .iter()
            .take(k)
            .map(|hit| {
                let distance = hit
                    .get("_additional")
                    .and_then(|a| a.get("distance"))
                    .and_then(Value::as_f64)
                    .map(|d| d as f32);
                record_from_properties(hit, distance)
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        self.check_open()?;
        let class = Self::class_name(&self.collection);
        let data = self
            .graphql(format!("{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}", class))
            .await?;

        Ok(data
            .get("Aggregate")
            .and_then(|a| a.get(&class))
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("meta"))
            .and_then(|m| m.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize)
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        self.check_open()?;
        let class = Self::class_name(&self.collection);
        let list: ObjectList = self
            .get_json(&format!("/v1/objects?class={}&limit={}", class, limit))
            .await?;

        Ok(list
            .objects
            .iter()
            .map(|o| record_from_properties(&o.properties, None))
            .collect())
    }

    async fn health_check(&self) -> Result<bool> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(false);
        }
        match self.client.get(self.url("/v1/.well-known/ready")).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        tracing::info!("Weaviate client closed");
        Ok(())
    }

    fn name(&self) -> &str {
        "weaviate"
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
