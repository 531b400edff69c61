//! Semantic chunking on embedding distance breakpoints
//!
//! Sentences are embedded together with their neighbours, and a chunk boundary
//! is placed wherever the cosine distance between consecutive sentences rises
//! above a percentile of all distances in the unit.

use std::sync::Arc;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::providers::{cosine_similarity, EmbeddingProvider};
use crate::types::{Chunk, ChunkMetadata, DocumentUnit, UnitKind};

/// Splits document units into semantically coherent chunks
pub struct SemanticChunker {
    embedder: Arc<dyn EmbeddingProvider>,
    config: ChunkingConfig,
}

impl SemanticChunker {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: ChunkingConfig) -> Self {
        Self { embedder, config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk every unit; slides stay whole
    pub async fn split_units(&self, units: &[DocumentUnit]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();

        for unit in units {
            let metadata = ChunkMetadata::from_metadata(unit.metadata());
            let texts = match unit.kind() {
                UnitKind::Slide => vec![unit.content().to_string()],
                UnitKind::Element => self.split_text(unit.content()).await?,
            };

            chunks.extend(
                texts
                    .into_iter()
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| Chunk::new(t, metadata.clone())),
            );
        }

        tracing::debug!("Split {} units into {} chunks", units.len(), chunks.len());
        Ok(chunks)
    }

    /// Split one text into chunks
    pub async fn split_text(&self, text: &str) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.len() < 2 {
            return Ok(sentences);
        }

        let combined = combine_sentences(&sentences, self.config.buffer_size);
        let embeddings = self.embedder.embed_batch(&combined).await?;
        if embeddings.len() != combined.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                combined.len(),
                embeddings.len()
            )));
        }

        let distances: Vec<f32> = embeddings
            .windows(2)
            .map(|pair| 1.0 - cosine_similarity(&pair[0], &pair[1]))
            .collect();
        let threshold = percentile(&distances, self.config.breakpoint_percentile);

        let mut chunks = Vec::new();
        let mut start = 0;
        for (index, distance) in distances.iter().enumerate() {
            if *distance <= threshold {
                continue;
            }
            let group = sentences[start..=index].join(" ");
            if let Some(min) = self.config.min_chunk_size {
                if group.chars().count() < min {
                    continue;
                }
            }
            chunks.push(group);
            start = index + 1;
        }

        if start < sentences.len() {
            chunks.push(sentences[start..].join(" "));
        }

        Ok(chunks)
    }
}

/// Split on whitespace that follows `.`, `?` or `!`; empty pieces are dropped
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() && current.ends_with(|p: char| matches!(p, '.' | '?' | '!')) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            sentences.push(std::mem::take(&mut current));
            continue;
        }
        current.push(c);
    }
    sentences.push(current);

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Each sentence joined with `buffer` neighbours on both sides
fn combine_sentences(sentences: &[String], buffer: usize) -> Vec<String> {
    (0..sentences.len())
        .map(|i| {
            let lo = i.saturating_sub(buffer);
            let hi = (i + buffer).min(sentences.len() - 1);
            sentences[lo..=hi].join(" ")
        })
        .collect()
}

/// Percentile with linear interpolation between closest ranks
fn percentile(values: &[f32], pct: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f32)
}
