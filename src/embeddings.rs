//! Sentence embeddings for the embedding-based lure path (spec.md §4.2).
//!
//! Grounded on the teacher's `workspace::embeddings::EmbeddingProvider`
//! trait shape (one trait, swappable backends). The pattern-based lure
//! path never needs this; it is only consulted when
//! `Config::embedding_lure_enabled` is set, which is off by default so
//! that organ results stay bit-deterministic without a model loaded
//! (spec.md §8 property 6).

use crate::atoms::EMBEDDING_DIM;

/// Errors from the embedding backend.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding model failed to initialize: {0}")]
    InitializationError(String),

    #[error("embedding inference failed: {0}")]
    ExecutionError(String),
}

/// A provider of fixed-dimension sentence embeddings.
pub trait EmbeddingProvider: Send + Sync {
    fn dimension(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// `fastembed`-backed provider (teacher dependency, used here for local,
/// offline sentence embeddings rather than an external embedding API).
pub struct FastEmbedProvider {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

impl FastEmbedProvider {
    pub fn new() -> Result<Self, EmbeddingError> {
        let model = fastembed::TextEmbedding::try_new(Default::default())
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbeddingError::ExecutionError(e.to_string()))?;
        let mut embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::ExecutionError(e.to_string()))?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::ExecutionError("empty embedding batch".to_string()))
    }
}

/// Deterministic stand-in used in tests and whenever the real model isn't
/// loaded: derives a unit vector from the text's hash so cosine similarity
/// is still meaningful for identical/near-identical strings.
pub struct DeterministicEmbeddingProvider {
    dimension: usize,
}

impl DeterministicEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for DeterministicEmbeddingProvider {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl EmbeddingProvider for DeterministicEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let normalized = text.to_lowercase();
        let mut v = vec![0f32; self.dimension];
        let mut state: u64 = 0xcbf29ce484222325 ^ normalized.len() as u64;
        for b in normalized.as_bytes() {
            state ^= *b as u64;
            state = state.wrapping_mul(0x100000001b3);
        }
        for slot in v.iter_mut() {
            state = state
                .wrapping_add(0x9E3779B97F4A7C15)
                .wrapping_mul(0xBF58476D1CE4E5B9);
            let bits = (state >> 11) as f64 / (1u64 << 53) as f64;
            *slot = (bits * 2.0 - 1.0) as f32;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}

/// Cosine similarity between two equal-length vectors; 0.0 if either is a
/// zero vector or the lengths mismatch.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        (dot / (na * nb)) as f64
    }
}
