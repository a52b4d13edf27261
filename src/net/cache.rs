//! Memoizing embedding provider.
//!
//! Word lists and repeated searches ask for the same text again and again.
//! `CachedEmbedder` answers repeats from memory and evicts the oldest entry
//! once `capacity` distinct texts have been stored.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use super::embed::{EmbedError, EmbeddingProvider};

struct Memo {
    entries: HashMap<String, Vec<f32>>,
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

/// Embedding cache in front of any provider.
pub struct CachedEmbedder<E> {
    inner: E,
    capacity: usize,
    memo: Mutex<Memo>,
}

impl<E: EmbeddingProvider> CachedEmbedder<E> {
    /// Wrap `inner`, remembering at most `capacity` texts (0 disables caching).
    pub fn new(inner: E, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            memo: Mutex::new(Memo {
                entries: HashMap::new(),
                order: VecDeque::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Number of cached texts.
    pub fn cached(&self) -> usize {
        self.memo.lock().entries.len()
    }

    /// Cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let memo = self.memo.lock();
        let total = memo.hits + memo.misses;
        if total == 0 {
            0.0
        } else {
            memo.hits as f64 / total as f64
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        {
            let mut memo = self.memo.lock();
            if let Some(hit) = memo.entries.get(text).cloned() {
                memo.hits += 1;
                log::debug!("Embedding cache HIT: {}", text);
                return Ok(hit);
            }
            memo.misses += 1;
        }

        // Lock released across the network call; failures are not cached.
        log::debug!("Embedding cache MISS: {}", text);
        let embedding = self.inner.embed(text)?;

        if self.capacity > 0 {
            let mut memo = self.memo.lock();
            if !memo.entries.contains_key(text) {
                while memo.entries.len() >= self.capacity {
                    match memo.order.pop_front() {
                        Some(oldest) => {
                            memo.entries.remove(&oldest);
                        }
                        None => break,
                    }
                }
                memo.order.push_back(text.to_string());
            }
            memo.entries.insert(text.to_string(), embedding.clone());
        }
        Ok(embedding)
    }
}
