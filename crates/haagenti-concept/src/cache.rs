//! Prompt embedding cache
//!
//! Maps prompt text to the embedding the encoder produced for it, so each
//! distinct prompt is encoded once per training run. The cache never
//! decides when to populate itself and never evicts.
//!
//! `put` takes `&mut self`; callers sharing one cache across workers wrap
//! it in a lock ([`SharedPromptCache`]) and must not read a key while its
//! first write is in flight.

use crate::LatentTensor;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Cache shared between training workers
pub type SharedPromptCache = Arc<RwLock<PromptCache>>;

/// Lookup statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total lookups
    pub lookups: u64,
    /// Lookups that found an entry
    pub hits: u64,
    /// Entries in cache
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate
    pub fn hit_rate(&self) -> f32 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f32 / self.lookups as f32
        }
    }
}

/// Prompt text to embedding store
#[derive(Debug, Default)]
pub struct PromptCache {
    prompts: HashMap<String, Arc<LatentTensor>>,
    lookups: AtomicU64,
    hits: AtomicU64,
}

impl PromptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache behind a lock for sharing between workers
    pub fn shared() -> SharedPromptCache {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Store an embedding, replacing any previous one for `key`
    pub fn put(&mut self, key: impl Into<String>, embedding: impl Into<Arc<LatentTensor>>) {
        let key = key.into();
        if self.prompts.insert(key.clone(), embedding.into()).is_some() {
            debug!("Replaced cached embedding for '{}'", key);
        }
    }

    /// Look up an embedding; `None` if the prompt was never stored
    pub fn get(&self, key: &str) -> Option<Arc<LatentTensor>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let found = self.prompts.get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Whether `key` has an embedding; not counted as a lookup
    pub fn contains(&self, key: &str) -> bool {
        self.prompts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            entries: self.prompts.len(),
        }
    }
}
