//! Bounded in-memory cache of loaded models

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::error::ModelError;
use crate::registry::WhisperModel;

/// Maximum number of models kept resident at once
pub const MAX_CACHED: usize = 2;

/// Blocking collaborator that turns a model identifier into a loaded
/// handle. Loading may take several seconds and may download the model
/// file first.
pub trait ModelLoader {
    type Model;

    fn load(&self, model: WhisperModel) -> Result<Self::Model, ModelError>;
}

/// In-process model cache with strict insertion-order eviction.
///
/// Capacity is deliberately small to bound resident memory: whisper
/// models run to gigabytes. Eviction is FIFO on insertion order and
/// ignores access patterns, so repeated use of the oldest entry does not
/// protect it; a thrashing miss pattern simply pays the reload cost.
pub struct ModelCache<L: ModelLoader> {
    loader: L,
    capacity: usize,
    entries: VecDeque<(WhisperModel, L::Model)>,
}

impl<L: ModelLoader> ModelCache<L> {
    pub fn new(loader: L) -> Self {
        Self::with_capacity(loader, MAX_CACHED)
    }

    pub fn with_capacity(loader: L, capacity: usize) -> Self {
        Self {
            loader,
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, model: WhisperModel) -> bool {
        self.entries.iter().any(|(m, _)| *m == model)
    }

    /// Get the loaded handle for a model, loading it on a miss.
    ///
    /// On a miss the loader runs before anything is evicted, so a load
    /// failure leaves the cache untouched.
    pub fn acquire(&mut self, model: WhisperModel) -> Result<&L::Model, ModelError> {
        if let Some(pos) = self.entries.iter().position(|(m, _)| *m == model) {
            debug!("Model {} served from cache", model);
            return Ok(&self.entries[pos].1);
        }

        let handle = self.loader.load(model)?;

        while self.entries.len() >= self.capacity {
            if let Some((evicted, old)) = self.entries.pop_front() {
                info!("Evicting model {} from cache", evicted);
                // Release the old handle before inserting the new one so
                // both are never resident together
                drop(old);
            }
        }

        self.entries.push_back((model, handle));
        let last = self.entries.len() - 1;
        Ok(&self.entries[last].1)
    }
}
