use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::domain::audio_decoder::{AudioDecoder, DecodedAudio};
use crate::shared::error::{AugmentError, Result};

/// Bounded least-recently-used cache of decoded audio files.
///
/// Each operator owns its own cache; it is not meant to be shared between
/// threads. Entries are immutable and handed out as `Arc`s. A miss decodes
/// synchronously.
pub struct AudioCache {
    decoder: Box<dyn AudioDecoder>,
    capacity: usize,
    entries: HashMap<PathBuf, Arc<DecodedAudio>>,
    /// Front is least recently used.
    recency: VecDeque<PathBuf>,
    hits: usize,
    misses: usize,
}

impl AudioCache {
    pub fn new(decoder: Box<dyn AudioDecoder>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(AugmentError::config("lru_cache_size must be at least 1"));
        }
        Ok(Self {
            decoder,
            capacity,
            entries: HashMap::new(),
            recency: VecDeque::new(),
            hits: 0,
            misses: 0,
        })
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<DecodedAudio>> {
        if let Some(entry) = self.entries.get(path).cloned() {
            self.hits += 1;
            self.touch(path);
            return Ok(entry);
        }

        self.misses += 1;
        log::debug!("Decoding {} (cache miss)", path.display());
        let decoded = Arc::new(self.decoder.decode(path)?);

        self.entries.insert(path.to_path_buf(), decoded.clone());
        self.recency.push_back(path.to_path_buf());
        while self.entries.len() > self.capacity {
            match self.recency.pop_front() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                }
                None => break,
            }
        }
        Ok(decoded)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    fn touch(&mut self, path: &Path) {
        if let Some(pos) = self.recency.iter().position(|p| p == path) {
            if let Some(key) = self.recency.remove(pos) {
                self.recency.push_back(key);
            }
        }
    }
}
