use gomoku_core::board::Board;
use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Bounded board-keyed cache with a time-to-live.
///
/// Eviction is by insertion order: once full, the oldest inserted key is dropped, regardless of
/// how recently it was read. Overwriting an existing key keeps its original slot in that order.
#[derive(Debug)]
pub struct PredictionCache<V> {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<String, (V, Instant)>,
    order: VecDeque<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}

impl<V: Clone> Default for PredictionCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl<V: Clone> PredictionCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn set(&mut self, board: &Board, value: V) {
        let key = board.signature();

        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = (value, Instant::now());
            return;
        }

        while self.capacity <= self.entries.len() {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }

        debug!(key = %key, "prediction cached");
        self.order.push_back(key.clone());
        self.entries.insert(key, (value, Instant::now()));
    }

    /// Returns the cached value for `board` unless it is older than the TTL, in which case the
    /// entry is dropped.
    pub fn get(&mut self, board: &Board) -> Option<V> {
        let key = board.signature();
        let (value, inserted_at) = self.entries.get(&key)?;
        let age = inserted_at.elapsed();

        if self.ttl < age {
            debug!(key = %key, age_ms = age.as_millis() as u64, "prediction expired");
            self.remove(&key);
            return None;
        }

        debug!(key = %key, age_ms = age.as_millis() as u64, "prediction cache hit");
        Some(value.clone())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            capacity: self.capacity,
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}
