//! In-process engine for local runs and tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::engine::{EngineError, KeyValueEngine};

/// Used when a scan asks for zero members, matching Redis' default COUNT.
const DEFAULT_SCAN_COUNT: usize = 10;

#[derive(Debug, Default)]
struct State {
    records: HashMap<String, Vec<u8>>,
    sets: HashMap<String, BTreeSet<String>>,
}

/// Every operation runs under one lock, so the indexed writes are atomic.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    state: Arc<Mutex<State>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, EngineError> {
        self.state
            .lock()
            .map_err(|_| EngineError::Backend("memory engine lock poisoned".to_string()))
    }

    /// Adds a bare index member with no record behind it.
    #[cfg(test)]
    pub(crate) fn force_index_member(&self, index: &str, key: &str) {
        let mut state = self.state.lock().expect("lock");
        state.sets.entry(index.to_string()).or_default().insert(key.to_string());
    }

    /// Overwrites a record without touching any index.
    #[cfg(test)]
    pub(crate) fn force_record(&self, key: &str, value: &[u8]) {
        let mut state = self.state.lock().expect("lock");
        state.records.insert(key.to_string(), value.to_vec());
    }

    #[cfg(test)]
    pub(crate) fn index_members(&self, index: &str) -> Vec<String> {
        let state = self.state.lock().expect("lock");
        state
            .sets
            .get(index)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn record_count(&self) -> usize {
        self.state.lock().expect("lock").records.len()
    }
}

#[async_trait]
impl KeyValueEngine for MemoryEngine {
    async fn insert_indexed(
        &self,
        key: &str,
        value: Vec<u8>,
        index: &str,
    ) -> Result<bool, EngineError> {
        let mut state = self.lock()?;
        if state.records.contains_key(key) {
            return Ok(false);
        }
        state.records.insert(key.to_string(), value);
        state.sets.entry(index.to_string()).or_default().insert(key.to_string());
        Ok(true)
    }

    async fn replace(&self, key: &str, value: Vec<u8>) -> Result<bool, EngineError> {
        let mut state = self.lock()?;
        match state.records.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.lock()?.records.get(key).cloned())
    }

    async fn remove_indexed(&self, key: &str, index: &str) -> Result<bool, EngineError> {
        let mut state = self.lock()?;
        if state.records.remove(key).is_none() {
            return Ok(false);
        }
        if let Some(set) = state.sets.get_mut(index) {
            set.remove(key);
            if set.is_empty() {
                state.sets.remove(index);
            }
        }
        Ok(true)
    }

    /// The cursor is the position of the next member in key order.
    async fn scan_index(
        &self,
        index: &str,
        cursor: u64,
        count: usize,
    ) -> Result<(u64, Vec<String>), EngineError> {
        let state = self.lock()?;
        let Some(set) = state.sets.get(index) else {
            return Ok((0, Vec::new()));
        };

        let count = if count == 0 { DEFAULT_SCAN_COUNT } else { count };
        let start = usize::try_from(cursor).unwrap_or(usize::MAX);
        let keys: Vec<String> = set.iter().skip(start).take(count).cloned().collect();

        let end = start.saturating_add(keys.len());
        let next = if end >= set.len() { 0 } else { end as u64 };
        Ok((next, keys))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, EngineError> {
        let state = self.lock()?;
        Ok(keys.iter().map(|k| state.records.get(k).cloned()).collect())
    }
}
