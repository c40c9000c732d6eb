use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by the engine itself: transport, script or lock trouble.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("{0}")]
    Backend(String),
}

/// Primitives the order store needs from a key-value engine.
///
/// The two `*_indexed` operations touch a record key and an index set and
/// must commit as one unit: either both changes are visible or neither is.
#[async_trait]
pub trait KeyValueEngine: Send + Sync + 'static {
    /// Writes `value` at `key` only if `key` is absent, and in the same unit
    /// adds `key` to the set `index`. Returns `false` (and changes nothing)
    /// when `key` already existed.
    async fn insert_indexed(
        &self,
        key: &str,
        value: Vec<u8>,
        index: &str,
    ) -> Result<bool, EngineError>;

    /// Overwrites `key` only if it exists. Returns whether it existed.
    async fn replace(&self, key: &str, value: Vec<u8>) -> Result<bool, EngineError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError>;

    /// Deletes `key` and removes it from `index` as one unit. Returns `false`
    /// (and leaves the index alone) when `key` did not exist.
    async fn remove_indexed(&self, key: &str, index: &str) -> Result<bool, EngineError>;

    /// One step of an incremental scan over `index`. `count` is a hint; the
    /// engine may return more or fewer members. A returned cursor of `0`
    /// means the scan is complete.
    async fn scan_index(
        &self,
        index: &str,
        cursor: u64,
        count: usize,
    ) -> Result<(u64, Vec<String>), EngineError>;

    /// Bulk read with one slot per requested key, `None` where absent.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, EngineError>;
}
