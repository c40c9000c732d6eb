//! Redis-backed engine.
//!
//! Record keys are plain strings and the index is a Redis set. The two
//! indexed writes run as Lua scripts, so Redis executes each of them
//! atomically and a failed precondition writes nothing at all.

use async_trait::async_trait;
use log::info;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};

use super::engine::{EngineError, KeyValueEngine};

// Scripts are not rolled back on error, so the index type is checked before
// the first write.
const INSERT_INDEXED: &str = r"
local t = redis.call('TYPE', KEYS[2]).ok
if t ~= 'set' and t ~= 'none' then
    return redis.error_reply('WRONGTYPE index ' .. KEYS[2] .. ' is not a set')
end
if redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    redis.call('SADD', KEYS[2], KEYS[1])
    return 1
end
return 0
";

const REMOVE_INDEXED: &str = r"
local t = redis.call('TYPE', KEYS[2]).ok
if t ~= 'set' and t ~= 'none' then
    return redis.error_reply('WRONGTYPE index ' .. KEYS[2] .. ' is not a set')
end
if redis.call('DEL', KEYS[1]) == 1 then
    redis.call('SREM', KEYS[2], KEYS[1])
    return 1
end
return 0
";

/// Cheap to clone; clones multiplex over the same connection.
#[derive(Clone)]
pub struct RedisEngine {
    conn: ConnectionManager,
    insert_indexed: Script,
    remove_indexed: Script,
}

impl RedisEngine {
    /// Connects to `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> Result<Self, EngineError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Connected to Redis at {}", url);

        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            insert_indexed: Script::new(INSERT_INDEXED),
            remove_indexed: Script::new(REMOVE_INDEXED),
        }
    }
}

#[async_trait]
impl KeyValueEngine for RedisEngine {
    async fn insert_indexed(
        &self,
        key: &str,
        value: Vec<u8>,
        index: &str,
    ) -> Result<bool, EngineError> {
        let mut conn = self.conn.clone();
        let created: i64 = self
            .insert_indexed
            .key(key)
            .key(index)
            .arg(value)
            .invoke_async(&mut conn)
            .await?;
        Ok(created == 1)
    }

    async fn replace(&self, key: &str, value: Vec<u8>) -> Result<bool, EngineError> {
        let mut conn = self.conn.clone();
        // SET .. XX replies nil when the key is absent.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
        let mut conn = self.conn.clone();
        let bytes: Option<Vec<u8>> = conn.get(key).await?;
        Ok(bytes)
    }

    async fn remove_indexed(&self, key: &str, index: &str) -> Result<bool, EngineError> {
        let mut conn = self.conn.clone();
        let removed: i64 = self
            .remove_indexed
            .key(key)
            .key(index)
            .invoke_async(&mut conn)
            .await?;
        Ok(removed == 1)
    }

    async fn scan_index(
        &self,
        index: &str,
        cursor: u64,
        count: usize,
    ) -> Result<(u64, Vec<String>), EngineError> {
        let mut conn = self.conn.clone();
        let (next, keys): (u64, Vec<String>) = redis::cmd("SSCAN")
            .arg(index)
            .arg(cursor)
            .arg("COUNT")
            .arg(count.max(1))
            .query_async(&mut conn)
            .await?;
        Ok((next, keys))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, EngineError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        // Always MGET so a single key still comes back as a one-element array.
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }
}
