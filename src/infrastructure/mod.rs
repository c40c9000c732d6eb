pub mod codec;
pub mod engine;
pub mod keys;
pub mod memory_engine;
pub mod order_repo;
pub mod redis_engine;

pub use engine::{EngineError, KeyValueEngine};
pub use memory_engine::MemoryEngine;
pub use order_repo::KvOrderRepository;
pub use redis_engine::RedisEngine;
