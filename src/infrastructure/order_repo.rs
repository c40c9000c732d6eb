use async_trait::async_trait;
use log::debug;

use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderId};
use crate::domain::page::{Cursor, FindAllPage, FindResult};
use crate::domain::ports::OrderRepository;

use super::codec;
use super::engine::KeyValueEngine;
use super::keys::{order_key, INDEX_KEY};

// ── Repository ────────────────────────────────────────────────────────────────

/// Orders stored as one record per key plus a set indexing every live key.
///
/// No retries happen here; every engine failure goes straight back to the
/// caller with the operation and key attached.
pub struct KvOrderRepository<E> {
    engine: E,
}

impl<E: KeyValueEngine> KvOrderRepository<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: KeyValueEngine> OrderRepository for KvOrderRepository<E> {
    async fn insert(&self, cx: &Context, order: &Order) -> Result<(), DomainError> {
        let key = order_key(order.order_id);
        let data = codec::encode(&key, order)?;

        let created = cx
            .run("insert", async {
                self.engine
                    .insert_indexed(&key, data, INDEX_KEY)
                    .await
                    .map_err(|e| DomainError::engine("insert", key.as_str(), e))
            })
            .await?;

        if !created {
            return Err(DomainError::Duplicate { key });
        }
        debug!("Inserted {}", key);
        Ok(())
    }

    async fn find_by_id(&self, cx: &Context, id: OrderId) -> Result<Order, DomainError> {
        let key = order_key(id);

        let data = cx
            .run("find_by_id", async {
                self.engine
                    .get(&key)
                    .await
                    .map_err(|e| DomainError::engine("find_by_id", key.as_str(), e))
            })
            .await?;

        match data {
            Some(bytes) => codec::decode(&key, &bytes),
            None => Err(DomainError::NotFound { key }),
        }
    }

    async fn update(&self, cx: &Context, order: &Order) -> Result<(), DomainError> {
        let key = order_key(order.order_id);
        let data = codec::encode(&key, order)?;

        let existed = cx
            .run("update", async {
                self.engine
                    .replace(&key, data)
                    .await
                    .map_err(|e| DomainError::engine("update", key.as_str(), e))
            })
            .await?;

        if !existed {
            return Err(DomainError::NotFound { key });
        }
        debug!("Updated {}", key);
        Ok(())
    }

    async fn delete_by_id(&self, cx: &Context, id: OrderId) -> Result<(), DomainError> {
        let key = order_key(id);

        let existed = cx
            .run("delete_by_id", async {
                self.engine
                    .remove_indexed(&key, INDEX_KEY)
                    .await
                    .map_err(|e| DomainError::engine("delete_by_id", key.as_str(), e))
            })
            .await?;

        if !existed {
            return Err(DomainError::NotFound { key });
        }
        debug!("Deleted {}", key);
        Ok(())
    }

    async fn find_all(&self, cx: &Context, page: FindAllPage) -> Result<FindResult, DomainError> {
        let count = usize::try_from(page.size).unwrap_or(usize::MAX);

        let (next, keys) = cx
            .run("find_all", async {
                self.engine
                    .scan_index(INDEX_KEY, page.cursor.into(), count)
                    .await
                    .map_err(|e| DomainError::engine("find_all", INDEX_KEY, e))
            })
            .await?;
        let cursor = Cursor::from(next);
        debug!("Scanned {} keys from {:?}, next {:?}", keys.len(), page.cursor, cursor);

        if keys.is_empty() {
            return Ok(FindResult {
                orders: Vec::new(),
                cursor,
            });
        }

        let values = cx
            .run("find_all", async {
                self.engine
                    .get_many(&keys)
                    .await
                    .map_err(|e| DomainError::engine("find_all", INDEX_KEY, e))
            })
            .await?;

        if values.len() != keys.len() {
            return Err(DomainError::Decode {
                key: INDEX_KEY.to_string(),
                reason: format!(
                    "bulk read returned {} values for {} keys",
                    values.len(),
                    keys.len()
                ),
            });
        }

        let orders = keys
            .iter()
            .zip(values)
            .map(|(key, value)| match value {
                Some(bytes) => codec::decode(key, &bytes),
                None => Err(DomainError::Decode {
                    key: key.clone(),
                    reason: "indexed record is missing".to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FindResult { orders, cursor })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use super::KvOrderRepository;
    use crate::domain::context::Context;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{LineItem, Order, OrderId, OrderStatus, StatusTransition};
    use crate::domain::page::FindAllPage;
    use crate::domain::ports::OrderRepository;
    use crate::infrastructure::engine::{EngineError, KeyValueEngine};
    use crate::infrastructure::keys::{order_key, INDEX_KEY};
    use crate::infrastructure::memory_engine::MemoryEngine;

    /// Delegates to a `MemoryEngine` and counts bulk reads.
    #[derive(Default)]
    struct CountingEngine {
        inner: MemoryEngine,
        get_many_calls: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueEngine for CountingEngine {
        async fn insert_indexed(
            &self,
            key: &str,
            value: Vec<u8>,
            index: &str,
        ) -> Result<bool, EngineError> {
            self.inner.insert_indexed(key, value, index).await
        }

        async fn replace(&self, key: &str, value: Vec<u8>) -> Result<bool, EngineError> {
            self.inner.replace(key, value).await
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EngineError> {
            self.inner.get(key).await
        }

        async fn remove_indexed(&self, key: &str, index: &str) -> Result<bool, EngineError> {
            self.inner.remove_indexed(key, index).await
        }

        async fn scan_index(
            &self,
            index: &str,
            cursor: u64,
            count: usize,
        ) -> Result<(u64, Vec<String>), EngineError> {
            self.inner.scan_index(index, cursor, count).await
        }

        async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, EngineError> {
            self.get_many_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_many(keys).await
        }
    }

    fn setup() -> (MemoryEngine, KvOrderRepository<MemoryEngine>) {
        let engine = MemoryEngine::new();
        (engine.clone(), KvOrderRepository::new(engine))
    }

    fn cx() -> Context {
        Context::default().with_timeout(Duration::from_secs(5))
    }

    fn make_order(id: u64) -> Order {
        Order::new(
            OrderId(id),
            Uuid::new_v4(),
            vec![LineItem {
                item_id: Uuid::new_v4(),
                quantity: 6,
                price: 6000,
            }],
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn insert_and_find_by_id_roundtrip() {
        let (_engine, repo) = setup();
        let order = make_order(1);

        repo.insert(&cx(), &order).await.expect("insert failed");
        let found = repo.find_by_id(&cx(), OrderId(1)).await.expect("find failed");

        assert_eq!(found, order);
    }

    #[tokio::test]
    async fn second_insert_is_duplicate_and_keeps_first_value() {
        let (engine, repo) = setup();
        let first = make_order(7);
        let mut second = make_order(7);
        second.line_items.clear();

        repo.insert(&cx(), &first).await.expect("insert failed");
        let err = repo.insert(&cx(), &second).await.unwrap_err();

        assert!(matches!(err, DomainError::Duplicate { ref key } if key == "order:7"));
        assert_eq!(repo.find_by_id(&cx(), OrderId(7)).await.expect("find"), first);
        assert_eq!(engine.record_count(), 1);
        assert_eq!(engine.index_members(INDEX_KEY), vec!["order:7".to_string()]);
    }

    #[tokio::test]
    async fn find_by_id_unknown_is_not_found() {
        let (_engine, repo) = setup();
        let err = repo.find_by_id(&cx(), OrderId(404)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn find_by_id_corrupt_record_is_decode_error() {
        let (engine, repo) = setup();
        engine.force_record(&order_key(OrderId(3)), b"\x00\x01garbage");

        let err = repo.find_by_id(&cx(), OrderId(3)).await.unwrap_err();
        assert!(matches!(err, DomainError::Decode { ref key, .. } if key == "order:3"));
    }

    #[tokio::test]
    async fn update_of_unknown_order_is_not_found_and_creates_nothing() {
        let (engine, repo) = setup();

        let err = repo.update(&cx(), &make_order(9)).await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(engine.record_count(), 0);
        assert!(engine.index_members(INDEX_KEY).is_empty());
    }

    #[tokio::test]
    async fn update_replaces_whole_record() {
        let (_engine, repo) = setup();
        let mut order = make_order(11);
        repo.insert(&cx(), &order).await.expect("insert");

        order.apply(StatusTransition::Ship, Utc::now()).expect("ship");
        order.line_items.push(LineItem {
            item_id: Uuid::new_v4(),
            quantity: 1,
            price: 10,
        });
        repo.update(&cx(), &order).await.expect("update");

        assert_eq!(repo.find_by_id(&cx(), OrderId(11)).await.expect("find"), order);
    }

    #[tokio::test]
    async fn delete_removes_record_and_index_entry() {
        let (engine, repo) = setup();
        repo.insert(&cx(), &make_order(1)).await.expect("insert");
        repo.insert(&cx(), &make_order(2)).await.expect("insert");

        repo.delete_by_id(&cx(), OrderId(1)).await.expect("delete");

        let err = repo.find_by_id(&cx(), OrderId(1)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(engine.index_members(INDEX_KEY), vec!["order:2".to_string()]);

        let page = repo.find_all(&cx(), FindAllPage::first(100)).await.expect("find_all");
        assert!(page.orders.iter().all(|o| o.order_id != OrderId(1)));
    }

    #[tokio::test]
    async fn delete_of_unknown_order_is_not_found() {
        let (engine, repo) = setup();
        repo.insert(&cx(), &make_order(1)).await.expect("insert");

        let err = repo.delete_by_id(&cx(), OrderId(2)).await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { ref key } if key == "order:2"));
        assert_eq!(engine.index_members(INDEX_KEY), vec!["order:1".to_string()]);
    }

    #[tokio::test]
    async fn find_all_on_empty_index_is_empty_and_terminal() {
        let repo = KvOrderRepository::new(CountingEngine::default());

        let result = repo.find_all(&cx(), FindAllPage::first(5)).await.expect("find_all");

        assert!(result.orders.is_empty());
        assert!(result.is_last());
        assert_eq!(repo.engine.get_many_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn find_all_reads_a_non_empty_page_in_one_bulk_read() {
        let repo = KvOrderRepository::new(CountingEngine::default());
        repo.insert(&cx(), &make_order(1)).await.expect("insert");

        let result = repo.find_all(&cx(), FindAllPage::first(5)).await.expect("find_all");

        assert_eq!(result.orders.len(), 1);
        assert_eq!(repo.engine.get_many_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn find_all_cursor_chain_visits_every_order_once() {
        let (_engine, repo) = setup();
        let ids: HashSet<OrderId> = (1..=23).map(OrderId).collect();
        for id in &ids {
            repo.insert(&cx(), &make_order(id.0)).await.expect("insert");
        }

        let mut page = FindAllPage::first(5);
        let mut seen = Vec::new();
        let mut calls = 0;
        loop {
            let result = repo.find_all(&cx(), page).await.expect("find_all");
            seen.extend(result.orders.iter().map(|o| o.order_id));
            calls += 1;
            if result.is_last() {
                break;
            }
            page.cursor = result.cursor;
            assert!(calls < 100, "scan did not terminate");
        }

        assert_eq!(seen.len(), ids.len(), "no duplicates or omissions");
        assert_eq!(seen.into_iter().collect::<HashSet<_>>(), ids);
    }

    #[tokio::test]
    async fn find_all_surfaces_index_skew() {
        let (engine, repo) = setup();
        repo.insert(&cx(), &make_order(1)).await.expect("insert");
        engine.force_index_member(INDEX_KEY, "order:99");

        let err = repo.find_all(&cx(), FindAllPage::first(100)).await.unwrap_err();

        assert!(matches!(err, DomainError::Decode { ref key, .. } if key == "order:99"));
    }

    #[tokio::test]
    async fn find_all_surfaces_corrupt_record() {
        let (engine, repo) = setup();
        repo.insert(&cx(), &make_order(1)).await.expect("insert");
        engine.force_record("order:1", b"[]");

        let err = repo.find_all(&cx(), FindAllPage::first(100)).await.unwrap_err();
        assert!(matches!(err, DomainError::Decode { .. }));
    }

    #[tokio::test]
    async fn cancelled_context_changes_nothing() {
        let (engine, repo) = setup();
        let token = CancellationToken::new();
        token.cancel();
        let cx = Context::new(token);

        let err = repo.insert(&cx, &make_order(5)).await.unwrap_err();

        assert!(matches!(err, DomainError::Cancelled { op: "insert", .. }));
        assert_eq!(engine.record_count(), 0);
        assert!(engine.index_members(INDEX_KEY).is_empty());
    }

    #[tokio::test]
    async fn lifecycle_for_order_42() {
        let (_engine, repo) = setup();
        let order = make_order(42);
        repo.insert(&cx(), &order).await.expect("insert");

        let mut found = repo.find_by_id(&cx(), OrderId(42)).await.expect("find");
        assert_eq!(found.line_items, order.line_items);
        assert_eq!(found.line_items[0].quantity, 6);
        assert_eq!(found.line_items[0].price, 6000);

        found.apply(StatusTransition::Ship, Utc::now()).expect("ship");
        repo.update(&cx(), &found).await.expect("update shipped");
        found.apply(StatusTransition::Complete, Utc::now()).expect("complete");
        repo.update(&cx(), &found).await.expect("update completed");

        let mut stored = repo.find_by_id(&cx(), OrderId(42)).await.expect("find");
        assert_eq!(stored.status(), OrderStatus::Completed);
        assert!(stored.apply(StatusTransition::Ship, Utc::now()).is_err());
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_id_admit_exactly_one() {
        let (engine, repo) = setup();
        let repo = std::sync::Arc::new(repo);

        let attempts = (0..8).map(|_| {
            let repo = repo.clone();
            async move { repo.insert(&cx(), &make_order(77)).await }
        });
        let results = futures::future::join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, DomainError::Duplicate { .. })));
        assert_eq!(engine.index_members(INDEX_KEY).len(), 1);
    }
}
