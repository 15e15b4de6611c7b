use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::order::Order;

/// Bounded least-recently-used cache of orders keyed by `order_uid`.
///
/// Recency is tracked with a monotonically increasing tick: every touch
/// assigns the entry a fresh tick, and the entry with the smallest tick is
/// the eviction candidate.
pub struct OrderCache {
    capacity: usize,
    inner: Mutex<LruState>,
}

#[derive(Default)]
struct LruState {
    tick: u64,
    entries: HashMap<String, (u64, Arc<Order>)>,
    recency: BTreeMap<u64, String>,
}

impl LruState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &str) -> Option<Arc<Order>> {
        let tick = self.next_tick();
        let (old_tick, order) = self.entries.get_mut(key)?;
        self.recency.remove(&*old_tick);
        *old_tick = tick;
        self.recency.insert(tick, key.to_string());
        Some(Arc::clone(order))
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.recency.pop_first() {
            self.entries.remove(&key);
        }
    }

    fn push(&mut self, order: Arc<Order>) {
        let tick = self.next_tick();
        self.recency.insert(tick, order.order_uid.clone());
        self.entries.insert(order.order_uid.clone(), (tick, order));
    }
}

impl OrderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(LruState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace an order, marking it most recently used.
    pub fn set(&self, order: Arc<Order>) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.lock();

        if state.touch(&order.order_uid).is_some() {
            if let Some(entry) = state.entries.get_mut(&order.order_uid) {
                entry.1 = order;
            }
            return;
        }

        if state.entries.len() >= self.capacity {
            state.evict_oldest();
        }
        state.push(order);
    }

    /// Look up an order; a hit marks it most recently used.
    pub fn get(&self, order_uid: &str) -> Option<Arc<Order>> {
        self.lock().touch(order_uid)
    }

    /// Replace the whole cache with `orders`, loading in the given order
    /// until capacity is reached.
    pub fn load_batch(&self, orders: Vec<Arc<Order>>) {
        let mut state = self.lock();
        *state = LruState::default();

        for order in orders {
            if state.entries.len() >= self.capacity {
                break;
            }
            if !state.entries.contains_key(&order.order_uid) {
                state.push(order);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruState> {
        // State is consistent between statements, so a poisoned lock is usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::fixtures::sample_order;

    fn order(uid: &str) -> Arc<Order> {
        Arc::new(sample_order(uid))
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = OrderCache::new(3);
        assert_eq!(cache.capacity(), 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let cache = OrderCache::new(2);
        let o1 = order("1");
        cache.set(Arc::clone(&o1));

        let got = cache.get("1").unwrap();
        assert!(Arc::ptr_eq(&got, &o1));
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_update_existing_order() {
        let cache = OrderCache::new(2);

        let mut first = sample_order("1");
        first.delivery.email = "first@mail.com".to_string();
        cache.set(Arc::new(first));

        let mut second = sample_order("1");
        second.delivery.email = "second@mail.com".to_string();
        cache.set(Arc::new(second));

        assert_eq!(cache.get("1").unwrap().delivery.email, "second@mail.com");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_drops_least_recent() {
        let cache = OrderCache::new(2);
        cache.set(order("1"));
        cache.set(order("2"));
        cache.set(order("3"));

        assert!(cache.get("1").is_none());
        assert!(cache.get("2").is_some());
        assert!(cache.get("3").is_some());
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = OrderCache::new(2);
        cache.set(order("1"));
        cache.set(order("2"));

        cache.get("1");
        cache.set(order("3"));

        assert!(cache.get("2").is_none());
        assert!(cache.get("1").is_some());
    }

    #[test]
    fn test_update_refreshes_recency() {
        let cache = OrderCache::new(2);
        cache.set(order("1"));
        cache.set(order("2"));

        cache.set(order("1"));
        cache.set(order("3"));

        assert!(cache.get("2").is_none());
        assert!(cache.get("1").is_some());
    }

    #[test]
    fn test_zero_capacity_caches_nothing() {
        let cache = OrderCache::new(0);
        cache.set(order("1"));
        assert!(cache.get("1").is_none());
        cache.load_batch(vec![order("2")]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_batch_empty_clears() {
        let cache = OrderCache::new(3);
        cache.set(order("A"));
        cache.load_batch(Vec::new());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_batch_respects_capacity() {
        let cache = OrderCache::new(2);
        cache.load_batch(vec![order("A"), order("B"), order("C")]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("C").is_none());
        assert!(cache.get("A").is_some());
    }

    #[test]
    fn test_load_batch_replaces_old_data() {
        let cache = OrderCache::new(2);
        cache.set(order("OLD"));
        cache.load_batch(vec![order("NEW")]);

        assert!(cache.get("OLD").is_none());
        assert!(cache.get("NEW").is_some());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(OrderCache::new(100));
        let handles: Vec<_> = (0..16)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("key-{}", (t * 200 + i) % 150);
                        cache.set(Arc::new(sample_order(&key)));
                        cache.get(&key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 100);
    }
}
