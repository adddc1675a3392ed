//! Bounded LRU answer cache keyed by (query, user).
//!
//! Memoizes answers so an identical question from the same user skips
//! retrieval and inference entirely. Keys are the literal strings — no
//! case or whitespace normalization. Capacity is configured; the
//! least-recently-used entry is evicted when a new answer would exceed it.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type CacheKey = (String, String);

struct CacheInner {
    map: HashMap<CacheKey, String>,
    /// Keys ordered least- to most-recently used.
    order: VecDeque<CacheKey>,
}

pub struct AnswerCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl AnswerCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Cached answer for `(query, user_id)`, refreshing its recency.
    pub fn get(&self, query: &str, user_id: &str) -> Option<String> {
        let key = (query.to_string(), user_id.to_string());
        let mut inner = self.inner.lock().unwrap();
        let answer = inner.map.get(&key).cloned()?;
        touch(&mut inner.order, &key);
        Some(answer)
    }

    /// Store an answer, evicting the least-recently-used entry at capacity.
    pub fn put(&self, query: &str, user_id: &str, answer: String) {
        let key = (query.to_string(), user_id.to_string());
        let mut inner = self.inner.lock().unwrap();

        if inner.map.insert(key.clone(), answer).is_some() {
            touch(&mut inner.order, &key);
            return;
        }

        inner.order.push_back(key);
        while inner.map.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn touch(order: &mut VecDeque<CacheKey>, key: &CacheKey) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        order.remove(pos);
        order.push_back(key.clone());
    }
}
