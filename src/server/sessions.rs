//! Per-album session store.
//!
//! Session ids are random UUIDs minted on a successful Basic-Auth exchange and
//! live until the process exits. Each album owns one [`SessionSet`], shared via
//! `Arc` so it survives registry rebuilds while the album stays published.

use parking_lot::RwLock;
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

/// Sessions kept per album before the oldest is evicted.
pub const MAX_SESSIONS: usize = 4096;

/// Bounded set of valid session ids, oldest evicted first.
#[derive(Debug)]
pub struct SessionSet {
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Default for SessionSet {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl SessionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                ids: HashSet::new(),
                order: VecDeque::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().ids.contains(id)
    }

    /// Mint and record a new session id.
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.inner.write();
        if inner.order.len() >= inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.ids.remove(&oldest);
            }
        }
        inner.ids.insert(id.clone());
        inner.order.push_back(id.clone());
        id
    }

    pub fn len(&self) -> usize {
        self.inner.read().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
