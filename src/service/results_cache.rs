//! TTL cache for computed election results.
//!
//! Only results of completed elections are stored, and those cannot change
//! while the election exists. Deleting an election invalidates its entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::{ElectionId, ElectionResults};

#[derive(Debug)]
struct CachedResults {
    stored_at: Instant,
    results: Arc<ElectionResults>,
}

/// Results keyed by election, each valid for a fixed TTL.
#[derive(Debug)]
pub struct ResultsCache {
    ttl: Duration,
    entries: RwLock<HashMap<ElectionId, CachedResults>>,
}

impl ResultsCache {
    /// Creates an empty cache. A zero `ttl` disables caching.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached results if present and not expired.
    pub async fn get(&self, election_id: ElectionId) -> Option<Arc<ElectionResults>> {
        let entries = self.entries.read().await;
        entries
            .get(&election_id)
            .filter(|c| c.stored_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.results))
    }

    /// Stores results for `election_id`, dropping expired entries.
    pub async fn insert(&self, election_id: ElectionId, results: Arc<ElectionResults>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, c| c.stored_at.elapsed() < ttl);
        entries.insert(
            election_id,
            CachedResults {
                stored_at: Instant::now(),
                results,
            },
        );
    }

    /// Removes the entry for `election_id`.
    pub async fn invalidate(&self, election_id: ElectionId) {
        self.entries.write().await.remove(&election_id);
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
