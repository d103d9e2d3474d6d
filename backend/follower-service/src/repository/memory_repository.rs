//! In-process graph store
//!
//! Adjacency sets held behind a single async lock, so each mutation touches
//! both directions atomically. Used for local runs (`GRAPH_STORE=memory`)
//! and as the store under test.

use super::GraphStore;
use crate::domain::TwoHopCandidate;
use crate::error::{GraphError, GraphResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Adjacency {
    /// follower -> followees
    outgoing: HashMap<String, BTreeSet<String>>,
    /// followee -> followers
    incoming: HashMap<String, BTreeSet<String>>,
}

#[derive(Clone)]
pub struct MemoryGraphStore {
    state: Arc<RwLock<Adjacency>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Adjacency::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate the store going away (or coming back). While unavailable,
    /// every operation fails with `StoreUnavailable` and state is untouched.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored edges
    pub async fn edge_count(&self) -> usize {
        self.state.read().await.outgoing.values().map(BTreeSet::len).sum()
    }

    fn ensure_available(&self) -> GraphResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GraphError::StoreUnavailable(
                "in-memory store is offline".to_string(),
            ))
        }
    }
}

#[async_trait::async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_edge(&self, follower: &str, followee: &str) -> GraphResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write().await;

        state
            .outgoing
            .entry(follower.to_string())
            .or_default()
            .insert(followee.to_string());
        state
            .incoming
            .entry(followee.to_string())
            .or_default()
            .insert(follower.to_string());

        debug!("Upserted FOLLOWS: {} -> {}", follower, followee);
        Ok(())
    }

    async fn delete_edge(&self, follower: &str, followee: &str) -> GraphResult<u64> {
        self.ensure_available()?;
        let mut state = self.state.write().await;

        let removed = state
            .outgoing
            .get_mut(follower)
            .map(|followees| followees.remove(followee))
            .unwrap_or(false);

        if removed {
            if let Some(followers) = state.incoming.get_mut(followee) {
                followers.remove(follower);
            }
        }

        debug!("Deleted {} FOLLOWS: {} -> {}", removed as u64, follower, followee);
        Ok(removed as u64)
    }

    async fn out_neighbors(&self, user_id: &str) -> GraphResult<Vec<String>> {
        self.ensure_available()?;
        let state = self.state.read().await;

        Ok(state
            .outgoing
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn in_neighbors(&self, user_id: &str) -> GraphResult<Vec<String>> {
        self.ensure_available()?;
        let state = self.state.read().await;

        Ok(state
            .incoming
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn two_hop_candidates(&self, user_id: &str) -> GraphResult<Vec<TwoHopCandidate>> {
        self.ensure_available()?;
        let state = self.state.read().await;

        // Each intermediate is visited once and its followees form a set,
        // so every increment corresponds to one distinct intermediate.
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        if let Some(intermediates) = state.outgoing.get(user_id) {
            for intermediate in intermediates {
                if let Some(reachable) = state.outgoing.get(intermediate) {
                    for candidate in reachable {
                        *counts.entry(candidate.as_str()).or_insert(0) += 1;
                    }
                }
            }
        }

        Ok(counts
            .into_iter()
            .map(|(id, shared)| TwoHopCandidate::new(id, shared))
            .collect())
    }

    async fn ping(&self) -> GraphResult<()> {
        self.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryGraphStore::new();

        for _ in 0..3 {
            store.upsert_edge("alice", "bob").await.unwrap();
        }

        assert_eq!(store.edge_count().await, 1);
        assert_eq!(store.out_neighbors("alice").await.unwrap(), vec!["bob"]);
        assert_eq!(store.in_neighbors("bob").await.unwrap(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_delete_reports_count() {
        let store = MemoryGraphStore::new();
        store.upsert_edge("alice", "bob").await.unwrap();

        assert_eq!(store.delete_edge("alice", "bob").await.unwrap(), 1);
        assert_eq!(store.delete_edge("alice", "bob").await.unwrap(), 0);
        assert_eq!(store.delete_edge("nobody", "bob").await.unwrap(), 0);
        assert!(store.in_neighbors("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_converge() {
        let store = MemoryGraphStore::new();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert_edge("alice", "bob").await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.edge_count().await, 1);
    }

    #[tokio::test]
    async fn test_two_hop_counts_distinct_intermediates() {
        let store = MemoryGraphStore::new();
        store.upsert_edge("a", "b").await.unwrap();
        store.upsert_edge("a", "c").await.unwrap();
        store.upsert_edge("b", "d").await.unwrap();
        store.upsert_edge("b", "e").await.unwrap();
        store.upsert_edge("c", "d").await.unwrap();
        store.upsert_edge("b", "a").await.unwrap();

        let candidates = store.two_hop_candidates("a").await.unwrap();

        assert_eq!(
            candidates,
            vec![
                TwoHopCandidate::new("a", 1),
                TwoHopCandidate::new("d", 2),
                TwoHopCandidate::new("e", 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_offline_store_rejects_without_mutation() {
        let store = MemoryGraphStore::new();
        store.set_available(false);

        let err = store.upsert_edge("alice", "bob").await.unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(store.ping().await.is_err());

        store.set_available(true);
        assert_eq!(store.edge_count().await, 0);
        assert!(store.ping().await.is_ok());
    }
}
