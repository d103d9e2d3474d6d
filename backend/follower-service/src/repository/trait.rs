use crate::domain::TwoHopCandidate;
use crate::error::GraphResult;

/// Storage and traversal primitives for the FOLLOWS relation.
/// Both Neo4jGraphStore and MemoryGraphStore implement this.
///
/// Every mutation is a single atomic store operation: it either commits fully
/// or leaves observable state unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    /// Create both user nodes and the follower -> followee edge if absent
    async fn upsert_edge(&self, follower: &str, followee: &str) -> GraphResult<()>;

    /// Remove the follower -> followee edge; returns the number removed (0 or 1)
    async fn delete_edge(&self, follower: &str, followee: &str) -> GraphResult<u64>;

    /// Direct followees of a user, sorted and de-duplicated
    async fn out_neighbors(&self, user_id: &str) -> GraphResult<Vec<String>>;

    /// Direct followers of a user, sorted and de-duplicated
    async fn in_neighbors(&self, user_id: &str) -> GraphResult<Vec<String>>;

    /// Every node r with user_id -> m -> r, counted once per distinct m.
    /// No filtering: the origin and its direct followees may appear.
    async fn two_hop_candidates(&self, user_id: &str) -> GraphResult<Vec<TwoHopCandidate>>;

    /// Cheap round trip used to verify the session during startup
    async fn ping(&self) -> GraphResult<()>;
}
