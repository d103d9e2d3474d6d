use super::with_deadline;
use crate::domain::FollowEdge;
use crate::error::{GraphError, GraphResult};
use crate::metrics;
use crate::repository::GraphStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Follow/unfollow and 1-hop reads on top of a [`GraphStore`].
///
/// Holds no lock of its own: atomicity comes from the store, and concurrent
/// callers share the same store handle.
#[derive(Clone)]
pub struct RelationshipService {
    store: Arc<dyn GraphStore>,
    timeout: Duration,
}

fn require_pair(follower: &str, followee: &str) -> GraphResult<()> {
    if follower.is_empty() || followee.is_empty() {
        return Err(GraphError::validation("follower and followee required"));
    }
    Ok(())
}

fn require_id(user_id: &str) -> GraphResult<()> {
    if user_id.is_empty() {
        return Err(GraphError::validation("id required"));
    }
    Ok(())
}

impl RelationshipService {
    pub fn new(store: Arc<dyn GraphStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> Arc<dyn GraphStore> {
        self.store.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Idempotent: following someone already followed succeeds the same way.
    pub async fn follow(&self, follower: &str, followee: &str) -> GraphResult<()> {
        require_pair(follower, followee)?;
        if FollowEdge::new(follower, followee).is_self_edge() {
            return Err(GraphError::validation("cannot follow self"));
        }

        let result = with_deadline(self.timeout, self.store.upsert_edge(follower, followee)).await;
        metrics::record_operation("follow", result.is_ok());

        match &result {
            Ok(()) => info!(follower, followee, "Follow recorded"),
            Err(e) => error!(follower, followee, error = %e, "Failed to follow"),
        }
        result
    }

    /// Returns how many edges were removed: 1 if the edge existed, else 0.
    pub async fn unfollow(&self, follower: &str, followee: &str) -> GraphResult<u64> {
        require_pair(follower, followee)?;

        let result = with_deadline(self.timeout, self.store.delete_edge(follower, followee)).await;
        metrics::record_operation("unfollow", result.is_ok());

        match &result {
            Ok(removed) => info!(follower, followee, removed, "Unfollow processed"),
            Err(e) => error!(follower, followee, error = %e, "Failed to unfollow"),
        }
        result
    }

    pub async fn followers(&self, user_id: &str) -> GraphResult<Vec<String>> {
        require_id(user_id)?;

        let result = with_deadline(self.timeout, self.store.in_neighbors(user_id)).await;
        metrics::record_operation("followers", result.is_ok());

        if let Err(e) = &result {
            error!(user_id, error = %e, "Failed to get followers");
        }
        result
    }

    pub async fn following(&self, user_id: &str) -> GraphResult<Vec<String>> {
        require_id(user_id)?;

        let result = with_deadline(self.timeout, self.store.out_neighbors(user_id)).await;
        metrics::record_operation("following", result.is_ok());

        if let Err(e) = &result {
            error!(user_id, error = %e, "Failed to get following");
        }
        result
    }

    /// Whether `viewer` may read content authored by `author`: their own
    /// content, or an author they follow.
    pub async fn can_view(&self, viewer: &str, author: &str) -> GraphResult<bool> {
        require_pair(viewer, author)?;
        if viewer == author {
            return Ok(true);
        }

        let following = self.following(viewer).await?;
        Ok(following.iter().any(|id| id == author))
    }
}
