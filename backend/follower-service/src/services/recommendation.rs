use super::{with_deadline, RelationshipService};
use crate::domain::TwoHopCandidate;
use crate::error::GraphResult;
use crate::metrics;
use std::collections::HashSet;
use tracing::{debug, error};

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// Parse a raw `limit` query value; anything non-numeric reads as absent.
pub fn parse_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.parse::<i64>().ok())
}

/// Absent, zero or negative limits fall back to the default instead of
/// failing the request.
pub fn normalize_limit(limit: Option<i64>) -> usize {
    limit
        .filter(|v| *v > 0)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
}

/// Order candidates by shared-connection count, highest first, ties broken
/// by ascending id, and drop anything the user already sees.
pub fn rank_candidates(
    user_id: &str,
    candidates: Vec<TwoHopCandidate>,
    following: &HashSet<String>,
    limit: usize,
) -> Vec<String> {
    let mut eligible: Vec<TwoHopCandidate> = candidates
        .into_iter()
        .filter(|c| c.user_id != user_id && !following.contains(&c.user_id))
        .collect();

    eligible.sort_by(|a, b| b.shared.cmp(&a.shared).then_with(|| a.user_id.cmp(&b.user_id)));
    eligible.truncate(limit);
    eligible.into_iter().map(|c| c.user_id).collect()
}

/// "People you may know" over exactly two FOLLOWS hops.
#[derive(Clone)]
pub struct RecommendationEngine {
    relationships: RelationshipService,
}

impl RecommendationEngine {
    pub fn new(relationships: RelationshipService) -> Self {
        Self { relationships }
    }

    /// `limit` of `None` or <= 0 means the default of 10.
    pub async fn recommendations(&self, user_id: &str, limit: Option<i64>) -> GraphResult<Vec<String>> {
        let limit = normalize_limit(limit);
        let result = self.rank(user_id, limit).await;
        metrics::record_operation("recommendations", result.is_ok());

        if let Err(e) = &result {
            error!(user_id, error = %e, "Failed to get recommendations");
        }
        result
    }

    async fn rank(&self, user_id: &str, limit: usize) -> GraphResult<Vec<String>> {
        // Both reads are independent; a concurrent edit may land between them.
        let following: HashSet<String> =
            self.relationships.following(user_id).await?.into_iter().collect();

        let store = self.relationships.store();
        let candidates = with_deadline(
            self.relationships.timeout(),
            store.two_hop_candidates(user_id),
        )
        .await?;

        let ranked = rank_candidates(user_id, candidates, &following, limit);
        debug!(user_id, limit, returned = ranked.len(), "Ranked recommendations");
        Ok(ranked)
    }
}
