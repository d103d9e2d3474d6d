pub mod follow;
pub mod recommendation;

pub use follow::RelationshipService;
pub use recommendation::{
    normalize_limit, parse_limit, RecommendationEngine, DEFAULT_RECOMMENDATION_LIMIT,
};

use crate::error::{GraphError, GraphResult};
use std::future::Future;
use std::time::Duration;

/// Bound a store call by the caller's deadline. Dropping the inner future on
/// expiry aborts the operation; single-statement mutations never commit
/// partially.
pub(crate) async fn with_deadline<F, T>(deadline: Duration, future: F) -> GraphResult<T>
where
    F: Future<Output = GraphResult<T>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(GraphError::Timeout(deadline)),
    }
}
