use super::GraphStore;
use crate::domain::TwoHopCandidate;
use crate::error::{GraphError, GraphResult};
use neo4rs::{query, Graph, Query};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DeletedRow {
    deleted: i64,
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    id: String,
    shared: i64,
}

#[derive(Debug, Deserialize)]
struct HealthRow {
    health: i64,
}

/// Graph store backed by Neo4j.
///
/// Each operation is a single auto-commit Cypher statement, so Neo4j's
/// per-statement transaction is the atomicity boundary. The underlying
/// `Graph` owns its own connection pool and is shared across requests.
#[derive(Clone)]
pub struct Neo4jGraphStore {
    graph: Arc<Graph>,
}

impl Neo4jGraphStore {
    /// Build the driver handle. Connections are opened lazily; call
    /// [`GraphStore::ping`] to verify the server is actually reachable.
    pub fn new(uri: &str, user: &str, password: &str) -> GraphResult<Self> {
        let graph = Graph::new(uri, user, password)
            .map_err(|e| GraphError::StoreUnavailable(format!("Failed to create Neo4j driver: {e}")))?;

        Ok(Self {
            graph: Arc::new(graph),
        })
    }

    /// Create the `:User(id)` uniqueness constraint if it is missing.
    ///
    /// Without it, concurrent `MERGE` calls can create the same user twice
    /// and with it a second FOLLOWS edge for one pair.
    pub async fn ensure_schema(&self) -> GraphResult<()> {
        let cypher = "CREATE CONSTRAINT user_id_unique IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE";

        let mut result = self.graph.execute(query(cypher)).await?;
        while result.next().await?.is_some() {}

        info!("Ensured Neo4j constraint user_id_unique");
        Ok(())
    }

    /// Run a query returning one `id` column per row
    async fn fetch_ids(&self, q: Query) -> GraphResult<Vec<String>> {
        let mut result = self.graph.execute(q).await?;

        let mut ids = Vec::new();
        while let Some(row) = result.next().await? {
            let decoded: IdRow = row.to()?;
            ids.push(decoded.id);
        }

        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

#[async_trait::async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn upsert_edge(&self, follower: &str, followee: &str) -> GraphResult<()> {
        let cypher = r#"
            MERGE (a:User {id: $follower})
            MERGE (b:User {id: $followee})
            MERGE (a)-[:FOLLOWS]->(b)
        "#;

        let mut result = self
            .graph
            .execute(
                query(cypher)
                    .param("follower", follower.to_string())
                    .param("followee", followee.to_string()),
            )
            .await?;

        // Drain result stream so the statement completes before returning
        while result.next().await?.is_some() {}

        debug!("Upserted FOLLOWS: {} -> {}", follower, followee);
        Ok(())
    }

    async fn delete_edge(&self, follower: &str, followee: &str) -> GraphResult<u64> {
        let cypher = r#"
            OPTIONAL MATCH (a:User {id: $follower})-[r:FOLLOWS]->(b:User {id: $followee})
            DELETE r
            RETURN count(r) AS deleted
        "#;

        let mut result = self
            .graph
            .execute(
                query(cypher)
                    .param("follower", follower.to_string())
                    .param("followee", followee.to_string()),
            )
            .await?;

        let deleted = match result.next().await? {
            Some(row) => row.to::<DeletedRow>()?.deleted,
            None => {
                return Err(GraphError::MalformedRow(
                    "delete returned no count row".to_string(),
                ))
            }
        };

        // Consume the remainder so the auto-commit transaction finishes
        while result.next().await?.is_some() {}

        let deleted = u64::try_from(deleted)
            .map_err(|_| GraphError::MalformedRow(format!("negative delete count {deleted}")))?;

        debug!("Deleted {} FOLLOWS: {} -> {}", deleted, follower, followee);
        Ok(deleted)
    }

    async fn out_neighbors(&self, user_id: &str) -> GraphResult<Vec<String>> {
        let cypher = r#"
            MATCH (u:User {id: $id})-[:FOLLOWS]->(f:User)
            RETURN DISTINCT f.id AS id
        "#;

        let following = self.fetch_ids(query(cypher).param("id", user_id.to_string())).await?;
        debug!("Got {} following for user {}", following.len(), user_id);
        Ok(following)
    }

    async fn in_neighbors(&self, user_id: &str) -> GraphResult<Vec<String>> {
        let cypher = r#"
            MATCH (f:User)-[:FOLLOWS]->(u:User {id: $id})
            RETURN DISTINCT f.id AS id
        "#;

        let followers = self.fetch_ids(query(cypher).param("id", user_id.to_string())).await?;
        debug!("Got {} followers for user {}", followers.len(), user_id);
        Ok(followers)
    }

    async fn two_hop_candidates(&self, user_id: &str) -> GraphResult<Vec<TwoHopCandidate>> {
        let cypher = r#"
            MATCH (u:User {id: $id})-[:FOLLOWS]->(m:User)-[:FOLLOWS]->(r:User)
            RETURN r.id AS id, count(DISTINCT m) AS shared
        "#;

        let mut result = self
            .graph
            .execute(query(cypher).param("id", user_id.to_string()))
            .await?;

        let mut candidates = Vec::new();
        while let Some(row) = result.next().await? {
            let decoded: CandidateRow = row.to()?;
            let shared = u64::try_from(decoded.shared).map_err(|_| {
                GraphError::MalformedRow(format!("negative multiplicity for {}", decoded.id))
            })?;
            candidates.push(TwoHopCandidate::new(decoded.id, shared));
        }

        debug!(
            "Got {} two-hop candidates for user {}",
            candidates.len(),
            user_id
        );
        Ok(candidates)
    }

    async fn ping(&self) -> GraphResult<()> {
        let mut result = self.graph.execute(query("RETURN 1 AS health")).await?;

        let row = result.next().await?.ok_or_else(|| {
            GraphError::StoreUnavailable("health query returned no rows".to_string())
        })?;

        let health: HealthRow = row.to()?;
        if health.health != 1 {
            return Err(GraphError::MalformedRow(format!(
                "health query returned {}",
                health.health
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // NOTE: These tests require a running Neo4j instance
    // Run with: docker run -p 7687:7687 -e NEO4J_AUTH=neo4j/password neo4j:5

    fn store() -> Neo4jGraphStore {
        Neo4jGraphStore::new("bolt://localhost:7687", "neo4j", "password")
            .expect("Failed to build Neo4j driver")
    }

    fn user() -> String {
        Uuid::new_v4().to_string()
    }

    #[tokio::test]
    #[ignore] // Ignore by default, run manually with: cargo test -- --ignored
    async fn test_upsert_is_idempotent() {
        let repo = store();
        let (a, b) = (user(), user());

        repo.upsert_edge(&a, &b).await.expect("first upsert");
        repo.upsert_edge(&a, &b).await.expect("second upsert");

        assert_eq!(repo.out_neighbors(&a).await.unwrap(), vec![b.clone()]);
        assert_eq!(repo.in_neighbors(&b).await.unwrap(), vec![a.clone()]);

        // Cleanup
        assert_eq!(repo.delete_edge(&a, &b).await.unwrap(), 1);
        assert_eq!(repo.delete_edge(&a, &b).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore]
    async fn test_two_hop_multiplicity() {
        let repo = store();
        let (a, b, c, d, e) = (user(), user(), user(), user(), user());

        repo.upsert_edge(&a, &b).await.unwrap();
        repo.upsert_edge(&a, &c).await.unwrap();
        repo.upsert_edge(&b, &d).await.unwrap();
        repo.upsert_edge(&b, &e).await.unwrap();
        repo.upsert_edge(&c, &d).await.unwrap();

        let mut candidates = repo.two_hop_candidates(&a).await.unwrap();
        candidates.sort_by(|x, y| x.user_id.cmp(&y.user_id));

        let mut expected = vec![TwoHopCandidate::new(d.clone(), 2), TwoHopCandidate::new(e.clone(), 1)];
        expected.sort_by(|x, y| x.user_id.cmp(&y.user_id));
        assert_eq!(candidates, expected);

        // Cleanup
        for (x, y) in [(&a, &b), (&a, &c), (&b, &d), (&b, &e), (&c, &d)] {
            repo.delete_edge(x, y).await.ok();
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_concurrent_upserts_keep_single_edge() {
        let repo = store();
        repo.ensure_schema().await.expect("constraint");
        let (a, b) = (user(), user());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            let (a, b) = (a.clone(), b.clone());
            handles.push(tokio::spawn(async move { repo.upsert_edge(&a, &b).await }));
        }
        for handle in handles {
            // A lost constraint race surfaces as an error, never as a duplicate
            let _ = handle.await.expect("task panicked");
        }
        repo.upsert_edge(&a, &b).await.expect("final upsert");

        assert_eq!(repo.out_neighbors(&a).await.unwrap(), vec![b.clone()]);
        assert_eq!(repo.delete_edge(&a, &b).await.unwrap(), 1);
        assert_eq!(repo.delete_edge(&a, &b).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore]
    async fn test_ensure_schema_is_repeatable() {
        let repo = store();
        repo.ensure_schema().await.expect("first run");
        repo.ensure_schema().await.expect("second run");
    }

    #[tokio::test]
    #[ignore]
    async fn test_ping() {
        store().ping().await.expect("Neo4j should answer RETURN 1");
    }
}
