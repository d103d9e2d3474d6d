//! Startup connection establishment
//!
//! The service must not serve without a working store session, so startup
//! retries a bounded number of times with a linearly growing, capped
//! backoff. The whole loop races a shutdown future: a termination signal
//! received mid-retry aborts promptly instead of waiting out the backoff.

use crate::config::{Neo4jConfig, StartupConfig};
use crate::error::{GraphError, GraphResult};
use crate::metrics;
use crate::repository::{GraphStore, MemoryGraphStore, Neo4jGraphStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Produces a verified store session, or fails for this attempt
#[async_trait::async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> GraphResult<Arc<dyn GraphStore>>;
}

pub struct Neo4jConnector {
    config: Neo4jConfig,
}

impl Neo4jConnector {
    pub fn new(config: Neo4jConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl StoreConnector for Neo4jConnector {
    async fn connect(&self) -> GraphResult<Arc<dyn GraphStore>> {
        let store = Neo4jGraphStore::new(&self.config.uri, &self.config.user, &self.config.password)?;
        // Driver creation is lazy; only a round trip proves reachability
        store.ping().await?;
        store.ensure_schema().await?;
        Ok(Arc::new(store))
    }
}

pub struct MemoryConnector {
    store: MemoryGraphStore,
}

impl MemoryConnector {
    pub fn new(store: MemoryGraphStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self) -> GraphResult<Arc<dyn GraphStore>> {
        self.store.ping().await?;
        Ok(Arc::new(self.store.clone()))
    }
}

/// Delay after failed attempt `attempt` (1-based): `step * attempt`, capped.
pub fn backoff_delay(policy: &StartupConfig, attempt: u32) -> Duration {
    policy
        .backoff_step
        .saturating_mul(attempt)
        .min(policy.backoff_cap)
}

pub struct ConnectionManager<C> {
    connector: C,
    policy: StartupConfig,
}

impl<C: StoreConnector> ConnectionManager<C> {
    pub fn new(connector: C, policy: StartupConfig) -> Self {
        Self { connector, policy }
    }

    /// Acquire a store session or give up.
    ///
    /// Returns `StartupConnectFailure` once every attempt has failed and
    /// `StartupAborted` if `shutdown` resolves first. Callers treat both as
    /// fatal.
    pub async fn establish<S>(&self, shutdown: S) -> GraphResult<Arc<dyn GraphStore>>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!(attempt, "Shutdown requested while connecting to graph store");
                    return Err(GraphError::StartupAborted { attempts: attempt - 1 });
                }
                outcome = tokio::time::timeout(self.policy.attempt_timeout, self.connector.connect()) => outcome,
            };

            match outcome {
                Ok(Ok(store)) => {
                    metrics::record_connect_attempt(true);
                    info!(attempt, max_attempts, "Connected to graph store");
                    return Ok(store);
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!(
                        "attempt timed out after {:?}",
                        self.policy.attempt_timeout
                    )
                }
            }
            metrics::record_connect_attempt(false);

            if attempt == max_attempts {
                break;
            }

            let backoff = backoff_delay(&self.policy, attempt);
            warn!(
                attempt,
                max_attempts,
                backoff_secs = backoff.as_secs_f64(),
                error = %last_error,
                "Graph store connect attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!(attempt, "Shutdown requested during connect backoff");
                    return Err(GraphError::StartupAborted { attempts: attempt });
                }
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        error!(
            attempts = max_attempts,
            error = %last_error,
            "Exhausted graph store connect attempts"
        );
        Err(GraphError::StartupConnectFailure {
            attempts: max_attempts,
            last_error,
        })
    }
}
