use crate::repository::GraphStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Id used for the liveness read. It never needs to exist.
pub const PROBE_SENTINEL_ID: &str = "_health_check_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Unhealthy,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }
}

/// Lightweight read against the live store session.
///
/// A failure only flips the reported health; it never terminates the process
/// or touches request handling.
#[derive(Clone)]
pub struct LivenessProbe {
    store: Arc<dyn GraphStore>,
    timeout: Duration,
}

impl LivenessProbe {
    pub fn new(store: Arc<dyn GraphStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn check(&self) -> Health {
        match tokio::time::timeout(self.timeout, self.store.out_neighbors(PROBE_SENTINEL_ID)).await {
            Ok(Ok(_)) => {
                debug!("Liveness probe: OK");
                Health::Healthy
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Liveness probe: FAILED");
                Health::Unhealthy
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "Liveness probe: TIMED OUT");
                Health::Unhealthy
            }
        }
    }
}
