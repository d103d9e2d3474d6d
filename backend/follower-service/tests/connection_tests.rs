/// Startup retry and liveness behaviour, run on paused tokio time
use follower_service::config::StartupConfig;
use follower_service::connection::{
    ConnectionManager, Health, LivenessProbe, MemoryConnector, StoreConnector,
};
use follower_service::{GraphError, GraphResult, GraphStore, MemoryGraphStore};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Fails the first `failures` attempts, then hands out the in-memory store
struct FlakyConnector {
    failures: u32,
    calls: Arc<AtomicU32>,
    store: MemoryGraphStore,
}

impl FlakyConnector {
    fn new(failures: u32) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let connector = Self {
            failures,
            calls: calls.clone(),
            store: MemoryGraphStore::new(),
        };
        (connector, calls)
    }
}

#[async_trait::async_trait]
impl StoreConnector for FlakyConnector {
    async fn connect(&self) -> GraphResult<Arc<dyn GraphStore>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(GraphError::unavailable(format!("connection refused ({call})")));
        }
        Ok(Arc::new(self.store.clone()))
    }
}

/// Every attempt hangs until the per-attempt timeout cuts it off
struct HangingConnector {
    calls: Arc<AtomicU32>,
}

#[async_trait::async_trait]
impl StoreConnector for HangingConnector {
    async fn connect(&self) -> GraphResult<Arc<dyn GraphStore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Paused time jumps straight to timer deadlines; allow for ms rounding
fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_secs(1),
        "elapsed {elapsed:?}, expected about {expected:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_store_reachable_after_retries() {
    let (connector, calls) = FlakyConnector::new(4);
    let manager = ConnectionManager::new(connector, StartupConfig::default());

    let start = Instant::now();
    let store = manager.establish(std::future::pending()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    // Backoff after attempts 1..=4: 2 + 4 + 6 + 8 seconds
    assert_elapsed(start, Duration::from_secs(20));
    assert!(store.ping().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_store_reachable_on_last_attempt() {
    let (connector, calls) = FlakyConnector::new(19);
    let manager = ConnectionManager::new(connector, StartupConfig::default());

    assert!(manager.establish(std::future::pending()).await.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 20);
}

#[tokio::test(start_paused = true)]
async fn test_never_reachable_is_fatal() {
    let (connector, calls) = FlakyConnector::new(u32::MAX);
    let manager = ConnectionManager::new(connector, StartupConfig::default());

    let start = Instant::now();
    let Err(err) = manager.establish(std::future::pending()).await else {
        panic!("expected startup to fail");
    };

    match err {
        GraphError::StartupConnectFailure { attempts, last_error } => {
            assert_eq!(attempts, 20);
            assert!(last_error.contains("connection refused"));
        }
        other => panic!("expected StartupConnectFailure, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 20);
    // 2+4+..+18 for attempts 1-9, then 20s for attempts 10-19; no sleep after the last
    assert_elapsed(start, Duration::from_secs(90 + 200));
}

#[tokio::test(start_paused = true)]
async fn test_attempts_are_individually_timed_out() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = StartupConfig {
        max_attempts: 3,
        ..StartupConfig::default()
    };
    let manager = ConnectionManager::new(HangingConnector { calls: calls.clone() }, policy);

    let start = Instant::now();
    let Err(err) = manager.establish(std::future::pending()).await else {
        panic!("expected startup to fail");
    };

    assert!(matches!(err, GraphError::StartupConnectFailure { attempts: 3, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 3 x 15s attempt timeout plus 2s + 4s backoff
    assert_elapsed(start, Duration::from_secs(45 + 6));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_aborts_retry_promptly() {
    let (connector, calls) = FlakyConnector::new(u32::MAX);
    let manager = ConnectionManager::new(connector, StartupConfig::default());

    let start = Instant::now();
    let Err(err) = manager
        .establish(tokio::time::sleep(Duration::from_secs(5)))
        .await
    else {
        panic!("expected startup to be aborted");
    };

    // Attempts at t=0 and t=2; the signal lands during the 4s backoff
    assert!(matches!(err, GraphError::StartupAborted { attempts: 2 }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_elapsed(start, Duration::from_secs(5));
}

#[tokio::test]
async fn test_liveness_tracks_store_without_failing_requests_path() {
    let store = MemoryGraphStore::new();
    let manager = ConnectionManager::new(MemoryConnector::new(store.clone()), StartupConfig::default());
    let session = manager.establish(std::future::pending()).await.unwrap();

    let probe = LivenessProbe::new(session, Duration::from_secs(3));
    assert_eq!(probe.check().await, Health::Healthy);

    store.set_available(false);
    assert_eq!(probe.check().await, Health::Unhealthy);
    // Probing again after a failure keeps working
    assert_eq!(probe.check().await, Health::Unhealthy);

    store.set_available(true);
    assert_eq!(probe.check().await, Health::Healthy);
}
