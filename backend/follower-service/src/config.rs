/// Configuration management for Follower Service
///
/// Loads configuration from environment variables once at startup; the
/// resulting structure is passed explicitly to every component.
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Which graph store backs the service
    pub store: StoreBackend,
    /// Neo4j connection configuration
    pub neo4j: Neo4jConfig,
    /// Startup connection retry policy
    pub startup: StartupConfig,
    /// Liveness probe settings
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP port, defaults to 8082
    pub http_port: u16,
    /// Grace period for in-flight requests on shutdown
    pub shutdown_grace: Duration,
    /// Deadline applied to every graph store call made for a request
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Neo4j,
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "neo4j" => Some(StoreBackend::Neo4j),
            "memory" | "in-memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Neo4j bolt URI, e.g. bolt://neo4j:7687
    pub uri: String,
    /// Neo4j username
    pub user: String,
    /// Neo4j password
    pub password: String,
}

impl std::fmt::Debug for Neo4jConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bounded retry used to acquire the store session at process start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupConfig {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    /// Backoff after failed attempt `n` (1-based) is `backoff_step * n`
    pub backoff_step: Duration,
    pub backoff_cap: Duration,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            attempt_timeout: Duration::from_secs(15),
            backoff_step: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env_parse::<u64>(key)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Missing or unparseable values fall back to defaults so the service can
    /// still start and report its state through the health endpoint.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let server = ServerConfig {
            host: env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_parse("PORT").unwrap_or(8082),
            shutdown_grace: env_secs("SHUTDOWN_GRACE_SECS", Duration::from_secs(5)),
            request_timeout: env_secs("REQUEST_TIMEOUT_SECS", Duration::from_secs(15)),
        };

        let store = match env::var("GRAPH_STORE") {
            Ok(raw) => StoreBackend::parse(&raw)
                .ok_or_else(|| anyhow::anyhow!("Unknown GRAPH_STORE value: {raw}"))?,
            Err(_) => StoreBackend::Neo4j,
        };

        let neo4j = Neo4jConfig {
            uri: env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://neo4j:7687".to_string()),
            user: env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password: env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "CHANGE_ME".to_string()),
        };

        let defaults = StartupConfig::default();
        let startup = StartupConfig {
            max_attempts: env_parse::<u32>("NEO4J_CONNECT_MAX_ATTEMPTS")
                .unwrap_or(defaults.max_attempts)
                .max(1),
            attempt_timeout: env_secs(
                "NEO4J_CONNECT_ATTEMPT_TIMEOUT_SECS",
                defaults.attempt_timeout,
            ),
            backoff_step: env_secs("NEO4J_CONNECT_BACKOFF_STEP_SECS", defaults.backoff_step),
            backoff_cap: env_secs("NEO4J_CONNECT_BACKOFF_CAP_SECS", defaults.backoff_cap),
        };

        let probe = ProbeConfig {
            timeout: env_secs("HEALTH_PROBE_TIMEOUT_SECS", ProbeConfig::default().timeout),
        };

        Ok(Self {
            server,
            store,
            neo4j,
            startup,
            probe,
        })
    }
}
