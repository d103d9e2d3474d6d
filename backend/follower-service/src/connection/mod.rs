pub mod probe;
pub mod startup;

pub use probe::{Health, LivenessProbe, PROBE_SENTINEL_ID};
pub use startup::{
    backoff_delay, ConnectionManager, MemoryConnector, Neo4jConnector, StoreConnector,
};
