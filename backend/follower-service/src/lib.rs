pub mod config;
pub mod connection;
pub mod domain;
pub mod error;
pub mod http;
pub mod metrics;
pub mod repository;
pub mod services;

pub use domain::{FollowEdge, TwoHopCandidate};
pub use error::{GraphError, GraphResult};
pub use repository::{GraphStore, MemoryGraphStore, Neo4jGraphStore};
pub use services::{RecommendationEngine, RelationshipService};
