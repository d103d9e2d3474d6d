pub mod edge;

pub use edge::{FollowEdge, TwoHopCandidate};
