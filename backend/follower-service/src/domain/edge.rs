use serde::{Deserialize, Serialize};

/// Directed FOLLOWS edge between two opaque user ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower: String,
    pub followee: String,
}

impl FollowEdge {
    pub fn new(follower: impl Into<String>, followee: impl Into<String>) -> Self {
        Self {
            follower: follower.into(),
            followee: followee.into(),
        }
    }

    pub fn is_self_edge(&self) -> bool {
        self.follower == self.followee
    }
}

/// Node reachable in exactly two FOLLOWS hops, with the number of distinct
/// intermediates connecting it to the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoHopCandidate {
    pub user_id: String,
    pub shared: u64,
}

impl TwoHopCandidate {
    pub fn new(user_id: impl Into<String>, shared: u64) -> Self {
        Self {
            user_id: user_id.into(),
            shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_edge_detection() {
        assert!(FollowEdge::new("alice", "alice").is_self_edge());
        assert!(!FollowEdge::new("alice", "bob").is_self_edge());
    }

    #[test]
    fn test_follow_edge_from_json() {
        let edge: FollowEdge =
            serde_json::from_str(r#"{"follower":"alice","followee":"bob"}"#).unwrap();

        assert_eq!(edge.follower, "alice");
        assert_eq!(edge.followee, "bob");
    }
}
