mod graph_repository;
mod memory_repository;
mod r#trait;

pub use graph_repository::Neo4jGraphStore;
pub use memory_repository::MemoryGraphStore;
pub use r#trait::GraphStore;

#[cfg(test)]
pub use r#trait::MockGraphStore;
