pub mod model;
pub mod store;

pub use model::{TreeNode, TreeNodeModel};
pub use store::{TreeEvent, TreeNodeStore};

// Re-export the index type so downstream crates don't need a direct
// petgraph dependency.
pub use petgraph::graph::NodeIndex;
