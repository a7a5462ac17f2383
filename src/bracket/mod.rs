pub mod tree;
pub mod types;

pub use tree::{DrawTree, build_bracket};
pub use types::{DrawNode, Feed, MAX_ROUNDS, NodeId, NodeSpec, RoundLabel, Slot};
