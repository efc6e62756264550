//! Domain entities for the narrative graph.

mod check;
mod edge;
mod link;
mod node;

pub use check::{CheckKind, NodeCheck};
pub use edge::StoryEdge;
pub use link::{LinkTarget, LinkType, NodeLink};
pub use node::StoryNode;
