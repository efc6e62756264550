//! Narrative graph use cases - loading, mutating, and presenting one
//! act's story graph.

pub mod mutation;
pub mod presentation;
pub mod query;
pub mod timeline;

pub use mutation::{
    CheckOutcomes, CheckPatch, CreateCheckInput, CreateNodeInput, EdgePatch, GraphMutationError,
    GraphMutationOps, NodePatch, QuickBranchInput, QuickBranchResult,
};
pub use presentation::{
    choosable_paths, guard_connect, timeline_scroll_offset, ConnectRejection, SessionMode,
};
pub use query::{ActGraphSnapshot, GraphLoadError, GraphQueryOps, LinkedBadge, NodeLinks};
pub use timeline::{build_timeline, TimelineNode};

use std::sync::Arc;

/// Container for the narrative graph use cases.
pub struct NarrativeUseCases {
    pub query: Arc<GraphQueryOps>,
    pub mutation: Arc<GraphMutationOps>,
}

impl NarrativeUseCases {
    pub fn new(query: Arc<GraphQueryOps>, mutation: Arc<GraphMutationOps>) -> Self {
        Self { query, mutation }
    }
}
