//! PlotLoom domain - narrative graph entities, typed ids, and invariants.
//!
//! This crate holds the pure domain model for the branching narrative
//! tree: story nodes, directed edges, external-entity links, and
//! play-time checks. It performs no I/O; time is always injected.

extern crate self as plotloom_domain;

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{CheckKind, LinkTarget, LinkType, NodeCheck, NodeLink, StoryEdge, StoryNode};
pub use error::DomainError;
pub use ids::{
    ActId, CheckId, EdgeId, EncounterId, MonsterId, NodeId, NodeLinkId, SessionId, StoryNoteId,
};
pub use value_objects::CanvasPosition;
