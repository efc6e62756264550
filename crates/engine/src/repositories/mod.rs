//! Repository modules - Data access wrappers around port traits.
//!
//! Each repository wraps a port trait and adds per-call deadlines; use
//! cases go through these instead of touching ports directly.

pub mod graph;
pub mod reference;

pub use graph::NarrativeGraph;
pub use reference::References;
