//! Use cases - orchestration over the repositories.

pub mod narrative;

pub use narrative::NarrativeUseCases;
