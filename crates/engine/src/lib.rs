//! PlotLoom engine library.
//!
//! Server-side core of the PlotLoom narrative graph: per-act story
//! graphs a GM builds in preparation and traverses during live play.
//!
//! ## Structure
//!
//! - `repositories/` - Timeout-bounded wrappers over the storage ports
//! - `use_cases/` - Graph loading, mutation, timeline, and view state
//! - `infrastructure/` - Ports, SQLite adapters, clock, configuration
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod repositories;
pub mod use_cases;

pub use app::App;
