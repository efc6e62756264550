//! SQLite persistence adapters for the narrative graph.

mod connection;
mod graph_repository;
mod reference_repository;

pub use connection::Database;
pub use graph_repository::SqliteGraphRepository;
pub use reference_repository::SqliteReferenceRepository;
