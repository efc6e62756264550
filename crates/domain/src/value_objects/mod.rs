//! Value objects - immutable domain values with no identity.

mod position;

pub use position::CanvasPosition;
