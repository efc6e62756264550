//! Free-form canvas placement for story nodes.

use serde::{Deserialize, Serialize};

/// Position of a node on the free-form canvas.
///
/// Coordinates are unconstrained floats; there is no collision avoidance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasPosition {
    pub x: f64,
    pub y: f64,
}

impl CanvasPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin, used for root nodes.
    pub fn origin() -> Self {
        Self::default()
    }

    /// Returns this position shifted by the given deltas.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_origin() {
        assert_eq!(CanvasPosition::default(), CanvasPosition::new(0.0, 0.0));
        assert_eq!(CanvasPosition::origin(), CanvasPosition::new(0.0, 0.0));
    }

    #[test]
    fn offset_shifts_both_axes() {
        let pos = CanvasPosition::new(10.0, -5.0).offset(250.0, 140.0);
        assert_eq!(pos, CanvasPosition::new(260.0, 135.0));
    }
}
