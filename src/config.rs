use crate::error::{QuadTreeError, Result};
use crate::rect::Rect;

/// Construction parameters of a [`QuadTree`](crate::QuadTree).
///
/// With the `serde` feature enabled this can be read from any serde format;
/// missing fields take their default values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct QuadTreeConfig {
    /// Nodes at this depth never subdivide.
    pub max_depth: u8,
    /// Items a leaf holds before the next insertion splits it.
    pub capacity: usize,
    /// Region covered by the root node.
    pub bounds: Rect,
}

impl QuadTreeConfig {
    pub fn new(max_depth: u8, capacity: usize, bounds: Rect) -> Self {
        Self {
            max_depth,
            capacity,
            bounds,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity < 1 {
            return Err(QuadTreeError::InvalidConfiguration {
                reason: "capacity must be at least 1",
            });
        }
        if !self.bounds.is_finite() {
            return Err(QuadTreeError::InvalidConfiguration {
                reason: "bounds must be finite",
            });
        }
        if self.bounds.width <= 0.0 || self.bounds.height <= 0.0 {
            return Err(QuadTreeError::InvalidConfiguration {
                reason: "bounds must have a positive width and height",
            });
        }
        Ok(())
    }
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            capacity: 100,
            bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
        }
    }
}
