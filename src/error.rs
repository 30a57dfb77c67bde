use thiserror::Error;

/// Errors reported by [`QuadTree`](crate::QuadTree).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuadTreeError {
    /// A point handed to `add_item` lies outside the root bounds. The tree is
    /// left untouched.
    #[error("point ({x}, {y}) lies outside the quadtree bounds")]
    OutOfBounds { x: f32, y: f32 },

    /// Construction parameters that cannot describe a usable tree.
    #[error("invalid quadtree configuration: {reason}")]
    InvalidConfiguration { reason: &'static str },
}

pub type Result<T, E = QuadTreeError> = std::result::Result<T, E>;
