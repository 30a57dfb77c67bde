//! A point quadtree for simulations whose entities all move every step.
//!
//! The tree is cleared and refilled once per step, then queried for the items
//! around a point. Nodes are never updated in place.
//!
//! ```
//! use pointquad::{QuadTree, Rect};
//!
//! let mut tree = QuadTree::new(3, 4, Rect::new(0.0, 0.0, 100.0, 100.0))?;
//! tree.add_item(10.0, 10.0, "a")?;
//! tree.add_item(12.0, 12.0, "b")?;
//! tree.add_item(90.0, 90.0, "c")?;
//!
//! let mut near = tree.items_in_radius(11.0, 11.0, 3.0);
//! near.sort();
//! assert_eq!(near, vec![&"a", &"b"]);
//!
//! // next step
//! tree.clear();
//! assert!(tree.items_in_radius(11.0, 11.0, 3.0).is_empty());
//! # Ok::<(), pointquad::QuadTreeError>(())
//! ```

mod config;
mod error;
mod list;
mod quadtree;
mod rect;


/// Callbacks for [`QuadTree::visit`], e.g. to draw the subdivisions.
pub trait QuadTreeVisitor<T> {
    fn item(&mut self, item: &Item<T>);
    fn leaf(&mut self, depth: u8, bounds: Rect);
    fn branch(&mut self, depth: u8, bounds: Rect);
}

pub use config::QuadTreeConfig;
pub use error::{QuadTreeError, Result};
pub use quadtree::*;
pub use rect::Rect;
