//! Processing stages that turn raw outlines and drill hits into tool paths.

pub mod drill;
pub mod polygon;

pub use drill::DrillProcessor;
pub use polygon::{inset_corner, inset_polygon, line_intersection, PolygonProcessor};
