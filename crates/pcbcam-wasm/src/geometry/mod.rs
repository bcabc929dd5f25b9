//! Geometric model of a panel: points, polygons, drill groups and the panel
//! that owns them.

pub mod circle;
pub mod drill_group;
pub mod panel;
pub mod point;
pub mod polygon;
pub mod stats;

pub use circle::{circle, circle_segment_count};
pub use drill_group::{path_length, DrillGroup};
pub use panel::{Panel, TransformStatus};
pub use point::{approx_eq, find_nearest, BoundingBox, Direction, Point, MIN_OFFSET, PRECISION};
pub use polygon::{Polygon, PolygonKind};
pub use stats::{drill_tip_length, DrillStatistics, DrillSummary, PanelStatistics};
