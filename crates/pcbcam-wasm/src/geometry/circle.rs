//! Regular polygons approximating milled drill holes.

use std::f64::consts::PI;

use super::point::{Direction, Point, PRECISION};
use super::polygon::{Polygon, PolygonKind};

const MIN_CIRCLE_SEGMENTS: u32 = 4;

/// Number of segments for a circle of the given diameter.
///
/// Derived from the circumference divided by [`PRECISION`], rounded up to a
/// multiple of four so the quadrant points are always present.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn circle_segment_count(diameter: f64) -> u32 {
    let raw = (PI * diameter / (PRECISION * 4.0)).ceil();
    if !raw.is_finite() || raw <= 0.0 {
        return MIN_CIRCLE_SEGMENTS;
    }
    let quarters = raw.min(f64::from(u32::MAX / 4)) as u32;
    (quarters * 4).max(MIN_CIRCLE_SEGMENTS)
}

/// Builds a closed clockwise polygon approximating a circle.
///
/// The result is marked as an inner hole so it is cut from the inside.
pub fn circle(center: Point, diameter: f64) -> Polygon {
    let radius = diameter / 2.0;
    let segments = circle_segment_count(diameter);
    let step = 2.0 * PI / f64::from(segments);
    let points = (0..=segments)
        .map(|i| {
            let theta = step * f64::from(i);
            Point::new(
                radius.mul_add(theta.cos(), center.x),
                (-radius).mul_add(theta.sin(), center.y),
            )
        })
        .collect();

    let mut polygon = Polygon::new(points);
    polygon.set_inner(true);
    polygon.set_direction(Direction::Cw);
    polygon.set_kind(PolygonKind::Hole);
    polygon
}
