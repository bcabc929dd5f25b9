//! Ordered point sequence forming one cut path.

use super::point::{approx_eq, find_nearest, BoundingBox, Direction, Point};

/// What a polygon represents on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonKind {
    /// Board outline or internal cutout taken from the outline layer.
    #[default]
    Outline,
    /// Large drill hole replaced by a milled circle.
    Hole,
}

/// Ordered sequence of points. Insertion order is the traversal order of the cut.
///
/// The bounding box is recomputed after every mutation, so [`Polygon::bounds`]
/// always reflects the current points.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
    bounds: BoundingBox,
    inner: bool,
    direction: Direction,
    kind: PolygonKind,
}

impl Polygon {
    /// Creates an outer, counter-clockwise outline from the given points.
    pub fn new(points: Vec<Point>) -> Self {
        let bounds = BoundingBox::from_points(&points);
        Self {
            points,
            bounds,
            inner: false,
            direction: Direction::Ccw,
            kind: PolygonKind::Outline,
        }
    }

    /// Creates a polygon from raw `(x, y)` pairs.
    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    /// Concatenates the points of `preceding` and `current` into a new polygon.
    pub fn merge(preceding: &Self, current: &Self) -> Self {
        let mut points = Vec::with_capacity(preceding.len() + current.len());
        points.extend_from_slice(&preceding.points);
        points.extend_from_slice(&current.points);
        Self::new(points)
    }

    /// Points in traversal order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the polygon has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First point, if any.
    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    /// Last point, if any.
    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Current bounding box.
    pub const fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Width and height of the bounding box.
    pub fn size(&self) -> Point {
        self.bounds.size()
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    /// Returns `true` if the first and last points coincide within tolerance.
    /// An empty polygon is not closed.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => first.coincides(last),
            _ => false,
        }
    }

    /// Returns `true` if the polygon lies inside another polygon.
    pub const fn is_inner(&self) -> bool {
        self.inner
    }

    /// Sets the inner classification.
    pub fn set_inner(&mut self, inner: bool) {
        self.inner = inner;
    }

    /// Winding order assigned during classification.
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Sets the winding order.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// What this polygon represents.
    pub const fn kind(&self) -> PolygonKind {
        self.kind
    }

    /// Sets what this polygon represents.
    pub fn set_kind(&mut self, kind: PolygonKind) {
        self.kind = kind;
    }

    /// Appends one point.
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
        self.recalculate_bounds();
    }

    /// Inserts a point before `idx`. Indices past the end append.
    pub fn insert(&mut self, idx: usize, point: Point) {
        let idx = idx.min(self.points.len());
        self.points.insert(idx, point);
        self.recalculate_bounds();
    }

    /// Appends all given points.
    pub fn extend<I: IntoIterator<Item = Point>>(&mut self, points: I) {
        self.points.extend(points);
        self.recalculate_bounds();
    }

    /// Moves every point.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for point in &mut self.points {
            point.translate(dx, dy);
        }
        self.recalculate_bounds();
    }

    /// Rotates every point 90° about the origin.
    pub fn rotate(&mut self, direction: Direction) {
        for point in &mut self.points {
            point.rotate(direction);
        }
        self.recalculate_bounds();
    }

    /// Signed area test over consecutive vertex pairs, wrapping around.
    ///
    /// Sums `(x2 - x1) * (y2 + y1)`; a positive sum is clockwise.
    pub fn winding(&self) -> Direction {
        let sum: f64 = self
            .points
            .iter()
            .zip(self.points.iter().cycle().skip(1))
            .map(|(p1, p2)| (p2.x - p1.x) * (p2.y + p1.y))
            .sum();
        if sum > 0.0 {
            Direction::Cw
        } else {
            Direction::Ccw
        }
    }

    /// Drops repeated points, then interior points lying on a straight run
    /// along a shared X or Y.
    ///
    /// The first and last points are always kept. Polygons with fewer than
    /// three points are left untouched.
    pub fn optimize(&mut self) {
        if self.points.len() < 3 {
            return;
        }
        self.points.dedup_by(|next, prev| next.coincides(prev));
        if self.points.len() < 3 {
            self.recalculate_bounds();
            return;
        }
        let mut kept = Vec::with_capacity(self.points.len());
        kept.extend(self.points.first().copied());
        for window in self.points.windows(3) {
            let [ab, cd, ef] = window else {
                continue;
            };
            let same_x = approx_eq(ab.x, cd.x) && approx_eq(cd.x, ef.x);
            let same_y = approx_eq(ab.y, cd.y) && approx_eq(cd.y, ef.y);
            if !same_x && !same_y {
                kept.push(*cd);
            }
        }
        kept.extend(self.points.last().copied());
        self.points = kept;
        self.recalculate_bounds();
    }

    /// Rotates the point sequence so it starts at the vertex nearest `center`
    /// and closes it again with a copy of that vertex.
    ///
    /// A closed polygon drops its duplicated closing point first. An open one
    /// gains a closing point unconditionally. Returns the new last point.
    pub fn reorder(&mut self, center: &Point) -> Option<Point> {
        let idx = find_nearest(center, &self.points)?;
        if self.is_closed() {
            self.points.pop();
        }
        if idx < self.points.len() {
            self.points.rotate_left(idx);
        }
        let first = self.points.first()?.without_retract();
        self.points.push(first);
        self.recalculate_bounds();
        Some(first)
    }

    fn recalculate_bounds(&mut self) {
        self.bounds = BoundingBox::from_points(&self.points);
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::from_coords(&[
            (x, y),
            (x, y + size),
            (x + size, y + size),
            (x + size, y),
            (x, y),
        ])
    }

    #[test]
    fn unit_square_winds_clockwise() {
        let poly = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        assert_eq!(poly.winding(), Direction::Cw);
        assert_eq!(square(1.0, 1.0, 1.0).winding(), Direction::Cw);
    }

    #[test]
    fn reversed_square_winds_counter_clockwise() {
        let poly = Polygon::from_coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert_eq!(poly.winding(), Direction::Ccw);
    }

    #[test]
    fn closed_uses_precision() {
        assert!(square(0.0, 0.0, 1.0).is_closed());
        let open = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        assert!(!open.is_closed());
        let nearly = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0), (0.0005, 0.0)]);
        assert!(nearly.is_closed());
        assert!(!Polygon::new(Vec::new()).is_closed());
    }

    #[test]
    fn bounds_follow_mutations() {
        let mut poly = square(0.0, 0.0, 1.0);
        assert_eq!(poly.size(), Point::new(1.0, 1.0));

        poly.insert(2, Point::new(0.5, 3.0));
        assert_eq!(poly.bounds().max_y, 3.0);

        poly.translate(1.0, 1.0);
        assert_eq!(poly.bounds().min(), Point::new(1.0, 1.0));

        poly.push(Point::new(-1.0, 0.0));
        assert_eq!(poly.bounds().min(), Point::new(-1.0, 0.0));

        poly.extend([Point::new(4.0, 0.0), Point::new(4.0, -2.0)]);
        assert_eq!(poly.bounds().max_x, 4.0);
        assert_eq!(poly.bounds().min_y, -2.0);
        assert_eq!(poly.last(), Some(&Point::new(4.0, -2.0)));
    }

    #[test]
    fn rotate_updates_bounds() {
        let mut poly = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0), (2.0, 1.0), (2.0, 0.0), (0.0, 0.0)]);
        poly.rotate(Direction::Cw);
        assert_eq!(poly.size(), Point::new(1.0, 2.0));
        assert_eq!(poly.bounds().min(), Point::new(0.0, -2.0));
    }

    #[test]
    fn optimize_removes_collinear_points_with_same_x() {
        let mut poly =
            Polygon::from_coords(&[(1.0, 1.0), (1.0, 2.0), (1.0, 3.0), (2.0, 3.0), (2.0, 1.0), (1.0, 1.0)]);
        poly.optimize();
        assert_eq!(poly.len(), 5);
        assert_eq!(poly.points()[0], Point::new(1.0, 1.0));
        assert_eq!(poly.points()[1], Point::new(1.0, 3.0));
        assert_eq!(poly.last().copied(), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn optimize_removes_collinear_points_with_same_y() {
        let mut poly =
            Polygon::from_coords(&[(1.0, 1.0), (2.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)]);
        poly.optimize();
        assert_eq!(poly.len(), 5);
        assert_eq!(poly.points()[1], Point::new(3.0, 1.0));
    }

    #[test]
    fn optimize_keeps_corners() {
        let mut poly = square(0.0, 0.0, 1.0);
        poly.optimize();
        assert_eq!(poly.len(), 5);
    }

    #[test]
    fn optimize_removes_several_runs() {
        let mut poly = Polygon::from_coords(&[
            (0.0, 0.0),
            (0.0, 1.0),
            (0.0, 2.0),
            (1.0, 2.0),
            (2.0, 2.0),
            (2.0, 0.0),
            (0.0, 0.0),
        ]);
        poly.optimize();
        assert_eq!(poly.len(), 5);
    }

    #[test]
    fn optimize_collapses_flat_polygon() {
        let mut poly = Polygon::from_coords(&[(2.0, 0.0), (2.0, 1.0), (2.0, 1.0), (2.0, 0.0), (2.0, 0.0)]);
        poly.optimize();
        assert_eq!(poly.len(), 2);
    }

    #[test]
    fn optimize_keeps_corner_joined_from_two_fragments() {
        let mut poly = Polygon::from_coords(&[
            (0.0, 30.0),
            (50.0, 30.0),
            (50.0, 0.0),
            (0.0, 0.0),
            (0.0, 0.0),
            (0.0, 30.0),
        ]);
        poly.optimize();
        assert_eq!(poly.len(), 5);
        assert_eq!(poly.points()[3], Point::new(0.0, 0.0));
        assert!(poly.is_closed());
    }

    #[test]
    fn optimize_ignores_short_polygons() {
        let mut poly = Polygon::from_coords(&[(0.0, 0.0), (1.0, 0.0)]);
        poly.optimize();
        assert_eq!(poly.len(), 2);
    }

    #[test]
    fn reorder_starts_at_nearest_vertex() {
        let mut poly = square(0.0, 0.0, 10.0);
        let last = poly.reorder(&Point::new(9.0, 9.0));
        assert_eq!(poly.first().copied(), Some(Point::new(10.0, 10.0)));
        assert_eq!(last, Some(Point::new(10.0, 10.0)));
        assert!(poly.is_closed());
        assert_eq!(poly.len(), 5);
    }

    #[test]
    fn reorder_closes_open_polygon() {
        let mut poly = Polygon::from_coords(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        assert!(!poly.is_closed());
        poly.reorder(&Point::new(0.0, 0.0));
        assert!(poly.is_closed());
        assert_eq!(poly.len(), 5);
    }

    #[test]
    fn reorder_clears_retract_on_closing_point() {
        let mut poly = square(0.0, 0.0, 10.0);
        let mut points = poly.points().to_vec();
        points[2].retract = true;
        poly = Polygon::new(points);
        poly.reorder(&Point::new(10.0, 10.0));
        assert!(poly.points()[0].retract);
        assert_eq!(poly.last().map(|p| p.retract), Some(false));
    }

    #[test]
    fn reorder_empty_polygon_returns_none() {
        let mut poly = Polygon::new(Vec::new());
        assert!(poly.reorder(&Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn merge_concatenates_points() {
        let p1 = Polygon::from_coords(&[(0.0, 0.0), (1.0, 1.0)]);
        let p2 = Polygon::from_coords(&[(2.0, 2.0), (3.0, 3.0)]);
        let merged = Polygon::merge(&p1, &p2);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.points()[2], Point::new(2.0, 2.0));
        assert_eq!(merged.size(), Point::new(3.0, 3.0));
    }
}
