//! Point primitive, rotation sense and axis-aligned bounds.

/// Linear tolerance in millimeters used for every coordinate comparison.
pub const PRECISION: f64 = 0.001;

/// Extent below which an edge is treated as having no span on an axis.
pub const MIN_OFFSET: f64 = 0.005;

/// Winding order of a polygon and sense of a 90° rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Clockwise. Rotation maps `(x, y)` to `(y, -x)`.
    Cw,
    /// Counter-clockwise. Rotation maps `(x, y)` to `(-y, x)`.
    #[default]
    Ccw,
}

/// 2D point in millimeters.
///
/// `retract` marks a point where the tool lifts before the next move. It is
/// only set by tab synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Tool lifts after reaching this point.
    pub retract: bool,
}

impl Point {
    /// Creates a plain (non-retract) point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            retract: false,
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns `true` if `other` lies within [`PRECISION`] of this point.
    pub fn coincides(&self, other: &Self) -> bool {
        self.distance(other) < PRECISION
    }

    /// Moves the point in place.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Rotates the point 90° about the origin in the given direction.
    pub fn rotate(&mut self, direction: Direction) {
        let (x, y) = (self.x, self.y);
        match direction {
            Direction::Ccw => {
                self.x = -y;
                self.y = x;
            }
            Direction::Cw => {
                self.x = y;
                self.y = -x;
            }
        }
    }

    /// Divides both coordinates by ten.
    pub fn scale_down(&mut self) {
        self.x /= 10.0;
        self.y /= 10.0;
    }

    /// Copy of this point with the retract flag cleared.
    pub const fn without_retract(&self) -> Self {
        Self::new(self.x, self.y)
    }
}

/// Returns `true` if `a` and `b` differ by less than [`PRECISION`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < PRECISION
}

/// Index of the point nearest to `base`. The first minimum wins on ties.
pub fn find_nearest(base: &Point, points: &[Point]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, point) in points.iter().enumerate() {
        let distance = point.distance(base);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((idx, distance));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Creates an empty bounding box that will expand with the first `update` call.
    pub const fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Bounding box of a point sequence. Empty input yields an empty box.
    pub fn from_points<'a, I: IntoIterator<Item = &'a Point>>(points: I) -> Self {
        let mut bounds = Self::new();
        for p in points {
            bounds.update(p.x, p.y);
        }
        bounds
    }

    /// Expands the bounding box to include the given point.
    pub fn update(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Expands the bounding box to include another one.
    pub fn merge(&mut self, other: &Self) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Returns `true` if no point has been added.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Width and height. An empty box has zero size.
    pub fn size(&self) -> Point {
        if self.is_empty() {
            return Point::default();
        }
        Point::new(self.max_x - self.min_x, self.max_y - self.min_y)
    }

    /// Minimum corner. An empty box reports the origin.
    pub fn min(&self) -> Point {
        if self.is_empty() {
            return Point::default();
        }
        Point::new(self.min_x, self.min_y)
    }

    /// Center of the box.
    pub fn center(&self) -> Point {
        let min = self.min();
        let size = self.size();
        Point::new(min.x + size.x / 2.0, min.y + size.y / 2.0)
    }

    /// Returns `true` if `other` lies strictly inside this box on all four sides.
    pub fn strictly_contains(&self, other: &Self) -> bool {
        self.min_x < other.min_x
            && self.min_y < other.min_y
            && self.max_x > other.max_x
            && self.max_y > other.max_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}
