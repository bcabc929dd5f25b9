//! Drill hits sharing one tool, plus the tour optimizer that orders them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::point::{find_nearest, BoundingBox, Direction, Point};

/// Seed of the generator owned by every group. Fixed so tours are reproducible.
const TOUR_SEED: u64 = 0;

/// One drill tool and the holes it makes, in drilling order.
#[derive(Debug, Clone)]
pub struct DrillGroup {
    id: String,
    diameter: f64,
    ordinal: u32,
    drills: Vec<Point>,
    rng: StdRng,
}

impl DrillGroup {
    /// Creates an empty group.
    pub fn new(id: impl Into<String>, diameter: f64) -> Self {
        Self::with_drills(id, diameter, Vec::new())
    }

    /// Creates a group with the given holes.
    pub fn with_drills(id: impl Into<String>, diameter: f64, drills: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            diameter,
            ordinal: 0,
            drills,
            rng: StdRng::seed_from_u64(TOUR_SEED),
        }
    }

    /// Combines two groups: keeps the id of `first`, averages the diameters and
    /// appends the holes of `second` after those of `first`.
    pub fn merge(first: &Self, second: &Self) -> Self {
        let mut drills = Vec::with_capacity(first.len() + second.len());
        drills.extend_from_slice(&first.drills);
        drills.extend_from_slice(&second.drills);
        Self::with_drills(
            first.id.clone(),
            (first.diameter + second.diameter) / 2.0,
            drills,
        )
    }

    /// Tool label.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tool diameter in millimeters.
    pub const fn diameter(&self) -> f64 {
        self.diameter
    }

    /// Replaces the tool diameter.
    pub fn set_diameter(&mut self, diameter: f64) {
        self.diameter = diameter;
    }

    /// Tool-change number. Zero until assigned by the emitter.
    pub const fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Assigns the tool-change number.
    pub fn set_ordinal(&mut self, ordinal: u32) {
        self.ordinal = ordinal;
    }

    /// Holes in drilling order.
    pub fn drills(&self) -> &[Point] {
        &self.drills
    }

    /// Appends one hole.
    pub fn add_drill(&mut self, point: Point) {
        self.drills.push(point);
    }

    /// Number of holes.
    pub fn len(&self) -> usize {
        self.drills.len()
    }

    /// Returns `true` if the group has no holes.
    pub fn is_empty(&self) -> bool {
        self.drills.is_empty()
    }

    /// Bounding box of all holes.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.drills)
    }

    /// Total travel distance visiting the holes in their current order.
    pub fn path_length(&self) -> f64 {
        path_length(&self.drills)
    }

    /// Moves every hole.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for point in &mut self.drills {
            point.translate(dx, dy);
        }
    }

    /// Rotates every hole 90° about the origin.
    pub fn rotate(&mut self, direction: Direction) {
        for point in &mut self.drills {
            point.rotate(direction);
        }
    }

    /// Divides every coordinate by ten.
    pub fn scale_down(&mut self) {
        for point in &mut self.drills {
            point.scale_down();
        }
    }

    /// Rotates the drilling order so the hole nearest `start` comes first.
    ///
    /// Returns the new last hole, which is where the tool ends up.
    pub fn reorder(&mut self, start: &Point) -> Option<Point> {
        if let Some(idx) = find_nearest(start, &self.drills) {
            self.drills.rotate_left(idx);
        }
        self.drills.last().copied()
    }

    /// Reorders the holes to shorten the tool path.
    ///
    /// Holes are sorted by X then Y, improved by randomized nearest-neighbor
    /// restarts and finally by random pairwise swaps. Both loops scale with the
    /// number of holes and `level`, and a candidate replaces the current order
    /// only if it is strictly shorter. If the result is still not shorter than
    /// the incoming order, the incoming order is kept, so the path never gets
    /// longer.
    pub fn optimize(&mut self, level: u32) {
        if self.drills.len() < 2 {
            return;
        }
        let input = self.drills.clone();
        let input_length = path_length(&input);
        self.drills
            .sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        self.nearest_neighbor_restarts(level);
        self.swap_hill_climb(level);
        if self.path_length() >= input_length {
            self.drills = input;
        }
        tracing::debug!(
            id = %self.id,
            drills = self.drills.len(),
            length = self.path_length(),
            "optimized drill tour"
        );
    }

    fn nearest_neighbor_restarts(&mut self, level: u32) {
        let attempts = restart_count(self.drills.len(), level);
        let mut best_length = self.path_length();
        for _ in 0..attempts {
            let candidate = self.nearest_neighbor_tour();
            let length = path_length(&candidate);
            if length < best_length {
                self.drills = candidate;
                best_length = length;
            }
        }
    }

    fn nearest_neighbor_tour(&mut self) -> Vec<Point> {
        let mut remaining = self.drills.clone();
        let mut tour = Vec::with_capacity(remaining.len());
        let start = self.rng.gen_range(0..remaining.len());
        let mut current = remaining.remove(start);
        while let Some(idx) = find_nearest(&current, &remaining) {
            tour.push(current);
            current = remaining.remove(idx);
        }
        tour.push(current);
        tour
    }

    fn swap_hill_climb(&mut self, level: u32) {
        let count = self.drills.len();
        let iterations = count
            .saturating_mul(16)
            .saturating_mul(usize::try_from(level).unwrap_or(usize::MAX));
        let mut best_length = self.path_length();
        for _ in 0..iterations {
            let p1 = self.rng.gen_range(0..count);
            let p2 = self.rng.gen_range(0..count);
            self.drills.swap(p1, p2);
            let length = self.path_length();
            if length < best_length {
                best_length = length;
            } else {
                self.drills.swap(p1, p2);
            }
        }
    }
}

/// Sum of Euclidean distances between consecutive points.
pub fn path_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| match w {
            [a, b] => a.distance(b),
            _ => 0.0,
        })
        .sum()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn restart_count(count: usize, level: u32) -> usize {
    (count as f64 * 2.0 * (f64::from(level) / 18.0)).round() as usize
}
