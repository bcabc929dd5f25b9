//! Outline processing: reconstruction, classification, inset and tabs.
//!
//! Inset and line intersection follow the rotate-into-line-frame method: the
//! first line is moved to the origin and rotated onto the X axis, after which
//! the crossing of the second line is a single division.

use std::collections::VecDeque;

use crate::config::ProcessConfig;
use crate::diagnostics::Diagnostics;
use crate::geometry::{Direction, DrillGroup, Point, Polygon, MIN_OFFSET};

/// Id of the drill group collecting tab release holes.
pub const TAB_DRILL_GROUP_ID: &str = "MouseBites";

/// Lines whose far ends differ by less than this after rotation are parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Runs the outline pipeline with the cutter and tab settings of a config.
#[derive(Debug, Clone, Copy)]
pub struct PolygonProcessor<'a> {
    config: &'a ProcessConfig,
}

impl<'a> PolygonProcessor<'a> {
    /// Creates a processor bound to `config`.
    pub const fn new(config: &'a ProcessConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &'a ProcessConfig {
        self.config
    }

    /// Turns raw outline fragments into tool-compensated cut paths.
    ///
    /// Stages run in a fixed order: open fragments are joined, straight runs
    /// collapsed, polygons classified as inner or outer and by winding, each
    /// one restarted at the vertex nearest `center`, inset by the cutter
    /// radius, and finally outer edges receive breakaway tabs. Tab release
    /// holes are appended to `drills` as one extra group.
    ///
    /// Polygons that cannot be inset are dropped with a warning.
    pub fn process(
        &self,
        polygons: Vec<Polygon>,
        drills: &mut Vec<DrillGroup>,
        center: &Point,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Polygon> {
        let mut polygons = merge_open_polygons(polygons);
        for polygon in &mut polygons {
            polygon.optimize();
        }
        mark_inner_polygons(&mut polygons);
        for polygon in &mut polygons {
            polygon.set_direction(polygon.winding());
        }
        for polygon in &mut polygons {
            polygon.reorder(center);
        }
        let mut polygons = self.inset_polygons(&polygons, diagnostics);
        let tabbed = self.generate_tabs(&mut polygons, drills);
        if !tabbed && !polygons.is_empty() {
            diagnostics.warn(
                "no tabs were generated, the minimal tab distance may be too big for this board",
            );
        }
        tracing::debug!(polygons = polygons.len(), "processed outlines");
        polygons
    }

    /// Signed inset distance for one polygon.
    ///
    /// Outer cuts keep room for the tab release holes, inner cuts use the bare
    /// cutter radius. The sign flips for counter-clockwise winding and again
    /// for inner polygons so the cutter always runs on the waste side.
    pub fn inset_distance(&self, polygon: &Polygon) -> f64 {
        let outer_radius = (self.config.cutter_diameter + self.config.tab_drill_diameter) / 2.0;
        let inner_radius = self.config.cutter_diameter / 2.0;
        let mut distance = if polygon.is_inner() {
            -inner_radius
        } else {
            -outer_radius
        };
        if polygon.direction() == Direction::Ccw {
            distance = -distance;
        }
        if polygon.is_inner() {
            distance = -distance;
        }
        distance
    }

    fn inset_polygons(&self, polygons: &[Polygon], diagnostics: &mut Diagnostics) -> Vec<Polygon> {
        let mut result = Vec::with_capacity(polygons.len());
        for (idx, polygon) in polygons.iter().enumerate() {
            let distance = self.inset_distance(polygon);
            match inset_polygon(polygon, distance, diagnostics) {
                Some(inset) => result.push(inset),
                None => diagnostics.warn(format!(
                    "polygon {} ({} points, {}) cannot be inset and is skipped",
                    idx + 1,
                    polygon.len(),
                    if polygon.is_closed() { "closed" } else { "open" },
                )),
            }
        }
        result
    }

    /// Inserts breakaway tabs into outer polygons.
    ///
    /// Returns `false` if no tab was produced.
    pub fn generate_tabs(&self, polygons: &mut [Polygon], drills: &mut Vec<DrillGroup>) -> bool {
        let mut group = DrillGroup::new(TAB_DRILL_GROUP_ID, self.config.tab_drill_diameter);
        let num_drills = release_hole_count(self.config.tab_width, self.config.tab_drill_diameter);
        for polygon in polygons.iter_mut().filter(|p| !p.is_inner()) {
            self.generate_tabs_for_polygon(&mut group, num_drills, polygon);
        }
        if group.is_empty() {
            return false;
        }
        tracing::debug!(holes = group.len(), "generated tab release holes");
        drills.push(group);
        true
    }

    fn generate_tabs_for_polygon(&self, group: &mut DrillGroup, num_drills: i64, polygon: &mut Polygon) {
        let Some(mut start) = polygon.first().copied() else {
            return;
        };
        let center = polygon.center();
        let half_cutter_gap = self.config.cutter_diameter / 2.0 - self.config.tab_drill_diameter / 2.0;
        let drill_spacing = self.config.tab_drill_diameter * 2.0;

        let mut i = 1;
        while let Some(end) = polygon.points().get(i).copied() {
            let length = start.distance(&end);
            let splits = split_count(length, self.config.min_tab_distance);
            if splits < 2 || has_slope(&start, &end) {
                start = end;
                i += 1;
                continue;
            }

            let swap = (start.x - end.x) > 0.1 || (start.y - end.y) > 0.1;
            #[allow(clippy::cast_precision_loss)]
            let mut offset = length / splits as f64;
            let mut half_tab = (self.config.tab_width + self.config.cutter_diameter) / 2.0;
            if swap {
                offset = -offset;
                half_tab = -half_tab;
            }
            let along_y = (start.x - end.x).abs() < MIN_OFFSET;
            let mut drill_shift = -half_cutter_gap;
            if negative_shift_is_closer(&start, &center, drill_shift, along_y) {
                drill_shift = -drill_shift;
            }

            let (mut x1, mut y1) = (start.x, start.y);
            for _ in 1..splits {
                let (mut p1, p2) = if along_y {
                    y1 += offset;
                    for k in -num_drills / 2..=num_drills / 2 {
                        #[allow(clippy::cast_precision_loss)]
                        let shift = drill_spacing * k as f64;
                        group.add_drill(Point::new(x1 + drill_shift, y1 + shift));
                    }
                    (Point::new(x1, y1 - half_tab), Point::new(x1, y1 + half_tab))
                } else {
                    x1 += offset;
                    for k in -num_drills / 2..=num_drills / 2 {
                        #[allow(clippy::cast_precision_loss)]
                        let shift = drill_spacing * k as f64;
                        group.add_drill(Point::new(x1 + shift, y1 + drill_shift));
                    }
                    (Point::new(x1 - half_tab, y1), Point::new(x1 + half_tab, y1))
                };
                p1.retract = true;
                polygon.insert(i, p2);
                polygon.insert(i, p1);
                i += 2;
            }
            start = end;
            i += 1;
        }
    }
}

/// Joins open fragments whose endpoints meet into longer polygons.
///
/// Closed polygons are kept first, in input order. Each open fragment is
/// matched against a remaining fragment ending where it starts; the pair is
/// concatenated and either finished (if now closed) or queued again.
/// Fragments without a match are kept open.
pub fn merge_open_polygons(polygons: Vec<Polygon>) -> Vec<Polygon> {
    let (mut result, open): (Vec<Polygon>, Vec<Polygon>) =
        polygons.into_iter().partition(Polygon::is_closed);

    let mut open: VecDeque<Polygon> = open.into();
    while let Some(current) = open.pop_front() {
        let preceding = current.first().and_then(|first| {
            open.iter()
                .position(|candidate| candidate.last().is_some_and(|last| last.coincides(first)))
        });
        match preceding.and_then(|idx| open.remove(idx)) {
            Some(preceding) => {
                let merged = Polygon::merge(&preceding, &current);
                if merged.is_closed() {
                    result.push(merged);
                } else {
                    open.push_back(merged);
                }
            }
            None => result.push(current),
        }
    }
    result
}

/// Marks every polygon whose bounding box lies strictly inside the bounding
/// box of another polygon as inner.
pub fn mark_inner_polygons(polygons: &mut [Polygon]) {
    for idx in 0..polygons.len() {
        let Some(tested) = polygons.get(idx) else {
            continue;
        };
        if tested.is_inner() {
            continue;
        }
        let tested_bounds = *tested.bounds();
        let contained = polygons
            .iter()
            .enumerate()
            .any(|(other, p)| other != idx && p.bounds().strictly_contains(&tested_bounds));
        if contained {
            if let Some(polygon) = polygons.get_mut(idx) {
                polygon.set_inner(true);
            }
        }
    }
}

/// Offsets a closed polygon by `distance` along the edge normals.
///
/// Returns `None` if the polygon has fewer than three points or is open.
/// Corners whose offset edges do not intersect are replaced by the vertex
/// moved along the normal of an adjacent edge, and a warning is recorded.
pub fn inset_polygon(polygon: &Polygon, distance: f64, diagnostics: &mut Diagnostics) -> Option<Polygon> {
    if polygon.len() < 3 || !polygon.is_closed() {
        return None;
    }
    let size = polygon.len() - 1;
    let vertices = polygon.points().get(..size)?;

    let mut points = Vec::with_capacity(size + 1);
    let mut cd = *vertices.get(size - 1)?;
    let mut ef = *vertices.first()?;
    for i in 0..size {
        let ab = cd;
        cd = ef;
        ef = *vertices.get((i + 1) % size)?;
        let corner = inset_corner(&ab, &cd, &ef, distance).unwrap_or_else(|| {
            diagnostics.warn(format!(
                "unable to calculate inset at ({:.6}, {:.6}), distance {distance}",
                cd.x, cd.y
            ));
            shifted_vertex(&ab, &cd, &ef, distance)
        });
        points.push(corner);
    }
    let first = points.first()?.without_retract();
    points.push(first);

    let mut result = Polygon::new(points);
    result.set_direction(polygon.direction());
    result.set_inner(polygon.is_inner());
    result.set_kind(polygon.kind());
    Some(result)
}

/// New position of corner `cd` after offsetting edges `ab-cd` and `cd-ef`.
///
/// Returns `None` for a zero-length edge or when the offset edges are parallel.
pub fn inset_corner(ab: &Point, cd: &Point, ef: &Point, distance: f64) -> Option<Point> {
    let (ix1, iy1) = edge_offset(ab, cd, distance)?;
    let (ix2, iy2) = edge_offset(cd, ef, distance)?;

    let nab = Point::new(ab.x + ix1, ab.y + iy1);
    let ncd1 = Point::new(cd.x + ix1, cd.y + iy1);
    let nef = Point::new(ef.x + ix2, ef.y + iy2);
    let ncd2 = Point::new(cd.x + ix2, cd.y + iy2);
    line_intersection(&nab, &ncd1, &nef, &ncd2)
}

/// Intersection of the infinite lines `a-b` and `c-d`.
///
/// Returns `None` if `a` and `b` coincide or the lines are parallel.
pub fn line_intersection(a: &Point, b: &Point, c: &Point, d: &Point) -> Option<Point> {
    let dist_ab = a.distance(b);
    if dist_ab == 0.0 {
        return None;
    }
    let cos = (b.x - a.x) / dist_ab;
    let sin = (b.y - a.y) / dist_ab;

    let (cx, cy) = (c.x - a.x, c.y - a.y);
    let (dx, dy) = (d.x - a.x, d.y - a.y);
    let c_rot = (cx.mul_add(cos, cy * sin), cy.mul_add(cos, -(cx * sin)));
    let d_rot = (dx.mul_add(cos, dy * sin), dy.mul_add(cos, -(dx * sin)));

    if (c_rot.1 - d_rot.1).abs() < PARALLEL_EPSILON {
        return None;
    }
    let along = d_rot.0 + (c_rot.0 - d_rot.0) * d_rot.1 / (d_rot.1 - c_rot.1);
    Some(Point::new(along.mul_add(cos, a.x), along.mul_add(sin, a.y)))
}

/// Normal offset `(dy, -dx) / len * distance` of the edge `from-to`.
fn edge_offset(from: &Point, to: &Point, distance: f64) -> Option<(f64, f64)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return None;
    }
    Some((dy / len * distance, -dx / len * distance))
}

fn shifted_vertex(ab: &Point, cd: &Point, ef: &Point, distance: f64) -> Point {
    edge_offset(ab, cd, distance)
        .or_else(|| edge_offset(cd, ef, distance))
        .map_or_else(|| cd.without_retract(), |(ix, iy)| Point::new(cd.x + ix, cd.y + iy))
}

fn has_slope(start: &Point, end: &Point) -> bool {
    (start.x - end.x).abs() > MIN_OFFSET && (start.y - end.y).abs() > MIN_OFFSET
}

fn negative_shift_is_closer(start: &Point, center: &Point, shift: f64, along_y: bool) -> bool {
    let (p1, p2) = if along_y {
        (Point::new(start.x + shift, start.y), Point::new(start.x - shift, start.y))
    } else {
        (Point::new(start.x, start.y + shift), Point::new(start.x, start.y - shift))
    };
    p1.distance(center) > p2.distance(center)
}

#[allow(clippy::cast_possible_truncation)]
fn split_count(length: f64, min_tab_distance: f64) -> i64 {
    let raw = (length / min_tab_distance).round();
    if raw.is_finite() {
        raw as i64
    } else {
        0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn release_hole_count(tab_width: f64, tab_drill_diameter: f64) -> i64 {
    let raw = (tab_width / (tab_drill_diameter * 2.0)).round();
    if raw.is_finite() {
        raw as i64
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::from_coords(&[
            (x, y),
            (x, y + size),
            (x + size, y + size),
            (x + size, y),
            (x, y),
        ])
    }

    fn assert_point(p: &Point, x: f64, y: f64) {
        assert!((p.x - x).abs() < EPS && (p.y - y).abs() < EPS, "expected ({x}, {y}), got ({}, {})", p.x, p.y);
    }

    #[test]
    fn line_intersection_of_crossing_lines() {
        let p = line_intersection(
            &Point::new(0.0, 0.0),
            &Point::new(10.0, 10.0),
            &Point::new(0.0, 10.0),
            &Point::new(10.0, 0.0),
        );
        assert!(p.is_some());
        if let Some(p) = p {
            assert_point(&p, 5.0, 5.0);
        }
    }

    #[test]
    fn line_intersection_of_perpendicular_lines() {
        let p = line_intersection(
            &Point::new(0.0, 0.0),
            &Point::new(10.0, 0.0),
            &Point::new(5.0, -5.0),
            &Point::new(5.0, 5.0),
        );
        assert!(p.is_some());
        if let Some(p) = p {
            assert_point(&p, 5.0, 0.0);
        }
    }

    #[test]
    fn line_intersection_of_parallel_lines_is_none() {
        let p = line_intersection(
            &Point::new(0.0, 0.0),
            &Point::new(10.0, 0.0),
            &Point::new(0.0, 1.0),
            &Point::new(10.0, 1.0),
        );
        assert!(p.is_none());
    }

    #[test]
    fn line_intersection_with_degenerate_first_line_is_none() {
        let a = Point::new(1.0, 1.0);
        assert!(line_intersection(&a, &a, &Point::new(0.0, 0.0), &Point::new(2.0, 0.0)).is_none());
    }

    #[test]
    fn inset_corner_rejects_zero_length_edges() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert!(inset_corner(&a, &a, &b, 0.1).is_none());
        assert!(inset_corner(&a, &b, &b, 0.1).is_none());
    }

    #[test]
    fn inset_square_inward() {
        let mut diagnostics = Diagnostics::new();
        let result = inset_polygon(&square(1.0, 1.0, 1.0), 0.1, &mut diagnostics);
        assert!(result.is_some());
        let Some(result) = result else {
            return;
        };
        assert_eq!(result.len(), 5);
        assert!(result.is_closed());
        assert!((result.size().x - 0.8).abs() < EPS);
        assert!((result.size().y - 0.8).abs() < EPS);
        assert_point(&result.points()[0], 1.1, 1.1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn inset_square_outward() {
        let mut diagnostics = Diagnostics::new();
        let Some(result) = inset_polygon(&square(1.0, 1.0, 1.0), -0.1, &mut diagnostics) else {
            unreachable!("closed square must inset");
        };
        assert!((result.size().x - 1.2).abs() < EPS);
        assert_point(&result.bounds().min(), 0.9, 0.9);
        assert!((result.bounds().max_x - 2.1).abs() < EPS);
    }

    #[test]
    fn inset_round_trip_restores_convex_polygon() {
        let original = Polygon::from_coords(&[(0.0, 0.0), (1.0, 4.0), (5.0, 5.0), (6.0, 1.0), (0.0, 0.0)]);
        let mut diagnostics = Diagnostics::new();
        let there = inset_polygon(&original, 0.3, &mut diagnostics);
        let back = there.and_then(|p| inset_polygon(&p, -0.3, &mut diagnostics));
        assert!(back.is_some());
        if let Some(back) = back {
            for (a, b) in original.points().iter().zip(back.points()) {
                assert!(a.distance(b) < 0.005, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn inset_keeps_flags() {
        let mut poly = square(0.0, 0.0, 4.0);
        poly.set_inner(true);
        poly.set_direction(Direction::Cw);
        let mut diagnostics = Diagnostics::new();
        let result = inset_polygon(&poly, 0.5, &mut diagnostics);
        assert!(result.as_ref().is_some_and(Polygon::is_inner));
        assert_eq!(result.map(|p| p.direction()), Some(Direction::Cw));
    }

    #[test]
    fn inset_rejects_open_and_short_polygons() {
        let mut diagnostics = Diagnostics::new();
        let open = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        assert!(inset_polygon(&open, 0.1, &mut diagnostics).is_none());
        let short = Polygon::from_coords(&[(0.0, 0.0), (0.0, 0.0)]);
        assert!(inset_polygon(&short, 0.1, &mut diagnostics).is_none());
    }

    #[test]
    fn inset_warns_on_collinear_corner() {
        let poly = Polygon::from_coords(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (2.0, 0.0), (0.0, 0.0)]);
        let mut diagnostics = Diagnostics::new();
        let result = inset_polygon(&poly, 0.1, &mut diagnostics);
        assert!(result.is_some());
        assert_eq!(diagnostics.warnings().len(), 1);
        if let Some(result) = result {
            // the collinear vertex is pushed along its edge normal
            let expected = Point::new(1.0 + 0.1 / 2f64.sqrt(), 1.0 - 0.1 / 2f64.sqrt());
            assert!(result.points()[1].distance(&expected) < EPS);
        }
    }

    #[test]
    fn merge_joins_fragments_into_closed_polygon() {
        let a = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let b = Polygon::from_coords(&[(1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        let result = merge_open_polygons(vec![a, b]);
        assert_eq!(result.len(), 1);
        assert!(result[0].is_closed());
        assert_eq!(result[0].len(), 6);
    }

    #[test]
    fn merge_keeps_closed_polygons_first() {
        let open = Polygon::from_coords(&[(5.0, 5.0), (6.0, 6.0)]);
        let closed = square(0.0, 0.0, 1.0);
        let result = merge_open_polygons(vec![open, closed]);
        assert_eq!(result.len(), 2);
        assert!(result[0].is_closed());
        assert!(!result[1].is_closed());
    }

    #[test]
    fn merge_chains_three_fragments() {
        let a = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0)]);
        let b = Polygon::from_coords(&[(0.0, 1.0), (1.0, 1.0)]);
        let c = Polygon::from_coords(&[(1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        let result = merge_open_polygons(vec![c, a, b]);
        assert_eq!(result.len(), 1);
        assert!(result[0].is_closed());
    }

    #[test]
    fn merge_leaves_unmatched_fragments_open() {
        let a = Polygon::from_coords(&[(0.0, 0.0), (0.0, 1.0)]);
        let b = Polygon::from_coords(&[(3.0, 3.0), (4.0, 4.0)]);
        let result = merge_open_polygons(vec![a, b]);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|p| !p.is_closed()));
    }

    #[test]
    fn nested_square_is_inner() {
        let mut polygons = vec![square(0.0, 0.0, 10.0), square(2.0, 2.0, 2.0)];
        mark_inner_polygons(&mut polygons);
        assert!(!polygons[0].is_inner());
        assert!(polygons[1].is_inner());
    }

    #[test]
    fn disjoint_squares_are_outer() {
        let mut polygons = vec![square(0.0, 0.0, 1.0), square(2.0, 0.0, 1.0)];
        mark_inner_polygons(&mut polygons);
        assert!(polygons.iter().all(|p| !p.is_inner()));
    }

    #[test]
    fn same_size_squares_are_not_inner() {
        let mut polygons = vec![square(0.0, 0.0, 1.0), square(0.0, 0.0, 1.0)];
        mark_inner_polygons(&mut polygons);
        assert!(polygons.iter().all(|p| !p.is_inner()));
    }

    #[test]
    fn inset_distance_signs() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);

        let mut poly = square(0.0, 0.0, 10.0);
        poly.set_direction(Direction::Cw);
        assert!((processor.inset_distance(&poly) + 1.05).abs() < EPS);

        poly.set_direction(Direction::Ccw);
        assert!((processor.inset_distance(&poly) - 1.05).abs() < EPS);

        poly.set_inner(true);
        assert!((processor.inset_distance(&poly) + 0.8).abs() < EPS);

        poly.set_direction(Direction::Cw);
        assert!((processor.inset_distance(&poly) - 0.8).abs() < EPS);
    }

    #[test]
    fn outer_cut_grows_and_inner_cut_shrinks() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);
        let mut drills = Vec::new();
        let mut diagnostics = Diagnostics::new();
        let polygons = vec![square(0.0, 0.0, 10.0), square(3.0, 3.0, 4.0)];
        let result = processor.process(polygons, &mut drills, &Point::new(5.0, 5.0), &mut diagnostics);
        assert_eq!(result.len(), 2);
        assert!((result[0].size().x - 12.1).abs() < EPS);
        assert!(result[1].is_inner());
        assert!((result[1].size().x - 2.4).abs() < EPS);
    }

    #[test]
    fn process_generates_tabs_on_long_edges() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);
        let mut drills = Vec::new();
        let mut diagnostics = Diagnostics::new();
        let result = processor.process(
            vec![square(0.0, 0.0, 50.0)],
            &mut drills,
            &Point::new(25.0, 25.0),
            &mut diagnostics,
        );
        assert_eq!(result.len(), 1);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.warnings());
        assert_eq!(drills.len(), 1);
        assert_eq!(drills[0].id(), TAB_DRILL_GROUP_ID);
        assert!((drills[0].diameter() - 0.5).abs() < EPS);

        // 52.1mm edges, 16mm spacing: 3 splits, 2 tabs per edge, 5 holes per tab
        let retracts = result[0].points().iter().filter(|p| p.retract).count();
        assert_eq!(retracts, 8);
        assert_eq!(result[0].len(), 5 + 16);
        assert_eq!(drills[0].len(), 8 * 5);
        assert!(result[0].is_closed());
    }

    #[test]
    fn tab_gap_and_release_holes_sit_on_edge() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);
        let mut polygons = vec![Polygon::from_coords(&[(0.0, 0.0), (0.0, 32.0), (1.0, 32.0), (1.0, 0.0), (0.0, 0.0)])];
        let mut drills = Vec::new();
        assert!(processor.generate_tabs(&mut polygons, &mut drills));

        let points = polygons[0].points();
        assert!(points[1].retract);
        assert!(!points[2].retract);
        // gap centered at y = 16, (tab width + cutter) / 2 = 3.3 either side
        assert_point(&points[1], 0.0, 16.0 - 3.3);
        assert_point(&points[2], 0.0, 16.0 + 3.3);

        // holes shifted by (cutter - tab drill) / 2 towards the polygon center
        let holes = drills[0].drills();
        assert_eq!(holes.len(), 5 * 2);
        assert_point(&holes[0], 0.55, 14.0);
        assert_point(&holes[2], 0.55, 16.0);
    }

    #[test]
    fn no_tabs_on_short_or_diagonal_edges() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);
        let mut polygons = vec![
            square(0.0, 0.0, 10.0),
            Polygon::from_coords(&[(0.0, 0.0), (40.0, 40.0), (80.0, 0.0), (0.0, 0.0)]),
        ];
        let mut drills = Vec::new();
        // the last edge of the triangle is 80mm long and straight
        assert!(processor.generate_tabs(&mut polygons, &mut drills));
        assert_eq!(polygons[0].len(), 5);
        assert_eq!(polygons[1].points().iter().filter(|p| p.retract).count(), 4);

        let mut short = vec![square(0.0, 0.0, 10.0)];
        let mut drills = Vec::new();
        assert!(!processor.generate_tabs(&mut short, &mut drills));
        assert!(drills.is_empty());
    }

    #[test]
    fn inner_polygons_get_no_tabs() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);
        let mut inner = square(0.0, 0.0, 50.0);
        inner.set_inner(true);
        let mut polygons = vec![inner];
        let mut drills = Vec::new();
        assert!(!processor.generate_tabs(&mut polygons, &mut drills));
        assert_eq!(polygons[0].len(), 5);
    }

    #[test]
    fn process_warns_when_no_tabs() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);
        let mut drills = Vec::new();
        let mut diagnostics = Diagnostics::new();
        processor.process(vec![square(0.0, 0.0, 5.0)], &mut drills, &Point::new(0.0, 0.0), &mut diagnostics);
        assert_eq!(diagnostics.warnings().len(), 1);
        assert!(diagnostics.warnings()[0].contains("no tabs"));
    }

    #[test]
    fn process_without_outlines_is_silent() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);
        let mut drills = Vec::new();
        let mut diagnostics = Diagnostics::new();
        let result = processor.process(Vec::new(), &mut drills, &Point::new(0.0, 0.0), &mut diagnostics);
        assert!(result.is_empty());
        assert!(drills.is_empty());
        assert!(diagnostics.is_empty(), "unexpected warnings: {:?}", diagnostics.warnings());
    }

    #[test]
    fn process_skips_polygons_that_cannot_be_inset() {
        let config = ProcessConfig::default();
        let processor = PolygonProcessor::new(&config);
        let flat = Polygon::from_coords(&[(2.0, 0.0), (2.0, 1.0), (2.0, 1.0), (2.0, 0.0), (2.0, 0.0)]);
        let mut drills = Vec::new();
        let mut diagnostics = Diagnostics::new();
        let result = processor.process(
            vec![square(0.0, 0.0, 1.0), flat],
            &mut drills,
            &Point::new(1.0, 0.5),
            &mut diagnostics,
        );
        assert_eq!(result.len(), 1);
        assert!(diagnostics.warnings().iter().any(|w| w.contains("cannot be inset")));
    }
}
