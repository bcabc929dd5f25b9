//! Gerber outline layer reader.
//!
//! Walks the D01/D02 commands of a board outline layer and turns every run of
//! connected draws into one open [`Polygon`] in millimeters. A run that
//! starts where the previously flushed polygon ended is appended to it, so
//! outlines written as one D02/D01 pair per segment come back as a single
//! path. Remaining gaps are closed later by fragment joining.

use std::f64::consts::TAU;
use std::io::{BufReader, Cursor};

use gerber_types::{
    Command, CoordinateOffset, Coordinates, DCode, FunctionCode, GCode, InterpolationMode,
    Operation, QuadrantMode, Unit,
};

use crate::diagnostics::Diagnostics;
use crate::error::CamError;
use crate::excellon::MM_PER_INCH;
use crate::geometry::{Point, Polygon, PRECISION};

/// Longest chord used when flattening circular interpolation, in millimeters.
const ARC_SEGMENT_LENGTH: f64 = 0.1;
const MIN_ARC_SEGMENTS: u32 = 8;

/// Polygons read from an outline layer together with reader warnings.
#[derive(Debug, Clone, Default)]
pub struct OutlineResult {
    /// Open outline paths in file order, in millimeters.
    pub polygons: Vec<Polygon>,
    /// Number of D01 draws that contributed points.
    pub draw_count: usize,
    /// Recoverable problems, in the order they were found.
    pub warnings: Vec<String>,
}

/// Read a Gerber outline layer.
///
/// A file the parser only partially understands is still walked; the parse
/// error is reported as a warning. Apertures and flashes are ignored since
/// only the center line of the outline is cut.
///
/// # Errors
///
/// Returns [`CamError::ParseError`] if `data` is empty.
pub fn read(data: &[u8]) -> Result<OutlineResult, CamError> {
    if data.is_empty() {
        return Err(CamError::ParseError("empty outline input".to_string()));
    }

    let mut diagnostics = Diagnostics::new();
    let reader = BufReader::new(Cursor::new(data));
    let doc = match gerber_parser::parse(reader) {
        Ok(doc) => doc,
        Err((doc, err)) => {
            diagnostics.warn(format!(
                "outline layer was only partially parsed: {err:?}"
            ));
            doc
        }
    };

    let scale = match doc.units {
        Some(Unit::Inches) => MM_PER_INCH,
        Some(Unit::Millimeters) => 1.0,
        None => {
            diagnostics.warn("outline layer declares no units, assuming millimeters");
            1.0
        }
    };

    let mut plotter = OutlinePlotter::new(scale, diagnostics);
    for command in doc.commands() {
        plotter.apply(command);
    }
    Ok(plotter.finish())
}

/// Center line plotter collecting connected draws into polygons.
#[derive(Debug)]
struct OutlinePlotter {
    scale: f64,
    position: Point,
    interpolation: InterpolationMode,
    multi_quadrant: bool,
    path: Vec<Point>,
    polygons: Vec<Polygon>,
    draw_count: usize,
    diagnostics: Diagnostics,
}

impl OutlinePlotter {
    const fn new(scale: f64, diagnostics: Diagnostics) -> Self {
        Self {
            scale,
            position: Point::new(0.0, 0.0),
            interpolation: InterpolationMode::Linear,
            multi_quadrant: false,
            path: Vec::new(),
            polygons: Vec::new(),
            draw_count: 0,
            diagnostics,
        }
    }

    fn apply(&mut self, command: &Command) {
        match command {
            Command::FunctionCode(FunctionCode::GCode(GCode::InterpolationMode(mode))) => {
                self.interpolation = *mode;
            }
            Command::FunctionCode(FunctionCode::GCode(GCode::QuadrantMode(mode))) => {
                self.multi_quadrant = matches!(mode, QuadrantMode::Multi);
            }
            Command::FunctionCode(FunctionCode::DCode(DCode::Operation(operation))) => {
                self.operate(operation);
            }
            _ => {}
        }
    }

    fn operate(&mut self, operation: &Operation) {
        match operation {
            Operation::Interpolate(coords, offset) => {
                let target = self.target(coords.as_ref());
                self.draw(target, offset.as_ref());
            }
            Operation::Move(coords) => {
                let target = self.target(coords.as_ref());
                self.flush();
                self.position = target;
            }
            Operation::Flash(coords) => {
                let target = self.target(coords.as_ref());
                tracing::debug!(x = target.x, y = target.y, "flash ignored on outline layer");
                self.position = target;
            }
        }
    }

    /// Modal coordinates: a missing axis keeps the current value.
    fn target(&self, coords: Option<&Coordinates>) -> Point {
        let Some(coords) = coords else {
            return self.position;
        };
        Point::new(
            coords.x.map_or(self.position.x, |x| f64::from(x) * self.scale),
            coords.y.map_or(self.position.y, |y| f64::from(y) * self.scale),
        )
    }

    fn draw(&mut self, target: Point, offset: Option<&CoordinateOffset>) {
        if self.path.is_empty() {
            self.path.push(self.position);
        }
        match self.interpolation {
            InterpolationMode::Linear => self.path.push(target),
            InterpolationMode::ClockwiseCircular => self.arc(target, offset, true),
            InterpolationMode::CounterclockwiseCircular => self.arc(target, offset, false),
        }
        self.draw_count += 1;
        self.position = target;
    }

    fn arc(&mut self, target: Point, offset: Option<&CoordinateOffset>, clockwise: bool) {
        let (i, j) = offset.map_or((0.0, 0.0), |offset| {
            (
                offset.x.map_or(0.0, |x| f64::from(x) * self.scale),
                offset.y.map_or(0.0, |y| f64::from(y) * self.scale),
            )
        });
        let from = self.position;
        let center = if self.multi_quadrant {
            Point::new(from.x + i, from.y + j)
        } else {
            single_quadrant_center(from, target, i.abs(), j.abs(), clockwise)
        };

        let radius = from.distance(&center);
        if radius < PRECISION {
            self.diagnostics.warn(format!(
                "arc to ({:.3}, {:.3}) has zero radius, drawn as a straight line",
                target.x, target.y
            ));
            self.path.push(target);
            return;
        }

        let start = (from.y - center.y).atan2(from.x - center.x);
        let end = (target.y - center.y).atan2(target.x - center.x);
        let sweep = if from.coincides(&target) && self.multi_quadrant {
            if clockwise {
                -TAU
            } else {
                TAU
            }
        } else {
            arc_sweep(start, end, clockwise)
        };

        let segments = arc_segment_count(sweep.abs() * radius);
        for step in 1..segments {
            let angle = sweep.mul_add(f64::from(step) / f64::from(segments), start);
            self.path.push(Point::new(
                radius.mul_add(angle.cos(), center.x),
                radius.mul_add(angle.sin(), center.y),
            ));
        }
        self.path.push(target);
    }

    fn flush(&mut self) {
        if self.path.len() < 2 {
            self.path.clear();
            return;
        }
        let path = std::mem::take(&mut self.path);
        if let Some(last) = self.polygons.last_mut() {
            let joins = match (last.last(), path.first()) {
                (Some(end), Some(start)) => end.distance(start) <= PRECISION,
                _ => false,
            };
            if joins {
                last.extend(path.into_iter().skip(1));
                return;
            }
        }
        self.polygons.push(Polygon::new(path));
    }

    fn finish(mut self) -> OutlineResult {
        self.flush();
        if self.polygons.is_empty() {
            self.diagnostics.warn("outline layer holds no draws");
        }
        tracing::debug!(
            polygons = self.polygons.len(),
            draws = self.draw_count,
            "outline layer read"
        );
        OutlineResult {
            polygons: self.polygons,
            draw_count: self.draw_count,
            warnings: self.diagnostics.into_warnings(),
        }
    }
}

fn arc_sweep(start: f64, end: f64, clockwise: bool) -> f64 {
    let delta = end - start;
    if clockwise {
        if delta >= 0.0 {
            delta - TAU
        } else {
            delta
        }
    } else if delta <= 0.0 {
        delta + TAU
    } else {
        delta
    }
}

/// Single-quadrant offsets are unsigned; pick the sign combination whose
/// center is equidistant from both ends and sweeps at most a quarter turn.
fn single_quadrant_center(from: Point, to: Point, i: f64, j: f64, clockwise: bool) -> Point {
    let mut best = Point::new(from.x + i, from.y + j);
    let mut best_error = f64::INFINITY;
    for (si, sj) in [(1.0_f64, 1.0_f64), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
        let center = Point::new(si.mul_add(i, from.x), sj.mul_add(j, from.y));
        let start = (from.y - center.y).atan2(from.x - center.x);
        let end = (to.y - center.y).atan2(to.x - center.x);
        if arc_sweep(start, end, clockwise).abs() > TAU / 4.0 + PRECISION {
            continue;
        }
        let error = (from.distance(&center) - to.distance(&center)).abs();
        if error < best_error {
            best = center;
            best_error = error;
        }
    }
    best
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn arc_segment_count(arc_length: f64) -> u32 {
    let raw = (arc_length / ARC_SEGMENT_LENGTH).ceil();
    if !raw.is_finite() || raw <= 0.0 {
        return MIN_ARC_SEGMENTS;
    }
    (raw.min(f64::from(u32::MAX)) as u32).max(MIN_ARC_SEGMENTS)
}
