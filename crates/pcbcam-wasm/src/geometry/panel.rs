//! One manufacturing run: all outlines and drill groups, plus the
//! panel-level transforms applied before emission.

use serde::Serialize;

use super::circle::circle;
use super::drill_group::DrillGroup;
use super::point::{BoundingBox, Direction, Point};
use super::polygon::Polygon;
use super::stats::{DrillStatistics, PanelStatistics};
use crate::config::ProcessConfig;
use crate::diagnostics::Diagnostics;
use crate::error::CamError;
use crate::gcode;
use crate::processor::{DrillProcessor, PolygonProcessor};

/// Drill coordinates beyond this multiple of the panel extent are assumed to
/// be in the wrong unit.
const DRILL_SCALE_ANOMALY_FACTOR: f64 = 8.0;

/// Which panel transforms were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TransformStatus {
    /// Panel was rotated to match the blank orientation.
    pub rotated: bool,
    /// Panel was centered on the blank.
    pub centered: bool,
}

/// Outlines and drill groups of one run.
///
/// Size, minimum corner and center are derived from the outlines on demand.
#[derive(Debug, Clone)]
pub struct Panel {
    outlines: Vec<Polygon>,
    drills: Vec<DrillGroup>,
    diagnostics: Diagnostics,
}

impl Panel {
    /// Creates a panel.
    ///
    /// If any drill lies beyond eight times the outline extent the drill data
    /// is assumed to be scaled by ten and every group is divided down, with a
    /// warning.
    pub fn new(outlines: Vec<Polygon>, drills: Vec<DrillGroup>) -> Self {
        let mut panel = Self {
            outlines,
            drills,
            diagnostics: Diagnostics::new(),
        };
        if panel.has_drill_scale_anomaly() {
            panel.diagnostics.warn(
                "drill coordinates exceed the panel size, scaling drills down by 10; verify the output manually",
            );
            for group in &mut panel.drills {
                group.scale_down();
            }
        }
        panel
    }

    fn has_drill_scale_anomaly(&self) -> bool {
        let bounds = self.bounds();
        if bounds.is_empty() {
            return false;
        }
        let limit_x = bounds.max_x * DRILL_SCALE_ANOMALY_FACTOR;
        let limit_y = bounds.max_y * DRILL_SCALE_ANOMALY_FACTOR;
        self.drills
            .iter()
            .flat_map(DrillGroup::drills)
            .any(|p| p.x > limit_x || p.y > limit_y)
    }

    /// Cut paths.
    pub fn outlines(&self) -> &[Polygon] {
        &self.outlines
    }

    /// Drill groups.
    pub fn drills(&self) -> &[DrillGroup] {
        &self.drills
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[String] {
        self.diagnostics.warnings()
    }

    /// Records a warning produced outside the panel, e.g. by a file reader.
    pub fn warn(&mut self, msg: impl Into<String>) {
        self.diagnostics.warn(msg);
    }

    /// Consumes the panel and returns its warnings.
    pub fn into_warnings(self) -> Vec<String> {
        self.diagnostics.into_warnings()
    }

    /// Bounding box of all outlines.
    pub fn bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::new();
        for polygon in &self.outlines {
            bounds.merge(polygon.bounds());
        }
        bounds
    }

    /// Panel width and height.
    pub fn size(&self) -> Point {
        self.bounds().size()
    }

    /// Minimum corner of the outlines.
    pub fn min(&self) -> Point {
        self.bounds().min()
    }

    /// Center of the outline bounding box.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Moves everything on the panel.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for polygon in &mut self.outlines {
            polygon.translate(dx, dy);
        }
        for group in &mut self.drills {
            group.translate(dx, dy);
        }
    }

    /// Rotates everything on the panel 90° about the origin.
    pub fn rotate(&mut self, direction: Direction) {
        for polygon in &mut self.outlines {
            polygon.rotate(direction);
        }
        for group in &mut self.drills {
            group.rotate(direction);
        }
    }

    /// Runs outline processing, optional large-drill milling and drill
    /// normalization and optimization.
    ///
    /// Returns the drill statistics taken after normalization but before tour
    /// optimization, so the caller can report the improvement.
    pub fn process(
        &mut self,
        polygon_processor: &PolygonProcessor<'_>,
        drill_processor: &DrillProcessor<'_>,
    ) -> DrillStatistics {
        let center = self.center();
        let outlines = std::mem::take(&mut self.outlines);
        self.outlines =
            polygon_processor.process(outlines, &mut self.drills, &center, &mut self.diagnostics);

        self.replace_large_drills(drill_processor);

        let drills = std::mem::take(&mut self.drills);
        self.drills = drill_processor.process(drills);
        let before = self.drill_stats();
        let drills = std::mem::take(&mut self.drills);
        self.drills = drill_processor.optimize(drills);
        before
    }

    fn replace_large_drills(&mut self, drill_processor: &DrillProcessor<'_>) {
        let config = drill_processor.config();
        if !config.mill_large_drills {
            return;
        }
        let (large, small): (Vec<DrillGroup>, Vec<DrillGroup>) = std::mem::take(&mut self.drills)
            .into_iter()
            .partition(|group| group.diameter() >= config.large_drill_threshold);
        self.drills = small;

        let large = drill_processor.optimize(drill_processor.process(large));
        for group in &large {
            let diameter = group.diameter() - config.cutter_diameter;
            if diameter <= 0.0 {
                self.diagnostics.warn(format!(
                    "drill {} ({:.2}mm) is not larger than the cutter, {} holes skipped",
                    group.id(),
                    group.diameter(),
                    group.len()
                ));
                continue;
            }
            tracing::debug!(id = group.id(), holes = group.len(), "milling large drills");
            self.outlines
                .extend(group.drills().iter().map(|p| circle(p.without_retract(), diameter)));
        }
    }

    /// Rotates the panel to the blank orientation, then centers it on the
    /// blank. Each step runs only if enabled in `config`.
    pub fn rotate_and_center(&mut self, config: &ProcessConfig) -> TransformStatus {
        let rotated = self.rotate_to_blank(config);
        let centered = self.center_on_blank(config);
        TransformStatus { rotated, centered }
    }

    fn rotate_to_blank(&mut self, config: &ProcessConfig) -> bool {
        if !config.rotate_panel {
            return false;
        }
        let blank = config.blank_dimensions();
        let size = self.size();
        if (blank.x < blank.y) == (size.x < size.y) {
            return false;
        }
        let min = self.min();
        self.rotate(Direction::Cw);
        let rotated_min = self.min();
        self.translate(min.x - rotated_min.x, min.y - rotated_min.y);
        true
    }

    fn center_on_blank(&mut self, config: &ProcessConfig) -> bool {
        if !config.center_panel {
            return false;
        }
        let blank = config.blank_dimensions();
        let size = self.size();
        let min = self.min();
        self.translate(
            (blank.x - size.x) / 2.0 - min.x,
            (blank.y - size.y) / 2.0 - min.y,
        );
        true
    }

    /// Drill counts and tour lengths in the current order.
    pub fn drill_stats(&self) -> DrillStatistics {
        let mut stats = DrillStatistics::new();
        for group in &self.drills {
            stats.add(group.diameter(), group.len(), group.path_length());
        }
        stats
    }

    /// Panel size, board count and drill statistics.
    pub fn stats(&self) -> PanelStatistics {
        let size = self.size();
        PanelStatistics {
            panel_size: [size.x, size.y],
            board_sizes: self
                .outlines
                .iter()
                .filter(|p| !p.is_inner())
                .map(|p| {
                    let s = p.size();
                    [s.x, s.y]
                })
                .collect(),
            drills: self.drill_stats(),
        }
    }

    /// Program cutting the outlines and drilling every group.
    ///
    /// # Errors
    ///
    /// Returns [`CamError::InvalidInput`] if the panel is empty.
    pub fn generate(&mut self, config: &ProcessConfig) -> Result<String, CamError> {
        gcode::generate(
            config,
            Some(self.outlines.as_slice()),
            Some(self.drills.as_mut_slice()),
        )
    }

    /// Program cutting the outlines only.
    ///
    /// # Errors
    ///
    /// Returns [`CamError::InvalidInput`] if there are no outlines.
    pub fn generate_mills(&self, config: &ProcessConfig) -> Result<String, CamError> {
        gcode::generate(config, Some(self.outlines.as_slice()), None)
    }

    /// Program drilling every group only.
    ///
    /// # Errors
    ///
    /// Returns [`CamError::InvalidInput`] if there are no drills.
    pub fn generate_drills(&mut self, config: &ProcessConfig) -> Result<String, CamError> {
        gcode::generate(config, None, Some(self.drills.as_mut_slice()))
    }
}
