//! Drill diameter normalization and tour optimization.

use crate::config::ProcessConfig;
use crate::geometry::DrillGroup;

/// Normalizes drill diameters to the configured grid and optimizes tours.
#[derive(Debug, Clone, Copy)]
pub struct DrillProcessor<'a> {
    config: &'a ProcessConfig,
}

impl<'a> DrillProcessor<'a> {
    /// Creates a processor bound to `config`.
    pub const fn new(config: &'a ProcessConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &'a ProcessConfig {
        self.config
    }

    /// Sorts groups by diameter, merges neighbors closer than half a step and
    /// snaps every diameter to the step grid.
    ///
    /// Merging is a single left-to-right pass: a merged pair is not compared
    /// again with the following group.
    pub fn process(&self, mut drills: Vec<DrillGroup>) -> Vec<DrillGroup> {
        sort_by_diameter(&mut drills);
        let mut groups = merge_close_diameters(drills, self.config.drill_diameter_step / 2.0);
        for group in &mut groups {
            group.set_diameter(snap_diameter(group.diameter(), self.config.drill_diameter_step));
        }
        sort_by_diameter(&mut groups);
        tracing::debug!(groups = groups.len(), "normalized drill diameters");
        groups
    }

    /// Optimizes the drilling order of every group.
    pub fn optimize(&self, mut drills: Vec<DrillGroup>) -> Vec<DrillGroup> {
        for group in &mut drills {
            group.optimize(self.config.optimization_level);
        }
        drills
    }
}

fn sort_by_diameter(drills: &mut [DrillGroup]) {
    drills.sort_by(|a, b| a.diameter().total_cmp(&b.diameter()));
}

fn merge_close_diameters(drills: Vec<DrillGroup>, threshold: f64) -> Vec<DrillGroup> {
    let mut result = Vec::with_capacity(drills.len());
    let mut iter = drills.into_iter().peekable();
    while let Some(first) = iter.next() {
        match iter.next_if(|second| second.diameter() - first.diameter() < threshold) {
            Some(second) => result.push(DrillGroup::merge(&first, &second)),
            None => result.push(first),
        }
    }
    result
}

/// Rounds `diameter` to the nearest multiple of `step`, halves away from zero.
///
/// A non-positive or non-finite step leaves the diameter unchanged.
pub fn snap_diameter(diameter: f64, step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return diameter;
    }
    step * (diameter / step).round()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    const EPS: f64 = 1e-9;

    fn group(id: &str, diameter: f64) -> DrillGroup {
        DrillGroup::with_drills(id, diameter, vec![Point::new(diameter, diameter)])
    }

    #[test]
    fn merges_close_neighbors_and_snaps() {
        let config = ProcessConfig::default();
        let processor = DrillProcessor::new(&config);
        let result = processor.process(vec![group("T03", 0.60), group("T01", 0.50), group("T02", 0.55)]);
        assert_eq!(result.len(), 2);
        assert!((result[0].diameter() - 0.5).abs() < EPS);
        assert_eq!(result[0].len(), 1);
        assert!((result[1].diameter() - 0.6).abs() < EPS);
        assert_eq!(result[1].len(), 2);
        assert_eq!(result[1].id(), "T02");
    }

    #[test]
    fn snaps_distinct_diameters() {
        let config = ProcessConfig::default();
        let processor = DrillProcessor::new(&config);
        let result = processor.process(vec![group("T01", 0.51), group("T02", 0.62), group("T03", 0.74)]);
        let diameters: Vec<f64> = result.iter().map(DrillGroup::diameter).collect();
        assert_eq!(diameters.len(), 3);
        assert!((diameters[0] - 0.5).abs() < EPS);
        assert!((diameters[1] - 0.6).abs() < EPS);
        assert!((diameters[2] - 0.7).abs() < EPS);
    }

    #[test]
    fn merge_threshold_is_strict() {
        let config = ProcessConfig::default();
        let processor = DrillProcessor::new(&config);

        let merged = processor.process(vec![group("T01", 0.5), group("T02", 0.549)]);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].diameter() - 0.5).abs() < EPS);

        let separate = processor.process(vec![group("T01", 0.5), group("T02", 0.551)]);
        assert_eq!(separate.len(), 2);
    }

    #[test]
    fn half_step_difference_is_not_merged() {
        let config = ProcessConfig::default();
        let processor = DrillProcessor::new(&config);
        let result = processor.process(vec![group("T01", 0.50), group("T02", 0.55)]);
        assert_eq!(result.len(), 2);
        assert!((result[0].diameter() - 0.5).abs() < EPS);
        assert!((result[1].diameter() - 0.6).abs() < EPS);
    }

    #[test]
    fn merge_is_single_pass() {
        let config = ProcessConfig::default();
        let processor = DrillProcessor::new(&config);
        // 0.50 and 0.52 merge into 0.51, which is not compared with 0.54 again
        let result = processor.process(vec![group("T01", 0.50), group("T02", 0.52), group("T03", 0.54)]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].len() + result[1].len(), 3);
    }

    #[test]
    fn snap_rounds_half_away_from_zero() {
        assert!((snap_diameter(0.55, 0.1) - 0.6).abs() < EPS);
        assert!((snap_diameter(0.51, 0.1) - 0.5).abs() < EPS);
        assert!((snap_diameter(1.04, 0.1) - 1.0).abs() < EPS);
        assert!((snap_diameter(0.8, 0.0) - 0.8).abs() < EPS);
    }

    #[test]
    fn optimize_keeps_groups() {
        let config = ProcessConfig::default();
        let processor = DrillProcessor::new(&config);
        let groups = vec![DrillGroup::with_drills(
            "T01",
            0.8,
            vec![Point::new(2.0, 0.0), Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
        )];
        let result = processor.optimize(groups);
        assert_eq!(result.len(), 1);
        assert!((result[0].path_length() - 2.0).abs() < EPS);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let config = ProcessConfig::default();
        let processor = DrillProcessor::new(&config);
        assert!(processor.process(Vec::new()).is_empty());
    }
}
