//! Read-only summaries of a panel for reporting.

use std::fmt;

use serde::Serialize;

/// Extra drilling depth needed for the conical tip of a drill.
///
/// Uses a 130° point angle: `diameter / 2 * cot(65°)`.
pub fn drill_tip_length(diameter: f64) -> f64 {
    let half_angle = 65f64.to_radians();
    diameter / 2.0 * (half_angle.cos() / half_angle.sin())
}

/// Count and tour length of one drill diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrillSummary {
    /// Drill diameter in millimeters.
    pub diameter: f64,
    /// Number of holes.
    pub count: usize,
    /// Tool path length visiting the holes in order.
    pub path_length: f64,
}

/// Per-diameter drill counts and tool path lengths.
///
/// The report line reads `path length`. Older reports in this format spell
/// it `path lenght`, so text diffs against them differ in that word and
/// nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrillStatistics {
    drills: Vec<DrillSummary>,
}

impl DrillStatistics {
    /// Creates empty statistics.
    pub const fn new() -> Self {
        Self { drills: Vec::new() }
    }

    /// Adds one drill diameter.
    pub fn add(&mut self, diameter: f64, count: usize, path_length: f64) {
        self.drills.push(DrillSummary {
            diameter,
            count,
            path_length,
        });
    }

    /// Summaries in insertion order.
    pub fn drills(&self) -> &[DrillSummary] {
        &self.drills
    }

    /// Total number of holes.
    pub fn total_count(&self) -> usize {
        self.drills.iter().map(|d| d.count).sum()
    }

    /// Total tool path length over all diameters.
    pub fn total_path_length(&self) -> f64 {
        self.drills.iter().map(|d| d.path_length).sum()
    }
}

impl fmt::Display for DrillStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for drill in &self.drills {
            writeln!(
                f,
                "Drill {:.2} ({:.3}mm extra depth), {:4} drills, path length {:.2}",
                drill.diameter,
                drill_tip_length(drill.diameter),
                drill.count,
                drill.path_length
            )?;
        }
        writeln!(
            f,
            "Total: {} drills, {:.2}mm tool path",
            self.total_count(),
            self.total_path_length()
        )
    }
}

/// Panel size, board count and drill statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelStatistics {
    /// Panel width and height.
    pub panel_size: [f64; 2],
    /// Width and height of every outer outline.
    pub board_sizes: Vec<[f64; 2]>,
    /// Drill statistics.
    pub drills: DrillStatistics,
}

impl PanelStatistics {
    /// Number of boards, one per outer outline.
    pub fn board_count(&self) -> usize {
        self.board_sizes.len()
    }
}

impl fmt::Display for PanelStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [width, height] = self.panel_size;
        writeln!(f, "Panel dimension {width:.3}mm x {height:.3}mm")?;
        writeln!(f, "Total: {} boards on the panel", self.board_count())?;
        writeln!(f)?;
        write!(f, "{}", self.drills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drill_tip_length_uses_130_degree_point() {
        assert!((drill_tip_length(0.5) - 0.116_573).abs() < 1e-5);
        assert!(drill_tip_length(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drill_statistics_format() {
        let mut stats = DrillStatistics::new();
        stats.add(0.5, 2, 2.828_427);
        stats.add(1.0, 12, 40.0);
        assert_eq!(stats.total_count(), 14);
        assert_eq!(
            stats.to_string(),
            "Drill 0.50 (0.117mm extra depth),    2 drills, path length 2.83\n\
             Drill 1.00 (0.233mm extra depth),   12 drills, path length 40.00\n\
             Total: 14 drills, 42.83mm tool path\n"
        );
    }

    #[test]
    fn drill_statistics_spell_path_length() {
        let mut stats = DrillStatistics::new();
        stats.add(0.8, 3, 10.0);
        let report = stats.to_string();
        assert!(report.contains(", path length 10.00\n"));
        assert!(!report.contains("lenght"));
    }

    #[test]
    fn empty_drill_statistics_format() {
        assert_eq!(
            DrillStatistics::default().to_string(),
            "Total: 0 drills, 0.00mm tool path\n"
        );
    }

    #[test]
    fn panel_statistics_format() {
        let stats = PanelStatistics {
            panel_size: [100.0, 80.5],
            board_sizes: vec![[50.0, 80.5], [48.0, 80.5]],
            drills: DrillStatistics::new(),
        };
        assert_eq!(stats.board_count(), 2);
        assert_eq!(
            stats.to_string(),
            "Panel dimension 100.000mm x 80.500mm\n\
             Total: 2 boards on the panel\n\
             \n\
             Total: 0 drills, 0.00mm tool path\n"
        );
    }
}
