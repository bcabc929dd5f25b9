//! Excellon drill file types.

use crate::geometry::DrillGroup;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Excellon tool definition from the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// Tool number (T1, T2, etc.).
    pub number: u32,
    /// Tool label as written in the file, e.g. `T01`.
    pub label: String,
    /// Drill diameter in millimeters.
    pub diameter: f64,
}

/// Unit system for Excellon files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcellonUnits {
    /// Metric (millimeters).
    Metric,
    /// Imperial (inches).
    Imperial,
}

impl ExcellonUnits {
    /// Factor converting a value in these units to millimeters.
    pub const fn to_mm(self) -> f64 {
        match self {
            Self::Metric => 1.0,
            Self::Imperial => MM_PER_INCH,
        }
    }
}

/// Result of Excellon parsing for a single file.
#[derive(Debug, Clone)]
pub struct ExcellonResult {
    /// One group per tool that has holes, ordered by tool number.
    /// Coordinates and diameters are in millimeters.
    pub groups: Vec<DrillGroup>,
    /// Tool definitions, ordered by tool number.
    pub tools: Vec<ToolDefinition>,
    /// Unit system in effect at the end of the file.
    pub units: ExcellonUnits,
    /// Parser warnings encountered while processing the file.
    pub warnings: Vec<String>,
}

impl ExcellonResult {
    /// Total number of holes over all groups.
    pub fn hole_count(&self) -> usize {
        self.groups.iter().map(DrillGroup::len).sum()
    }
}
