//! Processing and emission parameters, and the `key = value` file reader.
//!
//! Every parameter has a default. A configuration file only needs to list the
//! variables it changes:
//!
//! ```text
//! # mill with a 2mm end mill, no rotation
//! cut.cutter.diameter = 2.0
//! output.board.rotate.panel = false
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CamError;
use crate::geometry::Point;

/// Safe Z height between cuts.
pub const CUT_SAFE_Z: &str = "cut.safe.z";
/// Safe Z height between drill hits.
pub const DRILL_SAFE_Z: &str = "drill.safe.z";
/// Cutting depth.
pub const CUT_Z: &str = "cut.z";
/// Drilling depth.
pub const DRILL_Z: &str = "drill.z";
/// Feed rate while cutting.
pub const CUT_FEED_RATE: &str = "cut.feed.rate";
/// Z height for tool changes.
pub const TOOL_CHANGE_Z: &str = "config.tool.change.z";
/// Feed rate for free moves.
pub const FREE_MOVE_FEED_RATE: &str = "config.free.move.feed.rate";
/// Outline cutter diameter.
pub const CUTTER_DIAMETER: &str = "cut.cutter.diameter";
/// Minimal distance between breakaway tabs.
pub const MIN_TAB_DISTANCE: &str = "tab.minimal.distance";
/// Breakaway tab width.
pub const TAB_WIDTH: &str = "tab.width";
/// Diameter of tab release holes.
pub const TAB_DRILL_DIAMETER: &str = "tab.drill.diameter";
/// Grid step drill diameters are snapped to.
pub const DRILL_DIAMETER_STEP: &str = "config.drills.diameter.step";
/// Blank width.
pub const BOARD_WIDTH: &str = "output.board.width";
/// Blank height.
pub const BOARD_HEIGHT: &str = "output.board.height";
/// Diameter from which drills are milled as circles.
pub const LARGE_DRILL_THRESHOLD: &str = "config.mill.large.drills.threshold";
/// X scale applied on output.
pub const SCALE_X: &str = "config.scale.x";
/// Y scale applied on output.
pub const SCALE_Y: &str = "config.scale.y";
/// Spindle speed in RPM.
pub const SPINDLE_SPEED: &str = "config.spindle.speed";
/// Spindle startup delay in seconds.
pub const SPINDLE_DELAY: &str = "config.spindle.startup.delay";
/// Drill tour optimization effort.
pub const OPTIMIZATION_LEVEL: &str = "config.optimization.level";
/// Emit cuts for inner polygons.
pub const GENERATE_INNER_CUT: &str = "output.generate.inner.cut";
/// Rotate the panel to match the blank orientation.
pub const ROTATE_PANEL: &str = "output.board.rotate.panel";
/// Center the panel on the blank.
pub const CENTER_PANEL: &str = "output.board.center.panel";
/// Deepen drills by the drill tip length.
pub const DRILL_DEPTH_ADJUST: &str = "config.drills.adjust.depth";
/// Cut every outline twice.
pub const DOUBLE_PASS_OUTLINE: &str = "config.outline.double.pass";
/// Mill large drills as circles instead of drilling them.
pub const MILL_LARGE_DRILLS: &str = "config.mill.large.drills";
/// Line separator of the emitted program.
pub const LINE_SEPARATOR: &str = "config.line.separator";

/// All recognized variable names.
pub const VARIABLE_NAMES: [&str; 27] = [
    CUT_SAFE_Z,
    DRILL_SAFE_Z,
    CUT_Z,
    DRILL_Z,
    CUT_FEED_RATE,
    TOOL_CHANGE_Z,
    FREE_MOVE_FEED_RATE,
    CUTTER_DIAMETER,
    MIN_TAB_DISTANCE,
    TAB_WIDTH,
    TAB_DRILL_DIAMETER,
    DRILL_DIAMETER_STEP,
    BOARD_WIDTH,
    BOARD_HEIGHT,
    LARGE_DRILL_THRESHOLD,
    SCALE_X,
    SCALE_Y,
    SPINDLE_SPEED,
    SPINDLE_DELAY,
    OPTIMIZATION_LEVEL,
    GENERATE_INNER_CUT,
    ROTATE_PANEL,
    CENTER_PANEL,
    DRILL_DEPTH_ADJUST,
    DOUBLE_PASS_OUTLINE,
    MILL_LARGE_DRILLS,
    LINE_SEPARATOR,
];

/// Parameters of one processing run. Lengths are in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProcessConfig {
    /// Safe Z height between cuts.
    pub safe_z: f64,
    /// Safe Z height between drill hits.
    pub drill_safe_z: f64,
    /// Cutting depth.
    pub cut_z: f64,
    /// Drilling depth.
    pub drill_z: f64,
    /// Feed rate while cutting, mm/min.
    pub cut_feed_rate: f64,
    /// Z height for tool changes.
    pub tool_change_z: f64,
    /// Feed rate for free moves, mm/min.
    pub free_move_feed_rate: f64,
    /// Outline cutter diameter.
    pub cutter_diameter: f64,
    /// Minimal distance between breakaway tabs.
    pub min_tab_distance: f64,
    /// Breakaway tab width.
    pub tab_width: f64,
    /// Diameter of tab release holes.
    pub tab_drill_diameter: f64,
    /// Grid step drill diameters are snapped to.
    pub drill_diameter_step: f64,
    /// Blank width.
    pub board_width: f64,
    /// Blank height.
    pub board_height: f64,
    /// Diameter from which drills are milled as circles.
    pub large_drill_threshold: f64,
    /// X scale applied on output.
    pub scale_x: f64,
    /// Y scale applied on output.
    pub scale_y: f64,
    /// Spindle speed in RPM.
    pub spindle_speed: u32,
    /// Spindle startup delay in seconds.
    pub spindle_delay: u32,
    /// Drill tour optimization effort.
    pub optimization_level: u32,
    /// Emit cuts for inner polygons.
    pub generate_inner_cut: bool,
    /// Rotate the panel to match the blank orientation.
    pub rotate_panel: bool,
    /// Center the panel on the blank.
    pub center_panel: bool,
    /// Deepen drills by the drill tip length.
    pub drill_depth_adjust: bool,
    /// Cut every outline twice.
    pub double_pass_outline: bool,
    /// Mill large drills as circles instead of drilling them.
    pub mill_large_drills: bool,
    /// Line separator of the emitted program.
    pub line_separator: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            safe_z: 6.0,
            drill_safe_z: 5.0,
            cut_z: -2.2,
            drill_z: -2.2,
            cut_feed_rate: 150.0,
            tool_change_z: 55.0,
            free_move_feed_rate: 400.0,
            cutter_diameter: 1.6,
            min_tab_distance: 16.0,
            tab_width: 5.0,
            tab_drill_diameter: 0.5,
            drill_diameter_step: 0.1,
            board_width: 160.0,
            board_height: 200.0,
            large_drill_threshold: 2.0,
            scale_x: 1.0,
            scale_y: 1.0,
            spindle_speed: 60000,
            spindle_delay: 5,
            optimization_level: 5,
            generate_inner_cut: false,
            rotate_panel: true,
            center_panel: true,
            drill_depth_adjust: true,
            double_pass_outline: false,
            mill_large_drills: false,
            line_separator: "\n".to_string(),
        }
    }
}

impl ProcessConfig {
    /// Blank dimensions as X/Y. Blank height maps to X and width to Y.
    pub const fn blank_dimensions(&self) -> Point {
        Point::new(self.board_height, self.board_width)
    }

    /// Applies one raw variable. The name is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`CamError::ConfigError`] if the variable is unknown or the value
    /// does not parse as the variable's type.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), CamError> {
        let key = name.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            CUT_SAFE_Z => self.safe_z = parse_float(&key, value)?,
            DRILL_SAFE_Z => self.drill_safe_z = parse_float(&key, value)?,
            CUT_Z => self.cut_z = parse_float(&key, value)?,
            DRILL_Z => self.drill_z = parse_float(&key, value)?,
            CUT_FEED_RATE => self.cut_feed_rate = parse_float(&key, value)?,
            TOOL_CHANGE_Z => self.tool_change_z = parse_float(&key, value)?,
            FREE_MOVE_FEED_RATE => self.free_move_feed_rate = parse_float(&key, value)?,
            CUTTER_DIAMETER => self.cutter_diameter = parse_float(&key, value)?,
            MIN_TAB_DISTANCE => self.min_tab_distance = parse_float(&key, value)?,
            TAB_WIDTH => self.tab_width = parse_float(&key, value)?,
            TAB_DRILL_DIAMETER => self.tab_drill_diameter = parse_float(&key, value)?,
            DRILL_DIAMETER_STEP => self.drill_diameter_step = parse_float(&key, value)?,
            BOARD_WIDTH => self.board_width = parse_float(&key, value)?,
            BOARD_HEIGHT => self.board_height = parse_float(&key, value)?,
            LARGE_DRILL_THRESHOLD => self.large_drill_threshold = parse_float(&key, value)?,
            SCALE_X => self.scale_x = parse_float(&key, value)?,
            SCALE_Y => self.scale_y = parse_float(&key, value)?,
            SPINDLE_SPEED => self.spindle_speed = parse_int(&key, value)?,
            SPINDLE_DELAY => self.spindle_delay = parse_int(&key, value)?,
            OPTIMIZATION_LEVEL => self.optimization_level = parse_int(&key, value)?,
            GENERATE_INNER_CUT => self.generate_inner_cut = parse_bool(&key, value)?,
            ROTATE_PANEL => self.rotate_panel = parse_bool(&key, value)?,
            CENTER_PANEL => self.center_panel = parse_bool(&key, value)?,
            DRILL_DEPTH_ADJUST => self.drill_depth_adjust = parse_bool(&key, value)?,
            DOUBLE_PASS_OUTLINE => self.double_pass_outline = parse_bool(&key, value)?,
            MILL_LARGE_DRILLS => self.mill_large_drills = parse_bool(&key, value)?,
            LINE_SEPARATOR => self.line_separator = unescape(value),
            _ => return Err(CamError::ConfigError(format!("unknown variable {name}"))),
        }
        Ok(())
    }
}

/// Result of reading a configuration file.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResult {
    /// Defaults overridden by every valid line of the file.
    pub config: ProcessConfig,
    /// Lines that were ignored and why.
    pub warnings: Vec<String>,
}

/// Reads a `key = value` configuration file.
///
/// Blank lines and lines starting with `#` are skipped. Malformed lines,
/// unknown variables and unparsable values are ignored with a warning.
///
/// # Errors
///
/// Returns [`CamError::ParseError`] if the input is not valid UTF-8.
pub fn parse(data: &[u8]) -> Result<ConfigResult, CamError> {
    let text = std::str::from_utf8(data)
        .map_err(|err| CamError::ParseError(format!("config is not valid UTF-8: {err}")))?;

    let mut config = ProcessConfig::default();
    let mut warnings = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = split_variable(line) else {
            warnings.push(format!("line {}: ignored malformed line \"{line}\"", line_no + 1));
            continue;
        };
        if let Err(err) = config.set(name, value) {
            warnings.push(format!("line {}: {err}, variable ignored", line_no + 1));
        }
    }

    Ok(ConfigResult { config, warnings })
}

fn split_variable(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once('=')?;
    let name = name.trim();
    let value = value.trim();
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if !valid_name || value.is_empty() {
        return None;
    }
    Some((name, value))
}

fn parse_float(key: &str, value: &str) -> Result<f64, CamError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid_value(key, value))
}

fn parse_int(key: &str, value: &str) -> Result<u32, CamError> {
    value.parse::<u32>().map_err(|_| invalid_value(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CamError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid_value(key, value)),
    }
}

fn invalid_value(key: &str, value: &str) -> CamError {
    CamError::ConfigError(format!("invalid value {value} for {key}"))
}

fn unescape(value: &str) -> String {
    value.replace("\\r", "\r").replace("\\n", "\n")
}
