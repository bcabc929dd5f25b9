//! Machine-control program emission.
//!
//! Produces an RS-274 program for a LinuxCNC-style controller: a preamble
//! with the tool table, one cut per polygon, one canned drilling cycle per
//! drill group and a postamble. Tool ordinals are assigned here: the outline
//! cutter is tool 1 when outlines are emitted and drill groups follow in order.

use std::fmt::{self, Write};

use crate::config::ProcessConfig;
use crate::error::CamError;
use crate::geometry::stats::drill_tip_length;
use crate::geometry::{DrillGroup, Point, Polygon, PolygonKind, PRECISION};

/// Generates a program for the given outlines and drill groups.
///
/// Either part may be left out. Drill groups receive their tool ordinals.
/// Inner outlines are cut only when `generate_inner_cut` is set; milled holes
/// are always cut.
///
/// # Errors
///
/// Returns [`CamError::InvalidInput`] if there is nothing to emit and
/// [`CamError::Format`] if writing the program fails.
pub fn generate(
    config: &ProcessConfig,
    outlines: Option<&[Polygon]>,
    drills: Option<&mut [DrillGroup]>,
) -> Result<String, CamError> {
    let outlines = outlines.filter(|o| !o.is_empty());
    let drills = drills.filter(|d| !d.is_empty());
    if outlines.is_none() && drills.is_none() {
        return Err(CamError::InvalidInput(
            "no outlines or drills to generate".to_string(),
        ));
    }

    let mut program = Program::new(config);
    let mut drills = drills;

    program.preamble()?;
    let mut tool_number = 0;
    if outlines.is_some() {
        tool_number += 1;
        program.line(format_args!(
            "G10 L1 P{tool_number} R{:.5} ( Define cutter tool )",
            config.cutter_diameter / 2.0
        ))?;
        program.blank()?;
    }
    if let Some(groups) = drills.as_deref_mut() {
        for group in groups.iter_mut() {
            tool_number += 1;
            group.set_ordinal(tool_number);
            program.line(format_args!(
                "G10 L1 P{} R{:.5} (Define drill tool)",
                group.ordinal(),
                group.diameter() / 2.0
            ))?;
            program.blank()?;
        }
    }

    if let Some(polygons) = outlines {
        program.tool_change(1, config.cutter_diameter, "mill", polygons.len())?;
        program.polygons(polygons)?;
        if config.double_pass_outline {
            program.polygons(polygons)?;
        }
    }
    if let Some(groups) = drills {
        for group in groups.iter() {
            program.drill_group(group)?;
        }
    }

    program.postamble()?;
    Ok(program.finish())
}

/// Drilling depth for a group, deepened by the drill tip when enabled.
pub fn drill_depth(config: &ProcessConfig, diameter: f64) -> f64 {
    let extra = if config.drill_depth_adjust {
        drill_tip_length(diameter)
    } else {
        0.0
    };
    config.drill_z + extra
}

struct Coords {
    x: f64,
    y: f64,
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{:.5} Y{:.5}", self.x, self.y)
    }
}

struct Program<'a> {
    config: &'a ProcessConfig,
    out: String,
}

impl<'a> Program<'a> {
    const fn new(config: &'a ProcessConfig) -> Self {
        Self {
            config,
            out: String::new(),
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.out.write_fmt(args)?;
        self.out.push_str(&self.config.line_separator);
        Ok(())
    }

    fn blank(&mut self) -> fmt::Result {
        self.out.push_str(&self.config.line_separator);
        Ok(())
    }

    fn coords(&self, point: &Point) -> Coords {
        Coords {
            x: point.x * self.config.scale_x,
            y: point.y * self.config.scale_y,
        }
    }

    fn preamble(&mut self) -> fmt::Result {
        self.line(format_args!("G94     ( Millimeters per minute feed rate. )"))?;
        self.line(format_args!("G21     ( Units == Millimeters. )"))?;
        self.line(format_args!("G17     ( X-Y plane )"))?;
        self.line(format_args!("G90     ( Absolute coordinates.        )"))?;
        self.line(format_args!(
            "G64 P{PRECISION:.5} ( Set maximum deviation from commanded toolpath )"
        ))
    }

    fn postamble(&mut self) -> fmt::Result {
        self.blank()?;
        self.tool_change_retract()?;
        self.line(format_args!("M5 ( Spindle stop. )"))?;
        self.line(format_args!("M9 ( Coolant off. )"))?;
        self.line(format_args!("M2 ( Program end. )"))
    }

    fn tool_change_retract(&mut self) -> fmt::Result {
        let z = self.config.tool_change_z;
        self.line(format_args!("G00 Z{z:.5} ( retract )"))
    }

    fn retract(&mut self) -> fmt::Result {
        let z = self.config.safe_z;
        self.line(format_args!("G00 Z{z:.5} ( retract )"))
    }

    fn plunge(&mut self) -> fmt::Result {
        let (z, feed) = (self.config.cut_z, self.config.cut_feed_rate);
        self.line(format_args!("G01 Z{z:.5} F{feed:.5} ( plunge )"))
    }

    fn tool_change(&mut self, ordinal: u32, diameter: f64, tool: &str, count: usize) -> fmt::Result {
        let config = self.config;
        self.tool_change_retract()?;
        self.line(format_args!("T{ordinal}"))?;
        self.line(format_args!("M5"))?;
        self.line(format_args!("M6"))?;
        self.line(format_args!(
            "(MSG, Change tool bit to {tool} size {diameter:.2} [{count}])"
        ))?;
        self.line(format_args!("M0"))?;
        self.line(format_args!(
            "S{}  ( RPM spindle speed.           )",
            config.spindle_speed
        ))?;
        self.line(format_args!("F{:.5}", config.free_move_feed_rate))?;
        self.line(format_args!("M3      ( Spindle on clockwise.        )"))?;
        self.blank()?;
        self.line(format_args!(
            "G04 P{:.5} ( wait while spindle reach full speed )",
            f64::from(config.spindle_delay)
        ))
    }

    fn polygons(&mut self, polygons: &[Polygon]) -> fmt::Result {
        let generate_inner_cut = self.config.generate_inner_cut;
        let emitted = polygons
            .iter()
            .filter(|p| p.kind() == PolygonKind::Hole || !p.is_inner() || generate_inner_cut);
        for (idx, polygon) in emitted.enumerate() {
            self.polygon(polygon, idx + 1)?;
        }
        Ok(())
    }

    fn polygon(&mut self, polygon: &Polygon, ordinal: usize) -> fmt::Result {
        let Some(first) = polygon.first() else {
            return Ok(());
        };
        let size = polygon.size();
        self.line(format_args!(
            "( Polygon  {ordinal}, {} points, {:.3}mm x {:.3}mm )",
            polygon.len(),
            size.x,
            size.y
        ))?;
        let start = self.coords(first);
        let safe_z = self.config.safe_z;
        self.line(format_args!("G00 {start} Z{safe_z:.5} ( rapid move to begin )"))?;
        self.plunge()?;

        let mut retracted = false;
        for point in polygon.points() {
            let coords = self.coords(point);
            self.line(format_args!("{coords}"))?;
            if retracted && !point.retract {
                self.plunge()?;
                retracted = false;
            }
            if point.retract {
                self.retract()?;
                retracted = true;
            }
        }
        self.retract()
    }

    fn drill_group(&mut self, group: &DrillGroup) -> fmt::Result {
        let Some((first, rest)) = group.drills().split_first() else {
            return Ok(());
        };
        self.tool_change(group.ordinal(), group.diameter(), "drill", group.len())?;
        let start = self.coords(first);
        let safe_z = self.config.drill_safe_z;
        let depth = drill_depth(self.config, group.diameter());
        self.line(format_args!("G00 {start} Z{safe_z:.5} (rapid move to begin)"))?;
        self.line(format_args!("G81 R{safe_z:.5} Z{depth:.5} {start}"))?;
        for point in rest {
            let coords = self.coords(point);
            self.line(format_args!("{coords}"))?;
        }
        Ok(())
    }
}
