#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::indexing_slicing)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `PcbCam` WASM module: board outline milling and drilling toolpaths for
//! PCB isolation routers.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod excellon;
pub mod gcode;
pub mod geometry;
pub mod outline;
pub mod processor;

use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::config::{ConfigResult, ProcessConfig};
use crate::error::CamError;
use crate::geometry::{DrillGroup, Panel, Point, Polygon};
use crate::processor::{DrillProcessor, PolygonProcessor};

thread_local! {
    static LAST_PANEL: RefCell<Option<Panel>> = const { RefCell::new(None) };
}

fn store_panel(panel: Panel) {
    LAST_PANEL.with(|p| {
        *p.borrow_mut() = Some(panel);
    });
}

/// One drill group of a [`PanelRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrillGroupData {
    /// Group identifier, usually the tool label.
    pub id: String,
    /// Drill diameter in millimeters.
    pub diameter: f64,
    /// Hole positions in millimeters.
    pub points: Vec<[f64; 2]>,
}

/// Input of [`process_panel`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelRequest {
    /// Outline point lists in millimeters. Open outlines are joined.
    pub outlines: Vec<Vec<[f64; 2]>>,
    /// Raw Gerber outline layer. Its paths are added to `outlines`.
    pub outline_gerber: Option<Vec<u8>>,
    /// Drill groups in millimeters.
    pub drills: Vec<DrillGroupData>,
    /// Processing and emission parameters.
    pub config: ProcessConfig,
}

/// Output of [`process_panel`].
#[derive(Debug, Clone, Serialize)]
pub struct PanelReport {
    /// Panel statistics after processing, in report form.
    pub stats: String,
    /// Drill statistics before tour optimization, in report form.
    pub stats_before: String,
    /// Panel was rotated to the blank orientation.
    pub rotated: bool,
    /// Panel was centered on the blank.
    pub centered: bool,
    /// Everything that was skipped or repaired along the way.
    pub warnings: Vec<String>,
    /// Machine-control program for the whole panel.
    pub gcode: String,
    /// Number of polygons that will be milled, tabs excluded.
    pub polygon_count: u32,
    /// Number of holes that will be drilled, tab holes included.
    pub drill_count: u32,
}

/// Saturating `usize` to `u32` conversion for counts reported to JS.
pub fn saturate_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Initialize the WASM module. Sets up the panic hook for debugging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Process one panel: outline reconstruction, inset, tabs, drill merging
/// and tour optimization, then rotation and centering on the blank.
///
/// Takes a [`PanelRequest`] and returns a [`PanelReport`], both converted
/// via `serde-wasm-bindgen`. The processed panel is kept; retrieve its
/// toolpaths with [`get_mill_positions`] and [`get_drill_positions`].
///
/// # Errors
///
/// Returns a descriptive error string if the request cannot be decoded or
/// the panel is empty.
#[wasm_bindgen]
pub fn process_panel(request: JsValue) -> Result<JsValue, JsValue> {
    let request: PanelRequest = serde_wasm_bindgen::from_value(request)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let report = process_panel_internal(request).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Internal processing shared between the wasm export and native tests.
///
/// # Errors
///
/// Returns [`CamError::InvalidInput`] if the request holds neither outlines
/// nor drills, or [`CamError::ParseError`] if the Gerber outline is empty.
#[doc(hidden)]
pub fn process_panel_internal(request: PanelRequest) -> Result<PanelReport, CamError> {
    let PanelRequest {
        outlines,
        outline_gerber,
        drills,
        config,
    } = request;

    let mut warnings = Vec::new();
    let mut outlines: Vec<Polygon> = outlines
        .into_iter()
        .filter(|points| !points.is_empty())
        .map(|points| Polygon::new(to_points(&points)))
        .collect();
    if let Some(data) = outline_gerber {
        let layer = outline::read(&data)?;
        outlines.extend(layer.polygons);
        warnings.extend(layer.warnings);
    }

    if outlines.is_empty() && drills.iter().all(|group| group.points.is_empty()) {
        return Err(CamError::InvalidInput(
            "request holds no outlines and no drills".to_string(),
        ));
    }

    let drills = drills
        .into_iter()
        .filter(|group| !group.points.is_empty())
        .map(|group| DrillGroup::with_drills(group.id, group.diameter, to_points(&group.points)))
        .collect();

    let mut panel = Panel::new(outlines, drills);
    let before = panel.process(
        &PolygonProcessor::new(&config),
        &DrillProcessor::new(&config),
    );
    let status = panel.rotate_and_center(&config);
    let gcode = panel.generate(&config)?;
    warnings.extend_from_slice(panel.warnings());

    let report = PanelReport {
        stats: panel.stats().to_string(),
        stats_before: before.to_string(),
        rotated: status.rotated,
        centered: status.centered,
        warnings,
        gcode,
        polygon_count: saturate_u32(panel.outlines().len()),
        drill_count: saturate_u32(panel.drills().iter().map(DrillGroup::len).sum()),
    };

    tracing::debug!(
        polygons = report.polygon_count,
        drills = report.drill_count,
        warnings = report.warnings.len(),
        "panel processed"
    );

    store_panel(panel);

    Ok(report)
}

fn to_points(coords: &[[f64; 2]]) -> Vec<Point> {
    coords.iter().map(|&[x, y]| Point::new(x, y)).collect()
}

/// Parse an Excellon drill file into millimeter drill groups.
///
/// Returns the groups in [`PanelRequest`] drill form, ready to be passed
/// back to [`process_panel`].
///
/// # Errors
///
/// Returns a descriptive error string if parsing fails.
#[wasm_bindgen]
pub fn parse_excellon(data: &[u8]) -> Result<JsValue, JsValue> {
    let groups = parse_excellon_internal(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&groups).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Drill groups read from an Excellon file together with parser warnings.
#[derive(Debug, Clone, Serialize)]
pub struct ExcellonReport {
    /// Drill groups in millimeters, ordered by tool number.
    pub drills: Vec<DrillGroupData>,
    /// Parser warnings.
    pub warnings: Vec<String>,
}

/// Internal parse logic shared between the wasm export and native tests.
///
/// # Errors
///
/// Returns [`CamError::ParseError`] if the file is empty or malformed.
#[doc(hidden)]
pub fn parse_excellon_internal(data: &[u8]) -> Result<ExcellonReport, CamError> {
    let result = excellon::parse(data)?;
    let drills = result
        .groups
        .iter()
        .map(|group| DrillGroupData {
            id: group.id().to_string(),
            diameter: group.diameter(),
            points: group.drills().iter().map(|p| [p.x, p.y]).collect(),
        })
        .collect();
    Ok(ExcellonReport {
        drills,
        warnings: result.warnings,
    })
}

/// Parse a Gerber outline layer into millimeter point lists.
///
/// Returns an [`OutlineReport`] whose `outlines` can be passed back to
/// [`process_panel`] as [`PanelRequest::outlines`].
///
/// # Errors
///
/// Returns a descriptive error string if the input is empty.
#[wasm_bindgen]
pub fn parse_outline(data: &[u8]) -> Result<JsValue, JsValue> {
    let report = parse_outline_internal(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Outline paths read from a Gerber layer together with reader warnings.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineReport {
    /// Open outline paths in millimeters, in file order.
    pub outlines: Vec<Vec<[f64; 2]>>,
    /// Number of draw commands that contributed points.
    pub draw_count: u32,
    /// Reader warnings.
    pub warnings: Vec<String>,
}

/// Internal parse logic shared between the wasm export and native tests.
///
/// # Errors
///
/// Returns [`CamError::ParseError`] if the input is empty.
#[doc(hidden)]
pub fn parse_outline_internal(data: &[u8]) -> Result<OutlineReport, CamError> {
    let layer = outline::read(data)?;
    Ok(OutlineReport {
        outlines: layer
            .polygons
            .iter()
            .map(|polygon| polygon.points().iter().map(|p| [p.x, p.y]).collect())
            .collect(),
        draw_count: saturate_u32(layer.draw_count),
        warnings: layer.warnings,
    })
}

/// Parse a `key = value` configuration file into a [`ProcessConfig`].
///
/// # Errors
///
/// Returns a descriptive error string if the file is not valid UTF-8.
#[wasm_bindgen]
pub fn parse_config(data: &[u8]) -> Result<JsValue, JsValue> {
    let result = parse_config_internal(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Internal parse logic shared between the wasm export and native tests.
///
/// # Errors
///
/// Returns [`CamError::ParseError`] if the file is not valid UTF-8.
#[doc(hidden)]
pub fn parse_config_internal(data: &[u8]) -> Result<ConfigResult, CamError> {
    config::parse(data)
}

/// Retrieve the milling vertices of the last processed panel.
///
/// Returns interleaved `[x0, y0, x1, y1, ...]` positions of every polygon in
/// emission order. Use [`get_mill_ranges`] to split them per polygon.
/// Returns an empty array if no panel has been processed yet.
#[wasm_bindgen]
pub fn get_mill_positions() -> Vec<f32> {
    LAST_PANEL.with(|p| {
        p.borrow().as_ref().map_or_else(Vec::new, |panel| {
            flatten(panel.outlines().iter().flat_map(Polygon::points))
        })
    })
}

/// Retrieve the vertex ranges of each polygon of the last processed panel.
///
/// Returns a flattened `[start0, end0, start1, end1, ...]` array of vertex
/// indices into [`get_mill_positions`].
#[wasm_bindgen]
pub fn get_mill_ranges() -> Vec<u32> {
    LAST_PANEL.with(|p| {
        p.borrow().as_ref().map_or_else(Vec::new, |panel| {
            let mut flat = Vec::with_capacity(panel.outlines().len() * 2);
            let mut start = 0;
            for polygon in panel.outlines() {
                let end = start + polygon.len();
                flat.push(saturate_u32(start));
                flat.push(saturate_u32(end));
                start = end;
            }
            flat
        })
    })
}

/// Retrieve the hole positions of the last processed panel in drilling order.
///
/// Returns interleaved `[x0, y0, x1, y1, ...]` positions over all groups.
/// Returns an empty array if no panel has been processed yet.
#[wasm_bindgen]
pub fn get_drill_positions() -> Vec<f32> {
    LAST_PANEL.with(|p| {
        p.borrow().as_ref().map_or_else(Vec::new, |panel| {
            flatten(panel.drills().iter().flat_map(DrillGroup::drills))
        })
    })
}

#[allow(clippy::cast_possible_truncation)]
fn flatten<'a>(points: impl Iterator<Item = &'a Point>) -> Vec<f32> {
    points.flat_map(|p| [p.x as f32, p.y as f32]).collect()
}
