//! Excellon drill parser.

use std::collections::BTreeMap;

use crate::diagnostics::Diagnostics;
use crate::error::CamError;
use crate::geometry::{DrillGroup, Point};

use super::types::{ExcellonResult, ExcellonUnits, ToolDefinition};

const DEFAULT_METRIC_DECIMALS: u8 = 3;
const DEFAULT_IMPERIAL_DECIMALS: u8 = 4;

/// Which zeros the file leaves in coordinates without a decimal point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZeroFormat {
    /// `TZ`: trailing zeros kept, leading zeros dropped.
    TrailingKept,
    /// `LZ`: leading zeros kept, trailing zeros dropped.
    LeadingKept,
}

#[derive(Debug)]
struct Tool {
    label: String,
    diameter: f64,
    hits: Vec<Point>,
}

#[derive(Debug)]
struct ParserState {
    units: ExcellonUnits,
    integer_digits: u8,
    decimal_digits: u8,
    explicit_format: bool,
    zeros: ZeroFormat,
    tools: BTreeMap<u32, Tool>,
    current_tool: Option<u32>,
    last_x: f64,
    last_y: f64,
    diagnostics: Diagnostics,
    declared_units: bool,
    in_header: bool,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            units: ExcellonUnits::Imperial,
            integer_digits: 2,
            decimal_digits: DEFAULT_IMPERIAL_DECIMALS,
            explicit_format: false,
            zeros: ZeroFormat::TrailingKept,
            tools: BTreeMap::new(),
            current_tool: None,
            last_x: 0.0,
            last_y: 0.0,
            diagnostics: Diagnostics::new(),
            declared_units: false,
            in_header: false,
        }
    }
}

impl ParserState {
    fn set_units(&mut self, units: ExcellonUnits) {
        self.units = units;
        if !self.explicit_format {
            let (integer, decimal) = match units {
                ExcellonUnits::Metric => (3, DEFAULT_METRIC_DECIMALS),
                ExcellonUnits::Imperial => (2, DEFAULT_IMPERIAL_DECIMALS),
            };
            self.integer_digits = integer;
            self.decimal_digits = decimal;
        }
    }
}

/// Parse an Excellon drill file into one millimeter [`DrillGroup`] per tool
/// that has at least one hit.
///
/// # Errors
///
/// Returns [`CamError::ParseError`] if the input is empty, not valid UTF-8,
/// or contains invalid numeric fields in commands that must be parsed.
pub fn parse(data: &[u8]) -> Result<ExcellonResult, CamError> {
    if data.is_empty() {
        return Err(CamError::ParseError("empty input".to_string()));
    }

    let content = std::str::from_utf8(data)
        .map_err(|err| CamError::ParseError(format!("invalid UTF-8 input: {err}")))?;

    let mut state = ParserState::default();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        let normalized = line.to_ascii_uppercase();

        match normalized.as_str() {
            "M48" => {
                state.in_header = true;
                continue;
            }
            "%" | "M95" => {
                state.in_header = false;
                continue;
            }
            "M30" | "M00" => break,
            "M71" => {
                state.set_units(ExcellonUnits::Metric);
                continue;
            }
            "M72" | "M70" => {
                state.set_units(ExcellonUnits::Imperial);
                continue;
            }
            _ => {}
        }

        if state.in_header {
            parse_header_line(&normalized, &mut state)?;
        } else {
            parse_body_line(&normalized, &mut state)?;
        }
    }

    let mut tools = Vec::with_capacity(state.tools.len());
    let mut groups = Vec::new();
    for (number, tool) in state.tools {
        tools.push(ToolDefinition {
            number,
            label: tool.label.clone(),
            diameter: tool.diameter,
        });
        if !tool.hits.is_empty() {
            groups.push(DrillGroup::with_drills(tool.label, tool.diameter, tool.hits));
        }
    }

    tracing::debug!(
        tools = tools.len(),
        groups = groups.len(),
        "parsed excellon drill file"
    );

    Ok(ExcellonResult {
        groups,
        tools,
        units: state.units,
        warnings: state.diagnostics.into_warnings(),
    })
}

fn parse_header_line(line: &str, state: &mut ParserState) -> Result<(), CamError> {
    if apply_units_directive(line, state) {
        return Ok(());
    }

    if let Some((label, number, diameter)) = parse_tool_definition(line)? {
        register_tool(state, label, number, diameter);
    }

    Ok(())
}

fn parse_body_line(line: &str, state: &mut ParserState) -> Result<(), CamError> {
    if apply_units_directive(line, state) || is_routing_command(line) {
        return Ok(());
    }

    if let Some((label, number, diameter)) = parse_tool_definition(line)? {
        register_tool(state, label, number, diameter);
        return Ok(());
    }

    if let Some(number) = parse_tool_selection(line)? {
        if number == 0 {
            state.current_tool = None;
        } else if state.tools.contains_key(&number) {
            state.current_tool = Some(number);
        } else {
            state.current_tool = None;
            state
                .diagnostics
                .warn(format!("tool T{number} selected but not defined"));
        }
        return Ok(());
    }

    if let Some((x, y)) = parse_hit(line, state)? {
        let scale = state.units.to_mm();
        let point = Point::new(x * scale, y * scale);
        match state.current_tool.and_then(|number| state.tools.get_mut(&number)) {
            Some(tool) => tool.hits.push(point),
            None => state
                .diagnostics
                .warn(format!("hole at ({x}, {y}) skipped: no tool selected")),
        }
    }

    Ok(())
}

fn apply_units_directive(line: &str, state: &mut ParserState) -> bool {
    let (units, suffix) = if let Some(rest) = line.strip_prefix("METRIC") {
        (ExcellonUnits::Metric, rest)
    } else if let Some(rest) = line.strip_prefix("INCH") {
        (ExcellonUnits::Imperial, rest)
    } else {
        return false;
    };

    if state.declared_units && state.units != units {
        state
            .diagnostics
            .warn("mixed unit declarations detected; last declaration wins");
    }

    state.set_units(units);
    state.declared_units = true;

    for field in suffix.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        match field {
            "TZ" => state.zeros = ZeroFormat::TrailingKept,
            "LZ" => state.zeros = ZeroFormat::LeadingKept,
            _ => {
                if let Some((integer, decimal)) = parse_digit_format(field) {
                    state.integer_digits = integer;
                    state.decimal_digits = decimal;
                    state.explicit_format = true;
                }
            }
        }
    }

    true
}

/// Parses a `000.000` style digit format into integer and decimal counts.
fn parse_digit_format(field: &str) -> Option<(u8, u8)> {
    let (integer, decimal) = field.split_once('.')?;
    let is_zeros = |part: &str| !part.is_empty() && part.bytes().all(|b| b == b'0');
    if !is_zeros(integer) || !is_zeros(decimal) {
        return None;
    }
    Some((
        u8::try_from(integer.len()).ok()?,
        u8::try_from(decimal.len()).ok()?,
    ))
}

fn register_tool(state: &mut ParserState, label: String, number: u32, diameter: f64) {
    if diameter <= 0.0 {
        state.diagnostics.warn(format!(
            "tool {label} has zero or negative diameter and was skipped"
        ));
        return;
    }

    if state.tools.contains_key(&number) {
        state.diagnostics.warn(format!(
            "duplicate tool definition for {label}; last definition wins"
        ));
    }

    let diameter = diameter * state.units.to_mm();
    state.tools.insert(
        number,
        Tool {
            label,
            diameter,
            hits: Vec::new(),
        },
    );
}

/// Splits `T<digits><rest>` into the label, tool number and remainder.
fn split_tool_word(line: &str) -> Option<(&str, u32, &str)> {
    let after_t = line.strip_prefix('T')?;
    let digits_end = after_t
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(after_t.len());
    if digits_end == 0 {
        return None;
    }
    let (digits, rest) = after_t.split_at(digits_end);
    let number = digits.parse::<u32>().ok()?;
    Some((line.get(..=digits_end)?, number, rest))
}

fn parse_tool_definition(line: &str) -> Result<Option<(String, u32, f64)>, CamError> {
    let Some((label, number, rest)) = split_tool_word(line) else {
        return Ok(None);
    };

    let Some(position) = rest.find('C') else {
        return Ok(None);
    };

    let after_c = rest.get(position + 1..).unwrap_or_default();
    let diameter_raw = leading_number(after_c);
    if diameter_raw.is_empty() {
        return Err(CamError::ParseError(format!(
            "invalid tool definition `{line}`"
        )));
    }

    let diameter = parse_f64(diameter_raw, "tool diameter")?;
    Ok(Some((label.to_string(), number, diameter)))
}

fn parse_tool_selection(line: &str) -> Result<Option<u32>, CamError> {
    if !line.starts_with('T') || line.contains('C') {
        return Ok(None);
    }

    match split_tool_word(line) {
        Some((_, number, rest)) if rest.is_empty() => Ok(Some(number)),
        Some(_) => Err(CamError::ParseError(format!(
            "invalid tool selection `{line}`"
        ))),
        None => Ok(None),
    }
}

/// Parses an `X..Y..` hit. A missing axis keeps its previous value.
fn parse_hit(line: &str, state: &mut ParserState) -> Result<Option<(f64, f64)>, CamError> {
    if !line.starts_with('X') && !line.starts_with('Y') {
        return Ok(None);
    }

    let x_raw = axis_value(line, 'X');
    let y_raw = axis_value(line, 'Y');
    if x_raw == Some("") || y_raw == Some("") {
        return Err(CamError::ParseError(format!(
            "invalid coordinate command `{line}`"
        )));
    }

    if let Some(raw) = x_raw {
        state.last_x = parse_coordinate(raw, state)?;
    }
    if let Some(raw) = y_raw {
        state.last_y = parse_coordinate(raw, state)?;
    }

    Ok(Some((state.last_x, state.last_y)))
}

fn axis_value(line: &str, axis: char) -> Option<&str> {
    let start = line.find(axis)? + 1;
    line.get(start..).map(leading_number)
}

fn leading_number(raw: &str) -> &str {
    let end = raw
        .char_indices()
        .find(|&(index, ch)| {
            !(ch.is_ascii_digit() || ch == '.' || (index == 0 && (ch == '-' || ch == '+')))
        })
        .map_or(raw.len(), |(index, _)| index);
    raw.get(..end).unwrap_or_default()
}

fn parse_coordinate(raw: &str, state: &ParserState) -> Result<f64, CamError> {
    if raw.contains('.') {
        return parse_f64(raw, "coordinate");
    }

    let (sign, digits) = split_sign(raw);
    if digits.is_empty() {
        return Err(CamError::ParseError(
            "empty coordinate value".to_string(),
        ));
    }

    let normalized = normalize_implicit_decimal(
        digits,
        state.integer_digits,
        state.decimal_digits,
        state.zeros,
    );
    let value = parse_f64(&normalized, "coordinate")?;
    Ok(sign * value)
}

fn normalize_implicit_decimal(
    digits: &str,
    integer_digits: u8,
    decimal_digits: u8,
    zeros: ZeroFormat,
) -> String {
    let decimal_count = usize::from(decimal_digits);
    if decimal_count == 0 {
        return digits.to_string();
    }

    let total_digits = usize::from(integer_digits) + decimal_count;
    let expanded = if digits.len() < total_digits {
        match zeros {
            ZeroFormat::TrailingKept => format!("{digits:0>total_digits$}"),
            ZeroFormat::LeadingKept => format!("{digits:0<total_digits$}"),
        }
    } else {
        digits.to_string()
    };

    let split_index = expanded.len().saturating_sub(decimal_count);
    let (int_part, frac_part) = expanded.split_at(split_index);
    format!("{int_part}.{frac_part}")
}

fn split_sign(raw: &str) -> (f64, &str) {
    match (raw.strip_prefix('-'), raw.strip_prefix('+')) {
        (Some(rest), _) => (-1.0, rest),
        (None, Some(rest)) => (1.0, rest),
        (None, None) => (1.0, raw),
    }
}

fn parse_f64(raw: &str, label: &str) -> Result<f64, CamError> {
    raw.parse::<f64>()
        .map_err(|err| CamError::ParseError(format!("invalid {label} `{raw}`: {err}")))
}

fn is_routing_command(line: &str) -> bool {
    ["G00", "G01", "G02", "G03", "G85"]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}
