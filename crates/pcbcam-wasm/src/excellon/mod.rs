//! Excellon drill file reader producing millimeter drill groups.

pub mod parser;
pub mod types;

pub use parser::parse;
pub use types::{ExcellonResult, ExcellonUnits, ToolDefinition, MM_PER_INCH};
