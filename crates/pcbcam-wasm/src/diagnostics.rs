//! Warning channel for recoverable conditions.
//!
//! Degenerate corners, missing tabs and data-quality corrections never abort
//! processing. They are collected here in the order they occur and handed back
//! to the caller together with the result.

/// Ordered list of warnings produced while processing a panel.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    /// Creates an empty diagnostics list.
    pub const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Records a warning and forwards it to the `tracing` subscriber.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!("{msg}");
        self.warnings.push(msg);
    }

    /// Returns the recorded warnings.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consumes the list and returns the warnings.
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}
