//! Gain scheduling over an externally supplied variable.

use crate::error::TableError;
use crate::lookup::{LookupTable, TableParams};

/// Gain multiplier scheduled on a live signal the caller passes in each
/// tick. The caller owns the coupling: a loop scheduled on its own previous
/// output simply receives that value as the argument, so there is no hidden
/// cross-block aliasing.
///
/// An empty breakpoint table means unity gain regardless of the input.
#[derive(Debug, Clone, Default)]
pub struct GainSchedule {
    table: Option<LookupTable>,
}

impl GainSchedule {
    pub fn new(params: &TableParams) -> Result<Self, TableError> {
        if params.x.is_empty() && params.y.is_empty() {
            return Ok(Self { table: None });
        }
        Ok(Self {
            table: Some(LookupTable::new(params)?),
        })
    }

    /// Resolve the gain for the current value of the scheduling variable.
    /// `None` (no variable bound this tick) resolves the unscheduled gain.
    pub fn gain(&self, input: Option<f64>) -> f64 {
        match (&self.table, input) {
            (Some(table), Some(x)) => table.eval(x),
            (Some(table), None) => table.eval(0.0),
            (None, _) => 1.0,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.table.is_some()
    }
}
