//! Piecewise-linear lookup tables.

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Breakpoint table for a lookup curve, supplied as configuration data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableParams {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl TableParams {
    pub fn from_points(x: &[f64], y: &[f64]) -> Self {
        Self {
            x: x.to_vec(),
            y: y.to_vec(),
        }
    }
}

/// Piecewise-linear interpolation over strictly increasing breakpoints.
///
/// Queries outside the breakpoint range clamp to the boundary value. A
/// single-point table evaluates to a constant.
#[derive(Debug, Clone)]
pub struct LookupTable {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LookupTable {
    /// Build a table from configuration, rejecting empty, mismatched or
    /// non-monotone breakpoints.
    pub fn new(params: &TableParams) -> Result<Self, TableError> {
        if params.x.len() != params.y.len() {
            return Err(TableError::LengthMismatch);
        }
        if params.x.is_empty() {
            return Err(TableError::Empty);
        }
        if params.x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(TableError::NotMonotone);
        }
        Ok(Self {
            xs: params.x.clone(),
            ys: params.y.clone(),
        })
    }

    /// Evaluate the curve at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        // Index of the segment containing x; bounds are handled above.
        let i = self.xs.partition_point(|&knot| knot <= x) - 1;
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        self.ys[i] + t * (self.ys[i + 1] - self.ys[i])
    }
}
