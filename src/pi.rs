//! Proportional-integral control with clamped-integrator anti-windup.

use serde::{Deserialize, Serialize};

use crate::error::LoopConfigError;
use crate::util::clamp;

/// PI gains and integrator bounds.
///
/// The default is a transparent proportional unit (`kp = 1`, `ki = 0`,
/// unbounded integrator): a loop whose dynamics live entirely in its
/// transfer function sections runs the error path through this unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiParams {
    pub kp: f64,
    pub ki: f64,
    pub integrator_min: f64,
    pub integrator_max: f64,
}

impl Default for PiParams {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            integrator_min: f64::NEG_INFINITY,
            integrator_max: f64::INFINITY,
        }
    }
}

/// Discrete PI controller with trapezoidal integration.
///
/// The per-tick `gain` argument scales both terms, which is how the gain
/// schedule acts on the whole controller rather than on `kp` alone. The
/// integrator is clamped every tick to the intersection of its configured
/// bounds and the caller's current output limits, so a saturated output can
/// never wind the integrator past what the actuator will accept.
#[derive(Debug, Clone)]
pub struct PiController {
    kp: f64,
    ki: f64,
    period: f64,
    integrator_min: f64,
    integrator_max: f64,
    integrator: f64,
    prev_error: f64,
}

impl PiController {
    pub fn new(params: &PiParams, period: f64) -> Result<Self, LoopConfigError> {
        if params.integrator_min > params.integrator_max {
            return Err(LoopConfigError::IntegratorLimits {
                min: params.integrator_min,
                max: params.integrator_max,
            });
        }
        Ok(Self {
            kp: params.kp,
            ki: params.ki,
            period,
            integrator_min: params.integrator_min,
            integrator_max: params.integrator_max,
            integrator: 0.0,
            prev_error: 0.0,
        })
    }

    /// Advance one sample and return the clamped control action.
    pub fn step(&mut self, error: f64, gain: f64, out_min: f64, out_max: f64) -> f64 {
        self.integrator +=
            gain * self.ki * self.period * (error + self.prev_error) / 2.0;
        let lo = self.integrator_min.max(out_min);
        let hi = self.integrator_max.min(out_max);
        self.integrator = clamp(self.integrator, lo, hi);
        self.prev_error = error;
        clamp(gain * self.kp * error + self.integrator, out_min, out_max)
    }

    /// Overwrite the integrator, e.g. for bumpless hand-back after a spell
    /// of feed-forward operation.
    pub fn preload(&mut self, value: f64) {
        self.integrator = clamp(value, self.integrator_min, self.integrator_max);
        self.prev_error = 0.0;
    }

    pub fn integrator(&self) -> f64 {
        self.integrator
    }
}
