//! The generic SISO control loop: measurement conditioning, zone-based
//! setpoint resolution, gain-scheduled PI regulation and output limiting.
//!
//! One loop instance drives one actuation channel. The same block, tuned
//! with different coefficients, serves as drivetrain damper, torque
//! regulator, collective pitch regulator and yaw-error regulator; the
//! differences are pure configuration data.
//!
//! Per tick, in order:
//! 1. the measurement runs through the measurement filter cascade and the
//!    notch cascade;
//! 2. the setpoint generator resolves the zone setpoint or hands the tick
//!    over to the feed-forward preferred action;
//! 3. the regulation error runs through the error filter cascade;
//! 4. the gain-scheduled PI produces the control action;
//! 5. the post-gain filter cascade shapes it;
//! 6. the result is clamped to the limits supplied by the caller for this
//!    tick. The loop holds no limits of its own; both bounds arrive fresh
//!    every step because other components produce them.

use serde::{Deserialize, Serialize};

use crate::error::{LoopConfigError, SignalError};
use crate::filter::{BiquadCascade, FilterParams, NotchParams};
use crate::gain::GainSchedule;
use crate::lookup::TableParams;
use crate::pi::{PiController, PiParams};
use crate::setpoint::{LoopAction, SetpointGenerator, SetpointParams};
use crate::util::clamp;

/// Complete tuning record for one control loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopParams {
    pub measurement_filters: Vec<FilterParams>,
    pub measurement_notches: Vec<NotchParams>,
    pub error_filters: Vec<FilterParams>,
    /// Gain as a function of the scheduling variable; empty means unity.
    pub gain_schedule: TableParams,
    pub pi: PiParams,
    pub post_filters: Vec<FilterParams>,
    pub setpoint: SetpointParams,
}

/// Per-tick inputs to [`ControlLoop::step`]. Every cross-component coupling
/// (feed-forward action, scheduling variable, dynamic limits) is an explicit
/// argument supplied by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct LoopInputs {
    pub setpoint: f64,
    pub measurement: f64,
    /// Live preferred control action, when the setpoint generator is
    /// configured with an external feed-forward source.
    pub preferred: Option<f64>,
    /// Current value of the scheduling variable, when the loop is
    /// gain-scheduled. May be the loop's own previous output.
    pub schedule_input: Option<f64>,
    pub min_output: f64,
    pub max_output: f64,
}

/// A configured SISO control block. See the module docs for the processing
/// order.
#[derive(Debug, Clone)]
pub struct ControlLoop {
    measurement_filters: BiquadCascade,
    measurement_notches: BiquadCascade,
    error_filters: BiquadCascade,
    schedule: GainSchedule,
    pi: PiController,
    post_filters: BiquadCascade,
    setpoint_generator: SetpointGenerator,

    // Last-tick values kept for introspection.
    last_setpoint: f64,
    last_filtered: f64,
    last_error: f64,
    last_gain: f64,
    last_output: f64,
    last_min: f64,
    last_max: f64,
}

impl ControlLoop {
    /// Validate a tuning record and build the loop. Each rejected sub-block
    /// maps to its own error variant, so the caller can report exactly which
    /// part of which loop's tuning is wrong.
    pub fn new(params: &LoopParams, period: f64) -> Result<Self, LoopConfigError> {
        Ok(Self {
            measurement_filters: BiquadCascade::new(&params.measurement_filters)
                .map_err(LoopConfigError::MeasurementFilters)?,
            measurement_notches: BiquadCascade::from_notches(&params.measurement_notches, period)
                .map_err(LoopConfigError::MeasurementNotches)?,
            error_filters: BiquadCascade::new(&params.error_filters)
                .map_err(LoopConfigError::ErrorFilters)?,
            schedule: GainSchedule::new(&params.gain_schedule)
                .map_err(LoopConfigError::GainSchedule)?,
            pi: PiController::new(&params.pi, period)?,
            post_filters: BiquadCascade::new(&params.post_filters)
                .map_err(LoopConfigError::PostFilters)?,
            setpoint_generator: SetpointGenerator::new(&params.setpoint)
                .map_err(LoopConfigError::SetpointZones)?,
            last_setpoint: 0.0,
            last_filtered: 0.0,
            last_error: 0.0,
            last_gain: 1.0,
            last_output: 0.0,
            last_min: 0.0,
            last_max: 0.0,
        })
    }

    /// Advance one sample. Never fails; numeric hazards are absorbed by the
    /// validated configuration and the output clamp.
    pub fn step(&mut self, inputs: LoopInputs) -> f64 {
        let filtered = self
            .measurement_notches
            .tick(self.measurement_filters.tick(inputs.measurement));

        let action =
            self.setpoint_generator
                .resolve(inputs.setpoint, filtered, inputs.preferred);

        let output = match action {
            LoopAction::FeedForward(preferred) => {
                let output = clamp(preferred, inputs.min_output, inputs.max_output);
                // Keep the integrator on the issued action so regulation
                // resumes from it without a step.
                self.pi.preload(output);
                self.last_setpoint = inputs.setpoint;
                self.last_error = 0.0;
                self.last_gain = 1.0;
                output
            }
            LoopAction::Regulate(setpoint) => {
                let error = self.error_filters.tick(setpoint - filtered);
                let gain = self.schedule.gain(inputs.schedule_input);
                let action = self
                    .pi
                    .step(error, gain, inputs.min_output, inputs.max_output);
                let shaped = self.post_filters.tick(action);
                self.last_setpoint = setpoint;
                self.last_error = error;
                self.last_gain = gain;
                clamp(shaped, inputs.min_output, inputs.max_output)
            }
        };

        self.last_filtered = filtered;
        self.last_min = inputs.min_output;
        self.last_max = inputs.max_output;
        self.last_output = output;
        output
    }

    /// The control action issued on the last tick.
    pub fn output(&self) -> f64 {
        self.last_output
    }

    /// The conditioned measurement from the last tick.
    pub fn filtered_measurement(&self) -> f64 {
        self.last_filtered
    }

    /// Named signal lookup for the diagnostic boundary.
    pub fn signal(&self, name: &str) -> Result<f64, SignalError> {
        match name {
            "setpoint" => Ok(self.last_setpoint),
            "filtered measurement" => Ok(self.last_filtered),
            "error" => Ok(self.last_error),
            "schedule gain" => Ok(self.last_gain),
            "control action" => Ok(self.last_output),
            "minimum control action" => Ok(self.last_min),
            "maximum control action" => Ok(self.last_max),
            _ => Err(SignalError::UnknownSignal(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setpoint::PreferredAction;
    use approx::assert_relative_eq;

    const FREE: f64 = 1.0e9;

    fn plain_pi(kp: f64, ki: f64) -> LoopParams {
        LoopParams {
            pi: PiParams {
                kp,
                ki,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn step_plain(loop_: &mut ControlLoop, setpoint: f64, measurement: f64) -> f64 {
        loop_.step(LoopInputs {
            setpoint,
            measurement,
            preferred: None,
            schedule_input: None,
            min_output: -FREE,
            max_output: FREE,
        })
    }

    #[test]
    fn default_params_build_a_passthrough_regulator() {
        let mut c = ControlLoop::new(&LoopParams::default(), 0.01).unwrap();
        // kp = 1, no filters: output equals the raw error.
        assert_relative_eq!(step_plain(&mut c, 5.0, 3.0), 2.0);
    }

    #[test]
    fn measurement_filters_condition_the_feedback() {
        let mut params = plain_pi(1.0, 0.0);
        params.measurement_filters = vec![FilterParams {
            enable: true,
            b: [0.5, 0.0, 0.0],
            a: [1.0, 0.0, 0.0],
        }];
        let mut c = ControlLoop::new(&params, 0.01).unwrap();
        // Measurement halved before the error is formed.
        assert_relative_eq!(step_plain(&mut c, 10.0, 4.0), 8.0);
        assert_relative_eq!(c.filtered_measurement(), 2.0);
    }

    #[test]
    fn output_clamps_to_per_tick_limits() {
        let mut c = ControlLoop::new(&plain_pi(10.0, 0.0), 0.01).unwrap();
        let u = c.step(LoopInputs {
            setpoint: 100.0,
            measurement: 0.0,
            preferred: None,
            schedule_input: None,
            min_output: -1.0,
            max_output: 1.0,
        });
        assert_relative_eq!(u, 1.0);
        // Fresh limits next tick take effect immediately.
        let u = c.step(LoopInputs {
            setpoint: 100.0,
            measurement: 0.0,
            preferred: None,
            schedule_input: None,
            min_output: -3.0,
            max_output: 3.0,
        });
        assert_relative_eq!(u, 3.0);
    }

    #[test]
    fn schedule_scales_the_regulator() {
        let mut params = plain_pi(2.0, 0.0);
        params.gain_schedule = TableParams::from_points(&[0.0, 10.0], &[1.0, 3.0]);
        let mut c = ControlLoop::new(&params, 0.01).unwrap();
        let u = c.step(LoopInputs {
            setpoint: 1.0,
            measurement: 0.0,
            preferred: None,
            schedule_input: Some(10.0),
            min_output: -FREE,
            max_output: FREE,
        });
        assert_relative_eq!(u, 6.0);
        assert_relative_eq!(c.signal("schedule gain").unwrap(), 3.0);
    }

    #[test]
    fn feed_forward_inside_zone_with_bumpless_handback() {
        let mut params = plain_pi(0.0, 1.0);
        params.setpoint = SetpointParams {
            zones: vec![[10.0, 20.0]],
            preferred: PreferredAction::External,
        };
        let mut c = ControlLoop::new(&params, 0.01).unwrap();

        // Inside the zone the loop tracks the preferred action.
        let u = c.step(LoopInputs {
            setpoint: 20.0,
            measurement: 15.0,
            preferred: Some(42.0),
            schedule_input: None,
            min_output: 0.0,
            max_output: 100.0,
        });
        assert_relative_eq!(u, 42.0);

        // Leaving the zone, regulation resumes from the preferred action
        // instead of from a stale integrator.
        let u = c.step(LoopInputs {
            setpoint: 20.0,
            measurement: 20.0,
            preferred: Some(42.0),
            schedule_input: None,
            min_output: 0.0,
            max_output: 100.0,
        });
        assert_relative_eq!(u, 42.0, max_relative = 1e-12);
    }

    #[test]
    fn feed_forward_is_clamped() {
        let mut params = LoopParams::default();
        params.setpoint = SetpointParams {
            zones: vec![[0.0, 100.0]],
            preferred: PreferredAction::External,
        };
        let mut c = ControlLoop::new(&params, 0.01).unwrap();
        let u = c.step(LoopInputs {
            setpoint: 100.0,
            measurement: 50.0,
            preferred: Some(1.0e6),
            schedule_input: None,
            min_output: 0.0,
            max_output: 200.0,
        });
        assert_relative_eq!(u, 200.0);
    }

    #[test]
    fn error_filters_shape_the_error_path() {
        // Pure gain of 3 in the error path.
        let mut params = plain_pi(1.0, 0.0);
        params.error_filters = vec![FilterParams {
            enable: true,
            b: [3.0, 0.0, 0.0],
            a: [1.0, 0.0, 0.0],
        }];
        let mut c = ControlLoop::new(&params, 0.01).unwrap();
        assert_relative_eq!(step_plain(&mut c, 2.0, 0.0), 6.0);
    }

    #[test]
    fn signal_lookup_and_unknown_names() {
        let mut c = ControlLoop::new(&LoopParams::default(), 0.01).unwrap();
        step_plain(&mut c, 5.0, 3.0);
        assert_relative_eq!(c.signal("control action").unwrap(), 2.0);
        assert_relative_eq!(c.signal("error").unwrap(), 2.0);
        assert_relative_eq!(c.signal("setpoint").unwrap(), 5.0);
        assert!(matches!(
            c.signal("no such thing"),
            Err(SignalError::UnknownSignal(_))
        ));
    }

    #[test]
    fn config_errors_name_the_sub_block() {
        let mut params = LoopParams::default();
        params.error_filters = vec![FilterParams {
            enable: true,
            a: [0.0, 0.0, 0.0],
            ..Default::default()
        }];
        assert!(matches!(
            ControlLoop::new(&params, 0.01).unwrap_err(),
            LoopConfigError::ErrorFilters(_)
        ));

        let mut params = LoopParams::default();
        params.gain_schedule = TableParams::from_points(&[1.0, 0.0], &[1.0, 1.0]);
        assert!(matches!(
            ControlLoop::new(&params, 0.01).unwrap_err(),
            LoopConfigError::GainSchedule(_)
        ));
    }
}
