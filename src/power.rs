//! Power and derating management.
//!
//! Produces the derating-dependent torque ceiling, the below-rated
//! feed-forward torque and the minimum pitch floor from lookup curves over
//! the derating ratio. Units follow the controller convention: power in kW,
//! torque in kNm, speed in rad/s, pitch in degrees.

use serde::{Deserialize, Serialize};

use crate::error::{PowerConfigError, SignalError};
use crate::lookup::{LookupTable, TableParams};

/// Power manager tuning. The defaults are the neutral strategy: zero rated
/// power, unit efficiency and flat zero curves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerParams {
    /// Rated electrical power in kW.
    pub rated_power: f64,
    /// Drivetrain efficiency, dimensionless, non-zero.
    pub efficiency: f64,
    /// Below-rated torque gain `Kopt` over the derating ratio, in
    /// kNm·s²/rad².
    pub torque_gain_table: TableParams,
    /// Minimum pitch over the derating ratio, in degrees.
    pub minimum_pitch_table: TableParams,
}

impl Default for PowerParams {
    fn default() -> Self {
        Self {
            rated_power: 0.0,
            efficiency: 1.0,
            torque_gain_table: TableParams::from_points(&[0.0], &[0.0]),
            minimum_pitch_table: TableParams::from_points(&[0.0], &[0.0]),
        }
    }
}

/// Derating-driven limit producer. Stateless across ticks apart from the
/// retained outputs; everything is recomputed from the current inputs.
#[derive(Debug, Clone)]
pub struct PowerManager {
    rated_power: f64,
    efficiency: f64,
    torque_gain: LookupTable,
    minimum_pitch_curve: LookupTable,

    derating_ratio: f64,
    max_speed: f64,
    measured_speed: f64,
    maximum_torque: f64,
    below_rated_torque: f64,
    minimum_pitch: f64,
}

impl PowerManager {
    pub fn new(params: &PowerParams) -> Result<Self, PowerConfigError> {
        if params.efficiency == 0.0 {
            return Err(PowerConfigError::ZeroEfficiency);
        }
        Ok(Self {
            rated_power: params.rated_power,
            efficiency: params.efficiency,
            torque_gain: LookupTable::new(&params.torque_gain_table)
                .map_err(PowerConfigError::TorqueGainTable)?,
            minimum_pitch_curve: LookupTable::new(&params.minimum_pitch_table)
                .map_err(PowerConfigError::MinimumPitchTable)?,
            derating_ratio: 0.0,
            max_speed: 0.0,
            measured_speed: 0.0,
            maximum_torque: 0.0,
            below_rated_torque: 0.0,
            minimum_pitch: 0.0,
        })
    }

    /// Recompute the three strategy outputs and return the torque ceiling.
    pub fn step(&mut self, derating_ratio: f64, max_speed: f64, measured_speed: f64) -> f64 {
        self.derating_ratio = derating_ratio;
        self.max_speed = max_speed;
        self.measured_speed = measured_speed;

        self.maximum_torque =
            (1.0 - derating_ratio) * self.rated_power / max_speed / self.efficiency;
        self.below_rated_torque =
            self.torque_gain.eval(derating_ratio) * measured_speed * measured_speed;
        self.minimum_pitch = self.minimum_pitch_curve.eval(derating_ratio);

        self.maximum_torque
    }

    pub fn maximum_torque(&self) -> f64 {
        self.maximum_torque
    }

    pub fn below_rated_torque(&self) -> f64 {
        self.below_rated_torque
    }

    pub fn minimum_pitch(&self) -> f64 {
        self.minimum_pitch
    }

    /// Named signal lookup for the diagnostic boundary.
    pub fn signal(&self, name: &str) -> Result<f64, SignalError> {
        match name {
            "derating ratio" => Ok(self.derating_ratio),
            "maximum speed" => Ok(self.max_speed),
            "measured speed" => Ok(self.measured_speed),
            "maximum torque" => Ok(self.maximum_torque),
            "below rated torque" => Ok(self.below_rated_torque),
            "minimum pitch" => Ok(self.minimum_pitch),
            _ => Err(SignalError::UnknownSignal(name.to_string())),
        }
    }
}
