//! Controller configuration.
//!
//! One nested record per sub-component, supplied once before construction.
//! All numeric tuning (filter coefficients, gain schedules, lookup curves,
//! zones) is data in these records; the controller contains no per-turbine
//! numbers. The defaults are the neutral tuning: transparent loops, zero
//! power strategy, disabled individual pitch action.

use serde::{Deserialize, Serialize};

use crate::control_loop::LoopParams;
use crate::ipc::IpcParams;
use crate::power::PowerParams;
use crate::sensors::SensorParams;

/// Complete tuning record for one controller instance.
///
/// Unit conventions across the configuration and the runtime interface:
/// torque in kNm, pitch in degrees, rotational speed in rad/s, azimuth in
/// degrees, power in kW.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller sample interval in seconds.
    pub sample_period: f64,
    pub drivetrain_damper: LoopParams,
    pub torque_control: LoopParams,
    pub collective_pitch_control: LoopParams,
    pub power_manager: PowerParams,
    pub individual_pitch_control: IpcParams,
    pub yaw_by_ipc: LoopParams,
    pub speed_sensor_manager: SensorParams,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sample_period: 0.01,
            drivetrain_damper: LoopParams::default(),
            torque_control: LoopParams::default(),
            collective_pitch_control: LoopParams::default(),
            power_manager: PowerParams::default(),
            individual_pitch_control: IpcParams::default(),
            yaw_by_ipc: LoopParams::default(),
            speed_sensor_manager: SensorParams::default(),
        }
    }
}
