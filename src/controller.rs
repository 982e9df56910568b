//! The wind turbine controller: one `step()` per sample interval.
//!
//! Wires the speed sensor manager, power manager, regime state machine,
//! three torque/pitch control loops, the yaw-error regulator and the
//! individual pitch controller in a fixed order. Every coupling between
//! components is read from the producer and passed into the consumer as an
//! explicit argument on the same tick; the regime manager alone runs on the
//! previous tick's demands, which is what makes the loop well-defined.
//!
//! The hot path performs no allocation and no I/O. One controller instance
//! owns all of its state; several turbines mean several instances.

use crate::config::ControllerConfig;
use crate::control_loop::{ControlLoop, LoopInputs};
use crate::error::{ConfigError, SignalError};
use crate::ipc::{IndividualPitchControl, IpcInputs};
use crate::power::PowerManager;
use crate::regime::{OperatingRegime, RegimeInputs, TorquePitchManager};
use crate::sensors::{SensorStatus, SpeedSensorManager};

/// Measurements and external limits for one tick. Torque in kNm, pitch and
/// azimuth in degrees, speeds in rad/s, moments in kNm.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerInputs {
    pub external_maximum_torque: f64,
    pub external_minimum_torque: f64,
    pub external_maximum_pitch: f64,
    pub external_minimum_pitch: f64,
    /// Generator speed setpoint ceiling.
    pub maximum_speed: f64,
    pub generator_speed: f64,
    pub rotor_speed: f64,
    pub azimuth: f64,
    /// Fraction of rated power intentionally withheld.
    pub derating_ratio: f64,
    /// Per-blade trim authority for individual pitch action.
    pub maximum_individual_pitch: f64,
    pub yaw_error_reference: f64,
    pub yaw_error: f64,
    /// Yaw moment error for the in-rotor yaw compensation, when enabled.
    pub yaw_moment_error: f64,
    /// Flapwise blade-root bending moments.
    pub blade_root_moments: [f64; 3],
    /// Clears the sensor diagnoser's deviation accumulators this tick.
    pub sensor_reset: bool,
}

/// Demands issued for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerOutputs {
    /// Generator torque demand in kNm.
    pub torque_demand: f64,
    /// Per-blade pitch demands in degrees.
    pub pitch_demand: [f64; 3],
}

/// A complete controller instance.
#[derive(Debug)]
pub struct WindTurbineController {
    sensor_manager: SpeedSensorManager,
    power_manager: PowerManager,
    regime_manager: TorquePitchManager,
    drivetrain_damper: ControlLoop,
    torque_control: ControlLoop,
    collective_pitch_control: ControlLoop,
    yaw_by_ipc: ControlLoop,
    individual_pitch_control: IndividualPitchControl,

    // Demands fed back into the regime manager next tick.
    prev_torque_control: f64,
    prev_collective_pitch: f64,

    // Last-tick values kept for introspection.
    speed_equivalent: f64,
    max_torque_from_power: f64,
    min_pitch_from_power: f64,
    min_pitch: f64,
    max_torque: f64,
    max_pitch: f64,
    min_torque: f64,
    torque_from_damper: f64,
    individual_pitch_for_yaw: f64,
    outputs: ControllerOutputs,
}

impl WindTurbineController {
    /// Validate the configuration and build a controller. A rejected
    /// configuration names the offending sub-component; the controller
    /// never runs on one.
    pub fn new(config: &ControllerConfig) -> Result<Self, ConfigError> {
        let period = config.sample_period;
        if !(period > 0.0) {
            return Err(ConfigError::SamplePeriod(period));
        }
        Ok(Self {
            sensor_manager: SpeedSensorManager::new(&config.speed_sensor_manager, period)
                .map_err(ConfigError::SpeedSensorManager)?,
            power_manager: PowerManager::new(&config.power_manager)
                .map_err(ConfigError::PowerManager)?,
            regime_manager: TorquePitchManager::new(),
            drivetrain_damper: ControlLoop::new(&config.drivetrain_damper, period)
                .map_err(ConfigError::DrivetrainDamper)?,
            torque_control: ControlLoop::new(&config.torque_control, period)
                .map_err(ConfigError::TorqueControl)?,
            collective_pitch_control: ControlLoop::new(&config.collective_pitch_control, period)
                .map_err(ConfigError::CollectivePitchControl)?,
            yaw_by_ipc: ControlLoop::new(&config.yaw_by_ipc, period)
                .map_err(ConfigError::YawByIpc)?,
            individual_pitch_control: IndividualPitchControl::new(
                &config.individual_pitch_control,
                period,
            )
            .map_err(ConfigError::IndividualPitchControl)?,
            prev_torque_control: 0.0,
            prev_collective_pitch: 0.0,
            speed_equivalent: 0.0,
            max_torque_from_power: 0.0,
            min_pitch_from_power: 0.0,
            min_pitch: 0.0,
            max_torque: 0.0,
            max_pitch: 0.0,
            min_torque: 0.0,
            torque_from_damper: 0.0,
            individual_pitch_for_yaw: 0.0,
            outputs: ControllerOutputs::default(),
        })
    }

    /// Execute the periodic calculations for one sample interval.
    pub fn step(&mut self, inputs: &ControllerInputs) -> (ControllerOutputs, OperatingRegime) {
        // Fault-tolerant speed first; everything downstream regulates on it.
        self.sensor_manager.step(
            inputs.generator_speed,
            inputs.rotor_speed,
            inputs.azimuth,
            inputs.sensor_reset,
        );
        self.speed_equivalent = self.sensor_manager.output_speed();

        // Derating strategy.
        self.max_torque_from_power = self.power_manager.step(
            inputs.derating_ratio,
            inputs.maximum_speed,
            self.speed_equivalent,
        );
        self.min_pitch_from_power = self.power_manager.minimum_pitch();
        let below_rated_torque = self.power_manager.below_rated_torque();

        // The tighter of the strategy limits and the external ones.
        self.min_pitch = self.min_pitch_from_power.max(inputs.external_minimum_pitch);
        self.max_torque = self
            .max_torque_from_power
            .min(inputs.external_maximum_torque);

        // Regime supervision runs on the demands issued last tick.
        let regime = self.regime_manager.step(RegimeInputs {
            torque: self.prev_torque_control,
            max_torque: self.max_torque,
            external_min_torque: inputs.external_minimum_torque,
            pitch: self.prev_collective_pitch,
            external_max_pitch: inputs.external_maximum_pitch,
            external_min_pitch: self.min_pitch,
        });
        self.max_pitch = self.regime_manager.max_pitch();
        self.min_torque = self.regime_manager.min_torque();

        // Torque channel: damper plus regulator.
        self.torque_from_damper = self.drivetrain_damper.step(LoopInputs {
            setpoint: 0.0,
            measurement: self.speed_equivalent,
            preferred: None,
            schedule_input: None,
            min_output: -inputs.external_maximum_torque,
            max_output: inputs.external_maximum_torque,
        });
        let torque_from_control = self.torque_control.step(LoopInputs {
            setpoint: inputs.maximum_speed,
            measurement: self.speed_equivalent,
            preferred: Some(below_rated_torque),
            schedule_input: None,
            min_output: self.min_torque,
            max_output: self.max_torque,
        });
        let torque_demand = self.torque_from_damper + torque_from_control;

        // Pitch channel, gain-scheduled on its own previous demand.
        let collective_pitch = self.collective_pitch_control.step(LoopInputs {
            setpoint: inputs.maximum_speed,
            measurement: self.speed_equivalent,
            preferred: None,
            schedule_input: Some(self.prev_collective_pitch),
            min_output: self.min_pitch,
            max_output: self.max_pitch,
        });

        // Yaw error into a yaw-frame pitch contribution.
        self.individual_pitch_for_yaw = self.yaw_by_ipc.step(LoopInputs {
            setpoint: inputs.yaw_error_reference,
            measurement: inputs.yaw_error,
            preferred: None,
            schedule_input: None,
            min_output: -inputs.maximum_individual_pitch,
            max_output: inputs.maximum_individual_pitch,
        });

        let pitch_demand = self.individual_pitch_control.step(&IpcInputs {
            blade_root_moments: inputs.blade_root_moments,
            azimuth: inputs.azimuth,
            collective_pitch,
            minimum_pitch: self.min_pitch,
            maximum_pitch: self.max_pitch,
            maximum_individual_pitch: inputs.maximum_individual_pitch,
            demanded_tilt_moment: 0.0,
            demanded_yaw_moment: 0.0,
            yaw_moment_error: inputs.yaw_moment_error,
            external_yaw_pitch: self.individual_pitch_for_yaw,
        });

        self.prev_torque_control = torque_from_control;
        self.prev_collective_pitch = collective_pitch;
        self.outputs = ControllerOutputs {
            torque_demand,
            pitch_demand,
        };
        (self.outputs, regime)
    }

    /// The demands issued on the last tick.
    pub fn outputs(&self) -> ControllerOutputs {
        self.outputs
    }

    /// The current operating regime.
    pub fn regime(&self) -> OperatingRegime {
        self.regime_manager.regime()
    }

    /// The sensor voting status from the last tick.
    pub fn sensor_status(&self) -> SensorStatus {
        self.sensor_manager.status()
    }

    /// Named signal lookup. Top-level names resolve directly; a
    /// `"block>leaf"` name is dispatched by prefix to the sub-component.
    /// String lookup exists only at this diagnostic boundary; internal
    /// consumers use the typed accessors.
    pub fn output(&self, name: &str) -> Result<f64, SignalError> {
        match name {
            "torque demand from torque control" => return Ok(self.prev_torque_control),
            "torque demand from drivetrain damper" => return Ok(self.torque_from_damper),
            "minimum pitch" => return Ok(self.min_pitch),
            "maximum pitch" => return Ok(self.max_pitch),
            "maximum torque" => return Ok(self.max_torque),
            "minimum torque" => return Ok(self.min_torque),
            "collective pitch demand" => return Ok(self.prev_collective_pitch),
            "maximum torque from power manager" => return Ok(self.max_torque_from_power),
            "minimum pitch from power manager" => return Ok(self.min_pitch_from_power),
            "individual pitch for yaw" => return Ok(self.individual_pitch_for_yaw),
            "generator speed equivalent" => return Ok(self.speed_equivalent),
            _ => {}
        }

        let Some((block, leaf)) = name.split_once('>') else {
            return Err(SignalError::UnknownSignal(name.to_string()));
        };
        match block {
            "power manager" => self.power_manager.signal(leaf),
            "torque-pitch manager" => self.regime_manager.signal(leaf),
            "drivetrain damper" => self.drivetrain_damper.signal(leaf),
            "torque control" => self.torque_control.signal(leaf),
            "collective pitch control" => self.collective_pitch_control.signal(leaf),
            "yaw by ipc" => self.yaw_by_ipc.signal(leaf),
            "individual pitch control" => self.individual_pitch_control.signal(leaf),
            "speed sensor manager" => self.sensor_manager.signal(leaf),
            _ => Err(SignalError::UnknownBlock(block.to_string())),
        }
    }
}
