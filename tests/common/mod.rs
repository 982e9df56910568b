//! Shared fixture: a 10 MW reference turbine tuning and a driver that
//! produces mutually consistent sensor inputs for a prescribed generator
//! speed.

#![allow(dead_code)]

use wtcon::config::ControllerConfig;
use wtcon::control_loop::LoopParams;
use wtcon::controller::ControllerInputs;
use wtcon::filter::{FilterParams, NotchParams};
use wtcon::lookup::TableParams;
use wtcon::pi::PiParams;
use wtcon::setpoint::{PreferredAction, SetpointParams};

pub const T: f64 = 0.01;
pub const W_MIN: f64 = 31.4159265358979;
pub const W_MAX: f64 = 50.2654824574367;
pub const GEARBOX_RATIO: f64 = 50.0;
pub const RATED_POWER: f64 = 10.0e3;
pub const EFFICIENCY: f64 = 0.94;

/// The torque ceiling at zero derating, kNm.
pub fn rated_torque() -> f64 {
    RATED_POWER / W_MAX / EFFICIENCY
}

/// Two unity-DC second-order low-pass sections plus the gain section that
/// normalises the pair, from the analog prototype `w² / (s² + 2dws + w²)`
/// applied twice.
fn fourth_order_lowpass(w: f64, d: f64, t: f64) -> Vec<FilterParams> {
    let k = (0.5 * t * w) * (0.5 * t * w);
    let den = 1.0 + t * d * w + k;
    let section = FilterParams {
        enable: true,
        b: [1.0, 2.0, 1.0],
        a: [1.0, -2.0 * (1.0 - k) / den, (1.0 - t * d * w + k) / den],
    };
    let gain = FilterParams {
        enable: true,
        b: [(k / den) * (k / den), 0.0, 0.0],
        a: [1.0, 0.0, 0.0],
    };
    vec![section.clone(), section, gain]
}

/// Band-pass drivetrain damper `G·s·w² / (s² + 2dws + w²)` discretised at
/// `t`, as an error-path cascade.
fn drivetrain_damper(t: f64) -> LoopParams {
    let g = 0.0382; // kNm·s²/rad
    let d = 0.1;
    let w = 21.1; // rad/s

    LoopParams {
        error_filters: vec![
            FilterParams {
                enable: true,
                b: [1.0, 0.0, -1.0],
                a: [
                    1.0 + t * d * w + t * t * w * w / 4.0,
                    -2.0 * (1.0 - t * t * w * w / 4.0),
                    1.0 - t * d * w + t * t * w * w / 4.0,
                ],
            },
            FilterParams {
                enable: true,
                b: [-g * t / 2.0 * w * w, 0.0, 0.0],
                a: [1.0, 0.0, 0.0],
            },
        ],
        ..Default::default()
    }
}

fn tower_mode_notch() -> NotchParams {
    NotchParams {
        enable: true,
        freq: 1.59,
        damp_num: 0.01,
        damp_den: 0.2,
    }
}

fn torque_control(t: f64) -> LoopParams {
    LoopParams {
        measurement_filters: fourth_order_lowpass(3.39, 0.5, t),
        measurement_notches: vec![tower_mode_notch()],
        pi: PiParams {
            kp: -34.3775, // kNm·s/rad
            ki: -11.4592, // kNm/rad
            ..Default::default()
        },
        setpoint: SetpointParams {
            zones: vec![[W_MIN, W_MAX]],
            preferred: PreferredAction::External,
        },
        ..Default::default()
    }
}

fn collective_pitch_control(t: f64) -> LoopParams {
    LoopParams {
        measurement_filters: fourth_order_lowpass(5.6, 0.5, t),
        measurement_notches: vec![tower_mode_notch()],
        gain_schedule: TableParams::from_points(
            &[
                0.0, 3.8424, 5.6505, 8.1091, 11.6797, 14.5687, 17.1140, 19.4472, 21.6249,
                23.6774, 25.0,
            ],
            &[
                2.1000, 2.1000, 2.0727, 1.7182, 1.5182, 1.3545, 1.2636, 1.1909, 1.1182, 1.0545,
                1.0545,
            ],
        ),
        pi: PiParams {
            kp: -0.3939, // deg·s/rad
            ki: -0.1313, // deg/rad
            ..Default::default()
        },
        ..Default::default()
    }
}

fn yaw_by_ipc(t: f64) -> LoopParams {
    let w = 0.6283185;
    let d = 1.0;
    let k = (0.5 * t * w) * (0.5 * t * w);
    let den = 1.0 + t * d * w + k;
    LoopParams {
        measurement_filters: vec![
            FilterParams {
                enable: true,
                b: [1.0, 2.0, 1.0],
                a: [1.0, -2.0 * (1.0 - k) / den, (1.0 - t * d * w + k) / den],
            },
            FilterParams {
                enable: true,
                b: [k / den, 0.0, 0.0],
                a: [1.0, 0.0, 0.0],
            },
        ],
        pi: PiParams {
            kp: 0.0,
            ki: 0.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// The reference tuning for the scenario tests: a 10 MW turbine with a
/// variable speed band of 300 to 480 rpm and a derating strategy over
/// 0 to 50 % withheld power.
pub fn reference_config() -> ControllerConfig {
    let mut config = ControllerConfig {
        sample_period: T,
        drivetrain_damper: drivetrain_damper(T),
        torque_control: torque_control(T),
        collective_pitch_control: collective_pitch_control(T),
        yaw_by_ipc: yaw_by_ipc(T),
        ..Default::default()
    };

    config.power_manager.rated_power = RATED_POWER;
    config.power_manager.efficiency = EFFICIENCY;
    let derating = [
        0.00, 0.05, 0.10, 0.15, 0.20, 0.25, 0.30, 0.35, 0.40, 0.45, 0.50,
    ];
    // Optimum-mode gain in Nm·s²/rad², stored in kNm.
    let kopt_nm = [
        90.607511506848581,
        86.115902720799966,
        81.575353112422349,
        77.050958297021111,
        72.492888078483688,
        68.064126426095299,
        63.512773230238686,
        58.970705560510474,
        54.464434076487962,
        49.891764181889293,
        45.401884663773203,
    ];
    let kopt: Vec<f64> = kopt_nm.iter().map(|k| k / 1.0e3).collect();
    config.power_manager.torque_gain_table = TableParams {
        x: derating.to_vec(),
        y: kopt,
    };
    // Minimum pitch in rad, stored in degrees.
    let min_pitch_rad: [f64; 11] = [
        0.0,
        0.039449747839419,
        0.058560350086376,
        0.073725555631053,
        0.086762305188347,
        0.098108135965117,
        0.108839079483571,
        0.118773997213269,
        0.128018250433713,
        0.136903315900539,
        0.145235569651071,
    ];
    let min_pitch: Vec<f64> = min_pitch_rad.iter().map(|p| p.to_degrees()).collect();
    config.power_manager.minimum_pitch_table = TableParams {
        x: derating.to_vec(),
        y: min_pitch,
    };

    config.individual_pitch_control.integrator_gain = -0.1e-3; // deg/(kNm·s)

    config.speed_sensor_manager.gearbox_ratio = GEARBOX_RATIO;
    config.speed_sensor_manager.diagnoser.tolerance = 1.0;
    config.speed_sensor_manager.diagnoser.steps_to_fault = 10;

    config
}

/// The zero-derating optimum torque at generator speed `w`, kNm.
pub fn optimum_torque(w: f64) -> f64 {
    90.607511506848581 / 1.0e3 * w * w
}

/// Produces mutually consistent generator speed, rotor speed and azimuth
/// measurements for a prescribed generator speed trajectory.
pub struct SpeedDriver {
    azimuth: f64,
}

impl SpeedDriver {
    pub fn new() -> Self {
        Self { azimuth: 0.0 }
    }

    /// Inputs for one tick at generator speed `w` rad/s.
    pub fn tick(&mut self, w: f64) -> ControllerInputs {
        let rotor = w / GEARBOX_RATIO;
        self.azimuth = (self.azimuth + (rotor * T).to_degrees()).rem_euclid(360.0);
        ControllerInputs {
            external_maximum_torque: 230.0,
            external_minimum_torque: 0.0,
            external_maximum_pitch: 90.0,
            external_minimum_pitch: 0.0,
            maximum_speed: W_MAX,
            generator_speed: w,
            rotor_speed: rotor,
            azimuth: self.azimuth,
            maximum_individual_pitch: 10.0,
            ..Default::default()
        }
    }
}
