//! Azimuth-synchronous individual pitch control.
//!
//! Blade-root flapwise moments are mapped by the Coleman (multi-blade
//! coordinate) transform into a non-rotating tilt/yaw frame, regulated
//! there, and mapped back into per-blade pitch trims. The inverse mapping
//! is evaluated at the azimuth plus a fixed phase lead that compensates the
//! pitch actuator lag. The transform carries only the asymmetric content of
//! the rotor loads; the symmetric (collective) component is the collective
//! pitch loop's business and never appears in the trims.

use nalgebra::{Matrix2x3, Matrix3x2, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{IpcConfigError, SignalError};
use crate::util::clamp;

/// Numbering direction of the blades around the rotor. With `Reversed`
/// the second and third blade swap their phase offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BladeOrder {
    #[default]
    Standard,
    Reversed,
}

/// Optional yaw-moment error compensation running alongside the load
/// reduction: the yaw axis is high-pass filtered before integration and a
/// PI-controlled yaw-moment-error term is summed into the yaw command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YawCompParams {
    pub enable: bool,
    /// Yaw axis high-pass corner frequency in rad/s.
    pub high_pass_corner: f64,
    /// Yaw moment error low-pass corner frequency in rad/s.
    pub low_pass_corner: f64,
    pub low_pass_damping: f64,
    pub kp: f64,
    pub ki: f64,
    /// Clamp on the PI term, integrator included, in degrees.
    pub minimum: f64,
    pub maximum: f64,
}

impl Default for YawCompParams {
    fn default() -> Self {
        Self {
            enable: false,
            high_pass_corner: 0.6283185,
            low_pass_corner: 0.6283185,
            low_pass_damping: 1.0,
            kp: -0.16,
            ki: -0.002,
            minimum: -100.0,
            maximum: 100.0,
        }
    }
}

/// Individual pitch control tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpcParams {
    /// Mounting offset between the azimuth encoder zero and blade one, in
    /// degrees.
    pub azimuth_offset: f64,
    pub blade_order: BladeOrder,
    /// Per-axis integrator gain, in deg/(kNm·s). Zero disables the load
    /// reduction while keeping the transform path alive.
    pub integrator_gain: f64,
    /// Phase lead applied in the inverse transform, in degrees.
    pub phase_lead: f64,
    pub yaw_compensation: YawCompParams,
}

/// Per-tick inputs. Moments in kNm, angles in degrees.
#[derive(Debug, Clone, Copy)]
pub struct IpcInputs {
    pub blade_root_moments: [f64; 3],
    pub azimuth: f64,
    pub collective_pitch: f64,
    pub minimum_pitch: f64,
    pub maximum_pitch: f64,
    /// Per-blade trim authority, degrees.
    pub maximum_individual_pitch: f64,
    pub demanded_tilt_moment: f64,
    pub demanded_yaw_moment: f64,
    /// Yaw moment error for the compensation path, kNm.
    pub yaw_moment_error: f64,
    /// Yaw-frame pitch contribution produced elsewhere (e.g. a yaw error
    /// regulator), degrees.
    pub external_yaw_pitch: f64,
}

/// Rotating-to-fixed-frame map at the blade phase offsets.
#[derive(Debug, Clone)]
pub struct ColemanTransform {
    phases: [f64; 3],
}

impl ColemanTransform {
    pub fn new(order: BladeOrder) -> Self {
        let third = 2.0 * std::f64::consts::PI / 3.0;
        let phases = match order {
            BladeOrder::Standard => [0.0, third, 2.0 * third],
            BladeOrder::Reversed => [0.0, 2.0 * third, third],
        };
        Self { phases }
    }

    /// Project the blade moments onto the non-rotating tilt and yaw axes.
    pub fn forward(&self, moments: [f64; 3], azimuth: f64) -> (f64, f64) {
        let projection = Matrix2x3::from_fn(|row, blade| {
            let angle = azimuth + self.phases[blade];
            if row == 0 {
                angle.cos()
            } else {
                angle.sin()
            }
        }) * (2.0 / 3.0);
        let axes = projection * Vector3::from(moments);
        (axes.x, axes.y)
    }

    /// Distribute tilt/yaw commands back onto the blades, `lead` radians
    /// ahead of the sampling azimuth.
    pub fn inverse(&self, tilt: f64, yaw: f64, azimuth: f64, lead: f64) -> [f64; 3] {
        let distribution = Matrix3x2::from_fn(|blade, column| {
            let angle = azimuth + lead + self.phases[blade];
            if column == 0 {
                angle.cos()
            } else {
                angle.sin()
            }
        });
        let trims = distribution * Vector2::new(tilt, yaw);
        [trims.x, trims.y, trims.z]
    }
}

/// First-order high-pass, seeded with its first input so start-up does not
/// inject a step.
#[derive(Debug, Clone)]
struct HighPass {
    corner: f64,
    period: f64,
    state: Option<(f64, f64)>,
}

impl HighPass {
    fn new(corner: f64, period: f64) -> Self {
        Self {
            corner,
            period,
            state: None,
        }
    }

    fn tick(&mut self, input: f64) -> f64 {
        let (prev_in, prev_out) = self.state.unwrap_or((input, input));
        let k = 2.0 / self.period;
        let output = k / (self.corner + k) * (input - prev_in)
            - (self.corner - k) / (self.corner + k) * prev_out;
        self.state = Some((input, output));
        output
    }
}

/// Second-order low-pass, seeded like [`HighPass`].
#[derive(Debug, Clone)]
struct SecondOrderLowPass {
    corner: f64,
    damping: f64,
    period: f64,
    state: Option<([f64; 2], [f64; 2])>,
}

impl SecondOrderLowPass {
    fn new(corner: f64, damping: f64, period: f64) -> Self {
        Self {
            corner,
            damping,
            period,
            state: None,
        }
    }

    fn tick(&mut self, input: f64) -> f64 {
        let (x, y) = self.state.unwrap_or(([input; 2], [input; 2]));
        let t = self.period;
        let wt2 = t * t * self.corner * self.corner;
        let dwt = 4.0 * t * self.damping * self.corner;
        let den = 4.0 + dwt + wt2;
        let output = ((8.0 - 2.0 * wt2) * y[0] + (-4.0 + dwt - wt2) * y[1]
            + wt2 * (input + 2.0 * x[0] + x[1]))
            / den;
        self.state = Some(([input, x[0]], [output, y[0]]));
        output
    }
}

/// PI term of the yaw compensation, integrator and output clamped to the
/// same configured band.
#[derive(Debug, Clone)]
struct YawMomentPi {
    kp: f64,
    ki: f64,
    period: f64,
    minimum: f64,
    maximum: f64,
    integrator: f64,
}

impl YawMomentPi {
    fn tick(&mut self, error: f64) -> f64 {
        self.integrator = clamp(
            self.integrator + self.ki * self.period * error,
            self.minimum,
            self.maximum,
        );
        clamp(self.kp * error + self.integrator, self.minimum, self.maximum)
    }
}

#[derive(Debug, Clone)]
struct YawCompensation {
    high_pass: HighPass,
    low_pass: SecondOrderLowPass,
    pi: YawMomentPi,
}

/// The individual pitch controller. Owns the two axis integrators, the yaw
/// compensation filters and the transform; everything is instance state.
#[derive(Debug, Clone)]
pub struct IndividualPitchControl {
    transform: ColemanTransform,
    azimuth_offset: f64,
    phase_lead: f64,
    integrator_gain: f64,
    period: f64,
    yaw_comp: Option<YawCompensation>,

    tilt_pitch: f64,
    yaw_pitch: f64,
    tilt_moment: f64,
    yaw_moment: f64,
    increments: [f64; 3],
}

impl IndividualPitchControl {
    pub fn new(params: &IpcParams, period: f64) -> Result<Self, IpcConfigError> {
        let yaw_comp = if params.yaw_compensation.enable {
            let c = &params.yaw_compensation;
            if c.high_pass_corner <= 0.0 {
                return Err(IpcConfigError::HighPassCorner(c.high_pass_corner));
            }
            if c.low_pass_corner <= 0.0 {
                return Err(IpcConfigError::LowPassCorner(c.low_pass_corner));
            }
            if c.low_pass_damping <= 0.0 {
                return Err(IpcConfigError::LowPassDamping(c.low_pass_damping));
            }
            if c.minimum > c.maximum {
                return Err(IpcConfigError::PiLimits {
                    min: c.minimum,
                    max: c.maximum,
                });
            }
            Some(YawCompensation {
                high_pass: HighPass::new(c.high_pass_corner, period),
                low_pass: SecondOrderLowPass::new(c.low_pass_corner, c.low_pass_damping, period),
                pi: YawMomentPi {
                    kp: c.kp,
                    ki: c.ki,
                    period,
                    minimum: c.minimum,
                    maximum: c.maximum,
                    integrator: 0.0,
                },
            })
        } else {
            None
        };

        Ok(Self {
            transform: ColemanTransform::new(params.blade_order),
            azimuth_offset: params.azimuth_offset,
            phase_lead: params.phase_lead.to_radians(),
            integrator_gain: params.integrator_gain,
            period,
            yaw_comp,
            tilt_pitch: 0.0,
            yaw_pitch: 0.0,
            tilt_moment: 0.0,
            yaw_moment: 0.0,
            increments: [0.0; 3],
        })
    }

    /// Advance one sample and return the three blade pitch demands.
    pub fn step(&mut self, inputs: &IpcInputs) -> [f64; 3] {
        let azimuth = (inputs.azimuth + self.azimuth_offset).to_radians();
        let (tilt_moment, yaw_moment) =
            self.transform.forward(inputs.blade_root_moments, azimuth);
        self.tilt_moment = tilt_moment;
        self.yaw_moment = yaw_moment;

        let tilt_error = inputs.demanded_tilt_moment - tilt_moment;
        let yaw_error = inputs.demanded_yaw_moment - yaw_moment;

        let (yaw_drive, yaw_pi_term) = match &mut self.yaw_comp {
            Some(comp) => {
                let filtered_error = comp.low_pass.tick(inputs.yaw_moment_error);
                (comp.high_pass.tick(yaw_error), comp.pi.tick(filtered_error))
            }
            None => (yaw_error, 0.0),
        };

        let authority = inputs.maximum_individual_pitch.abs();
        self.tilt_pitch = clamp(
            self.tilt_pitch + self.period * self.integrator_gain * tilt_error,
            -authority,
            authority,
        );
        self.yaw_pitch = clamp(
            self.yaw_pitch + self.period * self.integrator_gain * yaw_drive,
            -authority,
            authority,
        );

        let yaw_command = clamp(
            self.yaw_pitch + yaw_pi_term + inputs.external_yaw_pitch,
            -authority,
            authority,
        );

        let trims = self
            .transform
            .inverse(self.tilt_pitch, yaw_command, azimuth, self.phase_lead);

        let mut pitch = [0.0; 3];
        for blade in 0..3 {
            let trim = clamp(trims[blade], -authority, authority);
            self.increments[blade] = trim;
            pitch[blade] = clamp(
                inputs.collective_pitch + trim,
                inputs.minimum_pitch,
                inputs.maximum_pitch,
            );
        }
        pitch
    }

    /// Named signal lookup for the diagnostic boundary.
    pub fn signal(&self, name: &str) -> Result<f64, SignalError> {
        match name {
            "tilt moment" => Ok(self.tilt_moment),
            "yaw moment" => Ok(self.yaw_moment),
            "tilt pitch from control" => Ok(self.tilt_pitch),
            "yaw pitch from control" => Ok(self.yaw_pitch),
            "pitch increment 1" => Ok(self.increments[0]),
            "pitch increment 2" => Ok(self.increments[1]),
            "pitch increment 3" => Ok(self.increments[2]),
            _ => Err(SignalError::UnknownSignal(name.to_string())),
        }
    }
}
