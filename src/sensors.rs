//! Speed sensor cross-checking and fault-tolerant signal selection.
//!
//! Three independent observations of the same physical quantity are derived
//! each tick: the generator speed sensor, the rotor speed sensor scaled by
//! the gearbox ratio, and the azimuth encoder differentiated and scaled.
//! A two-out-of-three vote flags a signal that walks away from both of its
//! peers for longer than the configured number of consecutive ticks.
//! Sensor disagreement is a degraded-operation status, not an error: the
//! manager always emits a usable generator-speed-equivalent signal.

use serde::{Deserialize, Serialize};

use crate::error::{SensorConfigError, SignalError};

/// The three cross-checked speed observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedSignal {
    GeneratorSpeed,
    RotorSpeed,
    Azimuth,
}

impl SpeedSignal {
    const ALL: [SpeedSignal; 3] = [
        SpeedSignal::GeneratorSpeed,
        SpeedSignal::RotorSpeed,
        SpeedSignal::Azimuth,
    ];

    fn index(self) -> usize {
        match self {
            SpeedSignal::GeneratorSpeed => 0,
            SpeedSignal::RotorSpeed => 1,
            SpeedSignal::Azimuth => 2,
        }
    }
}

/// Aggregated voting outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    AllOk,
    SingleFault(SpeedSignal),
    MultipleFaults,
}

impl SensorStatus {
    /// Status code at the external interface: 0 all ok, -1/-2/-3 for a
    /// single faulted signal, 4 for two or more.
    pub fn code(self) -> i32 {
        match self {
            SensorStatus::AllOk => 0,
            SensorStatus::SingleFault(signal) => -(signal.index() as i32 + 1),
            SensorStatus::MultipleFaults => 4,
        }
    }
}

/// Cross-check tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnoserParams {
    /// Disagreement tolerance in rad/s.
    pub tolerance: f64,
    /// Consecutive deviant ticks before a signal is declared faulted.
    pub steps_to_fault: u32,
}

impl Default for DiagnoserParams {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            steps_to_fault: 10,
        }
    }
}

/// Speed sensor manager tuning. The sample period comes from the
/// controller-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorParams {
    pub diagnoser: DiagnoserParams,
    pub gearbox_ratio: f64,
    /// Azimuth wrap range in degrees.
    pub minimum_azimuth: f64,
    pub maximum_azimuth: f64,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            diagnoser: DiagnoserParams::default(),
            gearbox_ratio: 1.0,
            minimum_azimuth: 0.0,
            maximum_azimuth: 360.0,
        }
    }
}

/// Majority voter over the three derived signals.
///
/// A signal is deviant on a tick when it differs from **both** other
/// signals by more than the tolerance. Its counter tracks consecutive
/// deviant ticks and is cleared when agreement returns or when the external
/// reset pulse fires, so a latched fault can always be retried.
#[derive(Debug, Clone)]
pub struct SensorDiagnoser {
    tolerance: f64,
    steps_to_fault: u32,
    counters: [u32; 3],
    faulted: [bool; 3],
}

impl SensorDiagnoser {
    pub fn new(params: &DiagnoserParams) -> Result<Self, SensorConfigError> {
        if params.tolerance <= 0.0 {
            return Err(SensorConfigError::Tolerance(params.tolerance));
        }
        Ok(Self {
            tolerance: params.tolerance,
            steps_to_fault: params.steps_to_fault,
            counters: [0; 3],
            faulted: [false; 3],
        })
    }

    /// Update the vote with this tick's signals. `reset` clears the
    /// deviation counters before they are re-evaluated.
    pub fn step(&mut self, signals: [f64; 3], reset: bool) -> [bool; 3] {
        if reset {
            self.counters = [0; 3];
        }
        for i in 0..3 {
            let deviant = (0..3)
                .filter(|&j| j != i)
                .all(|j| (signals[i] - signals[j]).abs() > self.tolerance);
            if deviant {
                self.counters[i] = self.counters[i].saturating_add(1);
            } else {
                self.counters[i] = 0;
            }

            let fault = self.counters[i] > self.steps_to_fault;
            if fault != self.faulted[i] {
                let signal = SpeedSignal::ALL[i];
                if fault {
                    log::warn!("speed signal {signal:?} declared faulted");
                } else {
                    log::info!("speed signal {signal:?} back in agreement");
                }
                self.faulted[i] = fault;
            }
        }
        self.faulted
    }

    pub fn faulted(&self) -> [bool; 3] {
        self.faulted
    }
}

/// Derives the three speed observations, runs the diagnoser and selects
/// the generator-speed-equivalent output.
#[derive(Debug, Clone)]
pub struct SpeedSensorManager {
    diagnoser: SensorDiagnoser,
    gearbox_ratio: f64,
    period: f64,
    azimuth_range: f64,
    last_azimuth: Option<f64>,
    signals: [f64; 3],
    status: SensorStatus,
    output_speed: f64,
}

impl SpeedSensorManager {
    pub fn new(params: &SensorParams, period: f64) -> Result<Self, SensorConfigError> {
        if params.maximum_azimuth <= params.minimum_azimuth {
            return Err(SensorConfigError::AzimuthRange {
                min: params.minimum_azimuth,
                max: params.maximum_azimuth,
            });
        }
        Ok(Self {
            diagnoser: SensorDiagnoser::new(&params.diagnoser)?,
            gearbox_ratio: params.gearbox_ratio,
            period,
            azimuth_range: params.maximum_azimuth - params.minimum_azimuth,
            last_azimuth: None,
            signals: [0.0; 3],
            status: SensorStatus::AllOk,
            output_speed: 0.0,
        })
    }

    /// Cross-check this tick's measurements and return the voting status.
    /// Speeds are in rad/s, the azimuth in degrees.
    pub fn step(
        &mut self,
        generator_speed: f64,
        rotor_speed: f64,
        azimuth: f64,
        reset: bool,
    ) -> SensorStatus {
        // Azimuth increment, wrapped into half a revolution either way so a
        // rollover does not read as a speed spike. The first tick seeds the
        // memory and reports zero rate.
        let mut delta = azimuth - self.last_azimuth.unwrap_or(azimuth);
        if delta >= self.azimuth_range / 2.0 {
            delta -= self.azimuth_range;
        }
        if delta < -self.azimuth_range / 2.0 {
            delta += self.azimuth_range;
        }
        self.last_azimuth = Some(azimuth);

        self.signals = [
            generator_speed,
            self.gearbox_ratio * rotor_speed,
            self.gearbox_ratio * delta.to_radians() / self.period,
        ];

        let faulted = self.diagnoser.step(self.signals, reset);
        self.status = match faulted.iter().filter(|&&f| f).count() {
            0 => SensorStatus::AllOk,
            1 => {
                let i = faulted.iter().position(|&f| f).unwrap();
                SensorStatus::SingleFault(SpeedSignal::ALL[i])
            }
            _ => SensorStatus::MultipleFaults,
        };

        // Substitution only exists for a bad generator speed signal; every
        // other case, the multi-fault one included, passes the raw
        // generator speed through.
        self.output_speed = match self.status {
            SensorStatus::SingleFault(SpeedSignal::GeneratorSpeed) => self.signals[1],
            _ => self.signals[0],
        };

        self.status
    }

    /// The fault-tolerant generator speed equivalent, in rad/s.
    pub fn output_speed(&self) -> f64 {
        self.output_speed
    }

    pub fn status(&self) -> SensorStatus {
        self.status
    }

    /// Named signal lookup for the diagnostic boundary.
    pub fn signal(&self, name: &str) -> Result<f64, SignalError> {
        let faulted = self.diagnoser.faulted();
        match name {
            "generator speed equivalent" => Ok(self.output_speed),
            "signal 1" => Ok(self.signals[0]),
            "signal 2" => Ok(self.signals[1]),
            "signal 3" => Ok(self.signals[2]),
            "ok 1" => Ok((!faulted[0]) as i32 as f64),
            "ok 2" => Ok((!faulted[1]) as i32 as f64),
            "ok 3" => Ok((!faulted[2]) as i32 as f64),
            "status" => Ok(self.status.code() as f64),
            _ => Err(SignalError::UnknownSignal(name.to_string())),
        }
    }
}
