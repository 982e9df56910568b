//! Error types for configuration validation and signal introspection.
//!
//! Configuration problems are caught once, at construction time, and carry
//! enough structure to point at the exact sub-component and sub-block that
//! was rejected. `step()` never fails; run-time hazards are handled by
//! saturating clamps.

use thiserror::Error;

/// Lookup table construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table has no points")]
    Empty,
    #[error("table abscissae must be strictly increasing")]
    NotMonotone,
    #[error("table x and y point counts differ")]
    LengthMismatch,
}

/// Transfer function section errors, carrying the offending section index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("section {0}: leading denominator coefficient must be non-zero")]
    ZeroLeadingCoefficient(usize),
    #[error("too many sections: {0} (limit {1})")]
    TooManySections(usize, usize),
}

/// Notch specification errors, carrying the offending notch index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotchError {
    #[error("notch {0}: centre frequency must be positive")]
    Frequency(usize),
    #[error("notch {0}: numerator damping must be positive")]
    NumeratorDamping(usize),
    #[error("notch {0}: denominator damping must be positive")]
    DenominatorDamping(usize),
    #[error("too many notches: {0} (limit {1})")]
    TooManyNotches(usize, usize),
}

/// Setpoint zone errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    #[error("zone {0}: lower limit must be below upper limit")]
    Unordered(usize),
    #[error("zone {0} overlaps the previous zone")]
    Overlapping(usize),
    #[error("too many zones: {0} (limit {1})")]
    TooManyZones(usize, usize),
    #[error("zones configured without a preferred control action source")]
    MissingPreferredAction,
    #[error("preferred action table: {0}")]
    Table(TableError),
}

/// Control loop configuration errors, one variant per sub-block.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoopConfigError {
    #[error("measurement filters: {0}")]
    MeasurementFilters(FilterError),
    #[error("measurement notches: {0}")]
    MeasurementNotches(NotchError),
    #[error("error filters: {0}")]
    ErrorFilters(FilterError),
    #[error("post-gain filters: {0}")]
    PostFilters(FilterError),
    #[error("gain schedule: {0}")]
    GainSchedule(TableError),
    #[error("integrator limits: minimum {min} exceeds maximum {max}")]
    IntegratorLimits { min: f64, max: f64 },
    #[error("setpoint zones: {0}")]
    SetpointZones(ZoneError),
}

/// Power manager configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PowerConfigError {
    #[error("generator efficiency must be non-zero")]
    ZeroEfficiency,
    #[error("below-rated torque gain table: {0}")]
    TorqueGainTable(TableError),
    #[error("minimum pitch table: {0}")]
    MinimumPitchTable(TableError),
}

/// Speed sensor manager configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorConfigError {
    #[error("disagreement tolerance must be positive, got {0}")]
    Tolerance(f64),
    #[error("azimuth range is empty: minimum {min}, maximum {max}")]
    AzimuthRange { min: f64, max: f64 },
}

/// Individual pitch control configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IpcConfigError {
    #[error("yaw high-pass corner frequency must be positive, got {0}")]
    HighPassCorner(f64),
    #[error("yaw moment error low-pass corner frequency must be positive, got {0}")]
    LowPassCorner(f64),
    #[error("yaw moment error low-pass damping must be positive, got {0}")]
    LowPassDamping(f64),
    #[error("yaw moment PI limits: minimum {min} exceeds maximum {max}")]
    PiLimits { min: f64, max: f64 },
}

/// Top-level configuration error, one variant per controller sub-component
/// so a rejected configuration names exactly the block at fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample period must be positive, got {0}")]
    SamplePeriod(f64),
    #[error("drivetrain damper: {0}")]
    DrivetrainDamper(LoopConfigError),
    #[error("torque control: {0}")]
    TorqueControl(LoopConfigError),
    #[error("collective pitch control: {0}")]
    CollectivePitchControl(LoopConfigError),
    #[error("power manager: {0}")]
    PowerManager(PowerConfigError),
    #[error("individual pitch control: {0}")]
    IndividualPitchControl(IpcConfigError),
    #[error("yaw by individual pitch: {0}")]
    YawByIpc(LoopConfigError),
    #[error("speed sensor manager: {0}")]
    SpeedSensorManager(SensorConfigError),
}

/// Signal introspection lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("unknown signal name: {0}")]
    UnknownSignal(String),
    #[error("unknown block name: {0}")]
    UnknownBlock(String),
}
