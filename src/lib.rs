//! Digital control core for a pitch-regulated, variable-speed wind turbine.
//!
//! The crate is built to sit behind a narrow periodic callback: an external
//! simulator or turbine control computer calls
//! [`WindTurbineController::step`] once per fixed sample interval with
//! engineering-unit measurements and gets torque and per-blade pitch
//! demands back. Marshalling to and from any flat measurement buffer, as
//! well as per-turbine numeric tuning, belongs to the caller.
//!
//! # Architecture
//!
//! ```text
//!                 +-----------------------+
//!  gen/rotor/az ->| speed sensor manager  |--- speed equivalent ---+
//!                 +-----------------------+                        |
//!  derating ----->| power manager         |-- limits, Kopt·w²      |
//!                 +-----------------------+        |               |
//!                 | torque-pitch manager  |<- previous demands     |
//!                 +-----------------------+        |               |
//!                 | drivetrain damper     |<-------+---------------+
//!                 | torque control        |  (control loops)       |
//!                 | collective pitch      |<-----------------------+
//!                 +-----------------------+        |
//!  blade moments->| individual pitch ctrl |-- per-blade demands
//!                 +-----------------------+
//! ```
//!
//! The building blocks are reusable on their own: [`ControlLoop`] is a
//! generic SISO block combining cascaded IIR filtering, notch filtering,
//! gain-scheduled PI control with anti-windup and zone-based setpoint
//! generation; the other modules supply the turbine-specific supervision
//! around it.
//!
//! # Real-time behaviour
//!
//! `step()` is synchronous, allocation-free and never fails; it must
//! complete well inside the sample interval, and closed-loop stability
//! depends on the caller honouring that. All numeric validation happens
//! once at construction, where a bad configuration is rejected with an
//! error naming the offending sub-component. Sensor disagreement is a
//! degraded-operation status, not an error: the controller keeps producing
//! a safe command with one sensor faulted.
//!
//! Each controller instance exclusively owns its state. Multiple turbines
//! are multiple independent instances.

pub mod config;
pub mod control_loop;
pub mod controller;
pub mod error;
pub mod filter;
pub mod gain;
pub mod ipc;
pub mod lookup;
pub mod pi;
pub mod power;
pub mod regime;
pub mod sensors;
pub mod setpoint;
mod util;

pub use config::ControllerConfig;
pub use control_loop::{ControlLoop, LoopInputs, LoopParams};
pub use controller::{ControllerInputs, ControllerOutputs, WindTurbineController};
pub use error::{ConfigError, SignalError};
pub use regime::OperatingRegime;
pub use sensors::{SensorStatus, SpeedSignal};
