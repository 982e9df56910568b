//! Below-rated / above-rated supervision.
//!
//! A two-state machine that decides which actuation channel owns speed
//! regulation and computes the cross-coupled limit each regime imposes on
//! the other channel: below rated the pitch is pinned at its floor so the
//! torque loop does the regulating; above rated the torque is pinned at its
//! ceiling so the pitch loop does.

use crate::error::SignalError;
use crate::util::clamp;

/// Operating regime. The discriminants are the status code reported at the
/// external interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum OperatingRegime {
    /// Torque-regulated operation, the initial regime.
    BelowRated = 0,
    /// Pitch-regulated operation.
    AboveRated = 1,
}

impl OperatingRegime {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Per-tick inputs to the regime manager. Torque and pitch are the demands
/// issued on the previous tick; the limits are this tick's.
#[derive(Debug, Clone, Copy)]
pub struct RegimeInputs {
    pub torque: f64,
    pub max_torque: f64,
    pub external_min_torque: f64,
    pub pitch: f64,
    pub external_max_pitch: f64,
    pub external_min_pitch: f64,
}

/// The torque/pitch regime state machine.
#[derive(Debug, Clone)]
pub struct TorquePitchManager {
    regime: OperatingRegime,
    max_pitch: f64,
    min_torque: f64,
    last: RegimeInputs,
}

impl Default for TorquePitchManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TorquePitchManager {
    pub fn new() -> Self {
        Self {
            regime: OperatingRegime::BelowRated,
            max_pitch: 0.0,
            min_torque: 0.0,
            last: RegimeInputs {
                torque: 0.0,
                max_torque: 0.0,
                external_min_torque: 0.0,
                pitch: 0.0,
                external_max_pitch: 0.0,
                external_min_pitch: 0.0,
            },
        }
    }

    /// Transition if due, then compute this tick's dynamic limits. The
    /// limits reflect the post-transition regime, so a transition acts on
    /// the same tick it is detected.
    pub fn step(&mut self, inputs: RegimeInputs) -> OperatingRegime {
        self.last = inputs;

        let next = match self.regime {
            OperatingRegime::BelowRated
                if inputs.torque >= inputs.max_torque
                    || inputs.pitch > inputs.external_min_pitch =>
            {
                OperatingRegime::AboveRated
            }
            OperatingRegime::AboveRated if inputs.pitch <= inputs.external_min_pitch => {
                OperatingRegime::BelowRated
            }
            unchanged => unchanged,
        };
        if next != self.regime {
            log::info!("operating regime {:?} -> {:?}", self.regime, next);
            self.regime = next;
        }

        match self.regime {
            OperatingRegime::BelowRated => {
                self.max_pitch = clamp(
                    inputs.pitch,
                    inputs.external_min_pitch,
                    inputs.external_max_pitch,
                );
                self.min_torque = inputs.external_min_torque;
            }
            OperatingRegime::AboveRated => {
                self.max_pitch = inputs.external_max_pitch;
                self.min_torque = clamp(
                    inputs.torque,
                    inputs.external_min_torque,
                    inputs.max_torque,
                );
            }
        }

        self.regime
    }

    pub fn regime(&self) -> OperatingRegime {
        self.regime
    }

    /// Pitch ceiling imposed by the current regime.
    pub fn max_pitch(&self) -> f64 {
        self.max_pitch
    }

    /// Torque floor imposed by the current regime.
    pub fn min_torque(&self) -> f64 {
        self.min_torque
    }

    /// Named signal lookup for the diagnostic boundary.
    pub fn signal(&self, name: &str) -> Result<f64, SignalError> {
        match name {
            "maximum pitch" => Ok(self.max_pitch),
            "minimum torque" => Ok(self.min_torque),
            "torque" => Ok(self.last.torque),
            "pitch" => Ok(self.last.pitch),
            "maximum torque" => Ok(self.last.max_torque),
            "external minimum torque" => Ok(self.last.external_min_torque),
            "external maximum pitch" => Ok(self.last.external_max_pitch),
            "external minimum pitch" => Ok(self.last.external_min_pitch),
            _ => Err(SignalError::UnknownSignal(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(torque: f64, pitch: f64) -> RegimeInputs {
        RegimeInputs {
            torque,
            max_torque: 200.0,
            external_min_torque: 10.0,
            pitch,
            external_max_pitch: 90.0,
            external_min_pitch: 0.0,
        }
    }

    #[test]
    fn starts_below_rated() {
        assert_eq!(
            TorquePitchManager::new().regime(),
            OperatingRegime::BelowRated
        );
    }

    #[test]
    fn full_regime_cycle_at_exact_limit_values() {
        let mut tp = TorquePitchManager::new();
        let at = |torque: f64, pitch: f64| RegimeInputs {
            torque,
            max_torque: 200.0,
            external_min_torque: 10.0,
            pitch,
            external_max_pitch: 90.0,
            external_min_pitch: 2.0,
        };

        // Pitch exactly at the external floor: no transition, the pitch
        // ceiling tracks the pitch and the torque floor is the external one.
        let regime = tp.step(at(180.0, 2.0));
        assert_eq!(regime, OperatingRegime::BelowRated);
        assert_eq!(tp.max_pitch(), 2.0);
        assert_eq!(tp.min_torque(), 10.0);

        // Torque reaching the ceiling switches the same tick.
        let regime = tp.step(at(200.0, 2.0));
        assert_eq!(regime, OperatingRegime::AboveRated);
        assert_eq!(tp.max_pitch(), 90.0);
        assert_eq!(tp.min_torque(), 200.0);

        // Pitch driven back down to the external floor reverts.
        let regime = tp.step(at(150.0, 2.0));
        assert_eq!(regime, OperatingRegime::BelowRated);
        assert_eq!(tp.max_pitch(), 2.0);
        assert_eq!(tp.min_torque(), 10.0);
    }

    #[test]
    fn torque_at_ceiling_switches_the_same_tick() {
        let mut tp = TorquePitchManager::new();
        tp.step(inputs(180.0, 0.0));
        assert_eq!(tp.regime(), OperatingRegime::BelowRated);

        let regime = tp.step(inputs(200.0, 0.0));
        assert_eq!(regime, OperatingRegime::AboveRated);
        // Limits already reflect the new regime on this very tick.
        assert_eq!(tp.max_pitch(), 90.0);
        assert_eq!(tp.min_torque(), 200.0);
    }

    #[test]
    fn pitch_above_floor_also_switches() {
        let mut tp = TorquePitchManager::new();
        let regime = tp.step(inputs(50.0, 0.5));
        assert_eq!(regime, OperatingRegime::AboveRated);
    }

    #[test]
    fn pitch_back_at_floor_reverts() {
        let mut tp = TorquePitchManager::new();
        tp.step(inputs(200.0, 5.0));
        assert_eq!(tp.regime(), OperatingRegime::AboveRated);

        let regime = tp.step(inputs(150.0, 0.0));
        assert_eq!(regime, OperatingRegime::BelowRated);
        assert_eq!(tp.max_pitch(), 0.0);
        assert_eq!(tp.min_torque(), 10.0);
    }

    #[test]
    fn above_rated_torque_floor_is_clamped() {
        let mut tp = TorquePitchManager::new();
        tp.step(inputs(250.0, 5.0));
        assert_eq!(tp.regime(), OperatingRegime::AboveRated);
        // Torque beyond the ceiling clamps down to it.
        assert_eq!(tp.min_torque(), 200.0);

        tp.step(inputs(5.0, 5.0));
        // Torque below the external floor clamps up to it.
        assert_eq!(tp.min_torque(), 10.0);
    }

    #[test]
    fn below_rated_pitch_ceiling_clamps_to_external_band() {
        let mut tp = TorquePitchManager::new();
        // Pitch below the external floor: ceiling clamps up to the floor.
        tp.step(RegimeInputs {
            torque: 0.0,
            max_torque: 200.0,
            external_min_torque: 0.0,
            pitch: -3.0,
            external_max_pitch: 90.0,
            external_min_pitch: 1.0,
        });
        assert_eq!(tp.regime(), OperatingRegime::BelowRated);
        assert_eq!(tp.max_pitch(), 1.0);
    }

    #[test]
    fn regime_codes_match_the_external_contract() {
        assert_eq!(OperatingRegime::BelowRated.code(), 0);
        assert_eq!(OperatingRegime::AboveRated.code(), 1);
    }
}
