//! Zone-based setpoint generation with optional feed-forward.

use serde::{Deserialize, Serialize};

use crate::error::ZoneError;
use crate::lookup::{LookupTable, TableParams};

/// Most zones a generator will accept.
pub const MAX_ZONES: usize = 8;

/// Where the feed-forward "preferred control action" comes from while the
/// measurement sits inside a zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PreferredAction {
    /// No feed-forward; zones may not be configured with this source.
    #[default]
    None,
    /// Another component's live output, passed in by the caller each tick.
    External,
    /// A curve over the filtered measurement.
    Table(TableParams),
}

/// Setpoint zones plus the feed-forward source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetpointParams {
    /// `[lower, upper]` measurement bands, strictly ordered and
    /// non-overlapping. Empty means the externally demanded setpoint is
    /// used as-is.
    pub zones: Vec<[f64; 2]>,
    pub preferred: PreferredAction,
}

/// What the control loop should do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopAction {
    /// Regulate the measurement at the given setpoint.
    Regulate(f64),
    /// Track the given preferred control action directly.
    FeedForward(f64),
}

/// Resolves the per-tick setpoint or feed-forward action from the
/// measurement's position relative to the configured zones.
///
/// Inside a zone the loop hands the output over to the preferred action
/// (the below-rated operating strategy); at and beyond a zone edge it
/// regulates at that edge. Between two zones it regulates toward the
/// nearer edge.
#[derive(Debug, Clone)]
pub struct SetpointGenerator {
    zones: Vec<[f64; 2]>,
    table: Option<LookupTable>,
    external: bool,
}

impl SetpointGenerator {
    pub fn new(params: &SetpointParams) -> Result<Self, ZoneError> {
        if params.zones.len() > MAX_ZONES {
            return Err(ZoneError::TooManyZones(params.zones.len(), MAX_ZONES));
        }
        for (i, zone) in params.zones.iter().enumerate() {
            if zone[0] >= zone[1] {
                return Err(ZoneError::Unordered(i));
            }
            if i > 0 && zone[0] < params.zones[i - 1][1] {
                return Err(ZoneError::Overlapping(i));
            }
        }
        let (table, external) = match &params.preferred {
            PreferredAction::None => {
                if !params.zones.is_empty() {
                    return Err(ZoneError::MissingPreferredAction);
                }
                (None, false)
            }
            PreferredAction::External => (None, true),
            PreferredAction::Table(t) => (
                Some(LookupTable::new(t).map_err(ZoneError::Table)?),
                false,
            ),
        };
        Ok(Self {
            zones: params.zones.clone(),
            table,
            external,
        })
    }

    /// Decide this tick's action. `demanded` is the caller's setpoint
    /// ceiling, `measurement` the filtered feedback, `external` the live
    /// preferred action when one is wired in.
    pub fn resolve(&self, demanded: f64, measurement: f64, external: Option<f64>) -> LoopAction {
        if self.zones.is_empty() {
            return LoopAction::Regulate(demanded);
        }
        for (i, zone) in self.zones.iter().enumerate() {
            if measurement < zone[0] {
                // Below this zone: either below the whole range or in the
                // gap after zone i-1. Regulate toward the nearer edge.
                let setpoint = if i == 0 {
                    zone[0]
                } else {
                    let below = self.zones[i - 1][1];
                    if measurement - below < zone[0] - measurement {
                        below
                    } else {
                        zone[0]
                    }
                };
                return LoopAction::Regulate(setpoint.min(demanded));
            }
            if measurement < zone[1] {
                match self.preferred(measurement, external) {
                    Some(action) => return LoopAction::FeedForward(action),
                    // Preferred source wired but dry this tick: hold the
                    // zone floor rather than chase an undefined action.
                    None => return LoopAction::Regulate(zone[0].min(demanded)),
                }
            }
        }
        let top = self.zones[self.zones.len() - 1][1];
        LoopAction::Regulate(top.min(demanded))
    }

    fn preferred(&self, measurement: f64, external: Option<f64>) -> Option<f64> {
        if let Some(table) = &self.table {
            return Some(table.eval(measurement));
        }
        if self.external {
            return external;
        }
        None
    }
}
