//! Single and dual setpoint resolution across vendor modes and eco bands.

use crate::types::{field, DeviceState, HvacMode, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setpoint {
    Target,
    Cooling,
    Heating,
}

impl Setpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Target => "target temperature",
            Self::Cooling => "cooling threshold temperature",
            Self::Heating => "heating threshold temperature",
        }
    }

    fn regular_field(self) -> &'static str {
        match self {
            Self::Target => field::TARGET_TEMPERATURE,
            Self::Cooling => field::TARGET_TEMPERATURE_HIGH,
            Self::Heating => field::TARGET_TEMPERATURE_LOW,
        }
    }
}

/// Why a setpoint write completes without touching the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Range mode only takes the high/low pair.
    DualSetpointMode,
    /// Neither or both away bands are enabled, so no single band is targeted.
    AmbiguousEcoBand,
    /// A heat-only or cool-only device has no independent high/low band.
    SingleCapabilityEcoBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetpointTarget {
    pub scope: Scope,
    pub field: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointPlan {
    Skip(SkipReason),
    Write {
        /// Leave eco first, restoring this mode locally.
        exit_eco: Option<HvacMode>,
        target: SetpointTarget,
    },
}

pub fn target_temperature(state: &DeviceState) -> f64 {
    match state.effective_mode() {
        HvacMode::Eco => match (
            state.away_temperature_low_enabled,
            state.away_temperature_high_enabled,
        ) {
            (true, false) => heating_threshold(state),
            (false, true) => cooling_threshold(state),
            _ => state.current_temperature(),
        },
        HvacMode::Off => state.current_temperature(),
        _ => state.target_temperature,
    }
}

pub fn cooling_threshold(state: &DeviceState) -> f64 {
    if reads_regular_bands(state) {
        state
            .target_temperature_high
            .unwrap_or(state.target_temperature)
    } else {
        state
            .eco_temperature_high
            .or(state.away_temperature_high)
            .unwrap_or(state.target_temperature)
    }
}

pub fn heating_threshold(state: &DeviceState) -> f64 {
    if reads_regular_bands(state) {
        state
            .target_temperature_low
            .unwrap_or(state.target_temperature)
    } else {
        state
            .eco_temperature_low
            .or(state.away_temperature_low)
            .unwrap_or(state.target_temperature)
    }
}

// The eco variant stores its away bands under the regular target fields.
fn reads_regular_bands(state: &DeviceState) -> bool {
    state.is_eco_variant || state.hvac_mode != HvacMode::Eco
}

pub fn plan_setpoint(
    state: &DeviceState,
    setpoint: Setpoint,
    allow_eco_band_edit: bool,
) -> SetpointPlan {
    match state.effective_mode() {
        HvacMode::Range if setpoint == Setpoint::Target => {
            SetpointPlan::Skip(SkipReason::DualSetpointMode)
        }
        HvacMode::Eco if allow_eco_band_edit => plan_eco_band_edit(state, setpoint),
        HvacMode::Eco => {
            let restored = state.previous_hvac_mode;
            let field = match setpoint {
                Setpoint::Cooling | Setpoint::Heating if restored == HvacMode::Range => {
                    setpoint.regular_field()
                }
                _ => field::TARGET_TEMPERATURE,
            };
            SetpointPlan::Write {
                exit_eco: Some(restored),
                target: SetpointTarget {
                    scope: Scope::Shared,
                    field,
                },
            }
        }
        _ => SetpointPlan::Write {
            exit_eco: None,
            target: SetpointTarget {
                scope: Scope::Shared,
                field: setpoint.regular_field(),
            },
        },
    }
}

fn plan_eco_band_edit(state: &DeviceState, setpoint: Setpoint) -> SetpointPlan {
    let field = match setpoint {
        Setpoint::Target => match (
            state.away_temperature_low_enabled,
            state.away_temperature_high_enabled,
        ) {
            (true, false) => field::AWAY_TEMPERATURE_LOW,
            (false, true) => field::AWAY_TEMPERATURE_HIGH,
            _ => return SetpointPlan::Skip(SkipReason::AmbiguousEcoBand),
        },
        _ if !state.supports_heat_and_cool() => {
            return SetpointPlan::Skip(SkipReason::SingleCapabilityEcoBand)
        }
        Setpoint::Cooling => field::AWAY_TEMPERATURE_HIGH,
        Setpoint::Heating => field::AWAY_TEMPERATURE_LOW,
    };

    SetpointPlan::Write {
        exit_eco: None,
        target: SetpointTarget {
            scope: Scope::Device,
            field,
        },
    }
}
