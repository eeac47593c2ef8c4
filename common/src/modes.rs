//! Translation between the vendor mode vocabulary and the four-state host model.

use crate::types::{CurrentMode, DeviceState, HostMode, HvacMode, HvacState};

/// Vendor command that leaves eco and restores the pre-eco mode.
pub const ECO_OFF_COMMAND: &str = "eco-off";
pub const ECO_ON_COMMAND: &str = "eco";

/// Outcome of a host mode request before any write is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    /// Host already shows the requested mode; re-applying an eco-derived mode
    /// makes the host UI oscillate, so nothing is written.
    Unchanged,
    Write(HvacMode),
}

/// Local mode plus the vendor command for the eco switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcoToggle {
    pub local_mode: HvacMode,
    pub command: &'static str,
}

pub fn current_mode(state: &DeviceState) -> CurrentMode {
    match state.hvac_state {
        HvacState::Heating => CurrentMode::Heat,
        HvacState::Cooling => CurrentMode::Cool,
        HvacState::Off | HvacState::Unknown => CurrentMode::Off,
    }
}

pub fn target_mode(state: &DeviceState) -> HostMode {
    match state.effective_mode() {
        HvacMode::Heat => HostMode::Heat,
        HvacMode::Cool => HostMode::Cool,
        HvacMode::Range => HostMode::Auto,
        HvacMode::Eco => match (
            state.away_temperature_low_enabled,
            state.away_temperature_high_enabled,
        ) {
            (true, true) => HostMode::Auto,
            (true, false) => HostMode::Heat,
            (false, true) => HostMode::Cool,
            (false, false) => HostMode::Off,
        },
        HvacMode::Off | HvacMode::Unknown => HostMode::Off,
    }
}

/// Vendor mode a host request maps to, ignoring the idempotence guard.
pub fn device_mode_for(state: &DeviceState, requested: HostMode) -> HvacMode {
    match requested {
        HostMode::Off => HvacMode::Off,
        HostMode::Heat => HvacMode::Heat,
        HostMode::Cool => HvacMode::Cool,
        HostMode::Auto if state.supports_heat_and_cool() => HvacMode::Range,
        HostMode::Auto if state.can_cool => HvacMode::Cool,
        HostMode::Auto => HvacMode::Heat,
    }
}

pub fn plan_target_mode(state: &DeviceState, requested: HostMode) -> ModeChange {
    if target_mode(state) == requested {
        return ModeChange::Unchanged;
    }
    ModeChange::Write(device_mode_for(state, requested))
}

pub fn supported_modes(state: &DeviceState) -> Vec<HostMode> {
    if !state.can_cool {
        vec![HostMode::Off, HostMode::Heat]
    } else if !state.can_heat {
        vec![HostMode::Off, HostMode::Cool]
    } else {
        vec![HostMode::Off, HostMode::Heat, HostMode::Cool, HostMode::Auto]
    }
}

pub fn eco_mode(state: &DeviceState) -> bool {
    state.hvac_mode == HvacMode::Eco
}

pub fn plan_eco_mode(state: &DeviceState, on: bool) -> EcoToggle {
    if on {
        EcoToggle {
            local_mode: HvacMode::Eco,
            command: ECO_ON_COMMAND,
        }
    } else {
        EcoToggle {
            local_mode: state.previous_hvac_mode,
            command: ECO_OFF_COMMAND,
        }
    }
}
