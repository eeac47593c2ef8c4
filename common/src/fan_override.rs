//! Fan override flags and the outdoor-temperature gate on compressor cooling.
//!
//! Timers live with the runtime; this module only holds the flag invariant and
//! the pure gate decision so both can be tested without a clock.

use crate::types::HvacMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideMode {
    Normal,
    FanForcedOn,
    FanForcedOff,
}

impl OverrideMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::FanForcedOn => "FAN_FORCED_ON",
            Self::FanForcedOff => "FAN_FORCED_OFF",
        }
    }
}

/// At most one of the two flags is set at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideState {
    fan_forced_on: bool,
    fan_forced_off: bool,
}

impl OverrideState {
    pub fn mode(&self) -> OverrideMode {
        if self.fan_forced_off {
            OverrideMode::FanForcedOff
        } else if self.fan_forced_on {
            OverrideMode::FanForcedOn
        } else {
            OverrideMode::Normal
        }
    }

    pub fn is_fan_forced_on(&self) -> bool {
        self.fan_forced_on
    }

    pub fn is_fan_forced_off(&self) -> bool {
        self.fan_forced_off
    }

    pub fn force_on(&mut self) {
        self.fan_forced_off = false;
        self.fan_forced_on = true;
    }

    pub fn force_off(&mut self) {
        self.fan_forced_on = false;
        self.fan_forced_off = true;
    }

    pub fn clear_on(&mut self) {
        self.fan_forced_on = false;
    }

    pub fn clear_off(&mut self) {
        self.fan_forced_off = false;
    }

    /// Forced-off wins over forced-on, which wins over telemetry.
    pub fn fan_state(&self, telemetry_fan_on: bool) -> bool {
        match self.mode() {
            OverrideMode::FanForcedOff => false,
            OverrideMode::FanForcedOn => true,
            OverrideMode::Normal => telemetry_fan_on,
        }
    }
}

/// Inputs to the compressor gate, all Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateInput {
    pub outdoor_temp_c: f64,
    pub threshold_c: f64,
    pub current_temp_c: f64,
    pub target_high_c: f64,
}

impl GateInput {
    pub fn too_cold(&self) -> bool {
        self.outdoor_temp_c < self.threshold_c
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Gate passes or the write cannot start the compressor.
    Proceed,
    /// Skip the vendor write and only record the mode locally.
    SuppressLocalOnly,
    /// Skip the vendor write, record the mode locally and run the fan instead.
    SuppressWithFan,
}

impl GateDecision {
    pub fn suppresses_write(self) -> bool {
        !matches!(self, Self::Proceed)
    }
}

pub fn gate_cooling_request(mode: HvacMode, input: GateInput) -> GateDecision {
    if !mode.is_cooling() || !input.too_cold() {
        return GateDecision::Proceed;
    }

    match mode {
        HvacMode::Range if input.current_temp_c > input.target_high_c => {
            GateDecision::SuppressWithFan
        }
        HvacMode::Range => GateDecision::SuppressLocalOnly,
        _ => GateDecision::SuppressWithFan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(outdoor: f64, current: f64, target_high: f64) -> GateInput {
        GateInput {
            outdoor_temp_c: outdoor,
            threshold_c: 18.3,
            current_temp_c: current,
            target_high_c: target_high,
        }
    }

    #[test]
    fn forcing_one_flag_clears_the_other() {
        let mut state = OverrideState::default();
        state.force_on();
        assert_eq!(state.mode(), OverrideMode::FanForcedOn);

        state.force_off();
        assert!(!state.is_fan_forced_on());
        assert_eq!(state.mode(), OverrideMode::FanForcedOff);

        state.force_on();
        assert!(!state.is_fan_forced_off());
    }

    #[test]
    fn fan_state_priority() {
        let mut state = OverrideState::default();
        assert!(state.fan_state(true));
        assert!(!state.fan_state(false));

        state.force_on();
        assert!(state.fan_state(false));

        state.force_off();
        assert!(!state.fan_state(true));

        state.clear_off();
        assert_eq!(state.mode(), OverrideMode::Normal);
    }

    #[test]
    fn warm_outside_passes_gate() {
        assert_eq!(
            gate_cooling_request(HvacMode::Cool, input(25.0, 26.0, 22.0)),
            GateDecision::Proceed
        );
        assert_eq!(
            gate_cooling_request(HvacMode::Range, input(18.3, 26.0, 22.0)),
            GateDecision::Proceed
        );
    }

    #[test]
    fn non_cooling_modes_are_never_gated() {
        for mode in [HvacMode::Off, HvacMode::Heat, HvacMode::Eco] {
            assert_eq!(
                gate_cooling_request(mode, input(-5.0, 30.0, 20.0)),
                GateDecision::Proceed
            );
        }
    }

    #[test]
    fn cold_cool_request_runs_fan() {
        let decision = gate_cooling_request(HvacMode::Cool, input(10.0, 20.0, 22.0));
        assert_eq!(decision, GateDecision::SuppressWithFan);
        assert!(decision.suppresses_write());
    }

    #[test]
    fn cold_range_request_runs_fan_only_when_room_is_warm() {
        assert_eq!(
            gate_cooling_request(HvacMode::Range, input(10.0, 24.0, 22.0)),
            GateDecision::SuppressWithFan
        );
        assert_eq!(
            gate_cooling_request(HvacMode::Range, input(10.0, 21.0, 22.0)),
            GateDecision::SuppressLocalOnly
        );
    }
}
