use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::time::Instant;
use tracing::{debug, info};

use thermostat_bridge_common::{
    fan_override::gate_cooling_request, DeviceState, GateDecision, GateInput, HvacMode,
    OverrideConfig, OverrideMode, OverrideState,
};

use crate::timer::TimerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    On,
    Off,
}

#[derive(Debug)]
struct ArmedTimer {
    token: u64,
    deadline: Instant,
    handle: TimerHandle,
}

#[derive(Debug, Default)]
struct Inner {
    state: OverrideState,
    on_timer: Option<ArmedTimer>,
    off_timer: Option<ArmedTimer>,
    next_token: u64,
}

impl Inner {
    fn slot(&mut self, flag: Flag) -> &mut Option<ArmedTimer> {
        match flag {
            Flag::On => &mut self.on_timer,
            Flag::Off => &mut self.off_timer,
        }
    }
}

/// Fan override state machine: `Normal`, `FanForcedOn`, `FanForcedOff`.
///
/// Each flag owns at most one timer. Entering a state drops the opposite
/// flag's timer and replaces its own, so re-entering resets the window
/// instead of stacking a second expiry.
#[derive(Debug, Clone)]
pub struct OverrideController {
    inner: Arc<Mutex<Inner>>,
    config: OverrideConfig,
}

impl OverrideController {
    pub fn new(config: OverrideConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            config,
        }
    }

    /// Manual fan toggle from the host.
    pub fn request_fan(&self, on: bool) {
        if on {
            self.enter(Flag::On, Duration::from_millis(self.config.manual_fan_on_ms));
        } else {
            self.enter(Flag::Off, Duration::from_millis(self.config.manual_fan_off_ms));
        }
        info!("fan override requested: {}", if on { "on" } else { "off" });
    }

    /// Runs the fan in place of the compressor for a full duty cycle.
    pub fn run_fan_instead(&self) {
        self.enter(
            Flag::On,
            Duration::from_millis(self.config.substitute_fan_ms),
        );
        info!(
            "running fan instead of cooling for {} min",
            self.config.substitute_fan_ms / 60_000
        );
    }

    /// Checks a mode write against the outdoor gate before it reaches the
    /// vendor. A suppressed write leaves the requested mode on the local
    /// snapshot only, so the host keeps showing what it asked for.
    pub fn intercept_mode_write(
        &self,
        state: &mut DeviceState,
        mode: HvacMode,
        outdoor_temp_c: f64,
        threshold_c: f64,
    ) -> GateDecision {
        if !mode.is_cooling() || outdoor_temp_c >= threshold_c {
            return GateDecision::Proceed;
        }

        state.hvac_mode = mode;
        let decision = gate_cooling_request(
            mode,
            GateInput {
                outdoor_temp_c,
                threshold_c,
                current_temp_c: state.current_temperature(),
                target_high_c: state.target_high_for_gate(),
            },
        );

        info!(
            "too cold outside to run the compressor ({outdoor_temp_c:.1}°C < {threshold_c:.1}°C); {} not sent to device",
            mode.as_str()
        );
        if decision == GateDecision::SuppressWithFan {
            self.run_fan_instead();
        }
        decision
    }

    pub fn fan_state(&self, telemetry_fan_on: bool) -> bool {
        self.lock().state.fan_state(telemetry_fan_on)
    }

    pub fn mode(&self) -> OverrideMode {
        self.lock().state.mode()
    }

    pub fn on_deadline(&self) -> Option<Instant> {
        self.lock().on_timer.as_ref().map(|timer| timer.deadline)
    }

    pub fn off_deadline(&self) -> Option<Instant> {
        self.lock().off_timer.as_ref().map(|timer| timer.deadline)
    }

    fn enter(&self, flag: Flag, duration: Duration) {
        let mut inner = self.lock();
        match flag {
            Flag::On => {
                inner.off_timer = None;
                inner.state.force_on();
            }
            Flag::Off => {
                inner.on_timer = None;
                inner.state.force_off();
            }
        }

        inner.next_token = inner.next_token.wrapping_add(1);
        let token = inner.next_token;
        let weak = Arc::downgrade(&self.inner);
        let handle = TimerHandle::schedule(duration, move || expire(&weak, flag, token));

        // Replacing the slot drops, and so cancels, any earlier timer.
        *inner.slot(flag) = Some(ArmedTimer {
            token,
            deadline: Instant::now() + duration,
            handle,
        });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// A callback that lost a race with a newer transition sees a different token
// and leaves the state alone.
fn expire(inner: &Weak<Mutex<Inner>>, flag: Flag, token: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);

    let current = inner.slot(flag).as_ref().map(|timer| timer.token);
    if current != Some(token) {
        return;
    }
    if let Some(timer) = inner.slot(flag).take() {
        // This callback runs inside the timer's own task.
        timer.handle.detach();
    }
    match flag {
        Flag::On => inner.state.clear_on(),
        Flag::Off => inner.state.clear_off(),
    }
    debug!("fan override {flag:?} expired");
}
