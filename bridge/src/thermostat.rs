use std::sync::Arc;

use serde_json::json;
use tracing::info;

use thermostat_bridge_common::{
    characteristics::{temperature_limits, TemperatureLimits},
    modes::{self, ModeChange},
    thresholds::{self, SetpointPlan},
    types::field,
    BridgeStatus, CurrentMode, DeviceState, HostMode, PolicyConfig, Scope, Setpoint,
    TemperatureScale,
};

use crate::{
    fan_override::OverrideController,
    outdoor::OutdoorTemperatureProvider,
    writer::{PropertyWriter, WriteError},
};

/// Host-facing thermostat operations over a borrowed device snapshot.
///
/// Every operation that reaches the vendor goes through the property writer;
/// the only local-only mutations are the gate interception and the mode
/// restored when a setpoint write leaves eco.
#[derive(Clone)]
pub struct ThermostatBridge {
    writer: Arc<dyn PropertyWriter>,
    overrides: OverrideController,
    outdoor: OutdoorTemperatureProvider,
    policy: PolicyConfig,
}

impl ThermostatBridge {
    pub fn new(
        writer: Arc<dyn PropertyWriter>,
        overrides: OverrideController,
        outdoor: OutdoorTemperatureProvider,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            writer,
            overrides,
            outdoor,
            policy,
        }
    }

    pub fn overrides(&self) -> &OverrideController {
        &self.overrides
    }

    pub fn outdoor(&self) -> &OutdoorTemperatureProvider {
        &self.outdoor
    }

    pub fn current_mode(&self, state: &DeviceState) -> CurrentMode {
        modes::current_mode(state)
    }

    pub fn target_mode(&self, state: &DeviceState) -> HostMode {
        modes::target_mode(state)
    }

    pub async fn set_target_mode(
        &self,
        state: &mut DeviceState,
        requested: HostMode,
    ) -> Result<(), WriteError> {
        let mode = match modes::plan_target_mode(state, requested) {
            ModeChange::Unchanged => {
                info!("target mode already {}", requested.as_str());
                return Ok(());
            }
            ModeChange::Write(mode) => mode,
        };

        let decision = self.overrides.intercept_mode_write(
            state,
            mode,
            self.outdoor.current_temperature(),
            self.outdoor.threshold_c(),
        );
        if decision.suppresses_write() {
            return Ok(());
        }

        self.writer
            .write(Scope::Shared, field::HVAC_MODE, json!(mode.as_str()))
            .await?;
        state.hvac_mode = mode;
        info!("target mode set to {} ({})", requested.as_str(), mode.as_str());
        Ok(())
    }

    pub fn supported_modes(&self, state: &DeviceState) -> Vec<HostMode> {
        modes::supported_modes(state)
    }

    pub fn target_temperature(&self, state: &DeviceState) -> f64 {
        thresholds::target_temperature(state)
    }

    pub fn cooling_threshold(&self, state: &DeviceState) -> f64 {
        thresholds::cooling_threshold(state)
    }

    pub fn heating_threshold(&self, state: &DeviceState) -> f64 {
        thresholds::heating_threshold(state)
    }

    pub async fn set_target_temperature(
        &self,
        state: &mut DeviceState,
        value: f64,
    ) -> Result<(), WriteError> {
        self.set_setpoint(state, Setpoint::Target, value).await
    }

    pub async fn set_cooling_threshold(
        &self,
        state: &mut DeviceState,
        value: f64,
    ) -> Result<(), WriteError> {
        self.set_setpoint(state, Setpoint::Cooling, value).await
    }

    pub async fn set_heating_threshold(
        &self,
        state: &mut DeviceState,
        value: f64,
    ) -> Result<(), WriteError> {
        self.set_setpoint(state, Setpoint::Heating, value).await
    }

    async fn set_setpoint(
        &self,
        state: &mut DeviceState,
        setpoint: Setpoint,
        value: f64,
    ) -> Result<(), WriteError> {
        let plan = thresholds::plan_setpoint(state, setpoint, self.policy.allow_eco_band_edit);
        let (exit_eco, target) = match plan {
            SetpointPlan::Skip(reason) => {
                info!("ignoring {} write of {value:.1}: {reason:?}", setpoint.as_str());
                return Ok(());
            }
            SetpointPlan::Write { exit_eco, target } => (exit_eco, target),
        };

        if let Some(restored) = exit_eco {
            self.writer
                .write(
                    Scope::Shared,
                    field::HVAC_MODE,
                    json!(modes::ECO_OFF_COMMAND),
                )
                .await?;
            state.hvac_mode = restored;
            info!("left eco for {} write; mode now {}", setpoint.as_str(), restored.as_str());
        }

        self.writer
            .write(target.scope, target.field, json!(value))
            .await?;
        info!(
            "{} set to {value:.1} ({}.{})",
            setpoint.as_str(),
            target.scope.as_str(),
            target.field
        );
        Ok(())
    }

    pub fn eco_toggle_available(&self, state: &DeviceState) -> bool {
        self.policy.expose_eco_toggle && state.has_eco_mode && !state.is_eco_variant
    }

    pub fn eco_mode(&self, state: &DeviceState) -> bool {
        modes::eco_mode(state)
    }

    pub async fn set_eco_mode(&self, state: &mut DeviceState, on: bool) -> Result<(), WriteError> {
        let toggle = modes::plan_eco_mode(state, on);
        state.hvac_mode = toggle.local_mode;
        self.writer
            .write(Scope::Shared, field::HVAC_MODE, json!(toggle.command))
            .await?;
        info!("eco mode {}", if on { "on" } else { "off" });
        Ok(())
    }

    pub fn fan_service_available(&self, state: &DeviceState) -> bool {
        self.policy.expose_fan_service && state.has_fan
    }

    pub fn fan_state(&self, state: &DeviceState) -> bool {
        self.overrides.fan_state(state.hvac_fan_state)
    }

    pub async fn set_fan_state(&self, on: bool) -> Result<(), WriteError> {
        self.overrides.request_fan(on);
        self.writer
            .write(Scope::Device, field::FAN_TIMER_ACTIVE, json!(on))
            .await
    }

    pub fn temperature_units(&self, state: &DeviceState) -> TemperatureScale {
        state.temperature_scale
    }

    pub fn setpoint_limits(&self, state: &DeviceState) -> TemperatureLimits {
        temperature_limits(state.temperature_scale)
    }

    pub async fn set_temperature_units(
        &self,
        state: &mut DeviceState,
        scale: TemperatureScale,
    ) -> Result<(), WriteError> {
        self.writer
            .write(Scope::Device, field::TEMPERATURE_SCALE, json!(scale.as_str()))
            .await?;
        state.temperature_scale = scale;
        Ok(())
    }

    pub fn hot_water_available(&self, state: &DeviceState) -> bool {
        self.policy.expose_hot_water && state.has_hot_water_control
    }

    pub fn hot_water_state(&self, state: &DeviceState) -> bool {
        state.hot_water_state()
    }

    pub async fn set_hot_water_state(&self, on: bool) -> Result<(), WriteError> {
        self.writer
            .write(Scope::Device, field::HOT_WATER_ACTIVE, json!(on))
            .await
    }

    pub fn status(&self, state: &DeviceState) -> BridgeStatus {
        let outdoor_temp = self.outdoor.current_temperature();
        let min_outdoor_temp = self.outdoor.threshold_c();
        BridgeStatus {
            current_temp: state.current_temperature(),
            current_humidity: state.current_humidity,
            target_temp: self.target_temperature(state),
            cooling_threshold: self.cooling_threshold(state),
            heating_threshold: self.heating_threshold(state),
            current_mode: self.current_mode(state).as_str(),
            target_mode: self.target_mode(state).as_str(),
            supported_modes: self
                .supported_modes(state)
                .into_iter()
                .map(HostMode::as_str)
                .collect(),
            device_mode: state.hvac_mode.as_str(),
            eco_mode: self.eco_mode(state),
            fan_on: self.fan_state(state),
            fan_override: self.overrides.mode().as_str(),
            hot_water: self.hot_water_state(state),
            outdoor_temp,
            min_outdoor_temp,
            compressor_allowed: outdoor_temp >= min_outdoor_temp,
            units: self.temperature_units(state).as_str(),
            online: state.is_online,
        }
    }
}
