use serde::{Deserialize, Serialize};

/// Vendor field names used in property writes.
pub mod field {
    pub const HVAC_MODE: &str = "hvac_mode";
    pub const TARGET_TEMPERATURE: &str = "target_temperature";
    pub const TARGET_TEMPERATURE_HIGH: &str = "target_temperature_high";
    pub const TARGET_TEMPERATURE_LOW: &str = "target_temperature_low";
    pub const AWAY_TEMPERATURE_HIGH: &str = "away_temperature_high";
    pub const AWAY_TEMPERATURE_LOW: &str = "away_temperature_low";
    pub const TEMPERATURE_SCALE: &str = "temperature_scale";
    pub const FAN_TIMER_ACTIVE: &str = "fan_timer_active";
    pub const HOT_WATER_ACTIVE: &str = "hot_water_active";
}

/// Vendor-side thermostat mode as reported in `hvac_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    #[default]
    Off,
    Heat,
    Cool,
    Range,
    Eco,
    #[serde(other)]
    Unknown,
}

impl HvacMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::Range => "range",
            Self::Eco => "eco",
            Self::Unknown => "unknown",
        }
    }

    /// Modes whose vendor write would let the compressor run.
    pub fn is_cooling(self) -> bool {
        matches!(self, Self::Cool | Self::Range)
    }
}

/// Telemetry-only equipment state (`hvac_state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacState {
    #[default]
    Off,
    Heating,
    Cooling,
    #[serde(other)]
    Unknown,
}

/// What the equipment is doing right now, as the host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrentMode {
    Off,
    Heat,
    Cool,
}

impl CurrentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Heat => "Heating",
            Self::Cool => "Cooling",
        }
    }
}

/// The four-state mode model of the home-automation side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HostMode {
    Off,
    Heat,
    Cool,
    Auto,
}

impl HostMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Heat => "Heat",
            Self::Cool => "Cool",
            Self::Auto => "Auto",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OFF" => Some(Self::Off),
            "HEAT" => Some(Self::Heat),
            "COOL" => Some(Self::Cool),
            "AUTO" | "HEAT_COOL" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Which vendor-side object a property write patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Device,
    Shared,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Shared => "shared",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureScale {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureScale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

/// Mutable snapshot of the vendor thermostat. Temperatures are Celsius.
///
/// The integration layer owns the authoritative copy and replaces it on every
/// telemetry update; the bridge only reads it, issues writes, and applies the
/// few local-only changes the override paths need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    pub hvac_mode: HvacMode,
    pub previous_hvac_mode: HvacMode,
    pub hvac_state: HvacState,
    pub current_temperature: Option<f64>,
    pub backplate_temperature: Option<f64>,
    pub current_humidity: f64,
    pub target_temperature: f64,
    pub target_temperature_high: Option<f64>,
    pub target_temperature_low: Option<f64>,
    pub eco_temperature_high: Option<f64>,
    pub eco_temperature_low: Option<f64>,
    pub away_temperature_high: Option<f64>,
    pub away_temperature_low: Option<f64>,
    pub away_temperature_high_enabled: bool,
    pub away_temperature_low_enabled: bool,
    pub can_heat: bool,
    pub can_cool: bool,
    /// Hardware family that re-exposes eco as its pre-eco mode and stores
    /// away bands under the regular target fields.
    pub is_eco_variant: bool,
    pub has_fan: bool,
    pub has_eco_mode: bool,
    pub hvac_fan_state: bool,
    pub fan_timer_active: bool,
    /// Seconds.
    pub fan_timer_duration: u32,
    pub has_hot_water_control: bool,
    pub hot_water_active: bool,
    pub hot_water_boost_time_to_end: u32,
    pub has_leaf: bool,
    pub sunlight_correction_enabled: bool,
    pub sunlight_correction_active: bool,
    pub is_using_emergency_heat: bool,
    pub is_online: bool,
    pub temperature_scale: TemperatureScale,
    pub where_name: String,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            hvac_mode: HvacMode::Off,
            previous_hvac_mode: HvacMode::Off,
            hvac_state: HvacState::Off,
            current_temperature: None,
            backplate_temperature: None,
            current_humidity: 0.0,
            target_temperature: 20.0,
            target_temperature_high: None,
            target_temperature_low: None,
            eco_temperature_high: None,
            eco_temperature_low: None,
            away_temperature_high: None,
            away_temperature_low: None,
            away_temperature_high_enabled: false,
            away_temperature_low_enabled: false,
            can_heat: true,
            can_cool: false,
            is_eco_variant: false,
            has_fan: false,
            has_eco_mode: false,
            hvac_fan_state: false,
            fan_timer_active: false,
            fan_timer_duration: 0,
            has_hot_water_control: false,
            hot_water_active: false,
            hot_water_boost_time_to_end: 0,
            has_leaf: false,
            sunlight_correction_enabled: false,
            sunlight_correction_active: false,
            is_using_emergency_heat: false,
            is_online: true,
            temperature_scale: TemperatureScale::Celsius,
            where_name: String::new(),
        }
    }
}

impl DeviceState {
    /// Mode used for every decision: the eco variant reports eco as the mode it
    /// was in before eco was entered.
    pub fn effective_mode(&self) -> HvacMode {
        if self.is_eco_variant && self.hvac_mode == HvacMode::Eco {
            self.previous_hvac_mode
        } else {
            self.hvac_mode
        }
    }

    pub fn current_temperature(&self) -> f64 {
        self.current_temperature
            .or(self.backplate_temperature)
            .unwrap_or_default()
    }

    pub fn backplate_temperature(&self) -> f64 {
        self.backplate_temperature
            .or(self.current_temperature)
            .unwrap_or_default()
    }

    /// Upper room bound the outdoor gate compares against.
    pub fn target_high_for_gate(&self) -> f64 {
        if self.hvac_mode == HvacMode::Range {
            self.target_temperature_high
                .unwrap_or(self.target_temperature)
        } else {
            self.target_temperature
        }
    }

    pub fn supports_heat_and_cool(&self) -> bool {
        self.can_heat && self.can_cool
    }

    pub fn hot_water_state(&self) -> bool {
        self.hot_water_active || self.hot_water_boost_time_to_end > 0
    }

    pub fn fan_timer_duration_minutes(&self) -> u32 {
        (self.fan_timer_duration + 30) / 60
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    #[serde(rename = "currentTemp")]
    pub current_temp: f64,
    #[serde(rename = "currentHumidity")]
    pub current_humidity: f64,
    #[serde(rename = "targetTemp")]
    pub target_temp: f64,
    #[serde(rename = "coolingThreshold")]
    pub cooling_threshold: f64,
    #[serde(rename = "heatingThreshold")]
    pub heating_threshold: f64,
    #[serde(rename = "currentMode")]
    pub current_mode: &'static str,
    #[serde(rename = "targetMode")]
    pub target_mode: &'static str,
    #[serde(rename = "supportedModes")]
    pub supported_modes: Vec<&'static str>,
    #[serde(rename = "deviceMode")]
    pub device_mode: &'static str,
    #[serde(rename = "ecoMode")]
    pub eco_mode: bool,
    #[serde(rename = "fanOn")]
    pub fan_on: bool,
    #[serde(rename = "fanOverride")]
    pub fan_override: &'static str,
    #[serde(rename = "hotWater")]
    pub hot_water: bool,
    #[serde(rename = "outdoorTemp")]
    pub outdoor_temp: f64,
    #[serde(rename = "minOutdoorTemp")]
    pub min_outdoor_temp: f64,
    #[serde(rename = "compressorAllowed")]
    pub compressor_allowed: bool,
    pub units: &'static str,
    pub online: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_vendor_mode_deserializes() {
        let state: DeviceState =
            serde_json::from_str(r#"{"hvac_mode":"emergency","can_cool":true}"#).unwrap();

        assert_eq!(state.hvac_mode, HvacMode::Unknown);
        assert!(state.can_cool);
        assert!(state.can_heat);
    }

    #[test]
    fn eco_variant_unwraps_to_previous_mode() {
        let state = DeviceState {
            hvac_mode: HvacMode::Eco,
            previous_hvac_mode: HvacMode::Cool,
            is_eco_variant: true,
            ..DeviceState::default()
        };
        assert_eq!(state.effective_mode(), HvacMode::Cool);

        let regular = DeviceState {
            is_eco_variant: false,
            ..state
        };
        assert_eq!(regular.effective_mode(), HvacMode::Eco);
    }

    #[test]
    fn current_temperature_falls_back_to_backplate() {
        let state = DeviceState {
            current_temperature: None,
            backplate_temperature: Some(21.5),
            ..DeviceState::default()
        };
        assert_eq!(state.current_temperature(), 21.5);
        assert_eq!(state.backplate_temperature(), 21.5);
    }

    #[test]
    fn gate_high_bound_follows_range_mode() {
        let mut state = DeviceState {
            target_temperature: 21.0,
            target_temperature_high: Some(24.0),
            ..DeviceState::default()
        };
        assert_eq!(state.target_high_for_gate(), 21.0);

        state.hvac_mode = HvacMode::Range;
        assert_eq!(state.target_high_for_gate(), 24.0);
    }

    #[test]
    fn host_mode_parse_accepts_aliases() {
        assert_eq!(HostMode::parse(" auto "), Some(HostMode::Auto));
        assert_eq!(HostMode::parse("heat_cool"), Some(HostMode::Auto));
        assert_eq!(HostMode::parse("cool"), Some(HostMode::Cool));
        assert_eq!(HostMode::parse("dry"), None);
    }

    #[test]
    fn fan_timer_duration_rounds_to_minutes() {
        let state = DeviceState {
            fan_timer_duration: 900,
            ..DeviceState::default()
        };
        assert_eq!(state.fan_timer_duration_minutes(), 15);

        let state = DeviceState {
            fan_timer_duration: 89,
            ..DeviceState::default()
        };
        assert_eq!(state.fan_timer_duration_minutes(), 1);
    }
}
