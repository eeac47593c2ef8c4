use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Manual fan-on toggle; short so polling resyncs with the real device.
    pub manual_fan_on_ms: u64,
    pub manual_fan_off_ms: u64,
    /// Fan run substituted for compressor cooling.
    pub substitute_fan_ms: u64,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            manual_fan_on_ms: 8_000,
            manual_fan_off_ms: 45_000,
            substitute_fan_ms: 1_800_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutdoorConfig {
    pub min_outdoor_temp_c: f64,
    /// Served until the first successful lookup; low so the gate fails closed.
    pub fallback_temp_c: f64,
    pub cache_ttl_ms: u64,
    pub weather_api_key: Option<String>,
    pub weather_location: Option<String>,
}

impl Default for OutdoorConfig {
    fn default() -> Self {
        Self {
            min_outdoor_temp_c: 18.3,
            fallback_temp_c: 0.0,
            cache_ttl_ms: 600_000,
            weather_api_key: None,
            weather_location: None,
        }
    }
}

impl OutdoorConfig {
    /// Api key and location, when both are configured and non-blank.
    pub fn weather_credentials(&self) -> Option<(&str, &str)> {
        let key = self.weather_api_key.as_deref().map(str::trim)?;
        let location = self.weather_location.as_deref().map(str::trim)?;
        if key.is_empty() || location.is_empty() {
            return None;
        }
        Some((key, location))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Setpoint writes in eco edit the away bands instead of leaving eco.
    pub allow_eco_band_edit: bool,
    pub expose_eco_toggle: bool,
    pub expose_fan_service: bool,
    pub expose_hot_water: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allow_eco_band_edit: false,
            expose_eco_toggle: true,
            expose_fan_service: true,
            expose_hot_water: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
    pub device_id: String,
    pub http_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "127.0.0.1".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
            device_id: "thermostat".to_string(),
            http_port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    #[serde(rename = "override")]
    pub overrides: OverrideConfig,
    pub outdoor: OutdoorConfig,
    pub policy: PolicyConfig,
    pub network: NetworkConfig,
}

impl BridgeConfig {
    pub fn sanitize(&mut self) {
        let outdoor = &mut self.outdoor;
        if !outdoor.min_outdoor_temp_c.is_finite() {
            outdoor.min_outdoor_temp_c = OutdoorConfig::default().min_outdoor_temp_c;
        }
        outdoor.min_outdoor_temp_c = outdoor.min_outdoor_temp_c.clamp(-30.0, 40.0);
        if !outdoor.fallback_temp_c.is_finite() {
            outdoor.fallback_temp_c = 0.0;
        }
        outdoor.cache_ttl_ms = outdoor.cache_ttl_ms.max(60_000);

        let overrides = &mut self.overrides;
        overrides.manual_fan_on_ms = overrides.manual_fan_on_ms.max(1_000);
        overrides.manual_fan_off_ms = overrides.manual_fan_off_ms.max(1_000);
        overrides.substitute_fan_ms = overrides.substitute_fan_ms.max(1_000);

        if self.network.device_id.trim().is_empty() {
            self.network.device_id = NetworkConfig::default().device_id;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let outdoor = &self.outdoor;
        let has_key = outdoor
            .weather_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        let has_location = outdoor
            .weather_location
            .as_deref()
            .is_some_and(|location| !location.trim().is_empty());
        if has_key && !has_location {
            return Err(ConfigError::MissingWeatherLocation);
        }

        if self.network.mqtt_port == 0 {
            return Err(ConfigError::InvalidPort("mqtt_port"));
        }
        if self.network.http_port == 0 {
            return Err(ConfigError::InvalidPort("http_port"));
        }

        let device_id = &self.network.device_id;
        if device_id.contains(['/', '+', '#']) {
            return Err(ConfigError::InvalidDeviceId(device_id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_fills_defaults() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{"outdoor":{"min_outdoor_temp_c":15.0},"policy":{"allow_eco_band_edit":true}}"#,
        )
        .unwrap();

        assert_eq!(config.outdoor.min_outdoor_temp_c, 15.0);
        assert_eq!(config.outdoor.cache_ttl_ms, 600_000);
        assert!(config.policy.allow_eco_band_edit);
        assert!(config.policy.expose_fan_service);
        assert_eq!(config.overrides.manual_fan_on_ms, 8_000);
        assert_eq!(config.overrides.substitute_fan_ms, 1_800_000);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut config = BridgeConfig::default();
        config.outdoor.min_outdoor_temp_c = f64::NAN;
        config.outdoor.cache_ttl_ms = 5;
        config.overrides.manual_fan_on_ms = 0;
        config.network.device_id = "  ".to_string();

        config.sanitize();

        assert_eq!(config.outdoor.min_outdoor_temp_c, 18.3);
        assert_eq!(config.outdoor.cache_ttl_ms, 60_000);
        assert_eq!(config.overrides.manual_fan_on_ms, 1_000);
        assert_eq!(config.network.device_id, "thermostat");
    }

    #[test]
    fn api_key_without_location_is_rejected() {
        let mut config = BridgeConfig::default();
        config.outdoor.weather_api_key = Some("abc".to_string());

        assert_eq!(config.validate(), Err(ConfigError::MissingWeatherLocation));

        config.outdoor.weather_location = Some("Portland, OR".to_string());
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(
            config.outdoor.weather_credentials(),
            Some(("abc", "Portland, OR"))
        );
    }

    #[test]
    fn device_id_with_topic_wildcards_is_rejected() {
        let mut config = BridgeConfig::default();
        config.network.device_id = "hall/#".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDeviceId(_))
        ));
    }
}
