//! Custom characteristics exposed next to the standard thermostat service,
//! described as data rather than one type per characteristic.

use serde::Serialize;
use serde_json::{json, Value};

use crate::types::{DeviceState, TemperatureScale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Bool,
    Uint16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Notify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicId {
    FanTimerActive,
    FanTimerDuration,
    HasLeaf,
    SunlightCorrectionEnabled,
    SunlightCorrectionActive,
    UsingEmergencyHeat,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CharacteristicDescriptor {
    #[serde(skip)]
    pub id: CharacteristicId,
    pub uuid: &'static str,
    pub name: &'static str,
    pub format: DataFormat,
    pub permissions: &'static [Permission],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(rename = "minValue", skip_serializing_if = "Option::is_none")]
    pub min_value: Option<u32>,
    #[serde(rename = "maxValue", skip_serializing_if = "Option::is_none")]
    pub max_value: Option<u32>,
    #[serde(rename = "minStep", skip_serializing_if = "Option::is_none")]
    pub min_step: Option<u32>,
    #[serde(rename = "defaultValue")]
    pub default_value: u32,
}

const READ_WRITE_NOTIFY: &[Permission] =
    &[Permission::Read, Permission::Write, Permission::Notify];
const READ_NOTIFY: &[Permission] = &[Permission::Read, Permission::Notify];

const fn flag(
    id: CharacteristicId,
    uuid: &'static str,
    name: &'static str,
    permissions: &'static [Permission],
) -> CharacteristicDescriptor {
    CharacteristicDescriptor {
        id,
        uuid,
        name,
        format: DataFormat::Bool,
        permissions,
        unit: None,
        min_value: None,
        max_value: None,
        min_step: None,
        default_value: 0,
    }
}

pub const CHARACTERISTICS: [CharacteristicDescriptor; 6] = [
    flag(
        CharacteristicId::FanTimerActive,
        "D6D47D29-4640-4F44-B53C-D84015DAEBDB",
        "Fan Timer Active",
        READ_WRITE_NOTIFY,
    ),
    CharacteristicDescriptor {
        id: CharacteristicId::FanTimerDuration,
        uuid: "D6D47D29-4641-4F44-B53C-D84015DAEBDB",
        name: "Fan Timer Duration",
        format: DataFormat::Uint16,
        permissions: READ_WRITE_NOTIFY,
        unit: Some("minutes"),
        min_value: Some(0),
        max_value: Some(24 * 60),
        min_step: Some(15),
        default_value: 0,
    },
    flag(
        CharacteristicId::HasLeaf,
        "D6D47D29-4642-4F44-B53C-D84015DAEBDB",
        "Has Leaf",
        READ_NOTIFY,
    ),
    flag(
        CharacteristicId::SunlightCorrectionEnabled,
        "D6D47D29-4644-4F44-B53C-D84015DAEBDB",
        "Sunlight Correction Enabled",
        READ_NOTIFY,
    ),
    flag(
        CharacteristicId::SunlightCorrectionActive,
        "D6D47D29-4645-4F44-B53C-D84015DAEBDB",
        "Sunlight Correction Active",
        READ_NOTIFY,
    ),
    flag(
        CharacteristicId::UsingEmergencyHeat,
        "D6D47D29-4646-4F44-B53C-D84015DAEBDB",
        "Using Emergency Heat",
        READ_NOTIFY,
    ),
];

/// Descriptors that apply to this device; fan timer entries need a fan.
pub fn characteristics_for(
    state: &DeviceState,
) -> impl Iterator<Item = &'static CharacteristicDescriptor> + '_ {
    CHARACTERISTICS.iter().filter(|descriptor| {
        state.has_fan
            || !matches!(
                descriptor.id,
                CharacteristicId::FanTimerActive | CharacteristicId::FanTimerDuration
            )
    })
}

pub fn characteristic_value(id: CharacteristicId, state: &DeviceState) -> Value {
    match id {
        CharacteristicId::FanTimerActive => json!(state.fan_timer_active),
        CharacteristicId::FanTimerDuration => json!(state.fan_timer_duration_minutes()),
        CharacteristicId::HasLeaf => json!(state.has_leaf),
        CharacteristicId::SunlightCorrectionEnabled => json!(state.sunlight_correction_enabled),
        CharacteristicId::SunlightCorrectionActive => json!(state.sunlight_correction_active),
        CharacteristicId::UsingEmergencyHeat => json!(state.is_using_emergency_heat),
    }
}

/// Allowed setpoint and reading ranges in Celsius for the device's display scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureLimits {
    #[serde(rename = "minSet")]
    pub min_set: f64,
    #[serde(rename = "maxSet")]
    pub max_set: f64,
    #[serde(rename = "minGet")]
    pub min_get: f64,
    #[serde(rename = "maxGet")]
    pub max_get: f64,
    pub step: f64,
}

pub fn temperature_limits(scale: TemperatureScale) -> TemperatureLimits {
    match scale {
        TemperatureScale::Fahrenheit => TemperatureLimits {
            min_set: fahrenheit_to_celsius(50.0),
            max_set: fahrenheit_to_celsius(90.0),
            min_get: fahrenheit_to_celsius(0.0),
            max_get: fahrenheit_to_celsius(160.0),
            step: 0.1,
        },
        TemperatureScale::Celsius => TemperatureLimits {
            min_set: 9.0,
            max_set: 32.0,
            min_get: -20.0,
            max_get: 60.0,
            step: 0.1,
        },
    }
}

fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_characteristics_need_a_fan() {
        let without_fan = DeviceState::default();
        assert_eq!(characteristics_for(&without_fan).count(), 4);

        let with_fan = DeviceState {
            has_fan: true,
            ..DeviceState::default()
        };
        assert_eq!(characteristics_for(&with_fan).count(), 6);
    }

    #[test]
    fn values_read_from_device_state() {
        let state = DeviceState {
            fan_timer_duration: 1_800,
            has_leaf: true,
            ..DeviceState::default()
        };
        assert_eq!(
            characteristic_value(CharacteristicId::FanTimerDuration, &state),
            json!(30)
        );
        assert_eq!(
            characteristic_value(CharacteristicId::HasLeaf, &state),
            json!(true)
        );
    }

    #[test]
    fn descriptor_serializes_with_optional_props() {
        let value = serde_json::to_value(CHARACTERISTICS[1]).unwrap();
        assert_eq!(value["format"], json!("uint16"));
        assert_eq!(value["maxValue"], json!(1440));
        assert_eq!(value["permissions"], json!(["read", "write", "notify"]));

        let flag = serde_json::to_value(CHARACTERISTICS[2]).unwrap();
        assert!(flag.get("unit").is_none());
    }

    #[test]
    fn fahrenheit_limits_are_converted() {
        let limits = temperature_limits(TemperatureScale::Fahrenheit);
        assert!((limits.min_set - 10.0).abs() < 1e-9);
        assert!((limits.max_set - 32.222).abs() < 1e-3);
        assert_eq!(temperature_limits(TemperatureScale::Celsius).min_set, 9.0);
    }
}
