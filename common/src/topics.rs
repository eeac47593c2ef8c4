pub const TOPIC_ROOT: &str = "thermostat-bridge";

pub const SUFFIX_TELEMETRY: &str = "device/state";
pub const SUFFIX_WRITE: &str = "device/write";
pub const SUFFIX_STATUS: &str = "bridge/state";

pub const SUFFIX_CMD_MODE: &str = "cmnd/mode";
pub const SUFFIX_CMD_TARGET: &str = "cmnd/target";
pub const SUFFIX_CMD_COOLING: &str = "cmnd/cooling";
pub const SUFFIX_CMD_HEATING: &str = "cmnd/heating";
pub const SUFFIX_CMD_FAN: &str = "cmnd/fan";
pub const SUFFIX_CMD_ECO: &str = "cmnd/eco";
pub const SUFFIX_CMD_UNITS: &str = "cmnd/units";
pub const SUFFIX_CMD_HOT_WATER: &str = "cmnd/hot_water";

pub const COMMAND_SUFFIXES: [&str; 8] = [
    SUFFIX_CMD_MODE,
    SUFFIX_CMD_TARGET,
    SUFFIX_CMD_COOLING,
    SUFFIX_CMD_HEATING,
    SUFFIX_CMD_FAN,
    SUFFIX_CMD_ECO,
    SUFFIX_CMD_UNITS,
    SUFFIX_CMD_HOT_WATER,
];

pub fn device_topic(device_id: &str, suffix: &str) -> String {
    format!("{TOPIC_ROOT}/{device_id}/{suffix}")
}

/// Suffix of a topic under this device's root, if it belongs to it.
pub fn topic_suffix<'a>(device_id: &str, topic: &'a str) -> Option<&'a str> {
    topic
        .strip_prefix(TOPIC_ROOT)?
        .strip_prefix('/')?
        .strip_prefix(device_id)?
        .strip_prefix('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_round_trips_through_device_topic() {
        let topic = device_topic("hallway", SUFFIX_CMD_FAN);
        assert_eq!(topic, "thermostat-bridge/hallway/cmnd/fan");
        assert_eq!(topic_suffix("hallway", &topic), Some(SUFFIX_CMD_FAN));
        assert_eq!(topic_suffix("kitchen", &topic), None);
    }
}
