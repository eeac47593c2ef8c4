use std::{
    collections::HashMap,
    io::ErrorKind,
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use thermostat_bridge_common::{
    characteristics::{characteristic_value, characteristics_for, TemperatureLimits},
    device_topic, topic_suffix, BridgeConfig, BridgeStatus, CharacteristicDescriptor,
    DeviceState, HostMode, TemperatureScale, COMMAND_SUFFIXES, SUFFIX_CMD_COOLING, SUFFIX_CMD_ECO,
    SUFFIX_CMD_FAN, SUFFIX_CMD_HEATING, SUFFIX_CMD_HOT_WATER, SUFFIX_CMD_MODE, SUFFIX_CMD_TARGET,
    SUFFIX_CMD_UNITS, SUFFIX_STATUS, SUFFIX_TELEMETRY, SUFFIX_WRITE,
};

use crate::{
    fan_override::OverrideController,
    outdoor::{OutdoorStatus, OutdoorTemperatureProvider},
    thermostat::ThermostatBridge,
    weather::{OpenWeatherClient, WeatherLookup},
    writer::{MqttPropertyWriter, PropertyWriter, WriteError},
};

const MAX_MQTT_PAYLOAD_BYTES: usize = 8 * 1024;
const STATUS_PUBLISH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone)]
struct AppState {
    device: Arc<Mutex<Option<DeviceState>>>,
    last_telemetry: Arc<Mutex<Option<DateTime<Utc>>>>,
    bridge: ThermostatBridge,
    mqtt: AsyncClient,
    device_id: Arc<str>,
}

#[derive(Clone)]
struct ConfigStore {
    path: Arc<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct StatusView {
    #[serde(flatten)]
    status: BridgeStatus,
    #[serde(rename = "fanOverrideRemainingSecs")]
    fan_override_remaining_secs: Option<u64>,
    #[serde(rename = "lastTelemetry")]
    last_telemetry: Option<String>,
}

#[derive(Debug, Serialize)]
struct CharacteristicView {
    #[serde(flatten)]
    descriptor: CharacteristicDescriptor,
    value: Value,
}

#[derive(Debug, Serialize)]
struct CharacteristicsView {
    characteristics: Vec<CharacteristicView>,
    #[serde(rename = "setpointLimits")]
    setpoint_limits: TemperatureLimits,
}

/// A host set-request, from either an MQTT command topic or the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Mode(HostMode),
    Target(f64),
    Cooling(f64),
    Heating(f64),
    Fan(bool),
    Eco(bool),
    Units(TemperatureScale),
    HotWater(bool),
}

#[derive(Debug, Error)]
enum CommandError {
    #[error("no telemetry received yet")]
    NoTelemetry,
    #[error("{0} is not available on this device")]
    Unavailable(&'static str),
    #[error(transparent)]
    Write(#[from] WriteError),
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = ConfigStore::new();
    let mut config = store.load().await.unwrap_or_else(|err| {
        warn!("failed to load bridge config from store: {err:#}");
        BridgeConfig::default()
    });
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.sanitize();
    config.validate().context("invalid bridge configuration")?;

    let network = &config.network;
    let mut mqtt_options = MqttOptions::new(
        format!("thermostat-bridge-{}", network.device_id),
        network.mqtt_host.clone(),
        network.mqtt_port,
    );
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    if !network.mqtt_user.is_empty() {
        mqtt_options.set_credentials(network.mqtt_user.clone(), network.mqtt_pass.clone());
    }
    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);

    let lookup: Option<Arc<dyn WeatherLookup>> = match config.outdoor.weather_credentials() {
        Some((api_key, location)) => {
            info!("outdoor temperature from OpenWeatherMap for {location:?}");
            let client: Arc<dyn WeatherLookup> = Arc::new(
                OpenWeatherClient::new(api_key).context("failed to build weather client")?,
            );
            Some(client)
        }
        None => {
            info!(
                "no weather credentials; outdoor gate uses {:.1}°C",
                config.outdoor.fallback_temp_c
            );
            None
        }
    };

    let writer = Arc::new(MqttPropertyWriter::new(
        mqtt.clone(),
        device_topic(&network.device_id, SUFFIX_WRITE),
    ));
    let app_state = AppState::new(&config, writer, lookup, mqtt);

    subscribe_topics(&app_state).await?;
    spawn_mqtt_loop(app_state.clone(), eventloop);
    spawn_state_publish_loop(app_state.clone());

    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/characteristics", get(handle_get_characteristics))
        .route("/api/outdoor", get(handle_get_outdoor))
        .route("/api/mode", post(handle_set_mode))
        .route("/api/target", post(handle_set_target))
        .route("/api/cooling", post(handle_set_cooling))
        .route("/api/heating", post(handle_set_heating))
        .route("/api/fan", post(handle_set_fan))
        .route("/api/eco", post(handle_set_eco))
        .route("/api/units", post(handle_set_units))
        .route("/api/hot-water", post(handle_set_hot_water))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.network.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind bridge server at {addr}"))?;

    info!("bridge listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

impl AppState {
    fn new(
        config: &BridgeConfig,
        writer: Arc<dyn PropertyWriter>,
        lookup: Option<Arc<dyn WeatherLookup>>,
        mqtt: AsyncClient,
    ) -> Self {
        let bridge = ThermostatBridge::new(
            writer,
            OverrideController::new(config.overrides.clone()),
            OutdoorTemperatureProvider::new(config.outdoor.clone(), lookup),
            config.policy.clone(),
        );
        Self {
            device: Arc::new(Mutex::new(None)),
            last_telemetry: Arc::new(Mutex::new(None)),
            bridge,
            mqtt,
            device_id: Arc::from(config.network.device_id.as_str()),
        }
    }

    fn topic(&self, suffix: &str) -> String {
        device_topic(&self.device_id, suffix)
    }
}

async fn subscribe_topics(app_state: &AppState) -> anyhow::Result<()> {
    let topics = std::iter::once(SUFFIX_TELEMETRY).chain(COMMAND_SUFFIXES);
    for suffix in topics {
        app_state
            .mqtt
            .subscribe(app_state.topic(suffix), QoS::AtMostOnce)
            .await?;
    }
    Ok(())
}

fn spawn_mqtt_loop(app_state: AppState, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&app_state, message.topic, message.payload.to_vec())
                            .await
                    {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

fn spawn_state_publish_loop(app_state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATUS_PUBLISH_INTERVAL);
        loop {
            interval.tick().await;
            publish_status(&app_state).await;
        }
    });
}

async fn publish_status(app_state: &AppState) {
    let Some(view) = status_view(app_state).await else {
        return;
    };
    match serde_json::to_vec(&view) {
        Ok(body) => {
            if let Err(err) = app_state
                .mqtt
                .publish(app_state.topic(SUFFIX_STATUS), QoS::AtLeastOnce, true, body)
                .await
            {
                warn!("bridge state publish failed: {err}");
            }
        }
        Err(err) => warn!("bridge state serialization failed: {err}"),
    }
}

async fn status_view(app_state: &AppState) -> Option<StatusView> {
    let status = {
        let device = app_state.device.lock().await;
        app_state.bridge.status(device.as_ref()?)
    };
    let last_telemetry = *app_state.last_telemetry.lock().await;
    let last_telemetry = last_telemetry.map(|at| at.to_rfc3339());
    let overrides = app_state.bridge.overrides();
    let fan_override_remaining_secs = overrides
        .on_deadline()
        .or_else(|| overrides.off_deadline())
        .map(|deadline| {
            deadline
                .saturating_duration_since(tokio::time::Instant::now())
                .as_secs()
        });
    Some(StatusView {
        status,
        fan_override_remaining_secs,
        last_telemetry,
    })
}

async fn handle_mqtt_message(
    app_state: &AppState,
    topic: String,
    payload: Vec<u8>,
) -> anyhow::Result<()> {
    if payload.len() > MAX_MQTT_PAYLOAD_BYTES {
        warn!(
            "dropping oversized MQTT payload on topic {} ({} bytes)",
            topic,
            payload.len()
        );
        return Ok(());
    }

    let Some(suffix) = topic_suffix(&app_state.device_id, &topic) else {
        return Ok(());
    };
    let message = String::from_utf8(payload).context("non utf8 mqtt payload")?;

    if suffix == SUFFIX_TELEMETRY {
        let snapshot: DeviceState =
            serde_json::from_str(&message).context("invalid telemetry snapshot")?;
        *app_state.device.lock().await = Some(snapshot);
        *app_state.last_telemetry.lock().await = Some(Utc::now());
        debug!("telemetry snapshot updated");
        return Ok(());
    }

    let Some(command) = parse_command(suffix, &message) else {
        warn!("ignoring invalid command on {topic}: {message:?}");
        return Ok(());
    };
    apply_command(app_state, command)
        .await
        .with_context(|| format!("{command:?} from {topic}"))?;
    publish_status(app_state).await;
    Ok(())
}

fn parse_command(suffix: &str, value: &str) -> Option<Command> {
    let value = value.trim();
    match suffix {
        SUFFIX_CMD_MODE => HostMode::parse(value).map(Command::Mode),
        SUFFIX_CMD_TARGET => parse_temperature(value).map(Command::Target),
        SUFFIX_CMD_COOLING => parse_temperature(value).map(Command::Cooling),
        SUFFIX_CMD_HEATING => parse_temperature(value).map(Command::Heating),
        SUFFIX_CMD_FAN => parse_switch(value).map(Command::Fan),
        SUFFIX_CMD_ECO => parse_switch(value).map(Command::Eco),
        SUFFIX_CMD_UNITS => parse_units(value).map(Command::Units),
        SUFFIX_CMD_HOT_WATER => parse_switch(value).map(Command::HotWater),
        _ => None,
    }
}

fn parse_temperature(value: &str) -> Option<f64> {
    let temp = value.parse::<f64>().ok()?;
    (temp.is_finite() && (-20.0..=60.0).contains(&temp)).then_some(temp)
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_units(value: &str) -> Option<TemperatureScale> {
    match value.to_ascii_uppercase().as_str() {
        "C" | "CELSIUS" => Some(TemperatureScale::Celsius),
        "F" | "FAHRENHEIT" => Some(TemperatureScale::Fahrenheit),
        _ => None,
    }
}

// The device lock is held across the vendor write so host requests apply in
// order against one snapshot.
async fn apply_command(app_state: &AppState, command: Command) -> Result<(), CommandError> {
    let mut device = app_state.device.lock().await;
    let state = device.as_mut().ok_or(CommandError::NoTelemetry)?;
    let bridge = &app_state.bridge;

    match command {
        Command::Mode(mode) => bridge.set_target_mode(state, mode).await?,
        Command::Target(value) => bridge.set_target_temperature(state, value).await?,
        Command::Cooling(value) => bridge.set_cooling_threshold(state, value).await?,
        Command::Heating(value) => bridge.set_heating_threshold(state, value).await?,
        Command::Fan(on) => {
            if !bridge.fan_service_available(state) {
                return Err(CommandError::Unavailable("fan service"));
            }
            bridge.set_fan_state(on).await?
        }
        Command::Eco(on) => {
            if !bridge.eco_toggle_available(state) {
                return Err(CommandError::Unavailable("eco toggle"));
            }
            bridge.set_eco_mode(state, on).await?
        }
        Command::Units(scale) => bridge.set_temperature_units(state, scale).await?,
        Command::HotWater(on) => {
            if !bridge.hot_water_available(state) {
                return Err(CommandError::Unavailable("hot water"));
            }
            bridge.set_hot_water_state(on).await?
        }
    }
    Ok(())
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    match status_view(&state).await {
        Some(view) => Json(view).into_response(),
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "No telemetry received yet"),
    }
}

async fn handle_get_characteristics(State(state): State<AppState>) -> impl IntoResponse {
    let device = state.device.lock().await;
    let Some(snapshot) = device.as_ref() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "No telemetry received yet");
    };

    let characteristics = characteristics_for(snapshot)
        .map(|descriptor| CharacteristicView {
            descriptor: *descriptor,
            value: characteristic_value(descriptor.id, snapshot),
        })
        .collect();
    Json(CharacteristicsView {
        characteristics,
        setpoint_limits: state.bridge.setpoint_limits(snapshot),
    })
    .into_response()
}

async fn handle_get_outdoor(State(state): State<AppState>) -> Json<OutdoorStatus> {
    Json(state.bridge.outdoor().status())
}

async fn handle_set_mode(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    apply_http_command(state, SUFFIX_CMD_MODE, params).await
}

async fn handle_set_target(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    apply_http_command(state, SUFFIX_CMD_TARGET, params).await
}

async fn handle_set_cooling(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    apply_http_command(state, SUFFIX_CMD_COOLING, params).await
}

async fn handle_set_heating(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    apply_http_command(state, SUFFIX_CMD_HEATING, params).await
}

async fn handle_set_fan(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    apply_http_command(state, SUFFIX_CMD_FAN, params).await
}

async fn handle_set_eco(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    apply_http_command(state, SUFFIX_CMD_ECO, params).await
}

async fn handle_set_units(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    apply_http_command(state, SUFFIX_CMD_UNITS, params).await
}

async fn handle_set_hot_water(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    apply_http_command(state, SUFFIX_CMD_HOT_WATER, params).await
}

async fn apply_http_command(
    state: AppState,
    suffix: &str,
    params: HashMap<String, String>,
) -> axum::response::Response {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };
    let Some(command) = parse_command(suffix, value) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid value");
    };

    if let Err(err) = apply_command(&state, command).await {
        warn!("{command:?} failed: {err}");
        let status = match &err {
            CommandError::NoTelemetry => StatusCode::SERVICE_UNAVAILABLE,
            CommandError::Unavailable(_) => StatusCode::NOT_FOUND,
            CommandError::Write(_) => StatusCode::BAD_GATEWAY,
        };
        return error_response(status, &err.to_string());
    }

    publish_status(&state).await;
    handle_get_status(State(state)).await.into_response()
}

impl ConfigStore {
    fn new() -> Self {
        let data_dir = std::env::var("BRIDGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.thermostat-bridge"));

        Self {
            path: Arc::new(data_dir.join("config.json")),
        }
    }

    async fn load(&self) -> anyhow::Result<BridgeConfig> {
        match tokio::fs::read(self.path.as_ref()).await {
            Ok(raw) => Ok(serde_json::from_slice::<BridgeConfig>(&raw)
                .with_context(|| format!("invalid config at {}", self.path.display()))?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BridgeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }
}

fn apply_env_overrides(config: &mut BridgeConfig, env: impl Fn(&str) -> Option<String>) {
    let network = &mut config.network;
    if let Some(host) = env("MQTT_HOST") {
        network.mqtt_host = host;
    }
    if let Some(port) = env("MQTT_PORT").and_then(|value| value.parse::<u16>().ok()) {
        network.mqtt_port = port;
    }
    if let Some(user) = env("MQTT_USER") {
        network.mqtt_user = user;
    }
    if let Some(pass) = env("MQTT_PASS") {
        network.mqtt_pass = pass;
    }
    if let Some(port) = env("BRIDGE_HTTP_PORT").and_then(|value| value.parse::<u16>().ok()) {
        network.http_port = port;
    }

    let outdoor = &mut config.outdoor;
    if let Some(key) = env("WEATHER_API_KEY") {
        outdoor.weather_api_key = Some(key);
    }
    if let Some(location) = env("WEATHER_LOCATION") {
        outdoor.weather_location = Some(location);
    }
    if let Some(min) = env("MIN_OUTDOOR_TEMP_C").and_then(|value| value.parse::<f64>().ok()) {
        outdoor.min_outdoor_temp_c = min;
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use thermostat_bridge_common::{types::field, HvacMode, Scope};

    use super::*;
    use crate::writer::testing::{write, RecordingWriter};

    fn test_state(writer: Arc<RecordingWriter>) -> (AppState, rumqttc::EventLoop) {
        let (mqtt, eventloop) = AsyncClient::new(MqttOptions::new("test", "localhost", 1883), 16);
        let app_state = AppState::new(&BridgeConfig::default(), writer, None, mqtt);
        (app_state, eventloop)
    }

    fn telemetry() -> Vec<u8> {
        json!({
            "hvac_mode": "off",
            "can_heat": true,
            "can_cool": true,
            "has_fan": true,
            "current_temperature": 20.5,
            "target_temperature": 21.0
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn parses_command_payloads() {
        assert_eq!(
            parse_command(SUFFIX_CMD_MODE, "heat_cool"),
            Some(Command::Mode(HostMode::Auto))
        );
        assert_eq!(
            parse_command(SUFFIX_CMD_TARGET, " 21.5 "),
            Some(Command::Target(21.5))
        );
        assert_eq!(parse_command(SUFFIX_CMD_HEATING, "NaN"), None);
        assert_eq!(parse_command(SUFFIX_CMD_COOLING, "95"), None);
        assert_eq!(parse_command(SUFFIX_CMD_FAN, "ON"), Some(Command::Fan(true)));
        assert_eq!(parse_command(SUFFIX_CMD_ECO, "maybe"), None);
        assert_eq!(
            parse_command(SUFFIX_CMD_UNITS, "f"),
            Some(Command::Units(TemperatureScale::Fahrenheit))
        );
        assert_eq!(parse_command(SUFFIX_TELEMETRY, "on"), None);
    }

    #[test]
    fn env_overrides_replace_stored_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MQTT_HOST", "broker.lan"),
            ("MQTT_PORT", "not-a-port"),
            ("BRIDGE_HTTP_PORT", "9090"),
            ("WEATHER_API_KEY", "key"),
            ("WEATHER_LOCATION", "Portland, OR"),
            ("MIN_OUTDOOR_TEMP_C", "15.5"),
        ]);
        let mut config = BridgeConfig::default();

        apply_env_overrides(&mut config, |key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.network.mqtt_host, "broker.lan");
        assert_eq!(config.network.mqtt_port, 1883);
        assert_eq!(config.network.http_port, 9090);
        assert_eq!(config.outdoor.min_outdoor_temp_c, 15.5);
        assert_eq!(
            config.outdoor.weather_credentials(),
            Some(("key", "Portland, OR"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn commands_wait_for_first_telemetry() {
        let writer = Arc::new(RecordingWriter::default());
        let (app_state, _eventloop) = test_state(writer.clone());

        let result = apply_command(&app_state, Command::Mode(HostMode::Heat)).await;
        assert!(matches!(result, Err(CommandError::NoTelemetry)));
        assert!(status_view(&app_state).await.is_none());

        handle_mqtt_message(
            &app_state,
            device_topic("thermostat", SUFFIX_TELEMETRY),
            telemetry(),
        )
        .await
        .unwrap();
        handle_mqtt_message(
            &app_state,
            device_topic("thermostat", SUFFIX_CMD_MODE),
            b"HEAT".to_vec(),
        )
        .await
        .unwrap();

        assert_eq!(
            writer.writes(),
            vec![write(Scope::Shared, field::HVAC_MODE, json!("heat"))]
        );
        let device = app_state.device.lock().await;
        assert_eq!(device.as_ref().map(|state| state.hvac_mode), Some(HvacMode::Heat));
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_features_are_rejected() {
        let writer = Arc::new(RecordingWriter::default());
        let (app_state, _eventloop) = test_state(writer.clone());
        handle_mqtt_message(
            &app_state,
            device_topic("thermostat", SUFFIX_TELEMETRY),
            telemetry(),
        )
        .await
        .unwrap();

        let result = apply_command(&app_state, Command::HotWater(true)).await;
        assert!(matches!(result, Err(CommandError::Unavailable(_))));

        apply_command(&app_state, Command::Fan(true)).await.unwrap();
        assert_eq!(
            writer.writes(),
            vec![write(Scope::Device, field::FAN_TIMER_ACTIVE, json!(true))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn topics_for_other_devices_are_ignored() {
        let writer = Arc::new(RecordingWriter::default());
        let (app_state, _eventloop) = test_state(writer.clone());

        handle_mqtt_message(
            &app_state,
            device_topic("garage", SUFFIX_TELEMETRY),
            telemetry(),
        )
        .await
        .unwrap();

        assert!(app_state.device.lock().await.is_none());
    }
}
