use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use thermostat_bridge_common::Scope;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to encode {field}: {source}")]
    Encode {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Vendor property transport. Writes are at-least-once from the caller's
/// perspective and failures are returned unchanged; there is no retry here.
#[async_trait]
pub trait PropertyWriter: Send + Sync {
    async fn write(&self, scope: Scope, field: &str, value: Value) -> Result<(), WriteError>;
}

#[derive(Debug, Serialize)]
struct WriteMessage<'a> {
    scope: Scope,
    field: &'a str,
    value: Value,
}

/// Publishes each write as a JSON patch on the device write topic.
#[derive(Clone)]
pub struct MqttPropertyWriter {
    client: AsyncClient,
    topic: String,
}

impl MqttPropertyWriter {
    pub fn new(client: AsyncClient, topic: String) -> Self {
        Self { client, topic }
    }
}

#[async_trait]
impl PropertyWriter for MqttPropertyWriter {
    async fn write(&self, scope: Scope, field: &str, value: Value) -> Result<(), WriteError> {
        let body = serde_json::to_vec(&WriteMessage {
            scope,
            field,
            value,
        })
        .map_err(|source| WriteError::Encode {
            field: field.to_string(),
            source,
        })?;

        self.client
            .publish(self.topic.as_str(), QoS::AtLeastOnce, false, body)
            .await
            .map_err(|err| WriteError::Transport(err.to_string()))?;
        debug!("published write {}.{field}", scope.as_str());
        Ok(())
    }
}
