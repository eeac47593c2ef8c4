use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("weather api key is set but no weather location is configured")]
    MissingWeatherLocation,
    #[error("{0} must be non-zero")]
    InvalidPort(&'static str),
    #[error("device id {0:?} contains mqtt topic separators or wildcards")]
    InvalidDeviceId(String),
}
