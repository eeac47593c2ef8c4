use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use thermostat_bridge_common::{Coordinates, OutdoorConfig, OutdoorTemperatureCache};

use crate::weather::WeatherLookup;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdoorStatus {
    pub temperature_c: f64,
    pub last_reading_c: Option<f64>,
    pub age_ms: Option<u64>,
    pub fresh: bool,
    pub coordinates: Option<Coordinates>,
    pub min_outdoor_temp_c: f64,
    pub lookup_configured: bool,
}

/// Cached outdoor temperature with fire-and-forget refresh.
///
/// Reads never wait on the network: a stale or empty cache serves its last
/// value (or the fallback) and kicks off at most one background refresh.
#[derive(Clone)]
pub struct OutdoorTemperatureProvider {
    cache: Arc<Mutex<OutdoorTemperatureCache>>,
    lookup: Option<Arc<dyn WeatherLookup>>,
    config: OutdoorConfig,
    started: Instant,
    refreshing: Arc<AtomicBool>,
}

impl OutdoorTemperatureProvider {
    pub fn new(config: OutdoorConfig, lookup: Option<Arc<dyn WeatherLookup>>) -> Self {
        Self {
            cache: Arc::new(Mutex::new(OutdoorTemperatureCache::default())),
            lookup,
            config,
            started: Instant::now(),
            refreshing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn threshold_c(&self) -> f64 {
        self.config.min_outdoor_temp_c
    }

    pub fn current_temperature(&self) -> f64 {
        let now_ms = self.now_ms();
        let (fresh, value) = {
            let cache = self.lock();
            (
                cache.is_fresh(now_ms, self.config.cache_ttl_ms),
                cache.value_or(self.config.fallback_temp_c),
            )
        };
        if fresh {
            return value;
        }

        match (self.config.weather_credentials(), &self.lookup) {
            (Some((_, location)), Some(lookup)) => {
                self.spawn_refresh(lookup.clone(), location.to_string());
            }
            _ => debug!("outdoor lookup not configured; using {value:.1}°C"),
        }
        value
    }

    pub fn status(&self) -> OutdoorStatus {
        let now_ms = self.now_ms();
        let cache = self.lock();
        OutdoorStatus {
            temperature_c: cache.value_or(self.config.fallback_temp_c),
            last_reading_c: cache.last_temp_c(),
            age_ms: cache.age_ms(now_ms),
            fresh: cache.is_fresh(now_ms, self.config.cache_ttl_ms),
            coordinates: cache.coordinates(),
            min_outdoor_temp_c: self.config.min_outdoor_temp_c,
            lookup_configured: self.lookup.is_some()
                && self.config.weather_credentials().is_some(),
        }
    }

    fn spawn_refresh(&self, lookup: Arc<dyn WeatherLookup>, location: String) {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }
        let provider = self.clone();
        tokio::spawn(async move {
            provider.refresh(lookup.as_ref(), &location).await;
            provider.refreshing.store(false, Ordering::Release);
        });
    }

    async fn refresh(&self, lookup: &dyn WeatherLookup, location: &str) {
        let cached = self.lock().coordinates();
        let coordinates = match cached {
            Some(coordinates) => coordinates,
            None => match lookup.geocode(location).await {
                Ok(coordinates) => {
                    info!(
                        "resolved {location:?} to {:.3},{:.3}",
                        coordinates.lat, coordinates.lon
                    );
                    self.lock().store_coordinates(coordinates);
                    coordinates
                }
                Err(err) => {
                    warn!("geocoding {location:?} failed: {err}");
                    return;
                }
            },
        };

        match lookup.current_temperature(coordinates).await {
            Ok(temp_c) => {
                let now_ms = self.now_ms();
                self.lock().store_reading(temp_c, now_ms);
                info!("outdoor temperature {temp_c:.1}°C");
            }
            Err(err) => warn!("outdoor temperature lookup failed: {err}"),
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn lock(&self) -> MutexGuard<'_, OutdoorTemperatureCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::AtomicU32;

    use async_trait::async_trait;

    use super::*;
    use crate::weather::WeatherError;

    /// Counts calls and serves a fixed temperature.
    pub struct FakeWeather {
        pub geocode_calls: AtomicU32,
        pub fetch_calls: AtomicU32,
        temp_c: Mutex<f64>,
        failing: AtomicBool,
    }

    impl FakeWeather {
        pub fn new(temp_c: f64) -> Arc<Self> {
            Arc::new(Self {
                geocode_calls: AtomicU32::new(0),
                fetch_calls: AtomicU32::new(0),
                temp_c: Mutex::new(temp_c),
                failing: AtomicBool::new(false),
            })
        }

        pub fn set_temp(&self, temp_c: f64) {
            *self.temp_c.lock().unwrap() = temp_c;
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> (u32, u32) {
            (
                self.geocode_calls.load(Ordering::SeqCst),
                self.fetch_calls.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl WeatherLookup for FakeWeather {
        async fn geocode(&self, location: &str) -> Result<Coordinates, WeatherError> {
            self.geocode_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(WeatherError::NoMatch(location.to_string()));
            }
            Ok(Coordinates {
                lat: 45.5,
                lon: -122.7,
            })
        }

        async fn current_temperature(&self, _: Coordinates) -> Result<f64, WeatherError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(WeatherError::MissingTemperature);
            }
            Ok(*self.temp_c.lock().unwrap())
        }
    }

    pub fn configured() -> OutdoorConfig {
        OutdoorConfig {
            weather_api_key: Some("key".to_string()),
            weather_location: Some("Portland, OR".to_string()),
            ..OutdoorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::testing::{configured, FakeWeather};
    use super::*;
    use pretty_assertions::assert_eq;

    fn provider(weather: &Arc<FakeWeather>, config: OutdoorConfig) -> OutdoorTemperatureProvider {
        let lookup: Arc<dyn WeatherLookup> = weather.clone();
        OutdoorTemperatureProvider::new(config, Some(lookup))
    }

    // Lets spawned refresh tasks run to completion.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_cache_serves_fallback_then_refreshes() {
        let weather = FakeWeather::new(12.0);
        let outdoor = provider(&weather, configured());

        assert_eq!(outdoor.current_temperature(), 0.0);
        settle().await;

        assert_eq!(weather.calls(), (1, 1));
        assert_eq!(outdoor.current_temperature(), 12.0);
        assert_eq!(weather.calls(), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_cache_serves_old_value_and_refreshes_once() {
        let weather = FakeWeather::new(12.0);
        let outdoor = provider(&weather, configured());
        let start = Instant::now();

        outdoor.current_temperature();
        settle().await;
        weather.set_temp(7.0);

        tokio::time::sleep_until(start + Duration::from_secs(9 * 60)).await;
        assert_eq!(outdoor.current_temperature(), 12.0);
        settle().await;
        assert_eq!(weather.calls(), (1, 1));

        tokio::time::sleep_until(start + Duration::from_secs(11 * 60)).await;
        assert_eq!(outdoor.current_temperature(), 12.0);
        assert_eq!(outdoor.current_temperature(), 12.0);
        settle().await;

        // Coordinates stay cached; only the weather fetch repeats.
        assert_eq!(weather.calls(), (1, 2));
        assert_eq!(outdoor.current_temperature(), 7.0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_leaves_cache_untouched() {
        let weather = FakeWeather::new(12.0);
        let outdoor = provider(&weather, configured());
        let start = Instant::now();

        outdoor.current_temperature();
        settle().await;

        weather.set_failing(true);
        tokio::time::sleep_until(start + Duration::from_secs(11 * 60)).await;
        assert_eq!(outdoor.current_temperature(), 12.0);
        settle().await;

        assert_eq!(weather.calls(), (1, 2));
        let status = outdoor.status();
        assert_eq!(status.last_reading_c, Some(12.0));
        assert!(!status.fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_geocode_is_retried_on_next_read() {
        let weather = FakeWeather::new(12.0);
        weather.set_failing(true);
        let outdoor = provider(&weather, configured());

        assert_eq!(outdoor.current_temperature(), 0.0);
        settle().await;
        assert_eq!(weather.calls(), (1, 0));

        weather.set_failing(false);
        outdoor.current_temperature();
        settle().await;
        assert_eq!(weather.calls(), (2, 1));
        assert_eq!(outdoor.current_temperature(), 12.0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credentials_never_call_out() {
        let weather = FakeWeather::new(12.0);
        let mut config = configured();
        config.weather_location = None;
        let outdoor = provider(&weather, config);

        assert_eq!(outdoor.current_temperature(), 0.0);
        settle().await;

        assert_eq!(weather.calls(), (0, 0));
        assert!(!outdoor.status().lookup_configured);
    }
}
