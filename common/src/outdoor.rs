use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Last outdoor reading plus the resolved location.
///
/// Coordinates are kept for the life of the process once resolved; the
/// configured location is not expected to change without a restart.
#[derive(Debug, Clone, Default)]
pub struct OutdoorTemperatureCache {
    last_temp_c: Option<f64>,
    last_fetched_ms: Option<u64>,
    coordinates: Option<Coordinates>,
}

impl OutdoorTemperatureCache {
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.last_temp_c.is_some()
            && self
                .last_fetched_ms
                .map(|fetched| now_ms.saturating_sub(fetched) < ttl_ms)
                .unwrap_or(false)
    }

    /// Cached value, or `fallback_c` when nothing was ever fetched.
    pub fn value_or(&self, fallback_c: f64) -> f64 {
        self.last_temp_c.unwrap_or(fallback_c)
    }

    pub fn last_temp_c(&self) -> Option<f64> {
        self.last_temp_c
    }

    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.last_fetched_ms
            .map(|fetched| now_ms.saturating_sub(fetched))
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn store_coordinates(&mut self, coordinates: Coordinates) {
        self.coordinates = Some(coordinates);
    }

    pub fn store_reading(&mut self, temp_c: f64, now_ms: u64) {
        self.last_temp_c = Some(temp_c);
        self.last_fetched_ms = Some(now_ms);
    }
}
