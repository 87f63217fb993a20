//! # Forecast Fetching and Caching
//!
//! Pulls gridded forecast data from the National Weather Service and caches
//! the parsed result on disk so restarts and the periodic refresh don't
//! hammer the API. The flow is two requests: resolve the configured
//! coordinates through the points endpoint, then fetch the grid data it
//! points at. Values arrive in provider units (degrees C for temperature,
//! percent for humidity and precipitation probability) and are converted at
//! consumption time, not here.
//!
//! ## Caching
//!
//! - **Location**: `/tmp/matrix_weather_cache.json`, cleared on reboot
//! - **Format**: the parsed [`Prediction`], serialized with `serde_json`
//! - **TTL**: 23 hours, checked against the cache file's modification time
//! - **Failures**: a cache write failure is logged and ignored; corrupt or
//!   stale cache files simply fall through to a fresh fetch
//!
//! ## Error Handling
//!
//! All failure modes surface through [`WeatherError`]; callers treat any of
//! them as "no fresh data yet" and keep displaying what they have.

use chrono::{DateTime, Duration, Local};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use std::{fs, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The forecast payload was missing an expected field or timestamp
    #[error("unexpected forecast payload: {0}")]
    Payload(String),

    /// Cache file operations failed
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),
}

/// Cache file location; `/tmp` keeps it off the SD card's precious write
/// cycles and clears it on reboot.
const CACHE: &str = "/tmp/matrix_weather_cache.json";

/// Cache time-to-live in seconds (23 hours).
const TTL: u64 = 23 * 3600;

/// Forecast points further out than this are dropped at parse time.
const HORIZON_HOURS: i64 = 48;

/// One forecast sample.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub time: DateTime<Local>,
    /// Provider units: degrees C for temperature, percent otherwise.
    pub value: f32,
}

impl PredictionPoint {
    /// Whether this sample falls inside `[begin, end]`, inclusive.
    pub fn is_timely(&self, begin: DateTime<Local>, end: DateTime<Local>) -> bool {
        begin <= self.time && self.time <= end
    }

    pub fn value_fahrenheit(&self) -> f32 {
        1.8 * self.value + 32.0
    }
}

/// A forecast variable over time, sorted ascending by timestamp.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PredictionSeries {
    points: Vec<PredictionPoint>,
}

impl PredictionSeries {
    pub fn new() -> Self {
        PredictionSeries { points: Vec::new() }
    }

    /// Insert a sample, keeping the series sorted by time.
    pub fn push(&mut self, point: PredictionPoint) {
        let at = self
            .points
            .partition_point(|existing| existing.time <= point.time);
        self.points.insert(at, point);
    }

    pub fn points(&self) -> &[PredictionPoint] {
        &self.points
    }

    /// The sample in effect at `time`: the latest one not after it, falling
    /// back to the first sample for times before the series starts.
    pub fn value_at(&self, time: DateTime<Local>) -> Option<&PredictionPoint> {
        let before = self.points.partition_point(|p| p.time <= time);
        if before == 0 {
            self.points.first()
        } else {
            self.points.get(before - 1)
        }
    }

    /// Samples inside `[begin, end]`, in time order.
    pub fn timely(
        &self,
        begin: DateTime<Local>,
        end: DateTime<Local>,
    ) -> impl Iterator<Item = &PredictionPoint> {
        self.points.iter().filter(move |p| p.is_timely(begin, end))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One complete forecast pull.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    pub updated_at: DateTime<Local>,
    pub temperature: PredictionSeries,
    pub humidity: PredictionSeries,
    pub precipitation: PredictionSeries,
}

// -- NWS wire format --

#[derive(Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Deserialize)]
struct PointsProperties {
    #[serde(rename = "forecastGridData")]
    forecast_grid_data: String,
}

#[derive(Deserialize)]
struct GridResponse {
    properties: GridProperties,
}

#[derive(Deserialize)]
struct GridProperties {
    #[serde(rename = "updateTime")]
    update_time: String,
    temperature: GridSeries,
    #[serde(rename = "relativeHumidity")]
    relative_humidity: GridSeries,
    #[serde(rename = "probabilityOfPrecipitation")]
    probability_of_precipitation: GridSeries,
}

#[derive(Deserialize)]
struct GridSeries {
    values: Vec<GridValue>,
}

#[derive(Deserialize)]
struct GridValue {
    /// ISO-8601 timestamp with a trailing `/PT..` validity duration.
    #[serde(rename = "validTime")]
    valid_time: String,
    value: Option<f32>,
}

/// Parse an NWS `validTime`, discarding the duration suffix.
fn parse_valid_time(raw: &str) -> Result<DateTime<Local>, WeatherError> {
    let timestamp = raw.split('/').next().unwrap_or(raw);
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| WeatherError::Payload(format!("bad timestamp {:?}: {}", raw, e)))
}

fn parse_series(raw: &GridSeries, horizon: DateTime<Local>) -> Result<PredictionSeries, WeatherError> {
    let mut series = PredictionSeries::new();
    for sample in &raw.values {
        let time = parse_valid_time(&sample.valid_time)?;
        if time > horizon {
            continue;
        }
        // Grid cells occasionally report null values; drop them
        let Some(value) = sample.value else {
            continue;
        };
        series.push(PredictionPoint { time, value });
    }
    Ok(series)
}

fn parse_grid(raw: GridResponse, now: DateTime<Local>) -> Result<Prediction, WeatherError> {
    let horizon = now + Duration::hours(HORIZON_HOURS);
    Ok(Prediction {
        updated_at: parse_valid_time(&raw.properties.update_time)?,
        temperature: parse_series(&raw.properties.temperature, horizon)?,
        humidity: parse_series(&raw.properties.relative_humidity, horizon)?,
        precipitation: parse_series(&raw.properties.probability_of_precipitation, horizon)?,
    })
}

/// Disk-cached forecast source for one fixed location.
pub struct WeatherStore {
    latitude: f64,
    longitude: f64,
    cache_path: PathBuf,
}

impl WeatherStore {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        WeatherStore {
            latitude,
            longitude,
            cache_path: PathBuf::from(CACHE),
        }
    }

    /// Point the cache somewhere else (tests).
    pub fn with_cache_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_path = path.as_ref().to_path_buf();
        self
    }

    /// Current forecast, cache-first. Only when the cache is missing, stale,
    /// or corrupt does this touch the network.
    pub async fn current_prediction(&self) -> Result<Prediction, WeatherError> {
        if let Ok(prediction) = self.load_cache() {
            debug!("serving forecast from cache");
            return Ok(prediction);
        }

        let prediction = self.fetch_remote().await?;
        info!(
            "fetched forecast updated {} ({} temperature samples)",
            prediction.updated_at,
            prediction.temperature.points().len()
        );

        if let Err(e) = self.save_cache(&prediction) {
            warn!("unable to cache forecast to {}: {}", self.cache_path.display(), e);
        }
        Ok(prediction)
    }

    async fn fetch_remote(&self) -> Result<Prediction, WeatherError> {
        let client = reqwest::Client::builder()
            .user_agent("matrix-clock/0.1 (led panel display)")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let points_url = format!(
            "https://api.weather.gov/points/{:.4},{:.4}",
            self.latitude, self.longitude
        );
        let points: PointsResponse = client
            .get(&points_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let grid: GridResponse = client
            .get(&points.properties.forecast_grid_data)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_grid(grid, Local::now())
    }

    /// Load the parsed forecast from disk if still within TTL.
    fn load_cache(&self) -> Result<Prediction, io::Error> {
        let meta = fs::metadata(&self.cache_path)?;
        let age = SystemTime::now()
            .duration_since(meta.modified()?)
            .map_err(|_| io::Error::other("time error"))?
            .as_secs();
        if age > TTL {
            return Err(io::Error::other("stale"));
        }

        let data = fs::read(&self.cache_path)?;
        let prediction = serde_json::from_slice(&data)?;
        Ok(prediction)
    }

    fn save_cache(&self, prediction: &Prediction) -> Result<(), io::Error> {
        let data = serde_json::to_vec(prediction)?;
        fs::write(&self.cache_path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 12, h, m, 0).unwrap()
    }

    fn point(h: u32, value: f32) -> PredictionPoint {
        PredictionPoint { time: local(h, 0), value }
    }

    #[test]
    fn series_stays_sorted_regardless_of_insert_order() {
        let mut series = PredictionSeries::new();
        series.push(point(14, 22.0));
        series.push(point(8, 15.0));
        series.push(point(18, 18.0));

        let hours: Vec<f32> = series.points().iter().map(|p| p.value).collect();
        assert_eq!(hours, vec![15.0, 22.0, 18.0]);
    }

    #[test]
    fn value_at_picks_latest_sample_not_after_the_query() {
        let mut series = PredictionSeries::new();
        series.push(point(8, 15.0));
        series.push(point(14, 22.0));

        assert_eq!(series.value_at(local(10, 30)).unwrap().value, 15.0);
        assert_eq!(series.value_at(local(15, 0)).unwrap().value, 22.0);
        // Before the series starts, the first sample stands in
        assert_eq!(series.value_at(local(6, 0)).unwrap().value, 15.0);
    }

    #[test]
    fn timely_window_is_inclusive() {
        let mut series = PredictionSeries::new();
        series.push(point(8, 1.0));
        series.push(point(12, 2.0));
        series.push(point(20, 3.0));

        let inside: Vec<f32> = series
            .timely(local(8, 0), local(12, 0))
            .map(|p| p.value)
            .collect();
        assert_eq!(inside, vec![1.0, 2.0]);
    }

    #[test]
    fn fahrenheit_conversion() {
        assert_eq!(point(0, 0.0).value_fahrenheit(), 32.0);
        assert!((point(0, 22.0).value_fahrenheit() - 71.6).abs() < 1e-4);
    }

    #[test]
    fn valid_time_duration_suffix_is_discarded() {
        let with_suffix = parse_valid_time("2025-06-12T05:00:00+00:00/PT1H").unwrap();
        let without = parse_valid_time("2025-06-12T05:00:00+00:00").unwrap();
        assert_eq!(with_suffix, without);
    }

    #[test]
    fn malformed_timestamp_is_a_payload_error() {
        assert!(matches!(
            parse_valid_time("yesterday-ish"),
            Err(WeatherError::Payload(_))
        ));
    }

    #[test]
    fn grid_payload_parses_and_drops_nulls() {
        let json = r#"{
            "properties": {
                "updateTime": "2025-06-12T05:00:00+00:00",
                "temperature": {
                    "uom": "wmoUnit:degC",
                    "values": [
                        {"validTime": "2025-06-12T06:00:00+00:00/PT1H", "value": 21.5},
                        {"validTime": "2025-06-12T07:00:00+00:00/PT1H", "value": null},
                        {"validTime": "2025-06-12T08:00:00+00:00/PT1H", "value": 23.0}
                    ]
                },
                "relativeHumidity": {"values": []},
                "probabilityOfPrecipitation": {"values": []}
            }
        }"#;
        let raw: GridResponse = serde_json::from_str(json).unwrap();
        let now = parse_valid_time("2025-06-12T05:30:00+00:00").unwrap();
        let prediction = parse_grid(raw, now).unwrap();

        assert_eq!(prediction.temperature.points().len(), 2);
        assert!(prediction.humidity.is_empty());
    }

    #[test]
    fn forecast_horizon_drops_far_future_samples() {
        let json = r#"{
            "properties": {
                "updateTime": "2025-06-12T05:00:00+00:00",
                "temperature": {
                    "values": [
                        {"validTime": "2025-06-12T06:00:00+00:00/PT1H", "value": 20.0},
                        {"validTime": "2025-06-20T06:00:00+00:00/PT1H", "value": 25.0}
                    ]
                },
                "relativeHumidity": {"values": []},
                "probabilityOfPrecipitation": {"values": []}
            }
        }"#;
        let raw: GridResponse = serde_json::from_str(json).unwrap();
        let now = parse_valid_time("2025-06-12T05:30:00+00:00").unwrap();
        let prediction = parse_grid(raw, now).unwrap();
        assert_eq!(prediction.temperature.points().len(), 1);
    }

    #[test]
    fn cache_roundtrip_preserves_the_forecast() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeatherStore::new(35.71, -78.61)
            .with_cache_path(dir.path().join("forecast.json"));

        let mut temperature = PredictionSeries::new();
        temperature.push(point(8, 15.0));
        let prediction = Prediction {
            updated_at: local(5, 0),
            temperature,
            humidity: PredictionSeries::new(),
            precipitation: PredictionSeries::new(),
        };

        store.save_cache(&prediction).unwrap();
        let loaded = store.load_cache().unwrap();
        assert_eq!(loaded.updated_at, prediction.updated_at);
        assert_eq!(loaded.temperature.points().len(), 1);
    }

    #[test]
    fn missing_cache_is_an_error() {
        let store = WeatherStore::new(35.71, -78.61).with_cache_path("/nonexistent/cache.json");
        assert!(store.load_cache().is_err());
    }
}
