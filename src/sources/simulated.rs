//! Synthetic glucose cache for demonstration and offline use
//!
//! Produces a slow sine wave around a base value with a little random
//! jitter, sampled every five minutes like a real CGM sensor.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use glucowatch_core::{BloodSugar, CacheError, GlucoseCache, LoadFuture, Reading, Series, Units};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

/// Sensor sampling period
const SAMPLE_MINUTES: i64 = 5;

/// Configuration for the simulated source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Center of the wave, mg/dL
    #[serde(default = "default_base")]
    pub base_mgdl: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude_mgdl: f64,
    /// Wave period in minutes
    #[serde(default = "default_period")]
    pub period_minutes: f64,
    /// Maximum random jitter added to the current reading, mg/dL
    #[serde(default = "default_jitter")]
    pub jitter_mgdl: f64,
    /// Simulated network latency of a fresh load
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Fail every Nth fresh current-reading load; 0 never fails
    #[serde(default)]
    pub fail_every: u32,
}

fn default_base() -> f64 {
    130.0
}

fn default_amplitude() -> f64 {
    70.0
}

fn default_period() -> f64 {
    240.0
}

fn default_jitter() -> f64 {
    4.0
}

fn default_latency_ms() -> u64 {
    400
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_mgdl: default_base(),
            amplitude_mgdl: default_amplitude(),
            period_minutes: default_period(),
            jitter_mgdl: default_jitter(),
            latency_ms: default_latency_ms(),
            fail_every: 0,
        }
    }
}

impl SimulationConfig {
    /// Noise-free value of the wave at a point in time
    pub fn value_at(&self, time: DateTime<Utc>) -> f64 {
        let minutes = time.timestamp() as f64 / 60.0;
        let period = self.period_minutes.max(1.0);
        self.base_mgdl + self.amplitude_mgdl * (2.0 * PI * minutes / period).sin()
    }
}

#[derive(Debug)]
struct CacheState {
    current: Reading,
    today: Series,
    yesterday: Series,
    changed: bool,
    current_loads: u32,
}

/// In-memory [`GlucoseCache`] fed by a synthetic signal
#[derive(Clone)]
pub struct SimulatedCache {
    config: SimulationConfig,
    units: Units,
    state: Arc<Mutex<CacheState>>,
}

impl SimulatedCache {
    /// Create an empty cache; the first fresh load fills it
    pub fn new(config: SimulationConfig, units: Units) -> Self {
        Self {
            config,
            units,
            state: Arc::new(Mutex::new(CacheState {
                current: Reading::placeholder(),
                today: Vec::new(),
                yesterday: Vec::new(),
                changed: false,
                current_loads: 0,
            })),
        }
    }

    fn latency(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.config.latency_ms)
    }

    fn lock(state: &Mutex<CacheState>) -> std::sync::MutexGuard<'_, CacheState> {
        state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Start of the latest sensor slot at or before `now`
fn sample_slot(now: DateTime<Utc>) -> DateTime<Utc> {
    let step = SAMPLE_MINUTES * 60;
    let secs = now.timestamp() - now.timestamp().rem_euclid(step);
    Utc.timestamp_opt(secs, 0).single().unwrap_or(now)
}

/// Local midnight of the day containing `now`, as UTC
fn local_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.with_timezone(&Local)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| now - Duration::hours(24))
}

fn trend_arrow(delta: f64) -> &'static str {
    match delta {
        d if d > 15.0 => "↑↑",
        d if d > 7.0 => "↑",
        d if d > 3.0 => "↗",
        d if d >= -3.0 => "→",
        d if d >= -7.0 => "↘",
        d if d >= -15.0 => "↓",
        _ => "↓↓",
    }
}

/// Sample the wave between `from` (inclusive) and `to` (inclusive)
pub(crate) fn sample_series(config: &SimulationConfig, from: DateTime<Utc>, to: DateTime<Utc>) -> Series {
    let mut series = Vec::new();
    let mut slot = sample_slot(from);
    if slot < from {
        slot += Duration::minutes(SAMPLE_MINUTES);
    }
    while slot <= to {
        series.push(BloodSugar::new(config.value_at(slot).round(), slot));
        slot += Duration::minutes(SAMPLE_MINUTES);
    }
    series
}

pub(crate) fn simulated_reading(config: &SimulationConfig, units: Units, now: DateTime<Utc>, jitter: f64) -> Reading {
    let slot = sample_slot(now);
    let value = (config.value_at(slot) + jitter).round().max(39.0);
    let previous = config.value_at(slot - Duration::minutes(SAMPLE_MINUTES)).round();
    let delta = value - previous;
    let delta_in_units = match units {
        Units::MgDl => delta,
        Units::MmolL => delta / glucowatch_types::units::MMOL_TO_MGDL,
    };

    // Uploader battery drains slowly over the day
    let minutes_today = (slot - local_midnight(slot)).num_minutes();
    let battery = 100 - (minutes_today / 20).clamp(0, 80);

    Reading {
        sgv: units.format_mgdl(value),
        sgv_value: value,
        delta,
        delta_string: format!("{:+.1}", delta_in_units),
        delta_arrow: trend_arrow(delta).to_string(),
        time: Some(slot),
        battery: format!("{}%", battery),
        iob: format!("{:.1}U", (slot.timestamp() / 60 % 30) as f64 / 10.0),
        rawbg: units.format_mgdl(value + jitter * 2.0),
        noise: if jitter.abs() > 3.0 { "Light" } else { "Clean" }.to_string(),
    }
}

impl GlucoseCache for SimulatedCache {
    fn current_reading(&self) -> Reading {
        Self::lock(&self.state).current.clone()
    }

    fn load_current_reading(&self) -> LoadFuture<Reading> {
        let config = self.config.clone();
        let units = self.units;
        let state = self.state.clone();
        let latency = self.latency();

        Box::pin(async move {
            tokio::time::sleep(latency).await;

            let jitter = if config.jitter_mgdl > 0.0 {
                rand::thread_rng().gen_range(-config.jitter_mgdl..=config.jitter_mgdl)
            } else {
                0.0
            };

            let mut state = Self::lock(&state);
            state.current_loads += 1;
            if config.fail_every > 0 && state.current_loads % config.fail_every == 0 {
                return Err(CacheError::Unreachable("simulated outage".to_string()));
            }

            let reading = simulated_reading(&config, units, Utc::now(), jitter);
            if reading.time != state.current.time {
                log::debug!("New simulated reading {} at {:?}", reading.sgv, reading.time);
                state.current = reading.clone();
                state.changed = true;
            }
            Ok(state.current.clone())
        })
    }

    fn today_series(&self) -> Series {
        Self::lock(&self.state).today.clone()
    }

    fn load_today_series(&self) -> LoadFuture<Series> {
        let config = self.config.clone();
        let state = self.state.clone();
        let latency = self.latency();

        Box::pin(async move {
            tokio::time::sleep(latency).await;
            let now = Utc::now();
            let series = sample_series(&config, local_midnight(now), now);

            let mut state = Self::lock(&state);
            if state.today.last() != series.last() {
                state.today = series.clone();
                state.changed = true;
            }
            Ok(series)
        })
    }

    fn yesterday_series(&self) -> Series {
        Self::lock(&self.state).yesterday.clone()
    }

    fn load_yesterday_series(&self) -> LoadFuture<Series> {
        let config = self.config.clone();
        let state = self.state.clone();
        let latency = self.latency();

        Box::pin(async move {
            tokio::time::sleep(latency).await;
            let midnight = local_midnight(Utc::now());
            let series = sample_series(
                &config,
                midnight - Duration::hours(24),
                midnight - Duration::seconds(1),
            );

            let mut state = Self::lock(&state);
            if state.yesterday.first() != series.first() {
                state.yesterday = series.clone();
                state.changed = true;
            }
            Ok(series)
        })
    }

    fn has_changed_since_last_check(&self) -> bool {
        std::mem::replace(&mut Self::lock(&self.state).changed, false)
    }
}
