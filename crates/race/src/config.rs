use std::{env, time::Duration};

use anyhow::{Context, bail};
use uuid::Uuid;

use crate::speed_band::SpeedBandConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub poll_interval: Duration,
    pub bands: SpeedBandConfig,
    /// Race to keep a live poller running for, if any.
    pub live_race: Option<Uuid>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "postgres://docker:pg@0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3001".to_string())
            .parse::<u16>()
            .unwrap_or(3001);

        let poll_secs: u64 = parse_or("POLL_INTERVAL_SECS", &lookup, 10)?;
        if poll_secs == 0 {
            bail!("POLL_INTERVAL_SECS must be at least 1");
        }

        let slow_kmh: f64 = parse_or("BIKE_SLOW_KMH", &lookup, 25.0)?;
        let fast_kmh: f64 = parse_or("BIKE_FAST_KMH", &lookup, 35.0)?;
        let Some(bands) = SpeedBandConfig::from_kmh(slow_kmh, fast_kmh) else {
            bail!("bike speed band needs 0 < BIKE_SLOW_KMH < BIKE_FAST_KMH, got {slow_kmh} and {fast_kmh}");
        };

        let live_race = lookup("LIVE_RACE_ID")
            .map(|id| Uuid::parse_str(&id).context("LIVE_RACE_ID is not a UUID"))
            .transpose()?;

        Ok(Self {
            database_url,
            port,
            poll_interval: Duration::from_secs(poll_secs),
            bands,
            live_race,
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}
