use std::{str::FromStr, time::Duration};

use anyhow::{anyhow, Context};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_INACTIVITY: Duration = Duration::from_millis(10_000);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(15_000);

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// How long a participant may go without a heartbeat.
    pub inactivity: Duration,
    pub sweep_interval: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv::dotenv().ok();

        let database_url = dotenv::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = optional("PORT")?.unwrap_or(DEFAULT_PORT);
        let inactivity = window("INACTIVITY_MS", optional("INACTIVITY_MS")?, DEFAULT_INACTIVITY)?;
        let sweep_interval = window("SWEEP_INTERVAL_MS", optional("SWEEP_INTERVAL_MS")?, DEFAULT_SWEEP_INTERVAL)?;

        if sweep_interval.is_zero() {
            return Err(anyhow!("SWEEP_INTERVAL_MS must be positive"));
        }

        Ok(Config {
            database_url,
            port,
            inactivity,
            sweep_interval,
        })
    }
}

fn optional<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .with_context(|| format!("invalid {key}: {raw:?}")),
        Err(_) => Ok(None),
    }
}

/// Millisecond windows are compared against epoch-millisecond `i64`s, so they
/// must fit in one.
fn window(key: &str, millis: Option<u64>, default: Duration) -> anyhow::Result<Duration> {
    match millis {
        None => Ok(default),
        Some(ms) if ms > i64::MAX as u64 => Err(anyhow!("{key} is too large: {ms}")),
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_when_unset() {
        assert_eq!(window("INACTIVITY_MS", None, DEFAULT_INACTIVITY).unwrap(), DEFAULT_INACTIVITY);
    }

    #[test]
    fn window_accepts_up_to_i64_max() {
        let max = i64::MAX as u64;
        assert_eq!(
            window("INACTIVITY_MS", Some(max), DEFAULT_INACTIVITY).unwrap(),
            Duration::from_millis(max)
        );
        assert_eq!(
            window("INACTIVITY_MS", Some(2_500), DEFAULT_INACTIVITY).unwrap(),
            Duration::from_millis(2_500)
        );
    }

    #[test]
    fn window_rejects_values_past_i64_max() {
        let err = window("INACTIVITY_MS", Some(u64::MAX), DEFAULT_INACTIVITY).unwrap_err();
        assert!(err.to_string().contains("INACTIVITY_MS"));
    }
}
