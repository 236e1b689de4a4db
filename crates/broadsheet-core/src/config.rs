//! Configuration module
//!
//! Settings are read from the environment (a `.env` file is loaded first when
//! present). Every value has a default so a bare checkout can run the worker
//! against a local SQLite file.

use std::env;
use std::str::FromStr;
use std::time::Duration;

const DATABASE_URL: &str = "sqlite://broadsheet.db";
const DB_MAX_CONNECTIONS: u32 = 5;
const STORAGE_PATH: &str = ".";
const SERVER_PORT: u16 = 3000;

const MAX_RETRIES: i32 = 3;
const BATCH_SIZE: i64 = 5;
const POLL_INTERVAL_MS: u64 = 10_000;
const RETRY_DELAY_MS: u64 = 5_000;
const DRAIN_DELAY_MS: u64 = 1_000;
const MAX_WIDTH: u32 = 1200;
const MAX_HEIGHT: u32 = 1200;
const DITHER_TIMEOUT_MS: u64 = 120_000;
const STALE_PROCESSING_GRACE_SECS: i64 = 900;
const STALE_REAP_INTERVAL_SECS: u64 = 60;
const PROCESSED_PREFIX: &str = "images/processed";

/// Options of the processing queue and worker loop.
#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    /// Attempt ceiling for automatic selection.
    pub max_retries: i32,
    /// Rows selected per batch.
    pub batch_size: i64,
    /// Idle wait between batches when nothing was eligible.
    pub poll_interval_ms: u64,
    /// Wait after an unexpected loop-level error.
    pub retry_delay_ms: u64,
    /// Short wait between batches while a backlog is draining.
    pub drain_delay_ms: u64,
    pub max_width: u32,
    pub max_height: u32,
    /// Upper bound for a single dithering run. 0 = unbounded.
    pub dither_timeout_ms: u64,
    /// Age after which a `processing` claim is considered abandoned.
    pub stale_processing_grace_secs: i64,
    /// Interval between stale-claim sweeps in the worker loop. 0 = disabled.
    pub stale_reap_interval_secs: u64,
    /// Storage prefix under which dithered outputs are written.
    pub processed_prefix: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            batch_size: BATCH_SIZE,
            poll_interval_ms: POLL_INTERVAL_MS,
            retry_delay_ms: RETRY_DELAY_MS,
            drain_delay_ms: DRAIN_DELAY_MS,
            max_width: MAX_WIDTH,
            max_height: MAX_HEIGHT,
            dither_timeout_ms: DITHER_TIMEOUT_MS,
            stale_processing_grace_secs: STALE_PROCESSING_GRACE_SECS,
            stale_reap_interval_secs: STALE_REAP_INTERVAL_SECS,
            processed_prefix: PROCESSED_PREFIX.to_string(),
        }
    }
}

impl ProcessingConfig {
    pub fn from_env() -> Self {
        Self {
            max_retries: env_or("IMAGE_MAX_RETRIES", MAX_RETRIES),
            batch_size: env_or("IMAGE_BATCH_SIZE", BATCH_SIZE),
            poll_interval_ms: env_or("IMAGE_POLL_INTERVAL_MS", POLL_INTERVAL_MS),
            retry_delay_ms: env_or("IMAGE_RETRY_DELAY_MS", RETRY_DELAY_MS),
            drain_delay_ms: env_or("IMAGE_DRAIN_DELAY_MS", DRAIN_DELAY_MS),
            max_width: env_or("IMAGE_MAX_WIDTH", MAX_WIDTH),
            max_height: env_or("IMAGE_MAX_HEIGHT", MAX_HEIGHT),
            dither_timeout_ms: env_or("IMAGE_DITHER_TIMEOUT_MS", DITHER_TIMEOUT_MS),
            stale_processing_grace_secs: env_or(
                "IMAGE_STALE_GRACE_SECS",
                STALE_PROCESSING_GRACE_SECS,
            ),
            stale_reap_interval_secs: env_or(
                "IMAGE_STALE_REAP_INTERVAL_SECS",
                STALE_REAP_INTERVAL_SECS,
            ),
            processed_prefix: env::var("IMAGE_PROCESSED_PREFIX")
                .unwrap_or_else(|_| PROCESSED_PREFIX.to_string()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn drain_delay(&self) -> Duration {
        Duration::from_millis(self.drain_delay_ms)
    }

    pub fn dither_timeout(&self) -> Option<Duration> {
        (self.dither_timeout_ms > 0).then(|| Duration::from_millis(self.dither_timeout_ms))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_retries < 1 {
            return Err(anyhow::anyhow!("IMAGE_MAX_RETRIES must be at least 1"));
        }
        if self.batch_size < 1 {
            return Err(anyhow::anyhow!("IMAGE_BATCH_SIZE must be at least 1"));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(anyhow::anyhow!(
                "IMAGE_MAX_WIDTH and IMAGE_MAX_HEIGHT must be greater than zero"
            ));
        }
        if self.stale_processing_grace_secs < 0 {
            return Err(anyhow::anyhow!("IMAGE_STALE_GRACE_SECS cannot be negative"));
        }
        if self.stale_reap_interval_secs > 0 {
            // A reclaimed row must never still be dithering under its old claim.
            if self.dither_timeout_ms == 0 {
                return Err(anyhow::anyhow!(
                    "IMAGE_DITHER_TIMEOUT_MS must be set while the stale reaper is enabled"
                ));
            }
            let grace_ms = u64::try_from(self.stale_processing_grace_secs)
                .unwrap_or(0)
                .saturating_mul(1000);
            if grace_ms <= self.dither_timeout_ms {
                return Err(anyhow::anyhow!(
                    "IMAGE_STALE_GRACE_SECS must exceed IMAGE_DITHER_TIMEOUT_MS"
                ));
            }
        }
        let prefix = self.processed_prefix.trim_matches('/');
        if prefix.is_empty() || prefix.contains("..") {
            return Err(anyhow::anyhow!(
                "IMAGE_PROCESSED_PREFIX must be a relative path without '..'"
            ));
        }
        Ok(())
    }
}

/// Application configuration shared by the worker, the API and the CLI.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Root directory that `original_path` and processed keys are relative to.
    pub storage_path: String,
    pub server_port: u16,
    pub processing: ProcessingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| DATABASE_URL.to_string()),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", DB_MAX_CONNECTIONS),
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| STORAGE_PATH.to_string()),
            server_port: env_or("SERVER_PORT", SERVER_PORT),
            processing: ProcessingConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a SQLite connection string (sqlite://...)"
            ));
        }
        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }
        self.processing.validate()
    }
}

/// Read and parse an environment variable, falling back to `default` when it is
/// unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_defaults() {
        let config = ProcessingConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.poll_interval(), Duration::from_millis(10_000));
        assert_eq!(config.retry_delay(), Duration::from_millis(5_000));
        assert_eq!((config.max_width, config.max_height), (1200, 1200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        let config = ProcessingConfig {
            dither_timeout_ms: 0,
            stale_reap_interval_secs: 0,
            ..ProcessingConfig::default()
        };
        assert_eq!(config.dither_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reaper_requires_grace_beyond_dither_timeout() {
        let unbounded = ProcessingConfig {
            dither_timeout_ms: 0,
            ..ProcessingConfig::default()
        };
        assert!(unbounded.validate().is_err());

        let short_grace = ProcessingConfig {
            dither_timeout_ms: 120_000,
            stale_processing_grace_secs: 120,
            ..ProcessingConfig::default()
        };
        assert!(short_grace.validate().is_err());

        let ok = ProcessingConfig {
            dither_timeout_ms: 120_000,
            stale_processing_grace_secs: 121,
            ..ProcessingConfig::default()
        };
        assert!(ok.validate().is_ok());

        let reaper_off = ProcessingConfig {
            stale_processing_grace_secs: 0,
            stale_reap_interval_secs: 0,
            ..ProcessingConfig::default()
        };
        assert!(reaper_off.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_batch = ProcessingConfig {
            batch_size: 0,
            ..ProcessingConfig::default()
        };
        assert!(zero_batch.validate().is_err());

        let escaping_prefix = ProcessingConfig {
            processed_prefix: "../outside".to_string(),
            ..ProcessingConfig::default()
        };
        assert!(escaping_prefix.validate().is_err());

        let config = Config {
            database_url: "postgresql://localhost/db".to_string(),
            db_max_connections: 5,
            storage_path: ".".to_string(),
            server_port: 3000,
            processing: ProcessingConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("BROADSHEET_TEST_ENV_OR", "not-a-number");
        assert_eq!(env_or("BROADSHEET_TEST_ENV_OR", 7u32), 7);
        std::env::set_var("BROADSHEET_TEST_ENV_OR", " 12 ");
        assert_eq!(env_or("BROADSHEET_TEST_ENV_OR", 7u32), 12);
        std::env::remove_var("BROADSHEET_TEST_ENV_OR");
    }
}
