//! Retry-with-backoff for rate-limited stores.
//!
//! Remote spreadsheet services throttle aggressively. [`RetryStore`] wraps any
//! [`GridStore`] and re-issues a call that failed with
//! [`StoreError::RateLimited`], sleeping `initial_delay * backoff_factor^n`
//! before retry `n` (or the server's `retry_after`, when that is longer).
//! Every other error is returned on the spot.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::traits::{GridStore, RawGrid, UpdateInstruction, WorksheetRef};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry, in seconds when serialized.
    #[serde(with = "duration_secs")]
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Full sleep schedule: one entry per permitted retry.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|n| self.delay_for(n)).collect()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

type SleepFn = Box<dyn Fn(Duration) + Send + Sync>;

/// [`GridStore`] wrapper that retries rate-limited calls.
pub struct RetryStore<S> {
    inner: S,
    config: RetryConfig,
    sleep: SleepFn,
}

impl<S: GridStore> RetryStore<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self::with_sleep(inner, config, std::thread::sleep)
    }

    /// Use `sleep` instead of blocking the thread; tests record the delays.
    pub fn with_sleep(
        inner: S,
        config: RetryConfig,
        sleep: impl Fn(Duration) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            config,
            sleep: Box::new(sleep),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn call<T>(
        &self,
        operation: &'static str,
        mut op: impl FnMut(&S) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut retry = 0;
        loop {
            match op(&self.inner) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && retry < self.config.max_retries => {
                    let backoff = self.config.delay_for(retry);
                    let delay = err.retry_after().map_or(backoff, |hint| hint.max(backoff));
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        operation,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "grid store rate limited; retrying"
                    );
                    #[cfg(not(feature = "tracing"))]
                    let _ = operation;
                    (self.sleep)(delay);
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<S: GridStore> GridStore for RetryStore<S> {
    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, StoreError> {
        self.call("list_worksheets", |s| s.list_worksheets())
    }

    fn worksheet_by_name(&self, name: &str) -> Result<WorksheetRef, StoreError> {
        self.call("worksheet_by_name", |s| s.worksheet_by_name(name))
    }

    fn read_cells(&self, worksheet: &WorksheetRef, span: &str) -> Result<RawGrid, StoreError> {
        self.call("read_cells", |s| s.read_cells(worksheet, span))
    }

    fn batch_write(
        &self,
        worksheet: &WorksheetRef,
        updates: &[UpdateInstruction],
    ) -> Result<(), StoreError> {
        self.call("batch_write", |s| s.batch_write(worksheet, updates))
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), StoreError> {
        self.call("clear", |s| s.clear(worksheet))
    }
}
