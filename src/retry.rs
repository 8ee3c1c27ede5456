//! Backoff for calls to the translation service.
//!
//! Only transient failures (see [`TranslateError::is_retryable`]) are
//! repeated. With the default single attempt a failing call returns at once,
//! so a save never waits longer than one timeout per field and language.

use crate::translation::TranslateError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const FIRST_PAUSE: Duration = Duration::from_millis(500);
const MAX_PAUSE: Duration = Duration::from_secs(2);

/// How many times a translation call is tried and how long to wait between
/// tries. Pauses double from 500ms and are capped at 2s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    attempts: u32,
}

impl Backoff {
    /// `attempts` includes the first call; zero is treated as one.
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause before attempt number `attempt`, counting the first call as 0.
    fn pause_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        FIRST_PAUSE.saturating_mul(factor).min(MAX_PAUSE)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Run `call` until it succeeds, fails permanently or runs out of attempts.
/// The last error is returned unchanged.
pub async fn retry_translation<F, Fut>(
    backoff: &Backoff,
    label: &str,
    mut call: F,
) -> Result<String, TranslateError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, TranslateError>>,
{
    let mut attempt = 0;
    loop {
        let pause = backoff.pause_before(attempt);
        if !pause.is_zero() {
            debug!(
                "{}: attempt {}/{} in {:?}",
                label,
                attempt + 1,
                backoff.attempts,
                pause
            );
            sleep(pause).await;
        }

        match call().await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() && attempt + 1 < backoff.attempts => {
                warn!(
                    "{}: attempt {}/{} failed, retrying: {}",
                    label,
                    attempt + 1,
                    backoff.attempts,
                    e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
