// sources/retry.rs
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Shape of the delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`
    Exponential,
}

impl FromStr for Backoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Backoff::Linear),
            "exponential" | "exp" => Ok(Backoff::Exponential),
            other => Err(format!("unknown backoff '{other}' (expected linear|exponential)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Delay slept after failed attempt `attempt` (1-based), before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let factor = match self.backoff {
            Backoff::Linear => attempt,
            Backoff::Exponential => 2u32.saturating_pow(attempt - 1),
        };
        self.base_delay.saturating_mul(factor)
    }

    /// Total backoff slept before attempt `attempt` starts.
    pub fn min_wait_before(&self, attempt: u32) -> Duration {
        (1..attempt).map(|a| self.delay_after(a)).sum()
    }
}

#[derive(Debug)]
pub enum AttemptOutcome {
    Succeeded,
    Retrying(String),
    GaveUp(String),
}

/// One attempt, kept only long enough to be logged.
#[derive(Debug)]
pub struct FetchAttempt {
    pub attempt: u32,
    pub waited: Duration,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for FetchAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let waited = self.waited.as_millis();
        match &self.outcome {
            AttemptOutcome::Succeeded => {
                write!(f, "attempt {} succeeded after {waited}ms of backoff", self.attempt)
            }
            AttemptOutcome::Retrying(e) => write!(f, "attempt {} failed: {e}", self.attempt),
            AttemptOutcome::GaveUp(e) => write!(f, "attempt {} failed, giving up: {e}", self.attempt),
        }
    }
}

#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempt(s): {}", self.attempts, self.last)
    }
}

/// Runs `op` until it succeeds, returns a non-retryable error, or
/// `policy.max_attempts` is reached. The backoff is slept between attempts,
/// never after the final one.
pub fn retry<T, E, F, P>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    F: FnMut(u32) -> Result<T, E>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let started = Instant::now();
        let waited = policy.min_wait_before(attempt);

        match op(attempt) {
            Ok(value) => {
                let record = FetchAttempt {
                    attempt,
                    waited,
                    outcome: AttemptOutcome::Succeeded,
                };
                debug!(elapsed_ms = started.elapsed().as_millis() as u64, "{label}: {record}");
                return Ok(value);
            }
            Err(e) => {
                if !is_retryable(&e) || attempt >= max_attempts {
                    let record = FetchAttempt {
                        attempt,
                        waited,
                        outcome: AttemptOutcome::GaveUp(e.to_string()),
                    };
                    warn!(max_attempts, "{label}: {record}");
                    return Err(RetryError { attempts: attempt, last: e });
                }

                let delay = policy.delay_after(attempt);
                let record = FetchAttempt {
                    attempt,
                    waited,
                    outcome: AttemptOutcome::Retrying(e.to_string()),
                };
                warn!(
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "{label}: {record}"
                );

                std::thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}
