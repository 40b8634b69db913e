//! Bounded retry for calls the platform may reject while a previous update is
//! still being applied.
//!
//! Lambda answers a configuration update that arrives while a code update is
//! in flight with `ResourceConflictException`. The loop here retries such
//! transient failures on a fixed or exponential schedule, gives up on the
//! first permanent failure, and checks the deadline before every retry so no
//! attempt starts after it has elapsed.

use std::fmt::Display;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::contract::ValidationError;

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_DEADLINE: Duration = Duration::from_secs(20);

/// Platform error codes that describe a condition expected to clear by itself.
pub const TRANSIENT_ERROR_CODES: &[&str] = &[
    "ResourceConflictException",
    "TooManyRequestsException",
    "ServiceException",
    "EC2ThrottledException",
    "ThrottlingException",
    "RequestTimeout",
    "RequestTimeoutException",
    "InternalFailure",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Transient,
    Permanent,
}

pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

/// Unknown and missing codes are permanent, so authorization and validation
/// failures end the loop on the first attempt.
pub fn classify_error_code(code: Option<&str>) -> FailureKind {
    match code {
        Some(code) if TRANSIENT_ERROR_CODES.contains(&code) => FailureKind::Transient,
        _ => FailureKind::Permanent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Backoff {
    Fixed(Duration),
    Exponential {
        initial: Duration,
        factor: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the `failed_attempt`-th attempt (1-based).
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match *self {
            Self::Fixed(interval) => interval,
            Self::Exponential {
                initial,
                factor,
                max,
            } => {
                let exponent = failed_attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let scaled = initial.as_secs_f64() * factor.powi(exponent);
                if !scaled.is_finite() || scaled >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(scaled)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Fixed(DEFAULT_RETRY_INTERVAL),
            deadline: DEFAULT_RETRY_DEADLINE,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        backoff: Backoff,
        deadline: Duration,
    ) -> Result<Self, ValidationError> {
        if max_attempts == 0 {
            return Err(ValidationError::new(
                "retry max_attempts must be a positive integer",
            ));
        }
        if deadline.is_zero() {
            return Err(ValidationError::new("retry deadline must be positive"));
        }
        if let Backoff::Exponential { factor, .. } = backoff {
            if !factor.is_finite() || factor < 1.0 {
                return Err(ValidationError::new(
                    "retry backoff factor must be a finite number >= 1.0",
                ));
            }
        }
        Ok(Self {
            max_attempts,
            backoff,
            deadline,
        })
    }

    /// Fixed interval when `factor` is 1.0, exponential capped at `deadline`
    /// otherwise.
    pub fn from_interval(
        max_attempts: u32,
        interval: Duration,
        factor: f64,
        deadline: Duration,
    ) -> Result<Self, ValidationError> {
        let backoff = if factor == 1.0 {
            Backoff::Fixed(interval)
        } else {
            Backoff::Exponential {
                initial: interval,
                factor,
                max: deadline,
            }
        };
        Self::new(max_attempts, backoff, deadline)
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("permanent failure on attempt {attempts}: {error}")]
    Permanent { attempts: u32, error: E },
    #[error("gave up after {attempts} attempts: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: E },
    #[error("retry deadline of {}s elapsed after {attempts} attempts: {last_error}", .deadline.as_secs_f64())]
    DeadlineExceeded {
        attempts: u32,
        deadline: Duration,
        last_error: E,
    },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Permanent { attempts, .. }
            | Self::AttemptsExhausted { attempts, .. }
            | Self::DeadlineExceeded { attempts, .. } => *attempts,
        }
    }

    pub fn last_error(&self) -> &E {
        match self {
            Self::Permanent { error, .. } => error,
            Self::AttemptsExhausted { last_error, .. }
            | Self::DeadlineExceeded { last_error, .. } => last_error,
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, runs out of
/// attempts, or the next attempt could not start before the deadline.
///
/// `operation` receives the 1-based attempt number.
pub fn retry_with_policy<T, E, F>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    mut operation: F,
) -> Result<RetryOutcome<T>, RetryError<E>>
where
    E: Classify + Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let started_at = clock.now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let error = match operation(attempt) {
            Ok(value) => {
                return Ok(RetryOutcome {
                    value,
                    attempts: attempt,
                    elapsed: clock.now().saturating_duration_since(started_at),
                });
            }
            Err(error) => error,
        };

        if error.failure_kind() == FailureKind::Permanent {
            return Err(RetryError::Permanent {
                attempts: attempt,
                error,
            });
        }

        if attempt >= policy.max_attempts {
            return Err(RetryError::AttemptsExhausted {
                attempts: attempt,
                last_error: error,
            });
        }

        let delay = policy.backoff.delay_after(attempt);
        let elapsed = clock.now().saturating_duration_since(started_at);
        if elapsed + delay >= policy.deadline {
            return Err(RetryError::DeadlineExceeded {
                attempts: attempt,
                deadline: policy.deadline,
                last_error: error,
            });
        }

        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error,
            "transient failure, retrying"
        );
        clock.sleep(delay);

        if clock.now().saturating_duration_since(started_at) >= policy.deadline {
            return Err(RetryError::DeadlineExceeded {
                attempts: attempt,
                deadline: policy.deadline,
                last_error: error,
            });
        }
    }
}
