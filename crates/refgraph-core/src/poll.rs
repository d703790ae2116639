//! Poll a remote status until it reaches a terminal state.
//!
//! Export job status checks and flow unlock retries all share one shape:
//! sleep, ask for the current state, stop once the state is terminal or the
//! budget runs out. Callers pass the client handle in through the `check`
//! closure; nothing here holds global state.
//!
//! ```rust,ignore
//! let job = poll_until(
//!     &PollConfig::export_job(),
//!     || client.export_job_status(&job_id),
//!     |status| status.state != JobState::Started,
//! )?;
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::ErrorCode;

/// Interval and budget for [`poll_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep before each status check.
    pub interval: Duration,
    /// Give up once this much time has passed since the first check started.
    pub timeout: Duration,
    /// Optional cap on the number of checks.
    pub max_attempts: Option<u32>,
}

impl PollConfig {
    #[must_use]
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            max_attempts: None,
        }
    }

    /// Architect export jobs: check every second for up to 90 seconds.
    #[must_use]
    pub const fn export_job() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(90))
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// A terminal state together with how long it took to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled<S> {
    pub state: S,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Why polling stopped without a terminal state.
#[derive(Debug)]
pub enum PollError<E> {
    /// The status check itself failed. Check errors are not retried.
    Check { attempt: u32, source: E },
    /// The time or attempt budget ran out.
    TimedOut { elapsed: Duration, attempts: u32 },
}

impl<E> PollError<E> {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Check { .. } => ErrorCode::PollCheckFailed,
            Self::TimedOut { .. } => ErrorCode::PollTimedOut,
        }
    }
}

impl<E: fmt::Display> fmt::Display for PollError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check { attempt, source } => {
                write!(f, "status check failed on attempt {attempt}: {source}")
            }
            Self::TimedOut { elapsed, attempts } => write!(
                f,
                "timed out after {:.3}s and {attempts} checks waiting for a terminal state",
                elapsed.as_secs_f64()
            ),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for PollError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Check { source, .. } => Some(source),
            Self::TimedOut { .. } => None,
        }
    }
}

/// Call `check` every `config.interval` until `is_terminal` accepts its result.
///
/// The budget is tested before each sleep, so at least one check always
/// runs unless `max_attempts` is zero.
///
/// # Errors
///
/// Returns [`PollError::Check`] on the first failing check and
/// [`PollError::TimedOut`] when the budget is exhausted.
pub fn poll_until<S, E, C, T>(
    config: &PollConfig,
    mut check: C,
    is_terminal: T,
) -> Result<Polled<S>, PollError<E>>
where
    C: FnMut() -> Result<S, E>,
    T: Fn(&S) -> bool,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        let elapsed = started.elapsed();
        let attempts_exhausted = config.max_attempts.is_some_and(|max| attempts >= max);
        if elapsed > config.timeout || attempts_exhausted {
            debug!(attempts, ?elapsed, "polling budget exhausted");
            return Err(PollError::TimedOut { elapsed, attempts });
        }

        std::thread::sleep(config.interval);
        attempts += 1;

        let state = check().map_err(|source| PollError::Check {
            attempt: attempts,
            source,
        })?;

        if is_terminal(&state) {
            let elapsed = started.elapsed();
            debug!(attempts, ?elapsed, "reached terminal state");
            return Ok(Polled {
                state,
                attempts,
                elapsed,
            });
        }

        trace!(attempts, "state not terminal yet");
    }
}
