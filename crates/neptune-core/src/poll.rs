//! Fixed-interval polling shared by provisioning, deployment and `wait`.
//!
//! The three callers deliberately use different budgets:
//! provisioning waits without bound, the post-push deployment poll gives up
//! quietly after a fixed number of attempts, and `wait` fails on a timeout.

use crate::error::Result;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    /// Provisioning: every 2 s, no limit.
    pub const PROVISIONING: PollPolicy = PollPolicy {
        interval: Duration::from_secs(2),
        max_attempts: None,
        timeout: None,
    };

    /// Post-push deployment status: every 5 s, at most 60 attempts.
    pub const DEPLOYMENT: PollPolicy = PollPolicy {
        interval: Duration::from_secs(5),
        max_attempts: Some(60),
        timeout: None,
    };

    /// `wait`: every 2 s until the caller's timeout.
    pub fn wait(timeout: Duration) -> Self {
        PollPolicy {
            interval: Duration::from_secs(2),
            max_attempts: None,
            timeout: Some(timeout),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Result of one attempt.
pub enum Step<T> {
    Done(T),
    Pending(T),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Done(T),
    /// Attempt budget used up; carries the last observation.
    Exhausted(T),
    /// Timeout reached; carries the last observation.
    TimedOut(T),
}

impl<T> PollOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            PollOutcome::Done(v) | PollOutcome::Exhausted(v) | PollOutcome::TimedOut(v) => v,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, PollOutcome::Done(_))
    }
}

/// Run `attempt` until it reports `Done` or the policy's budget runs out.
/// Errors from `attempt` abort immediately.
pub fn poll<T>(
    policy: &PollPolicy,
    mut attempt: impl FnMut() -> Result<Step<T>>,
) -> Result<PollOutcome<T>> {
    let started = Instant::now();
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        let last = match attempt()? {
            Step::Done(v) => return Ok(PollOutcome::Done(v)),
            Step::Pending(v) => v,
        };
        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Ok(PollOutcome::Exhausted(last));
        }
        if policy.timeout.is_some_and(|t| started.elapsed() >= t) {
            return Ok(PollOutcome::TimedOut(last));
        }
        std::thread::sleep(policy.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NeptuneError;

    fn instant(max_attempts: Option<u32>) -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            max_attempts,
            timeout: None,
        }
    }

    #[test]
    fn stops_when_done() {
        let mut n = 0;
        let out = poll(&instant(None), || {
            n += 1;
            Ok(if n == 3 { Step::Done(n) } else { Step::Pending(n) })
        })
        .unwrap();
        assert_eq!(out, PollOutcome::Done(3));
    }

    #[test]
    fn exhausts_attempt_budget() {
        let mut n = 0;
        let out = poll(&instant(Some(4)), || {
            n += 1;
            Ok(Step::Pending(n))
        })
        .unwrap();
        assert_eq!(out, PollOutcome::Exhausted(4));
    }

    #[test]
    fn zero_timeout_times_out_after_first_attempt() {
        let policy = PollPolicy::wait(Duration::ZERO).with_interval(Duration::ZERO);
        let out = poll(&policy, || Ok(Step::Pending("Pending"))).unwrap();
        assert_eq!(out, PollOutcome::TimedOut("Pending"));
    }

    #[test]
    fn attempt_error_aborts() {
        let mut n = 0;
        let res: Result<PollOutcome<()>> = poll(&instant(None), || {
            n += 1;
            Err(NeptuneError::ProjectNotFound("x".into()))
        });
        assert!(res.is_err());
        assert_eq!(n, 1);
    }

    #[test]
    fn default_budgets() {
        assert_eq!(PollPolicy::PROVISIONING.max_attempts, None);
        assert_eq!(PollPolicy::DEPLOYMENT.max_attempts, Some(60));
        assert_eq!(PollPolicy::DEPLOYMENT.interval, Duration::from_secs(5));
    }
}
