//! Per-connection submission eligibility.
//!
//! The [`RateLimiter`] holds one [`RateLimitRecord`] per live connection.
//! Records are created when a connection registers and dropped when it
//! disconnects, so a reconnecting client starts with a clean slate. An
//! identity without a record is never eligible.
//!
//! Two policies exist and the choice is fixed for the process lifetime:
//!
//! | Policy | Allowed when | Query answer |
//! |--------|--------------|--------------|
//! | Cooldown | `now - last_submit >= window` (or never submitted) | `{allowed, mode: timed, secondsLeft}` |
//! | Single-shot | never submitted | `{allowed, mode: single_shot}` |

use std::collections::HashMap;

use gridwall_types::{ConnectionId, Eligibility, RateMode, Timestamp};

/// Milliseconds per second, for window and countdown conversions.
const MILLIS_PER_SECOND: u64 = 1000;

/// The rate-limit policy, chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePolicy {
    /// Require `window_ms` between successive accepted submissions.
    Cooldown {
        /// Minimum gap between accepted submissions, in milliseconds.
        window_ms: u64,
    },
    /// Allow exactly one accepted submission per identity.
    SingleShot,
}

impl RatePolicy {
    /// Cooldown policy with a window given in whole seconds.
    pub const fn cooldown_seconds(seconds: u64) -> Self {
        Self::Cooldown {
            window_ms: seconds.saturating_mul(MILLIS_PER_SECOND),
        }
    }

    /// The wire-level mode name for this policy.
    pub const fn mode(self) -> RateMode {
        match self {
            Self::Cooldown { .. } => RateMode::Cooldown,
            Self::SingleShot => RateMode::SingleShot,
        }
    }

    const fn fresh_record(self) -> RateLimitRecord {
        match self {
            Self::Cooldown { .. } => RateLimitRecord::Cooldown { last_submit: None },
            Self::SingleShot => RateLimitRecord::SingleShot {
                has_submitted: false,
            },
        }
    }
}

/// Why the rate limiter refused a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    /// The cooldown window has not elapsed yet.
    #[error("timed restriction: wait {seconds_left}s")]
    Cooldown {
        /// Whole seconds until the window expires, rounded up. Always > 0.
        seconds_left: u64,
    },
    /// The connection already used its single submission.
    #[error("single-shot: you have already submitted and cannot submit again")]
    SingleShotUsed,
    /// The identity has no record: it disconnected or never registered.
    #[error("connection is not registered")]
    Unregistered,
}

/// Rate-limit state for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitRecord {
    /// Cooldown mode: time of the last accepted submission.
    Cooldown {
        /// `None` until the first accepted submission.
        last_submit: Option<Timestamp>,
    },
    /// Single-shot mode: whether the one submission has been used.
    SingleShot {
        /// Set on the first accepted submission and never cleared.
        has_submitted: bool,
    },
}

/// Eligibility policy keyed by connection identity.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RatePolicy,
    records: HashMap<ConnectionId, RateLimitRecord>,
}

impl RateLimiter {
    /// Create an empty limiter enforcing `policy`.
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            records: HashMap::new(),
        }
    }

    /// The policy in force.
    pub const fn policy(&self) -> RatePolicy {
        self.policy
    }

    /// Create a fresh record for a newly connected identity.
    ///
    /// Re-registering an identity resets its record.
    pub fn register(&mut self, id: ConnectionId) {
        self.records.insert(id, self.policy.fresh_record());
    }

    /// Drop the record of a disconnected identity.
    ///
    /// Returns `true` if a record existed.
    pub fn forget(&mut self, id: ConnectionId) -> bool {
        self.records.remove(&id).is_some()
    }

    /// Number of identities with a record.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// The record for `id`, if registered.
    pub fn record_of(&self, id: ConnectionId) -> Option<RateLimitRecord> {
        self.records.get(&id).copied()
    }

    /// Decide whether `id` may submit at `now`.
    ///
    /// An identity without a record is refused with [`Denial::Unregistered`].
    ///
    /// # Errors
    ///
    /// Returns the [`Denial`] explaining why the submission is refused.
    pub fn check(&self, id: ConnectionId, now: Timestamp) -> Result<(), Denial> {
        let record = self.record_of(id).ok_or(Denial::Unregistered)?;
        match record {
            RateLimitRecord::Cooldown { last_submit } => {
                let seconds_left = self.seconds_left(last_submit, now);
                if seconds_left == 0 {
                    Ok(())
                } else {
                    Err(Denial::Cooldown { seconds_left })
                }
            }
            RateLimitRecord::SingleShot { has_submitted } => {
                if has_submitted {
                    Err(Denial::SingleShotUsed)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Query form of [`check`](Self::check), as answered to `can_submit`.
    pub fn eligibility(&self, id: ConnectionId, now: Timestamp) -> Eligibility {
        let mode = self.policy.mode();
        let Some(record) = self.record_of(id) else {
            return Eligibility {
                allowed: false,
                mode,
                seconds_left: None,
            };
        };
        match record {
            RateLimitRecord::Cooldown { last_submit } => {
                let seconds_left = self.seconds_left(last_submit, now);
                Eligibility {
                    allowed: seconds_left == 0,
                    mode,
                    seconds_left: Some(seconds_left),
                }
            }
            RateLimitRecord::SingleShot { has_submitted } => Eligibility {
                allowed: !has_submitted,
                mode,
                seconds_left: None,
            },
        }
    }

    /// Note an accepted submission by `id` at `now`.
    ///
    /// Only an existing record is updated; an unregistered identity never
    /// gains one here.
    pub fn record(&mut self, id: ConnectionId, now: Timestamp) {
        let updated = match self.policy {
            RatePolicy::Cooldown { .. } => RateLimitRecord::Cooldown {
                last_submit: Some(now),
            },
            RatePolicy::SingleShot => RateLimitRecord::SingleShot {
                has_submitted: true,
            },
        };
        if let Some(record) = self.records.get_mut(&id) {
            *record = updated;
        }
    }

    /// `ceil(max(0, window - (now - last_submit)) / 1000)`; zero when the
    /// window has elapsed or there was no previous submission.
    fn seconds_left(&self, last_submit: Option<Timestamp>, now: Timestamp) -> u64 {
        let RatePolicy::Cooldown { window_ms } = self.policy else {
            return 0;
        };
        let Some(last) = last_submit else {
            return 0;
        };
        // A clock that stepped backwards counts as zero elapsed time.
        let elapsed = u64::try_from(now.saturating_sub(last)).unwrap_or(0);
        window_ms
            .saturating_sub(elapsed)
            .div_ceil(MILLIS_PER_SECOND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE_MS: Timestamp = 60_000;

    fn cooldown_limiter() -> (RateLimiter, ConnectionId) {
        let mut limiter = RateLimiter::new(RatePolicy::cooldown_seconds(60));
        let id = ConnectionId::new();
        limiter.register(id);
        (limiter, id)
    }

    #[test]
    fn first_submission_is_allowed_in_both_modes() {
        let (limiter, id) = cooldown_limiter();
        assert_eq!(limiter.check(id, 0), Ok(()));

        let mut single = RateLimiter::new(RatePolicy::SingleShot);
        single.register(id);
        assert_eq!(single.check(id, 0), Ok(()));
    }

    #[test]
    fn cooldown_blocks_until_window_elapses() {
        let (mut limiter, id) = cooldown_limiter();
        limiter.record(id, 0);

        assert_eq!(limiter.check(id, 30_000), Err(Denial::Cooldown { seconds_left: 30 }));
        assert_eq!(limiter.check(id, MINUTE_MS - 1), Err(Denial::Cooldown { seconds_left: 1 }));
        assert_eq!(limiter.check(id, MINUTE_MS), Ok(()));
        assert_eq!(limiter.check(id, 61_000), Ok(()));
    }

    #[test]
    fn seconds_left_rounds_up() {
        let (mut limiter, id) = cooldown_limiter();
        limiter.record(id, 0);
        assert_eq!(limiter.check(id, 29_001), Err(Denial::Cooldown { seconds_left: 31 }));
        assert_eq!(limiter.check(id, 1), Err(Denial::Cooldown { seconds_left: 60 }));
    }

    #[test]
    fn backwards_clock_counts_as_no_elapsed_time() {
        let (mut limiter, id) = cooldown_limiter();
        limiter.record(id, 10_000);
        assert_eq!(limiter.check(id, 5_000), Err(Denial::Cooldown { seconds_left: 60 }));
    }

    #[test]
    fn cooldown_eligibility_reports_seconds_left() {
        let (mut limiter, id) = cooldown_limiter();
        let fresh = limiter.eligibility(id, 0);
        assert!(fresh.allowed);
        assert_eq!(fresh.mode, RateMode::Cooldown);
        assert_eq!(fresh.seconds_left, Some(0));

        limiter.record(id, 0);
        let waiting = limiter.eligibility(id, 15_000);
        assert!(!waiting.allowed);
        assert_eq!(waiting.seconds_left, Some(45));
    }

    #[test]
    fn single_shot_is_permanent() {
        let mut limiter = RateLimiter::new(RatePolicy::SingleShot);
        let id = ConnectionId::new();
        limiter.register(id);
        limiter.record(id, 0);

        assert_eq!(limiter.check(id, 1), Err(Denial::SingleShotUsed));
        assert_eq!(limiter.check(id, Timestamp::MAX), Err(Denial::SingleShotUsed));

        let eligibility = limiter.eligibility(id, 0);
        assert!(!eligibility.allowed);
        assert_eq!(eligibility.mode, RateMode::SingleShot);
        assert_eq!(eligibility.seconds_left, None);
    }

    #[test]
    fn identities_are_independent() {
        let (mut limiter, a) = cooldown_limiter();
        let b = ConnectionId::new();
        limiter.register(b);
        limiter.record(a, 0);
        assert!(limiter.check(a, 1_000).is_err());
        assert_eq!(limiter.check(b, 1_000), Ok(()));
    }

    #[test]
    fn forget_discards_state() {
        let (mut limiter, id) = cooldown_limiter();
        limiter.record(id, 0);
        assert!(limiter.forget(id));
        assert_eq!(limiter.tracked(), 0);
        assert_eq!(limiter.record_of(id), None);
        assert!(!limiter.forget(id));
    }

    #[test]
    fn register_creates_fresh_record() {
        let (limiter, id) = cooldown_limiter();
        assert_eq!(
            limiter.record_of(id),
            Some(RateLimitRecord::Cooldown { last_submit: None })
        );
        let mut single = RateLimiter::new(RatePolicy::SingleShot);
        single.register(id);
        assert_eq!(
            single.record_of(id),
            Some(RateLimitRecord::SingleShot {
                has_submitted: false
            })
        );
    }

    #[test]
    fn unregistered_identity_is_refused_and_not_tracked() {
        let (mut limiter, known) = cooldown_limiter();
        let stranger = ConnectionId::new();

        assert_eq!(limiter.check(stranger, 0), Err(Denial::Unregistered));
        let eligibility = limiter.eligibility(stranger, 0);
        assert!(!eligibility.allowed);
        assert_eq!(eligibility.seconds_left, None);

        limiter.record(stranger, 0);
        assert_eq!(limiter.record_of(stranger), None);
        assert_eq!(limiter.tracked(), 1);

        assert!(limiter.forget(known));
        limiter.record(known, 0);
        assert_eq!(limiter.tracked(), 0);
        assert_eq!(limiter.check(known, 0), Err(Denial::Unregistered));
    }

    #[test]
    fn denial_messages_are_human_readable() {
        assert_eq!(
            Denial::Cooldown { seconds_left: 30 }.to_string(),
            "timed restriction: wait 30s"
        );
        assert!(Denial::SingleShotUsed.to_string().starts_with("single-shot"));
    }
}
