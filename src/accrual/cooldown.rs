//! Cooldown gate: may this user claim again yet?

use chrono::{DateTime, Duration, Utc};

/// Outcome of a cooldown evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    /// Enough time has elapsed; the claim may proceed.
    Ready,
    /// The cooldown is still running.
    Waiting {
        /// Exact remaining wait, for a user-facing countdown.
        remaining: Duration,
    },
}

/// Evaluate the cooldown predicate.
///
/// A user with no prior claim is always `Ready`. Otherwise the claim is
/// admissible iff `now - last_claim >= cooldown`.
///
/// Pure and side-effect free. Callers use it for the user-facing pre-check;
/// the store re-runs the same predicate under its write lock so a race
/// between check and write cannot double-admit.
pub fn evaluate(
    last_claim: Option<DateTime<Utc>>,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> CooldownDecision {
    match last_claim {
        None => CooldownDecision::Ready,
        Some(last) => {
            let elapsed = now - last;
            if elapsed >= cooldown {
                CooldownDecision::Ready
            } else {
                CooldownDecision::Waiting {
                    remaining: cooldown - elapsed,
                }
            }
        }
    }
}
