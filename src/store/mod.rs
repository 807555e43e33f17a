//! Persistence seam for the claim engine.
//!
//! The engine never talks to a database directly; it is handed a [`Store`]
//! at construction. The trait's contract places every check-then-act pair
//! (cooldown admission, fingerprint binding, first-bonus settlement) inside
//! a single store call so the backend can make it atomic: a conditional
//! `UPDATE ... WHERE`, a unique-constrained insert, or — in the bundled
//! [`memory::MemoryStore`] — one mutex acquisition.

pub mod memory;

pub use memory::MemoryStore;

use crate::model::{ClaimSession, ReferralEarning, ReferralEdge, UserAccount};
use crate::MinegateError;
use chrono::{DateTime, Duration, Utc};

/// Per-claim state delta applied by [`Store::commit_claim`].
#[derive(Debug, Clone)]
pub struct ClaimUpdate {
    /// Points awarded after the streak multiplier.
    pub points: u64,
    /// New streak length.
    pub streak: u32,
    /// Whether the streak reset on this claim.
    pub streak_broken: bool,
    /// Whether to credit the spendable balance.
    pub credit_balance: bool,
    /// Source IP recorded on the session row.
    pub source_ip: String,
    /// User-agent recorded on the session row.
    pub user_agent: String,
    /// Fingerprint recorded on the session row.
    pub fingerprint_hash: String,
}

/// Outcome of the guarded claim commit.
#[derive(Debug, Clone)]
pub enum ClaimCommit {
    /// The conditional update applied. Carries the post-commit account
    /// snapshot and the id of the inserted session row.
    Applied {
        /// Account state after the write.
        account: UserAccount,
        /// Session row id.
        session_id: u64,
    },
    /// The guard failed: the stored last-claim time changed since it was
    /// read, or the cooldown predicate is unsatisfied. Carries the wait
    /// computed from the stored row; zero means an immediate retry would
    /// be admissible.
    Rejected {
        /// Remaining cooldown wait.
        remaining: Duration,
    },
}

/// Outcome of a conditional fingerprint bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// First global use; the hash is now bound to the presenting user.
    Registered,
    /// Already bound to the presenting user; last-seen refreshed.
    Refreshed,
    /// Bound to a different user. Never rebinds.
    OwnedByOther {
        /// The user the hash is bound to.
        owner_id: String,
    },
}

/// Storage contract the claim engine runs against.
///
/// Implementations must make each method atomic with respect to concurrent
/// calls; the engine performs no synchronization of its own.
pub trait Store: Send + Sync {
    /// Profile snapshot for a user, or `None` if unknown.
    fn account(&self, user_id: &str) -> Result<Option<UserAccount>, MinegateError>;

    /// Guarded claim commit: apply `update`, advance `last_claim` to `now`,
    /// and insert the session row, but only if the stored last-claim time
    /// still equals `expected_last_claim` and satisfies the cooldown
    /// predicate. The sole mutation path for last-claim, streak, and
    /// balance.
    fn commit_claim(
        &self,
        user_id: &str,
        expected_last_claim: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        cooldown: Duration,
        update: ClaimUpdate,
    ) -> Result<ClaimCommit, MinegateError>;

    /// Conditionally bind a fingerprint hash to a user. Unique on the hash:
    /// an unbound hash binds to the caller, the owner's presentation
    /// refreshes last-seen, anyone else gets [`BindOutcome::OwnedByOther`].
    fn bind_fingerprint(
        &self,
        hash: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome, MinegateError>;

    /// Id of another user with an accepted claim from `ip` within `window`
    /// of `now`, excluding `user_id` itself.
    fn recent_ip_use(
        &self,
        ip: &str,
        user_id: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, MinegateError>;

    /// Referral edge pointing at a referred user, if one exists.
    fn referral_edge(&self, referred_id: &str) -> Result<Option<ReferralEdge>, MinegateError>;

    /// Test-and-set of the first-claim-bonus flag on the edge from
    /// `referrer_id` to `referred_id`. Returns `true` iff the flag was
    /// unset and is now set; also promotes a pending edge to active.
    /// Invalid edges never settle.
    fn settle_first_claim_bonus(
        &self,
        referrer_id: &str,
        referred_id: &str,
    ) -> Result<bool, MinegateError>;

    /// Credit bonus points to a referrer's balance and lifetime total.
    fn credit_referrer(&self, referrer_id: &str, amount: u64) -> Result<(), MinegateError>;

    /// Append a referral earning ledger line.
    fn record_earning(&self, earning: ReferralEarning) -> Result<(), MinegateError>;

    /// Accepted claims for a user, oldest first. Review tooling support.
    fn sessions_for(&self, user_id: &str) -> Result<Vec<ClaimSession>, MinegateError>;
}
