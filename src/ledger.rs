//! Ledger writer: the single path that records an accepted claim.
//!
//! Wraps the store's guarded commit. The streak, multiplier, and point
//! amount are computed from a profile snapshot; the commit applies only
//! while the stored last-claim time still matches that snapshot and
//! satisfies the cooldown. A rejected commit means a concurrent duplicate
//! won the window or the snapshot was stale, and surfaces as a cooldown
//! error with the wait recomputed from the stored row.

use crate::accrual::StreakUpdate;
use crate::model::UserAccount;
use crate::request::{ClaimRequest, RequestMeta};
use crate::store::{ClaimCommit, ClaimUpdate, Store};
use crate::MinegateError;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Result of a committed claim.
#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    /// Account state after the commit.
    pub account: UserAccount,
    /// Inserted session row id.
    pub session_id: u64,
    /// Points awarded.
    pub points: u64,
    /// Multiplier that produced the award.
    pub multiplier: f64,
    /// Whether the streak reset on this claim.
    pub streak_broken: bool,
}

/// Commits accepted claims through the store.
pub struct LedgerWriter<'a> {
    store: &'a dyn Store,
    credit_balance: bool,
}

impl<'a> LedgerWriter<'a> {
    /// Writer over the given store.
    pub fn new(store: &'a dyn Store, credit_balance: bool) -> Self {
        Self {
            store,
            credit_balance,
        }
    }

    /// Commit one claim computed against the `snapshot` profile.
    ///
    /// # Errors
    /// - `CooldownActive` — the guarded update did not apply (cooldown
    ///   running, or a concurrent claim landed first)
    /// - `Persistence` — the store rejected the write outright
    pub fn commit(
        &self,
        snapshot: &UserAccount,
        streak: StreakUpdate,
        multiplier: f64,
        points: u64,
        request: &ClaimRequest,
        meta: &RequestMeta,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> Result<ClaimReceipt, MinegateError> {
        let commit = self.store.commit_claim(
            &snapshot.id,
            snapshot.last_claim,
            now,
            cooldown,
            ClaimUpdate {
                points,
                streak: streak.length,
                streak_broken: streak.broken,
                credit_balance: self.credit_balance,
                source_ip: meta.source_ip.clone(),
                user_agent: meta.user_agent.clone(),
                fingerprint_hash: request.fingerprint_hash.clone(),
            },
        )?;

        match commit {
            ClaimCommit::Applied {
                account,
                session_id,
            } => {
                debug!(
                    user = %account.id,
                    session = session_id,
                    points,
                    streak = streak.length,
                    "claim committed"
                );
                Ok(ClaimReceipt {
                    account,
                    session_id,
                    points,
                    multiplier,
                    streak_broken: streak.broken,
                })
            }
            ClaimCommit::Rejected { remaining } => Err(MinegateError::CooldownActive {
                remaining_seconds: remaining.num_seconds(),
            }),
        }
    }
}
