//! Referral bonus cascade.
//!
//! Runs only after a committed claim. A referred user's first-ever claim
//! pays the referrer a one-time bonus through an atomic test-and-set of the
//! edge's flag, promoting a pending edge to active; every later claim on an
//! active edge pays a smaller recurring bonus. Each payout leaves one
//! `ReferralEarning` ledger line.

use crate::model::{EarningKind, ReferralEarning, ReferralEdgeStatus, UserAccount};
use crate::store::Store;
use crate::MinegateError;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Applies referral bonuses after a committed claim.
pub struct ReferralCascader<'a> {
    store: &'a dyn Store,
    first_claim_bonus: u64,
    recurring_bonus: u64,
}

impl<'a> ReferralCascader<'a> {
    /// Cascader over the given store.
    pub fn new(store: &'a dyn Store, first_claim_bonus: u64, recurring_bonus: u64) -> Self {
        Self {
            store,
            first_claim_bonus,
            recurring_bonus,
        }
    }

    /// Cascade for the claim that produced `account` (post-commit snapshot)
    /// and `session_id`.
    ///
    /// Returns the earning that was paid, if any. Errors here must not
    /// abort the caller's already-committed claim; the engine logs and
    /// continues.
    pub fn cascade(
        &self,
        account: &UserAccount,
        session_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<ReferralEarning>, MinegateError> {
        let Some(edge) = self.store.referral_edge(&account.id)? else {
            return Ok(None);
        };
        if edge.status == ReferralEdgeStatus::Invalid {
            return Ok(None);
        }

        // claim_count is post-commit: 1 means the committed claim was the
        // user's first ever. The test-and-set makes the first bonus
        // at-most-once even when duplicates race.
        let first_claim = account.claim_count == 1;
        let (amount, kind) = if first_claim
            && self
                .store
                .settle_first_claim_bonus(&edge.referrer_id, &account.id)?
        {
            (self.first_claim_bonus, EarningKind::FirstClaim)
        } else if edge.status == ReferralEdgeStatus::Active {
            (self.recurring_bonus, EarningKind::Recurring)
        } else {
            return Ok(None);
        };

        self.store.credit_referrer(&edge.referrer_id, amount)?;
        let earning = ReferralEarning {
            referrer_id: edge.referrer_id.clone(),
            referred_id: account.id.clone(),
            amount,
            kind,
            session_id,
            earned_at: now,
        };
        self.store.record_earning(earning.clone())?;
        debug!(
            referrer = %earning.referrer_id,
            referred = %earning.referred_id,
            amount,
            kind = ?kind,
            "referral bonus paid"
        );
        Ok(Some(earning))
    }
}
