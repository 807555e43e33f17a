//! Domain records persisted through the store.
//!
//! `UserAccount` is mutated only by the ledger commit and administrative
//! tooling. `ClaimSession`, `ReferralEarning`, and audit rows are
//! append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account standing. Anything other than `Active` cannot claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account in good standing.
    Active,
    /// Temporarily barred by an operator.
    Suspended,
    /// Permanently barred.
    Banned,
}

/// A user's points profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Stable user identity from the external identity resolver.
    pub id: String,

    /// Spendable point balance.
    pub balance: u64,

    /// Lifetime points earned, including referral bonuses received.
    pub total_earned: u64,

    /// Number of accepted claims.
    pub claim_count: u64,

    /// Time of the most recent accepted claim. `None` until the first.
    pub last_claim: Option<DateTime<Utc>>,

    /// Current consecutive-claim streak length.
    pub streak: u32,

    /// Longest streak ever reached.
    pub longest_streak: u32,

    /// Account standing.
    pub status: AccountStatus,

    /// Id of the user who referred this account, if any.
    pub referred_by: Option<String>,
}

impl UserAccount {
    /// Fresh active account with no claim history.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            balance: 0,
            total_earned: 0,
            claim_count: 0,
            last_claim: None,
            streak: 0,
            longest_streak: 0,
            status: AccountStatus::Active,
            referred_by: None,
        }
    }

    /// Fresh account linked to a referrer.
    pub fn referred(id: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self {
            referred_by: Some(referrer.into()),
            ..Self::new(id)
        }
    }
}

/// A device fingerprint bound to exactly one owning user.
///
/// One hash maps to at most one user; a collision is a fraud signal, never a
/// silent rebind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    /// SHA-256 hash of client-derived signals, lowercase hex.
    pub hash: String,

    /// Owning user.
    pub user_id: String,

    /// When the fingerprint was first registered.
    pub first_seen: DateTime<Utc>,

    /// When the fingerprint was last presented by its owner.
    pub last_seen: DateTime<Utc>,
}

/// One accepted claim. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSession {
    /// Store-assigned session id.
    pub id: u64,

    /// Claiming user.
    pub user_id: String,

    /// Points awarded after the streak multiplier.
    pub points: u64,

    /// Source IP from transport metadata.
    pub source_ip: String,

    /// User-agent from transport metadata.
    pub user_agent: String,

    /// Fingerprint presented with the claim.
    pub fingerprint_hash: String,

    /// Commit time.
    pub claimed_at: DateTime<Utc>,
}

/// Referral edge lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralEdgeStatus {
    /// Created at signup, no qualifying claim yet.
    Pending,
    /// Referred user has claimed; recurring bonuses flow.
    Active,
    /// Disqualified by an operator or the cascade; pays nothing.
    Invalid,
}

/// The relationship between a referrer and the user they referred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralEdge {
    /// User who made the referral.
    pub referrer_id: String,

    /// User who was referred.
    pub referred_id: String,

    /// Edge lifecycle state.
    pub status: ReferralEdgeStatus,

    /// Set exactly once, when the first-claim bonus is paid.
    pub first_claim_bonus_paid: bool,

    /// Set by the signup flow, outside this engine.
    pub signup_bonus_paid: bool,
}

impl ReferralEdge {
    /// Pending edge with no bonuses paid, as created at signup.
    pub fn pending(referrer_id: impl Into<String>, referred_id: impl Into<String>) -> Self {
        Self {
            referrer_id: referrer_id.into(),
            referred_id: referred_id.into(),
            status: ReferralEdgeStatus::Pending,
            first_claim_bonus_paid: false,
            signup_bonus_paid: false,
        }
    }
}

/// Which rule produced a referral payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningKind {
    /// One-time bonus for the referred user's first accepted claim.
    FirstClaim,
    /// Per-claim bonus while the edge is active.
    Recurring,
}

/// Append-only ledger line for a bonus paid to a referrer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralEarning {
    /// User receiving the bonus.
    pub referrer_id: String,

    /// Referred user whose claim triggered it.
    pub referred_id: String,

    /// Bonus amount in points.
    pub amount: u64,

    /// Which rule paid out.
    pub kind: EarningKind,

    /// Claim session that triggered the payout.
    pub session_id: u64,

    /// Payout time.
    pub earned_at: DateTime<Utc>,
}
