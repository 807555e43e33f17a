//! In-memory store backend.
//!
//! One mutex guards all tables, so every [`Store`] method is atomic with
//! respect to concurrent claims — the same guarantee a database backend
//! provides with conditional updates and unique constraints. Doubles as the
//! test backend and the reference for the trait's semantics.

use crate::accrual::cooldown::{self, CooldownDecision};
use crate::audit::{AuditEntry, AuditSink};
use crate::model::{
    ClaimSession, DeviceFingerprint, ReferralEarning, ReferralEdge, ReferralEdgeStatus,
    UserAccount,
};
use crate::store::{BindOutcome, ClaimCommit, ClaimUpdate, Store};
use crate::MinegateError;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, UserAccount>,
    fingerprints: HashMap<String, DeviceFingerprint>,
    sessions: Vec<ClaimSession>,
    // Keyed by referred user: one referrer per account.
    edges: HashMap<String, ReferralEdge>,
    earnings: Vec<ReferralEarning>,
    audit: Vec<AuditEntry>,
    next_session_id: u64,
}

/// Mutex-guarded in-memory implementation of [`Store`] and
/// [`AuditSink`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account. Account creation belongs to the signup flow, not
    /// the engine, so this is an inherent method rather than part of the
    /// [`Store`] trait.
    pub fn insert_account(&self, account: UserAccount) {
        let mut tables = self.lock();
        tables.accounts.insert(account.id.clone(), account);
    }

    /// Seed a referral edge, as the signup flow would.
    pub fn insert_edge(&self, edge: ReferralEdge) {
        let mut tables = self.lock();
        tables.edges.insert(edge.referred_id.clone(), edge);
    }

    /// Snapshot of a bound fingerprint, for tests and review tooling.
    pub fn fingerprint(&self, hash: &str) -> Option<DeviceFingerprint> {
        self.lock().fingerprints.get(hash).cloned()
    }

    /// All referral earnings recorded so far.
    pub fn earnings(&self) -> Vec<ReferralEarning> {
        self.lock().earnings.clone()
    }

    /// All audit entries recorded so far.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.lock().audit.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned lock means a panic mid-write; propagating the panic is
        // the only sound option for an in-memory backend.
        self.tables.lock().expect("memory store lock poisoned")
    }
}

impl Store for MemoryStore {
    fn account(&self, user_id: &str) -> Result<Option<UserAccount>, MinegateError> {
        Ok(self.lock().accounts.get(user_id).cloned())
    }

    fn commit_claim(
        &self,
        user_id: &str,
        expected_last_claim: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        cooldown: Duration,
        update: ClaimUpdate,
    ) -> Result<ClaimCommit, MinegateError> {
        let mut tables = self.lock();
        let account = tables
            .accounts
            .get(user_id)
            .ok_or(MinegateError::AccountNotFound)?;

        // Guard: the row must be unchanged since the decision was computed,
        // and the cooldown predicate must hold against the stored value.
        let unchanged = account.last_claim == expected_last_claim;
        let admissible = cooldown::evaluate(account.last_claim, cooldown, now);
        if !unchanged || admissible != CooldownDecision::Ready {
            let remaining = match admissible {
                CooldownDecision::Ready => Duration::zero(),
                CooldownDecision::Waiting { remaining } => remaining,
            };
            return Ok(ClaimCommit::Rejected { remaining });
        }

        let session_id = tables.next_session_id;
        tables.next_session_id += 1;

        let account = tables
            .accounts
            .get_mut(user_id)
            .ok_or(MinegateError::AccountNotFound)?;
        account.last_claim = Some(now);
        account.streak = update.streak;
        account.longest_streak = account.longest_streak.max(update.streak);
        account.claim_count += 1;
        account.total_earned += update.points;
        if update.credit_balance {
            account.balance += update.points;
        }
        let snapshot = account.clone();

        tables.sessions.push(ClaimSession {
            id: session_id,
            user_id: user_id.to_string(),
            points: update.points,
            source_ip: update.source_ip,
            user_agent: update.user_agent,
            fingerprint_hash: update.fingerprint_hash,
            claimed_at: now,
        });

        Ok(ClaimCommit::Applied {
            account: snapshot,
            session_id,
        })
    }

    fn bind_fingerprint(
        &self,
        hash: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome, MinegateError> {
        let mut tables = self.lock();
        match tables.fingerprints.get_mut(hash) {
            None => {
                tables.fingerprints.insert(
                    hash.to_string(),
                    DeviceFingerprint {
                        hash: hash.to_string(),
                        user_id: user_id.to_string(),
                        first_seen: now,
                        last_seen: now,
                    },
                );
                Ok(BindOutcome::Registered)
            }
            Some(fp) if fp.user_id == user_id => {
                fp.last_seen = now;
                Ok(BindOutcome::Refreshed)
            }
            Some(fp) => Ok(BindOutcome::OwnedByOther {
                owner_id: fp.user_id.clone(),
            }),
        }
    }

    fn recent_ip_use(
        &self,
        ip: &str,
        user_id: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, MinegateError> {
        let tables = self.lock();
        Ok(tables
            .sessions
            .iter()
            .rev()
            .find(|s| s.source_ip == ip && s.user_id != user_id && now - s.claimed_at <= window)
            .map(|s| s.user_id.clone()))
    }

    fn referral_edge(&self, referred_id: &str) -> Result<Option<ReferralEdge>, MinegateError> {
        Ok(self.lock().edges.get(referred_id).cloned())
    }

    fn settle_first_claim_bonus(
        &self,
        referrer_id: &str,
        referred_id: &str,
    ) -> Result<bool, MinegateError> {
        let mut tables = self.lock();
        match tables.edges.get_mut(referred_id) {
            Some(edge)
                if edge.referrer_id == referrer_id
                    && edge.status != ReferralEdgeStatus::Invalid
                    && !edge.first_claim_bonus_paid =>
            {
                edge.first_claim_bonus_paid = true;
                if edge.status == ReferralEdgeStatus::Pending {
                    edge.status = ReferralEdgeStatus::Active;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn credit_referrer(&self, referrer_id: &str, amount: u64) -> Result<(), MinegateError> {
        let mut tables = self.lock();
        let account = tables
            .accounts
            .get_mut(referrer_id)
            .ok_or(MinegateError::AccountNotFound)?;
        account.balance += amount;
        account.total_earned += amount;
        Ok(())
    }

    fn record_earning(&self, earning: ReferralEarning) -> Result<(), MinegateError> {
        self.lock().earnings.push(earning);
        Ok(())
    }

    fn sessions_for(&self, user_id: &str) -> Result<Vec<ClaimSession>, MinegateError> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl AuditSink for MemoryStore {
    fn append(&self, entry: AuditEntry) -> Result<(), MinegateError> {
        self.lock().audit.push(entry);
        Ok(())
    }
}
