//! Claim engine - the main public API for Minegate.
//!
//! `ClaimEngine` runs the full pipeline for one inbound claim:
//! validation, account gating, abuse screening, cooldown pre-check, streak
//! advance, atomic ledger commit, referral cascade, audit trail.

use crate::abuse::{AbuseDetector, AbuseVerdict};
use crate::accrual::{cooldown, streak, CooldownDecision};
use crate::audit::{AuditEntry, AuditLogger, AuditSink};
use crate::clock::{Clock, SystemClock};
use crate::config::MinegateConfig;
use crate::ledger::LedgerWriter;
use crate::model::AccountStatus;
use crate::referral::ReferralCascader;
use crate::request::{ClaimRequest, RequestMeta};
use crate::store::Store;
use crate::MinegateError;
use chrono::Duration;
use std::sync::Arc;
use tracing::warn;

/// Successful claim response.
#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    /// Points awarded for this claim.
    pub points_awarded: u64,

    /// Spendable balance after the claim.
    pub new_balance: u64,

    /// Streak length after the claim.
    pub streak: u32,

    /// Longest streak ever reached.
    pub longest_streak: u32,

    /// Multiplier applied to the base award.
    pub multiplier: f64,

    /// Whether the previous streak was reset by this claim.
    pub streak_broken: bool,

    /// Recorded session row id.
    pub session_id: u64,
}

/// Main claim engine for Minegate.
///
/// Create one instance per service and share it across request handlers;
/// the engine holds no per-request state and all exclusivity comes from the
/// injected store.
pub struct ClaimEngine {
    config: MinegateConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn Store>,
    audit: AuditLogger,
}

impl ClaimEngine {
    /// Create a new engine with the given configuration and collaborators.
    ///
    /// Uses the system clock for time operations.
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration validation fails.
    pub fn new(
        config: MinegateConfig,
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, MinegateError> {
        config.validate()?;
        Ok(Self::with_clock(config, store, audit, Arc::new(SystemClock)))
    }

    /// Create an engine with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        config: MinegateConfig,
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MinegateError> {
        config.validate()?;
        Ok(Self::with_clock(config, store, audit, clock))
    }

    fn with_clock(
        config: MinegateConfig,
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            clock,
            store,
            audit: AuditLogger::new(audit),
        }
    }

    /// Process one claim for an authenticated user.
    ///
    /// Preconditions are enforced in order: authenticated caller, active
    /// account, well-formed body, clean fraud signals, elapsed cooldown.
    /// Abuse blocks are audited before the error returns; cooldown blocks
    /// are expected traffic and are not audited. The admission decision is
    /// re-verified atomically inside the ledger commit, so concurrent
    /// duplicates of this call produce exactly one accepted claim.
    ///
    /// # Errors
    /// - `Authentication` - empty caller id (identity resolution failed upstream)
    /// - `Validation` - malformed request body
    /// - `AccountNotFound` - authenticated caller has no account
    /// - `AccountSuspended` - account is suspended or banned
    /// - `IpReuseBlocked` - another account recently claimed from this IP
    /// - `FingerprintConflict` - device fingerprint belongs to another account
    /// - `CooldownActive` - cooldown has not elapsed; carries the exact wait
    /// - `Persistence` - store unavailable or write rejected
    pub fn claim(
        &self,
        user_id: &str,
        request: &ClaimRequest,
        meta: &RequestMeta,
    ) -> Result<ClaimOutcome, MinegateError> {
        if user_id.is_empty() {
            return Err(MinegateError::Authentication);
        }
        request.validate()?;

        let now = self.clock.now_utc();
        let account = self
            .store
            .account(user_id)?
            .ok_or(MinegateError::AccountNotFound)?;
        if account.status != AccountStatus::Active {
            return Err(MinegateError::AccountSuspended);
        }

        let ip_window = chrono_duration(self.config.ip_reuse_window);
        let detector = AbuseDetector::new(self.store.as_ref(), ip_window);
        match detector.screen(user_id, &request.fingerprint_hash, &meta.source_ip, now)? {
            AbuseVerdict::Clear => {}
            AbuseVerdict::IpReuse { conflicting_user } => {
                self.audit
                    .record(AuditEntry::ip_blocked(user_id, meta, &conflicting_user, now));
                return Err(MinegateError::IpReuseBlocked);
            }
            AbuseVerdict::DeviceConflict { owner_id } => {
                self.audit.record(AuditEntry::fingerprint_conflict(
                    user_id,
                    meta,
                    &owner_id,
                    &request.fingerprint_hash,
                    now,
                ));
                return Err(MinegateError::FingerprintConflict);
            }
        }

        let cooldown = chrono_duration(self.config.cooldown);
        if let CooldownDecision::Waiting { remaining } =
            cooldown::evaluate(account.last_claim, cooldown, now)
        {
            return Err(MinegateError::CooldownActive {
                remaining_seconds: remaining.num_seconds(),
            });
        }

        let grace = chrono_duration(self.config.streak_grace);
        let update = streak::advance(account.last_claim, account.streak, grace, now);
        let multiplier = streak::multiplier_for(&self.config.multiplier_table, update.length);
        let points = streak::points_for(self.config.base_points, multiplier);

        let writer = LedgerWriter::new(self.store.as_ref(), self.config.credit_balance);
        let receipt = writer.commit(
            &account, update, multiplier, points, request, meta, cooldown, now,
        )?;

        // Post-commit side effects are best-effort: the claim already
        // happened, so failures are surfaced to operators, not the caller.
        let cascader = ReferralCascader::new(
            self.store.as_ref(),
            self.config.first_claim_bonus,
            self.config.recurring_referral_bonus,
        );
        if let Err(error) = cascader.cascade(&receipt.account, receipt.session_id, now) {
            warn!(
                user = user_id,
                session = receipt.session_id,
                %error,
                "referral cascade failed after committed claim; needs operator replay"
            );
        }

        self.audit.record(AuditEntry::claim_accepted(
            user_id,
            meta,
            receipt.points,
            receipt.account.streak,
            receipt.multiplier,
            now,
        ));

        Ok(ClaimOutcome {
            points_awarded: receipt.points,
            new_balance: receipt.account.balance,
            streak: receipt.account.streak,
            longest_streak: receipt.account.longest_streak,
            multiplier: receipt.multiplier,
            streak_broken: receipt.streak_broken,
            session_id: receipt.session_id,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &MinegateConfig {
        &self.config
    }
}

fn chrono_duration(d: std::time::Duration) -> Duration {
    Duration::from_std(d).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEvent;
    use crate::clock::MockClock;
    use crate::model::{ReferralEdge, UserAccount};
    use crate::request::fingerprint_from_signals;
    use crate::store::MemoryStore;

    const START: &str = "2025-03-01T12:00:00Z";

    fn request_for(device: &str) -> ClaimRequest {
        ClaimRequest {
            fingerprint_hash: fingerprint_from_signals(&[device]),
            device_descriptor: Some(device.to_string()),
        }
    }

    fn meta_from(ip: &str) -> RequestMeta {
        RequestMeta {
            source_ip: ip.to_string(),
            user_agent: "test-agent".to_string(),
        }
    }

    fn engine_at(store: Arc<MemoryStore>, clock: MockClock) -> ClaimEngine {
        ClaimEngine::new_with_clock(
            MinegateConfig::default(),
            store.clone(),
            store,
            Arc::new(clock),
        )
        .unwrap()
    }

    #[test]
    fn empty_user_id_is_an_authentication_error() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_at(store, MockClock::from_rfc3339(START));
        let result = engine.claim("", &request_for("d1"), &meta_from("203.0.113.7"));
        assert!(matches!(result, Err(MinegateError::Authentication)));
    }

    #[test]
    fn malformed_fingerprint_is_rejected_without_side_effects() {
        let store = Arc::new(MemoryStore::new());
        store.insert_account(UserAccount::new("u1"));
        let engine = engine_at(store.clone(), MockClock::from_rfc3339(START));

        let bad = ClaimRequest {
            fingerprint_hash: "not-hex".to_string(),
            device_descriptor: None,
        };
        let result = engine.claim("u1", &bad, &meta_from("203.0.113.7"));
        assert!(matches!(result, Err(MinegateError::Validation(_))));
        assert!(store.audit_entries().is_empty());
        assert!(store.sessions_for("u1").unwrap().is_empty());
    }

    #[test]
    fn unknown_account_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_at(store, MockClock::from_rfc3339(START));
        let result = engine.claim("ghost", &request_for("d1"), &meta_from("203.0.113.7"));
        assert!(matches!(result, Err(MinegateError::AccountNotFound)));
    }

    #[test]
    fn suspended_account_cannot_claim() {
        let store = Arc::new(MemoryStore::new());
        let mut account = UserAccount::new("u1");
        account.status = AccountStatus::Suspended;
        store.insert_account(account);

        let engine = engine_at(store, MockClock::from_rfc3339(START));
        let result = engine.claim("u1", &request_for("d1"), &meta_from("203.0.113.7"));
        assert!(matches!(result, Err(MinegateError::AccountSuspended)));
    }

    #[test]
    fn scenario_first_claim_cooldown_streak_and_reset() {
        let store = Arc::new(MemoryStore::new());
        store.insert_account(UserAccount::new("u1"));
        let clock = MockClock::from_rfc3339(START);
        let request = request_for("d1");
        let meta = meta_from("203.0.113.7");

        // First-ever claim: streak 1, multiplier 1.0, base points.
        let outcome = engine_at(store.clone(), clock.clone())
            .claim("u1", &request, &meta)
            .unwrap();
        assert_eq!(outcome.points_awarded, 10_000);
        assert_eq!(outcome.streak, 1);
        assert_eq!(outcome.multiplier, 1.0);
        assert!(!outcome.streak_broken);

        // Immediate retry the same hour: cooldown active.
        let retry = engine_at(store.clone(), clock.after(chrono::Duration::hours(1)))
            .claim("u1", &request, &meta);
        match retry {
            Err(MinegateError::CooldownActive { remaining_seconds }) => {
                assert_eq!(remaining_seconds, 23 * 3600);
            }
            other => panic!("expected cooldown, got {:?}", other.map(|o| o.streak)),
        }

        // +25h: inside the 36h grace, past the 24h cooldown. Streak grows.
        let second = engine_at(store.clone(), clock.after(chrono::Duration::hours(25)))
            .claim("u1", &request, &meta)
            .unwrap();
        assert_eq!(second.streak, 2);
        assert!(!second.streak_broken);

        // +25h+40h: the 40h gap exceeds grace. Claim succeeds, streak resets.
        let third = engine_at(store.clone(), clock.after(chrono::Duration::hours(65)))
            .claim("u1", &request, &meta)
            .unwrap();
        assert_eq!(third.streak, 1);
        assert!(third.streak_broken);
        assert_eq!(third.longest_streak, 2);
    }

    #[test]
    fn shared_ip_blocks_second_account_and_audits() {
        let store = Arc::new(MemoryStore::new());
        store.insert_account(UserAccount::new("x"));
        store.insert_account(UserAccount::new("y"));
        let clock = MockClock::from_rfc3339(START);
        let meta = meta_from("1.2.3.4");

        engine_at(store.clone(), clock.clone())
            .claim("x", &request_for("dx"), &meta)
            .unwrap();

        let result = engine_at(store.clone(), clock.after(chrono::Duration::hours(2)))
            .claim("y", &request_for("dy"), &meta);
        assert!(matches!(result, Err(MinegateError::IpReuseBlocked)));

        let blocks: Vec<_> = store
            .audit_entries()
            .into_iter()
            .filter(|e| e.event == AuditEvent::IpBlocked)
            .collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].user_id, "y");
        assert_eq!(blocks[0].detail["conflicting_user"], "x");
    }

    #[test]
    fn foreign_fingerprint_blocks_and_audits_without_rebinding() {
        let store = Arc::new(MemoryStore::new());
        store.insert_account(UserAccount::new("a"));
        store.insert_account(UserAccount::new("b"));
        let clock = MockClock::from_rfc3339(START);
        let shared = request_for("same-device");

        engine_at(store.clone(), clock.clone())
            .claim("a", &shared, &meta_from("203.0.113.7"))
            .unwrap();

        let result = engine_at(store.clone(), clock.after(chrono::Duration::hours(1)))
            .claim("b", &shared, &meta_from("198.51.100.1"));
        assert!(matches!(result, Err(MinegateError::FingerprintConflict)));

        // Binding untouched.
        assert_eq!(
            store.fingerprint(&shared.fingerprint_hash).unwrap().user_id,
            "a"
        );
        let conflicts: Vec<_> = store
            .audit_entries()
            .into_iter()
            .filter(|e| e.event == AuditEvent::FingerprintConflict)
            .collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].detail["owner"], "a");
    }

    #[test]
    fn cooldown_blocks_are_not_audited() {
        let store = Arc::new(MemoryStore::new());
        store.insert_account(UserAccount::new("u1"));
        let clock = MockClock::from_rfc3339(START);
        let request = request_for("d1");
        let meta = meta_from("203.0.113.7");

        engine_at(store.clone(), clock.clone())
            .claim("u1", &request, &meta)
            .unwrap();
        let _ = engine_at(store.clone(), clock.after(chrono::Duration::hours(1)))
            .claim("u1", &request, &meta);

        let events: Vec<_> = store.audit_entries().iter().map(|e| e.event).collect();
        assert_eq!(events, vec![AuditEvent::ClaimAccepted]);
    }

    #[test]
    fn streak_multiplier_applies_to_award() {
        let store = Arc::new(MemoryStore::new());
        let mut account = UserAccount::new("u1");
        // Mid-streak profile: next prompt claim is the seventh.
        account.streak = 6;
        account.claim_count = 6;
        account.last_claim = Some(
            MockClock::from_rfc3339(START)
                .now_utc()
                .checked_sub_signed(chrono::Duration::hours(25))
                .unwrap(),
        );
        store.insert_account(account);

        let outcome = engine_at(store, MockClock::from_rfc3339(START))
            .claim("u1", &request_for("d1"), &meta_from("203.0.113.7"))
            .unwrap();
        assert_eq!(outcome.streak, 7);
        assert_eq!(outcome.multiplier, 1.25);
        assert_eq!(outcome.points_awarded, 12_500);
    }

    #[test]
    fn referred_first_claim_pays_the_referrer() {
        let store = Arc::new(MemoryStore::new());
        store.insert_account(UserAccount::new("ref"));
        store.insert_account(UserAccount::referred("u1", "ref"));
        store.insert_edge(ReferralEdge::pending("ref", "u1"));

        engine_at(store.clone(), MockClock::from_rfc3339(START))
            .claim("u1", &request_for("d1"), &meta_from("203.0.113.7"))
            .unwrap();

        let referrer = store.account("ref").unwrap().unwrap();
        assert_eq!(referrer.balance, 2_500);
        assert_eq!(store.earnings().len(), 1);
    }

    #[test]
    fn legacy_mode_records_without_crediting_balance() {
        let store = Arc::new(MemoryStore::new());
        store.insert_account(UserAccount::new("u1"));
        let config = MinegateConfig {
            credit_balance: false,
            ..MinegateConfig::default()
        };
        let engine = ClaimEngine::new_with_clock(
            config,
            store.clone(),
            store.clone(),
            Arc::new(MockClock::from_rfc3339(START)),
        )
        .unwrap();

        let outcome = engine
            .claim("u1", &request_for("d1"), &meta_from("203.0.113.7"))
            .unwrap();
        assert_eq!(outcome.points_awarded, 10_000);
        assert_eq!(outcome.new_balance, 0);

        let account = store.account("u1").unwrap().unwrap();
        assert_eq!(account.balance, 0);
        assert_eq!(account.total_earned, 10_000);
        assert_eq!(store.sessions_for("u1").unwrap().len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let store = Arc::new(MemoryStore::new());
        let config = MinegateConfig {
            base_points: 0,
            ..MinegateConfig::default()
        };
        let result = ClaimEngine::new(config, store.clone(), store);
        assert!(matches!(result, Err(MinegateError::ConfigError(_))));
    }

    #[test]
    fn config_accessor_exposes_settings() {
        let store = Arc::new(MemoryStore::new());
        let engine = ClaimEngine::new(MinegateConfig::default(), store.clone(), store).unwrap();
        assert_eq!(engine.config().base_points, 10_000);
    }
}
