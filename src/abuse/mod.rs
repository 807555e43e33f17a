//! Multi-signal abuse detection.
//!
//! Two ordered checks, each able to terminate a claim: shared-IP reuse,
//! then device-fingerprint collision. Both run before any ledger mutation
//! and are re-evaluated on every claim — fingerprints and IPs can be reused
//! fraudulently at any time, so nothing here is cached.

pub mod device;
pub mod ip;

use crate::store::Store;
use crate::MinegateError;
use chrono::{DateTime, Duration, Utc};

/// Screening result, handled exhaustively by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbuseVerdict {
    /// No fraud signal; the fingerprint is now bound or refreshed.
    Clear,
    /// Another account claimed from this IP inside the reuse window.
    IpReuse {
        /// The account that claimed first.
        conflicting_user: String,
    },
    /// The fingerprint is bound to a different account.
    DeviceConflict {
        /// The account the fingerprint belongs to.
        owner_id: String,
    },
}

/// Runs the ordered fraud checks against the store.
pub struct AbuseDetector<'a> {
    store: &'a dyn Store,
    ip_reuse_window: Duration,
}

impl<'a> AbuseDetector<'a> {
    /// Detector over the given store.
    pub fn new(store: &'a dyn Store, ip_reuse_window: Duration) -> Self {
        Self {
            store,
            ip_reuse_window,
        }
    }

    /// Screen one claim.
    ///
    /// The IP check runs first: a blocked claim must not register its
    /// fingerprint. A clear IP check proceeds to the fingerprint bind,
    /// which registers a globally-unseen hash to the claiming user as a
    /// side effect.
    pub fn screen(
        &self,
        user_id: &str,
        fingerprint_hash: &str,
        source_ip: &str,
        now: DateTime<Utc>,
    ) -> Result<AbuseVerdict, MinegateError> {
        if let Some(conflicting_user) =
            ip::check_reuse(self.store, source_ip, user_id, self.ip_reuse_window, now)?
        {
            return Ok(AbuseVerdict::IpReuse { conflicting_user });
        }

        if let Some(owner_id) = device::resolve(self.store, fingerprint_hash, user_id, now)? {
            return Ok(AbuseVerdict::DeviceConflict { owner_id });
        }

        Ok(AbuseVerdict::Clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserAccount;
    use crate::store::{ClaimUpdate, MemoryStore};
    use chrono::TimeZone;

    const WINDOW: Duration = Duration::hours(24);

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn seed_claim(store: &MemoryStore, user: &str, ip: &str, now: DateTime<Utc>) {
        store.insert_account(UserAccount::new(user));
        store
            .commit_claim(
                user,
                None,
                now,
                WINDOW,
                ClaimUpdate {
                    points: 10_000,
                    streak: 1,
                    streak_broken: false,
                    credit_balance: true,
                    source_ip: ip.to_string(),
                    user_agent: "test-agent".to_string(),
                    fingerprint_hash: "a".repeat(64),
                },
            )
            .unwrap();
    }

    #[test]
    fn clear_when_no_signals_fire() {
        let store = MemoryStore::new();
        let detector = AbuseDetector::new(&store, WINDOW);
        let verdict = detector.screen("u1", "fp-1", "203.0.113.7", at(0)).unwrap();
        assert_eq!(verdict, AbuseVerdict::Clear);
    }

    #[test]
    fn second_account_on_shared_ip_is_blocked() {
        let store = MemoryStore::new();
        seed_claim(&store, "u1", "203.0.113.7", at(0));

        let detector = AbuseDetector::new(&store, WINDOW);
        let verdict = detector.screen("u2", "fp-2", "203.0.113.7", at(1)).unwrap();
        assert_eq!(
            verdict,
            AbuseVerdict::IpReuse {
                conflicting_user: "u1".to_string()
            }
        );
    }

    #[test]
    fn ip_block_does_not_register_the_fingerprint() {
        let store = MemoryStore::new();
        seed_claim(&store, "u1", "203.0.113.7", at(0));

        let detector = AbuseDetector::new(&store, WINDOW);
        detector.screen("u2", "fp-2", "203.0.113.7", at(1)).unwrap();
        assert!(store.fingerprint("fp-2").is_none());
    }

    #[test]
    fn foreign_fingerprint_is_blocked() {
        let store = MemoryStore::new();
        let detector = AbuseDetector::new(&store, WINDOW);

        detector.screen("u1", "fp-1", "203.0.113.7", at(0)).unwrap();
        let verdict = detector.screen("u2", "fp-1", "198.51.100.1", at(1)).unwrap();
        assert_eq!(
            verdict,
            AbuseVerdict::DeviceConflict {
                owner_id: "u1".to_string()
            }
        );
    }

    #[test]
    fn signals_re_evaluated_every_claim() {
        let store = MemoryStore::new();
        let detector = AbuseDetector::new(&store, WINDOW);

        // Clear once does not mean clear forever: u1's later claim from the
        // shared IP turns u2's next attempt into a block.
        assert_eq!(
            detector.screen("u2", "fp-2", "203.0.113.7", at(0)).unwrap(),
            AbuseVerdict::Clear
        );
        seed_claim(&store, "u1", "203.0.113.7", at(1));
        assert!(matches!(
            detector.screen("u2", "fp-2", "203.0.113.7", at(2)).unwrap(),
            AbuseVerdict::IpReuse { .. }
        ));
    }
}
