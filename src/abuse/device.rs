//! Device-fingerprint resolution.
//!
//! First presentation of a globally-unseen hash registers it to the
//! claiming user. The owner's later presentations refresh last-seen. A hash
//! bound to someone else is a collision: the claim is blocked and the
//! binding is never transferred.

use crate::store::{BindOutcome, Store};
use crate::MinegateError;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Resolve a presented fingerprint for a user.
///
/// Returns `Some(owner_id)` when the hash belongs to a different account
/// (block the claim); `None` when it is now bound or refreshed for this
/// user. Binding is atomic inside the store, so two first-time devices
/// racing on one hash cannot bind to two different users.
pub fn resolve(
    store: &dyn Store,
    fingerprint_hash: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, MinegateError> {
    match store.bind_fingerprint(fingerprint_hash, user_id, now)? {
        BindOutcome::Registered => {
            debug!(user = user_id, "fingerprint registered on first use");
            Ok(None)
        }
        BindOutcome::Refreshed => Ok(None),
        BindOutcome::OwnedByOther { owner_id } => {
            debug!(
                user = user_id,
                owner = %owner_id,
                "fingerprint collision"
            );
            Ok(Some(owner_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn first_use_registers_to_claimant() {
        let store = MemoryStore::new();
        assert_eq!(resolve(&store, "fp-1", "u1", at(0)).unwrap(), None);

        let fp = store.fingerprint("fp-1").unwrap();
        assert_eq!(fp.user_id, "u1");
    }

    #[test]
    fn owner_reuse_refreshes_last_seen() {
        let store = MemoryStore::new();
        resolve(&store, "fp-1", "u1", at(0)).unwrap();
        resolve(&store, "fp-1", "u1", at(5)).unwrap();

        let fp = store.fingerprint("fp-1").unwrap();
        assert_eq!(fp.first_seen, at(0));
        assert_eq!(fp.last_seen, at(5));
    }

    #[test]
    fn collision_names_the_owner_and_keeps_the_binding() {
        let store = MemoryStore::new();
        resolve(&store, "fp-1", "u1", at(0)).unwrap();

        let owner = resolve(&store, "fp-1", "u2", at(1)).unwrap();
        assert_eq!(owner, Some("u1".to_string()));
        // Binding unchanged; collision does not refresh last-seen either.
        let fp = store.fingerprint("fp-1").unwrap();
        assert_eq!(fp.user_id, "u1");
        assert_eq!(fp.last_seen, at(0));
    }
}
