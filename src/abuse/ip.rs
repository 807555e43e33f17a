//! Shared-IP reuse check.
//!
//! Penalizes the *second* distinct account seen on an IP inside the window:
//! the first claimant holds the address, later accounts are blocked until
//! the window expires. Weak against VPN rotation, but it catches the common
//! one-device account farm.

use crate::store::Store;
use crate::MinegateError;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Return the conflicting user id if another account has an accepted claim
/// from `source_ip` within `window` of `now`.
pub fn check_reuse(
    store: &dyn Store,
    source_ip: &str,
    user_id: &str,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Option<String>, MinegateError> {
    let conflict = store.recent_ip_use(source_ip, user_id, window, now)?;
    if let Some(ref other) = conflict {
        debug!(user = user_id, ip = source_ip, conflicting_user = %other, "shared-ip reuse detected");
    }
    Ok(conflict)
}
