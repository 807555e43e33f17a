//! Append-only audit trail.
//!
//! Every abuse block and every accepted claim leaves a row. Blocks are
//! appended *before* the error returns to the caller, so the block itself is
//! evidence. Appends are best-effort: a sink failure is logged and never
//! rolls back or fails a committed claim.

pub mod file;

use crate::model::AccountStatus;
use crate::request::RequestMeta;
use crate::MinegateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Closed set of auditable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    /// A claim committed successfully.
    ClaimAccepted,
    /// A claim was blocked because another account recently used the IP.
    IpBlocked,
    /// A claim presented a fingerprint bound to another account.
    FingerprintConflict,
    /// Flagged by review tooling outside the claim path.
    SuspiciousPattern,
}

/// One audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// What happened.
    pub event: AuditEvent,

    /// Acting user.
    pub user_id: String,

    /// Source IP from transport metadata.
    pub source_ip: String,

    /// User-agent from transport metadata.
    pub user_agent: String,

    /// Free-form event detail.
    pub detail: serde_json::Value,

    /// When the event was recorded.
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    /// Row for a committed claim.
    pub fn claim_accepted(
        user_id: &str,
        meta: &RequestMeta,
        points: u64,
        streak: u32,
        multiplier: f64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            event: AuditEvent::ClaimAccepted,
            user_id: user_id.to_string(),
            source_ip: meta.source_ip.clone(),
            user_agent: meta.user_agent.clone(),
            detail: serde_json::json!({
                "points": points,
                "streak": streak,
                "multiplier": multiplier,
            }),
            at,
        }
    }

    /// Row for a shared-IP block, naming the conflicting account.
    pub fn ip_blocked(
        user_id: &str,
        meta: &RequestMeta,
        conflicting_user: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            event: AuditEvent::IpBlocked,
            user_id: user_id.to_string(),
            source_ip: meta.source_ip.clone(),
            user_agent: meta.user_agent.clone(),
            detail: serde_json::json!({ "conflicting_user": conflicting_user }),
            at,
        }
    }

    /// Row for a fingerprint collision, naming the owning account.
    pub fn fingerprint_conflict(
        user_id: &str,
        meta: &RequestMeta,
        owner_id: &str,
        fingerprint_hash: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            event: AuditEvent::FingerprintConflict,
            user_id: user_id.to_string(),
            source_ip: meta.source_ip.clone(),
            user_agent: meta.user_agent.clone(),
            detail: serde_json::json!({
                "owner": owner_id,
                "fingerprint": fingerprint_hash,
            }),
            at,
        }
    }

    /// Row for a pattern flagged by review tooling.
    pub fn suspicious_pattern(
        user_id: &str,
        meta: &RequestMeta,
        status: AccountStatus,
        note: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            event: AuditEvent::SuspiciousPattern,
            user_id: user_id.to_string(),
            source_ip: meta.source_ip.clone(),
            user_agent: meta.user_agent.clone(),
            detail: serde_json::json!({ "status": status, "note": note }),
            at,
        }
    }
}

/// Destination for audit rows.
pub trait AuditSink: Send + Sync {
    /// Append one row. Implementations must not reorder or drop rows on
    /// success paths.
    fn append(&self, entry: AuditEntry) -> Result<(), MinegateError>;
}

/// Best-effort writer over an [`AuditSink`].
///
/// The claim path calls [`AuditLogger::record`]; append failures are logged
/// at `warn` and swallowed so an already-committed claim still returns
/// success.
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    /// Wrap a sink.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Append a row, swallowing sink failures.
    pub fn record(&self, entry: AuditEntry) {
        if let Err(error) = self.sink.append(entry.clone()) {
            warn!(
                event = ?entry.event,
                user = %entry.user_id,
                %error,
                "audit append failed; continuing"
            );
        }
    }
}
