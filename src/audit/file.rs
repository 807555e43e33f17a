//! File-backed audit sink: append-only JSONL.
//!
//! One JSON object per line, flushed per append. Suitable for single-process
//! deployments and for shipping into a log pipeline; multi-writer
//! deployments should implement [`AuditSink`] over their database instead.

use crate::audit::{AuditEntry, AuditSink};
use crate::MinegateError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// JSONL audit log on the local filesystem.
pub struct FileAuditLog {
    path: PathBuf,
    // Serializes appends so concurrent claims interleave whole lines.
    guard: Mutex<()>,
}

impl FileAuditLog {
    /// Open (or create) an audit log at the given path.
    pub fn new(path: PathBuf) -> Result<Self, MinegateError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MinegateError::Persistence(format!("Failed to create audit dir: {}", e))
            })?;
        }
        Ok(Self {
            path,
            guard: Mutex::new(()),
        })
    }

    /// Read back all entries, oldest first. Review tooling support.
    pub fn entries(&self) -> Result<Vec<AuditEntry>, MinegateError> {
        let _held = self.lock();
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| MinegateError::Persistence(format!("Failed to read audit log: {}", e)))?;
        raw.lines()
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    MinegateError::Persistence(format!("Corrupt audit line: {}", e))
                })
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.guard.lock().expect("audit log lock poisoned")
    }
}

impl AuditSink for FileAuditLog {
    fn append(&self, entry: AuditEntry) -> Result<(), MinegateError> {
        let line = serde_json::to_string(&entry).map_err(|e| {
            MinegateError::Persistence(format!("Failed to serialize audit entry: {}", e))
        })?;

        let _held = self.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MinegateError::Persistence(format!("Failed to open audit log: {}", e)))?;
        writeln!(file, "{}", line)
            .map_err(|e| MinegateError::Persistence(format!("Failed to append audit log: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEvent;
    use crate::request::RequestMeta;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn meta() -> RequestMeta {
        RequestMeta {
            source_ip: "203.0.113.7".to_string(),
            user_agent: "test-agent".to_string(),
        }
    }

    #[test]
    fn appends_and_reads_back_in_order() {
        let dir = TempDir::new().unwrap();
        let log = FileAuditLog::new(dir.path().join("audit.jsonl")).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        log.append(AuditEntry::claim_accepted("u1", &meta(), 10_000, 1, 1.0, at))
            .unwrap();
        log.append(AuditEntry::ip_blocked("u2", &meta(), "u1", at))
            .unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, AuditEvent::ClaimAccepted);
        assert_eq!(entries[1].event, AuditEvent::IpBlocked);
    }

    #[test]
    fn empty_log_reads_as_no_entries() {
        let dir = TempDir::new().unwrap();
        let log = FileAuditLog::new(dir.path().join("audit.jsonl")).unwrap();
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("nested").join("audit.jsonl");
        let log = FileAuditLog::new(nested).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        log.append(AuditEntry::ip_blocked("u2", &meta(), "u1", at))
            .unwrap();
        assert_eq!(log.entries().unwrap().len(), 1);
    }
}
