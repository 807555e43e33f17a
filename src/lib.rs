//! # Minegate
//!
//! **Mining-claim accrual and anti-abuse engine for points-based products.**
//!
//! Minegate decides, for a single inbound claim request, whether a user may
//! receive points right now, how much, and whether the request looks
//! fraudulent. It owns the cooldown gate, the streak state machine, the
//! multi-signal abuse detector, the atomic ledger commit, and the referral
//! bonus cascade.
//!
//! ## Features
//!
//! - **Atomic admission** — cooldown check and state write are one guarded
//!   update; concurrent duplicate claims cannot double-award
//! - **Streak rewards** — consecutive claims inside a grace window grow a
//!   streak that maps to a configurable point multiplier
//! - **Abuse detection** — shared-IP reuse and device-fingerprint collision
//!   blocks, each recorded to the audit log before the error returns
//! - **Referral cascade** — one-time first-claim bonus paid at most once,
//!   plus a recurring per-claim bonus, as separate ledger lines
//! - **Injected collaborators** — storage, audit sink, and clock are passed
//!   in, never global, so every path is testable in isolation
//!
//! ## Quickstart
//!
//! ```no_run
//! use minegate::{ClaimEngine, ClaimRequest, MemoryStore, MinegateConfig, RequestMeta};
//! use minegate::model::UserAccount;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), minegate::MinegateError> {
//!     let store = Arc::new(MemoryStore::new());
//!     store.insert_account(UserAccount::new("miner-1"));
//!
//!     let engine = ClaimEngine::new(MinegateConfig::default(), store.clone(), store)?;
//!
//!     let request = ClaimRequest {
//!         fingerprint_hash: minegate::request::fingerprint_from_signals(&["ua", "canvas"]),
//!         device_descriptor: None,
//!     };
//!     let meta = RequestMeta {
//!         source_ip: "203.0.113.7".to_string(),
//!         user_agent: "example-browser/1.0".to_string(),
//!     };
//!
//!     let outcome = engine.claim("miner-1", &request, &meta)?;
//!     println!("awarded {} points, streak {}", outcome.points_awarded, outcome.streak);
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency model
//!
//! Claim requests may race, including duplicates from one user. Minegate
//! assumes no in-process synchronization between requests; all exclusivity
//! comes from the [`store::Store`] contract:
//!
//! - the ledger commit applies only while the stored last-claim time still
//!   matches the value the decision was computed from *and* satisfies the
//!   cooldown predicate
//! - fingerprint binding is a conditional insert, unique on the hash
//! - the first-claim referral bonus flag is a conditional test-and-set
//!
//! The bundled [`MemoryStore`] honors the contract and doubles as the test
//! backend. A database-backed store must map these to conditional updates or
//! unique-constrained inserts.
//!
//! ## What minegate does not do
//!
//! Identity resolution, session handling, points spending, and every
//! presentation surface live outside this crate. The engine takes an
//! already-authenticated user id and a profile snapshot from its store.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Request contract
pub mod request;

// Domain records
pub mod model;

// Pure accrual rules
pub mod accrual;

// Fraud signals
pub mod abuse;

// Persistence seam
pub mod store;

// Ledger commit
pub mod ledger;

// Referral cascade
pub mod referral;

// Audit trail
pub mod audit;

// Engine (main public API)
pub mod engine;

// Re-exports for public API
pub use audit::{AuditEntry, AuditEvent, AuditSink};
pub use clock::{Clock, SystemClock};
pub use config::MinegateConfig;
pub use engine::{ClaimEngine, ClaimOutcome};
pub use errors::MinegateError;
pub use request::{ClaimRequest, RequestMeta};
pub use store::{MemoryStore, Store};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
