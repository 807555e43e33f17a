//! Pure accrual rules: cooldown admission and streak progression.
//!
//! Nothing in this module touches storage. The cooldown decision here is
//! advisory; admission is re-verified atomically inside the ledger commit.

pub mod cooldown;
pub mod streak;

pub use cooldown::CooldownDecision;
pub use streak::StreakUpdate;
