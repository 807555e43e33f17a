//! Streak progression and the reward multiplier table.

use chrono::{DateTime, Duration, Utc};

/// Result of advancing a streak for an accepted claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    /// Streak length after this claim.
    pub length: u32,
    /// Whether the previous streak was reset by exceeding the grace window.
    pub broken: bool,
}

/// Advance the streak for a claim happening at `now`.
///
/// - no prior claim: streak becomes 1, not broken
/// - gap since last claim within `grace`: streak increments
/// - gap beyond `grace`: streak resets to 1, `broken` set
pub fn advance(
    last_claim: Option<DateTime<Utc>>,
    current: u32,
    grace: Duration,
    now: DateTime<Utc>,
) -> StreakUpdate {
    match last_claim {
        None => StreakUpdate {
            length: 1,
            broken: false,
        },
        Some(last) if now - last <= grace => StreakUpdate {
            length: current.saturating_add(1),
            broken: false,
        },
        Some(_) => StreakUpdate {
            length: 1,
            broken: true,
        },
    }
}

/// Look up the effective multiplier for a streak length.
///
/// The table holds `(minimum streak, multiplier)` pairs with strictly
/// increasing thresholds. Scanned highest-first so the greatest satisfied
/// threshold wins; below the lowest threshold the multiplier is 1.0.
pub fn multiplier_for(table: &[(u32, f64)], streak: u32) -> f64 {
    for &(threshold, multiplier) in table.iter().rev() {
        if streak >= threshold {
            return multiplier;
        }
    }
    1.0
}

/// Points awarded for a claim: floor of base times multiplier.
pub fn points_for(base: u64, multiplier: f64) -> u64 {
    (base as f64 * multiplier).floor() as u64
}
