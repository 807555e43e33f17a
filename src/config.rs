//! Minegate configuration.

use std::time::Duration;

/// Configuration for the claim engine.
///
/// Durations are wall-clock spans; all comparisons happen in UTC through the
/// injected [`crate::Clock`].
#[derive(Debug, Clone)]
pub struct MinegateConfig {
    /// Points awarded per accepted claim before the streak multiplier.
    pub base_points: u64,

    /// Minimum elapsed time between two accepted claims by one user.
    pub cooldown: Duration,

    /// Window within which a late claim still continues a streak.
    /// Must be strictly longer than `cooldown`, otherwise a user claiming
    /// promptly at the start of each eligible window would be reset.
    pub streak_grace: Duration,

    /// Streak multiplier table as `(minimum streak length, multiplier)`
    /// pairs, thresholds strictly increasing. The greatest threshold the
    /// streak meets wins; below the lowest threshold the multiplier is 1.0.
    pub multiplier_table: Vec<(u32, f64)>,

    /// Window within which a second distinct account claiming from the same
    /// source address is blocked.
    pub ip_reuse_window: Duration,

    /// One-time bonus paid to the referrer on the referred user's first
    /// accepted claim.
    pub first_claim_bonus: u64,

    /// Recurring bonus paid to the referrer on every later accepted claim
    /// while the referral edge is active.
    pub recurring_referral_bonus: u64,

    /// Whether an accepted claim credits the claimer's spendable balance.
    ///
    /// The legacy system recorded the session, streak, and referral payouts
    /// but left the balance increment disabled. `false` reproduces that
    /// behavior; `true` credits the balance atomically with the commit.
    pub credit_balance: bool,
}

impl Default for MinegateConfig {
    fn default() -> Self {
        Self {
            base_points: 10_000,
            cooldown: Duration::from_secs(24 * 60 * 60),
            streak_grace: Duration::from_secs(36 * 60 * 60),
            multiplier_table: vec![(3, 1.1), (7, 1.25), (14, 1.5), (30, 2.0)],
            ip_reuse_window: Duration::from_secs(24 * 60 * 60),
            first_claim_bonus: 2_500,
            recurring_referral_bonus: 500,
            credit_balance: true,
        }
    }
}

impl MinegateConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::MinegateError> {
        if self.base_points == 0 {
            return Err(crate::MinegateError::ConfigError(
                "base_points cannot be zero".to_string(),
            ));
        }
        if self.streak_grace <= self.cooldown {
            return Err(crate::MinegateError::ConfigError(format!(
                "streak_grace ({:?}) must exceed cooldown ({:?})",
                self.streak_grace, self.cooldown
            )));
        }
        let mut prev: Option<(u32, f64)> = None;
        for &(threshold, multiplier) in &self.multiplier_table {
            if multiplier < 1.0 {
                return Err(crate::MinegateError::ConfigError(format!(
                    "multiplier for streak {} is below 1.0",
                    threshold
                )));
            }
            if let Some((prev_threshold, prev_multiplier)) = prev {
                if threshold <= prev_threshold {
                    return Err(crate::MinegateError::ConfigError(
                        "multiplier_table thresholds must be strictly increasing".to_string(),
                    ));
                }
                if multiplier < prev_multiplier {
                    return Err(crate::MinegateError::ConfigError(
                        "multiplier_table multipliers must be non-decreasing".to_string(),
                    ));
                }
            }
            prev = Some((threshold, multiplier));
        }
        Ok(())
    }
}
