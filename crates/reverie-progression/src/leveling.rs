//! Leveling engine: XP thresholds and level-up mechanics.
//!
//! Pure functions over `(level, xp)`. A companion at level `L` holding `xp`
//! experience levels up when `xp >= xp_required_for_level(L + 1)`; the
//! threshold is subtracted and the check repeats, so one large award can
//! advance many levels.
//!
//! # Threshold Formula
//!
//! ```text
//! xp_required_for_level(t) = 0                                   for t <= 1
//!                          = max(min_threshold, t * per_level)   for t > 1
//! ```
//!
//! With the defaults (20, 20) level 1 to 2 needs 40 XP, level 2 to 3 needs
//! 60 XP. The formula is monotonically non-decreasing and always positive
//! above level 1. Threshold sums have a closed form (a flat run at the
//! floor, then an arithmetic series), so a gain is resolved by binary
//! search over the number of levels it buys rather than level by level.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default floor for any threshold above level 1.
pub const DEFAULT_MIN_THRESHOLD: u64 = 20;

/// Default per-level slope of the threshold curve.
pub const DEFAULT_PER_LEVEL: u64 = 20;

// ---------------------------------------------------------------------------
// LevelingCurve
// ---------------------------------------------------------------------------

/// Tunable parameters of the XP threshold curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelingCurve {
    /// Minimum XP any level above 1 requires. Treated as at least 1.
    pub min_threshold: u64,
    /// XP required per target level.
    pub per_level: u64,
}

impl Default for LevelingCurve {
    fn default() -> Self {
        Self {
            min_threshold: DEFAULT_MIN_THRESHOLD,
            per_level: DEFAULT_PER_LEVEL,
        }
    }
}

/// Result of applying an XP gain to a `(level, xp)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    /// Level after the gain.
    pub level: u32,
    /// Experience carried toward the next level.
    pub xp: u64,
    /// Number of level-ups the gain caused.
    pub levels_gained: u32,
}

impl LevelingCurve {
    /// Create a curve from explicit parameters.
    pub const fn new(min_threshold: u64, per_level: u64) -> Self {
        Self {
            min_threshold,
            per_level,
        }
    }

    /// XP required to advance *into* `target` from `target - 1`.
    ///
    /// Returns 0 for `target <= 1`; otherwise at least 1.
    pub fn xp_required_for_level(&self, target: u32) -> u64 {
        if target <= 1 {
            return 0;
        }
        let slope = u64::from(target).saturating_mul(self.per_level);
        slope.max(self.min_threshold).max(1)
    }

    /// Sum of thresholds from level 2 through `level`.
    ///
    /// Display aggregate only; saturates rather than overflowing.
    pub fn total_xp_to_reach_level(&self, level: u32) -> u64 {
        let count = level.saturating_sub(1);
        self.threshold_sum(1, count)
            .and_then(|sum| u64::try_from(sum).ok())
            .unwrap_or(u64::MAX)
    }

    /// Apply `gained` experience to a companion at `(level, xp)`.
    ///
    /// Negative gains are rejected as a no-op: progression never regresses
    /// from a bad event. The returned `xp` is always below the next
    /// threshold, except at the `u32::MAX` level cap where it accumulates.
    ///
    /// Runs in logarithmic time in the number of levels gained, so even an
    /// `i64::MAX` award resolves immediately.
    pub fn apply_xp_gain(&self, level: u32, xp: u64, gained: i64) -> LevelProgress {
        let level = level.max(1);
        let Ok(gained) = u64::try_from(gained) else {
            return LevelProgress {
                level,
                xp,
                levels_gained: 0,
            };
        };
        let pool = xp.saturating_add(gained);

        // Largest level count whose summed thresholds fit in the pool.
        let fits = |count: u32| {
            self.threshold_sum(level, count)
                .is_some_and(|sum| sum <= u128::from(pool))
        };
        let mut low: u32 = 0;
        let mut high = u32::MAX.saturating_sub(level);
        while low < high {
            let mid = low.saturating_add(high.saturating_sub(low).div_ceil(2));
            if fits(mid) {
                low = mid;
            } else {
                high = mid.saturating_sub(1);
            }
        }

        let spent = self
            .threshold_sum(level, low)
            .and_then(|sum| u64::try_from(sum).ok())
            .unwrap_or(pool);
        let mut current_level = level.saturating_add(low);
        let mut remaining = pool.saturating_sub(spent);
        let mut levels_gained = low;

        // Exact sums can exceed u64 where single thresholds saturate; settle
        // that remainder against the saturated thresholds. At most one step.
        while current_level < u32::MAX {
            let next = current_level.saturating_add(1);
            let threshold = self.xp_required_for_level(next);
            if remaining < threshold {
                break;
            }
            remaining = remaining.saturating_sub(threshold);
            current_level = next;
            levels_gained = levels_gained.saturating_add(1);
        }

        LevelProgress {
            level: current_level,
            xp: remaining,
            levels_gained,
        }
    }

    /// Exact sum of the thresholds of levels `from + 1 ..= from + count`.
    ///
    /// Thresholds sit flat at the floor while `t * per_level <= floor`, then
    /// grow linearly, so the sum is a flat run plus an arithmetic series.
    /// `None` on `u128` overflow.
    fn threshold_sum(&self, from: u32, count: u32) -> Option<u128> {
        if count == 0 {
            return Some(0);
        }
        let floor = u128::from(self.min_threshold.max(1));
        let per_level = u128::from(self.per_level);
        let first = u128::from(from.max(1)).checked_add(1)?;
        let last = u128::from(from.max(1)).checked_add(u128::from(count))?;

        let flat_until = if per_level == 0 {
            last
        } else {
            floor.checked_div(per_level)?.min(last)
        };
        let flat_count = if flat_until >= first {
            flat_until.checked_sub(first)?.checked_add(1)?
        } else {
            0
        };
        let flat_sum = floor.checked_mul(flat_count)?;

        let linear_from = first.max(flat_until.checked_add(1)?);
        if linear_from > last {
            return Some(flat_sum);
        }
        let terms = last.checked_sub(linear_from)?.checked_add(1)?;
        let series = linear_from
            .checked_add(last)?
            .checked_mul(terms)?
            .checked_div(2)?;
        flat_sum.checked_add(series.checked_mul(per_level)?)
    }

    /// Clamp `xp` so that it sits strictly below the next threshold.
    pub fn clamp_xp(&self, level: u32, xp: u64) -> u64 {
        let capacity = self.xp_required_for_level(level.saturating_add(1));
        xp.min(capacity.saturating_sub(1))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
