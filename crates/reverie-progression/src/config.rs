//! Tunable parameters for companion progression.
//!
//! The [`ProgressionConfig`] struct bundles every product value the manager
//! depends on: the threshold curve, per-source base XP, and log capacities.
//! The engine builds it from `reverie-config.yaml` at startup; tests build it
//! from [`Default`] and override fields.

use reverie_types::XpSource;

use crate::leveling::LevelingCurve;

/// Default capacity of the recent-evolutions notification log.
pub const DEFAULT_EVOLUTION_LOG_CAPACITY: usize = 12;

/// Default capacity of the recent-XP notification log.
pub const DEFAULT_XP_LOG_CAPACITY: usize = 20;

/// Base XP awarded per journal activity, before multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpRewards {
    /// Logging a dream (default: 10).
    pub dream: u64,
    /// Completing a ritual (default: 20).
    pub ritual: u64,
    /// Completing a quest (default: 50).
    pub quest: u64,
    /// Making an offering (default: 30).
    pub offering: u64,
}

impl Default for XpRewards {
    fn default() -> Self {
        Self {
            dream: 10,
            ritual: 20,
            quest: 50,
            offering: 30,
        }
    }
}

impl XpRewards {
    /// Base XP for one activity.
    pub const fn base_for(&self, source: XpSource) -> u64 {
        match source {
            XpSource::Dream => self.dream,
            XpSource::Ritual => self.ritual,
            XpSource::Quest => self.quest,
            XpSource::Offering => self.offering,
        }
    }
}

/// Configuration consumed by [`CompanionManager`](crate::CompanionManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionConfig {
    /// XP threshold curve.
    pub leveling: LevelingCurve,
    /// Base XP per activity.
    pub xp_rewards: XpRewards,
    /// Maximum entries kept in the recent-evolutions log (oldest evicted).
    pub evolution_log_capacity: usize,
    /// Maximum entries kept in the recent-XP log (oldest evicted).
    pub xp_log_capacity: usize,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            leveling: LevelingCurve::default(),
            xp_rewards: XpRewards::default(),
            evolution_log_capacity: DEFAULT_EVOLUTION_LOG_CAPACITY,
            xp_log_capacity: DEFAULT_XP_LOG_CAPACITY,
        }
    }
}
