//! Read-only companion projections for display.

use rust_decimal::Decimal;
use reverie_types::{Companion, CompanionView};

use crate::evolution;
use crate::leveling::LevelingCurve;

/// Progress toward the next level as a ratio clamped to `[0, 1]`.
///
/// Returns zero when the next level requires no XP.
pub fn xp_ratio(xp: u64, needed: u64) -> Decimal {
    if needed == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(xp)
        .checked_div(Decimal::from(needed))
        .map_or(Decimal::ZERO, |r| r.clamp(Decimal::ZERO, Decimal::ONE))
}

/// Build the display view of one companion.
pub fn companion_view(companion: &Companion, curve: &LevelingCurve) -> CompanionView {
    let xp_needed = curve.xp_required_for_level(companion.level.saturating_add(1));
    CompanionView {
        id: companion.id.clone(),
        name: companion.name.clone(),
        level: companion.level,
        xp: companion.xp,
        xp_needed,
        xp_ratio: xp_ratio(companion.xp, xp_needed),
        total_xp: curve
            .total_xp_to_reach_level(companion.level)
            .saturating_add(companion.xp),
        active_form: evolution::active_form(companion).cloned(),
        next_form: evolution::next_form(companion).cloned(),
        evolution_ready: evolution::can_evolve(companion),
        auto_evolve: companion.auto_evolve,
    }
}
