//! Enumeration types for the Reverie progression engine.
//!
//! The set of effect kinds and reward events is fixed: a form's buff can
//! only scale one of the four reward streams the journal awards.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Effect kinds
// ---------------------------------------------------------------------------

/// A multiplicative bonus a form can grant while it is a companion's
/// active form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EffectKind {
    /// Scales experience awarded to companions.
    XpMultiplier,
    /// Scales obedience currency gains.
    ObedienceGain,
    /// Scales token currency gains.
    TokenMultiplier,
    /// Scales dream clarity boosts.
    ClarityBoost,
}

impl EffectKind {
    /// Every effect kind, in canonical order.
    pub const ALL: [Self; 4] = [
        Self::XpMultiplier,
        Self::ObedienceGain,
        Self::TokenMultiplier,
        Self::ClarityBoost,
    ];

    /// Stable lower-camel key used inside derived identifiers.
    pub const fn key(self) -> &'static str {
        match self {
            Self::XpMultiplier => "xpMultiplier",
            Self::ObedienceGain => "obedienceGain",
            Self::TokenMultiplier => "tokenMultiplier",
            Self::ClarityBoost => "clarityBoost",
        }
    }

    /// Human-readable label for effect listings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::XpMultiplier => "XP Multiplier",
            Self::ObedienceGain => "Obedience Gain",
            Self::TokenMultiplier => "Token Multiplier",
            Self::ClarityBoost => "Clarity Boost",
        }
    }
}

// ---------------------------------------------------------------------------
// Event categories
// ---------------------------------------------------------------------------

/// A reward event whose base value effects can scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EventCategory {
    /// Experience awarded to companions.
    Xp,
    /// Obedience currency.
    Obedience,
    /// Token currency.
    Tokens,
    /// Dream clarity boost.
    Clarity,
}

impl EventCategory {
    /// The effect kinds that apply when scaling this event.
    pub const fn kinds(self) -> &'static [EffectKind] {
        match self {
            Self::Xp => &[EffectKind::XpMultiplier],
            Self::Obedience => &[EffectKind::ObedienceGain],
            Self::Tokens => &[EffectKind::TokenMultiplier],
            Self::Clarity => &[EffectKind::ClarityBoost],
        }
    }

    /// Whether `kind` contributes to this event's multiplier.
    pub fn is_scaled_by(self, kind: EffectKind) -> bool {
        self.kinds().contains(&kind)
    }
}

// ---------------------------------------------------------------------------
// XP sources
// ---------------------------------------------------------------------------

/// Journal activity that awards companion experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum XpSource {
    /// A dream entry was logged.
    Dream,
    /// A ritual was completed.
    Ritual,
    /// A quest was completed.
    Quest,
    /// An offering was made in the realm.
    Offering,
}

impl XpSource {
    /// Every XP source, in canonical order.
    pub const ALL: [Self; 4] = [Self::Dream, Self::Ritual, Self::Quest, Self::Offering];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_category_maps_to_one_kind() {
        assert!(EventCategory::Xp.is_scaled_by(EffectKind::XpMultiplier));
        assert!(!EventCategory::Xp.is_scaled_by(EffectKind::TokenMultiplier));
        assert!(EventCategory::Obedience.is_scaled_by(EffectKind::ObedienceGain));
        assert!(EventCategory::Tokens.is_scaled_by(EffectKind::TokenMultiplier));
        assert!(EventCategory::Clarity.is_scaled_by(EffectKind::ClarityBoost));
    }

    #[test]
    fn every_kind_is_reachable_from_some_category() {
        let categories = [
            EventCategory::Xp,
            EventCategory::Obedience,
            EventCategory::Tokens,
            EventCategory::Clarity,
        ];
        for kind in EffectKind::ALL {
            assert!(
                categories.iter().any(|c| c.is_scaled_by(kind)),
                "{kind:?} is never applied"
            );
        }
    }

    #[test]
    fn effect_kind_serializes_as_variant_name() {
        let json = serde_json::to_string(&EffectKind::ClarityBoost).ok();
        assert_eq!(json.as_deref(), Some("\"ClarityBoost\""));
    }
}
