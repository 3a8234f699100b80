//! Type-safe identifier wrappers.
//!
//! Companion and form identifiers are opaque strings chosen by whoever
//! authored the companion (seed data, the settings panel, an import). The
//! newtypes keep them from being mixed up at compile time. Fresh ids for
//! newly created companions and forms use UUID v7 (time-ordered).
//!
//! Effect ids are different: they are never generated. An [`EffectId`] is a
//! pure function of `(companion, form, kind)`, so re-deriving the registry
//! from unchanged state yields byte-identical keys.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::EffectKind;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Create a fresh identifier using UUID v7 (time-ordered).
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::now_v7().simple()))
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(String::from(id))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a companion.
    CompanionId, "COMP"
}

define_id! {
    /// Identifier of a form, unique within its companion's evolution chain.
    FormId, "FORM"
}

impl Default for FormId {
    /// The empty id, which names no form. Snapshot repair replaces it.
    fn default() -> Self {
        Self(String::new())
    }
}

/// Escape one key component so `:` only ever appears as a separator.
///
/// `%` becomes `%25` and `:` becomes `%3A`, which keeps the encoding
/// injective for arbitrary user-authored ids.
fn key_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            other => out.push(other),
        }
    }
    out
}

/// Identifier of the `(companion, form)` pair that grants an effect.
///
/// Every effect derived from the same form shares one source, which is how
/// display code groups "this form grants ..." lines. Id components are
/// escaped, so distinct pairs never share a source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EffectSource(pub String);

impl EffectSource {
    /// Derive the source key for a companion's form.
    pub fn derive(companion: &CompanionId, form: &FormId) -> Self {
        Self(format!(
            "companion:{}:{}",
            key_component(companion.as_str()),
            key_component(form.as_str())
        ))
    }
}

impl core::fmt::Display for EffectSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic identifier of one effect record.
///
/// At most one record exists per `(companion, form, kind)` triple, and the
/// id is the canonical encoding of that triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EffectId(pub String);

impl EffectId {
    /// Derive the record id for a companion's form and effect kind.
    pub fn derive(companion: &CompanionId, form: &FormId, kind: EffectKind) -> Self {
        Self(format!(
            "companion:{}:{}:{}",
            key_component(companion.as_str()),
            key_component(form.as_str()),
            kind.key()
        ))
    }
}

impl core::fmt::Display for EffectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
