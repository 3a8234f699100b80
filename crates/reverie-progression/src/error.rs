//! Error types for the reverie-progression crate.
//!
//! Every failure here is recoverable. A mutation that returns an error has
//! left the manager untouched, so callers may log and carry on.

use reverie_types::{CompanionId, FormId};

/// Errors that can occur during companion mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    /// Companion with the given ID is not managed.
    #[error("companion not found: {0}")]
    CompanionNotFound(CompanionId),

    /// A companion with this ID is already managed.
    #[error("duplicate companion id: {0}")]
    DuplicateCompanion(CompanionId),

    /// The companion owns no form with this ID.
    #[error("form {form_id} not found on companion {companion_id}")]
    FormNotFound {
        /// The companion that was searched.
        companion_id: CompanionId,
        /// The form that was requested.
        form_id: FormId,
    },

    /// The companion already owns a form with this ID.
    #[error("form {form_id} already exists on companion {companion_id}")]
    DuplicateForm {
        /// The companion being edited.
        companion_id: CompanionId,
        /// The clashing form id.
        form_id: FormId,
    },

    /// Removing the form would leave the companion without an evolution chain.
    #[error("cannot remove the last form of companion {0}")]
    LastForm(CompanionId),
}
