//! Evolution catalog: active/next form lookup and single-hop evolution.
//!
//! A companion's forms form a chain ordered by `unlock_level`. Evolution is
//! a state machine over that chain:
//!
//! ```text
//! form[0] --evolve--> form[1] --evolve--> ... --evolve--> form[n-1]
//!          guard: level >= form[k+1].unlock_level
//! ```
//!
//! One step moves exactly one hop, even when the level is far past several
//! thresholds. Cascades are bounded loops of single steps, never recursion,
//! and never run more iterations than the chain has forms.

use reverie_types::{Companion, Form, FormId};

/// The form matching `active_form_id`, if the companion owns it.
pub fn active_form(companion: &Companion) -> Option<&Form> {
    companion.form(&companion.active_form_id)
}

/// The form with the smallest unlock level strictly above the active form's.
///
/// A companion whose active form is missing is treated as sitting below
/// every form.
pub fn next_form(companion: &Companion) -> Option<&Form> {
    let current = active_form(companion).map_or(0, |f| f.unlock_level);
    companion
        .forms
        .iter()
        .filter(|f| f.unlock_level > current)
        .min_by_key(|f| f.unlock_level)
}

/// Whether a next form exists and the companion's level meets its unlock.
pub fn can_evolve(companion: &Companion) -> bool {
    next_form(companion).is_some_and(|next| companion.level >= next.unlock_level)
}

/// Advance one hop along the chain if eligible.
///
/// Returns `(from, to)` on success, `None` when ineligible (state untouched).
pub fn evolve_step(companion: &mut Companion) -> Option<(FormId, FormId)> {
    if !can_evolve(companion) {
        return None;
    }
    let to = next_form(companion)?.id.clone();
    let from = std::mem::replace(&mut companion.active_form_id, to.clone());
    Some((from, to))
}

/// Repeatedly apply [`evolve_step`] while eligible.
///
/// Returns every hop taken, in order. Iterations are capped at the number of
/// forms as a guard against malformed chains.
pub fn evolve_cascade(companion: &mut Companion) -> Vec<(FormId, FormId)> {
    let mut hops = Vec::new();
    for _ in 0..companion.forms.len() {
        match evolve_step(companion) {
            Some(hop) => hops.push(hop),
            None => break,
        }
    }
    hops
}

/// The first (root) form of the chain, the reset target.
pub fn root_form(companion: &Companion) -> Option<&Form> {
    companion.forms.iter().min_by_key(|f| f.unlock_level)
}

/// The highest form whose unlock level the companion has reached.
pub fn highest_unlocked_form(companion: &Companion) -> Option<&Form> {
    companion
        .forms
        .iter()
        .filter(|f| f.unlock_level <= companion.level)
        .max_by_key(|f| f.unlock_level)
}
