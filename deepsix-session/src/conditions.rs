//! Condition ledger: lifecycle of persistent effects on a character.
//!
//! Conditions and the roll outcomes that produce them reference each
//! other only by id; `clear_condition` carries the reconciliation that
//! keeps both sides agreeing about whether an outcome is applied.

use chrono::Utc;

use crate::constants::{LOG_CONDITION_ADDED, LOG_CONDITION_CLEARED};
use crate::state::{Condition, SessionState};

/// Append a new live condition to a character.
///
/// Returns the new condition's id, or `None` when the character does not
/// exist (stale ids are ignored).
pub fn create_condition(
    state: &mut SessionState,
    character_id: &str,
    kind: &str,
    label: &str,
    severity: u8,
) -> Option<String> {
    if state.character(character_id).is_none() {
        log::debug!("create_condition ignored: unknown character {character_id}");
        return None;
    }
    let condition_id = format!("cond-{}", state.next_seq());
    let condition = Condition {
        id: condition_id.clone(),
        kind: kind.to_string(),
        label: label.to_string(),
        severity,
        created_at: Utc::now(),
        cleared_at: None,
    };
    state
        .character_mut(character_id)
        .expect("character checked above")
        .conditions
        .push(condition);
    state.push_log(LOG_CONDITION_ADDED);
    Some(condition_id)
}

/// True iff the character carries a live condition of the given kind.
#[must_use]
pub fn has_live_condition(state: &SessionState, character_id: &str, kind: &str) -> bool {
    state
        .character(character_id)
        .is_some_and(|character| character.has_live_condition(kind))
}

/// Clear a condition, stamping `cleared_at`.
///
/// Idempotent: clearing an already-cleared condition is a no-op. When the
/// cleared condition is the one recorded on the character's pending roll
/// outcome, that outcome's applied block is reset as well; a condition
/// and the outcome that produced it never disagree about applied state.
pub fn clear_condition(state: &mut SessionState, character_id: &str, condition_id: &str) -> bool {
    let Some(character) = state.character_mut(character_id) else {
        log::debug!("clear_condition ignored: unknown character {character_id}");
        return false;
    };
    let Some(condition) = character.condition_mut(condition_id) else {
        log::debug!("clear_condition ignored: unknown condition {condition_id}");
        return false;
    };
    if !condition.is_live() {
        return false;
    }
    condition.cleared_at = Some(Utc::now());

    if let Some(outcome) = character.last_roll.as_mut()
        && outcome.applied_condition_id.as_deref() == Some(condition_id)
    {
        outcome.reset_applied();
    }
    state.push_log(LOG_CONDITION_CLEARED);
    true
}

/// Manual moderator toggle: clear every live condition of `kind`, or
/// create one when none is live.
pub fn toggle_condition(state: &mut SessionState, character_id: &str, kind: &str) -> bool {
    if state.character(character_id).is_none() {
        log::debug!("toggle_condition ignored: unknown character {character_id}");
        return false;
    }
    let live_ids: Vec<String> = state
        .character(character_id)
        .map(|character| {
            character
                .conditions
                .iter()
                .filter(|condition| condition.is_live() && condition.kind == kind)
                .map(|condition| condition.id.clone())
                .collect()
        })
        .unwrap_or_default();

    if live_ids.is_empty() {
        return create_condition(state, character_id, kind, kind, 0).is_some();
    }
    let mut cleared = false;
    for condition_id in live_ids {
        cleared |= clear_condition(state, character_id, &condition_id);
    }
    cleared
}
