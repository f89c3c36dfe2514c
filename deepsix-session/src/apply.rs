//! Apply/undo state machine for a pending roll outcome.
//!
//! A roll record moves PENDING -> APPLIED through `apply` or
//! `apply_stress_delta`, and back through `undo` (or through the ledger's
//! condition-clear reconciliation). Re-applying is a guarded no-op, and
//! any reference mismatch (stale event ids, unknown characters, choices
//! outside the offered set) leaves state untouched.

use chrono::Utc;

use crate::conditions::create_condition;
use crate::constants::{
    DUPLICATE_STRESS_INCREMENT, LOG_OUTCOME_APPLIED, LOG_OUTCOME_DISMISSED,
    LOG_OUTCOME_STRESS_COMMITTED, LOG_OUTCOME_UNDONE, STRESS_MAX,
};
use crate::state::SessionState;

/// Commit a pending outcome, creating a condition when it is persistent.
///
/// `chosen_entry_id` selects one of the outcome's offered alternatives;
/// an id outside the offered set rejects the whole command. Applying an
/// already-applied outcome is a no-op.
pub fn apply(
    state: &mut SessionState,
    character_id: &str,
    event_id: &str,
    chosen_entry_id: Option<&str>,
) -> bool {
    let Some(character) = state.character(character_id) else {
        log::debug!("apply ignored: unknown character {character_id}");
        return false;
    };
    let Some(outcome) = character.last_roll.as_ref() else {
        log::debug!("apply ignored: no pending outcome on {character_id}");
        return false;
    };
    if outcome.event_id != event_id {
        log::debug!("apply ignored: stale event {event_id}");
        return false;
    }
    if outcome.applied {
        return false;
    }

    // The entry actually applied: the chosen alternative, or the resolved
    // entry when the moderator declined to sub-select.
    let (entry_id, label, desc, persistent) = match chosen_entry_id {
        Some(choice_id) => match outcome.choices.iter().find(|choice| choice.id == choice_id) {
            Some(choice) => (
                choice.id.clone(),
                choice.label.clone(),
                choice.desc.clone(),
                choice.persistent,
            ),
            None => {
                log::debug!("apply rejected: choice {choice_id} not offered by {event_id}");
                return false;
            }
        },
        None => (
            outcome.entry_id.clone(),
            outcome.label.clone(),
            outcome.desc.clone(),
            outcome.persistent,
        ),
    };
    let severity_rank = outcome.entry_severity;

    let condition_id = if persistent {
        create_condition(state, character_id, &entry_id, &label, severity_rank)
    } else {
        None
    };

    let outcome = state
        .character_mut(character_id)
        .expect("character checked above")
        .last_roll
        .as_mut()
        .expect("outcome checked above");
    outcome.applied = true;
    outcome.applied_condition_id = condition_id;
    outcome.applied_entry_id = Some(entry_id);
    outcome.applied_label = Some(label);
    outcome.applied_desc = Some(desc);
    state.push_log(LOG_OUTCOME_APPLIED);
    true
}

/// Commit the outcome's stress delta to the character, at most once.
///
/// A duplicate stress outcome (a live condition of the committing kind
/// that this outcome did not itself create) collapses to a flat +1
/// instead of re-adding the configured delta. The post-clamp change is
/// recorded so `undo` can subtract back exactly what was added.
pub fn apply_stress_delta(state: &mut SessionState, character_id: &str, event_id: &str) -> bool {
    let Some(character) = state.character(character_id) else {
        log::debug!("apply_stress_delta ignored: unknown character {character_id}");
        return false;
    };
    let Some(outcome) = character.last_roll.as_ref() else {
        log::debug!("apply_stress_delta ignored: no pending outcome on {character_id}");
        return false;
    };
    if outcome.event_id != event_id {
        log::debug!("apply_stress_delta ignored: stale event {event_id}");
        return false;
    }
    if outcome.stress_delta_applied {
        return false;
    }

    // Delta source: the applied (possibly chosen) entry when one was
    // committed, the resolved entry otherwise.
    let (commit_kind, base_delta) = match outcome.applied_entry_id.as_deref() {
        Some(applied_id) if applied_id != outcome.entry_id => (
            applied_id.to_string(),
            outcome
                .choices
                .iter()
                .find(|choice| choice.id == applied_id)
                .and_then(|choice| choice.stress_delta),
        ),
        _ => (outcome.entry_id.clone(), outcome.entry_stress_delta),
    };
    let own_condition = outcome.applied_condition_id.clone();
    let duplicate = character.conditions.iter().any(|condition| {
        condition.is_live()
            && condition.kind == commit_kind
            && Some(condition.id.as_str()) != own_condition.as_deref()
    });

    let old_stress = character.vitals.stress;
    let delta = if duplicate {
        DUPLICATE_STRESS_INCREMENT
    } else {
        base_delta.unwrap_or(0)
    };
    let new_stress = (old_stress + delta).clamp(0, STRESS_MAX);

    let character = state
        .character_mut(character_id)
        .expect("character checked above");
    character.vitals.stress = new_stress;
    let outcome = character.last_roll.as_mut().expect("outcome checked above");
    outcome.applied = true;
    outcome.stress_delta_applied = true;
    outcome.applied_stress_duplicate = duplicate;
    outcome.applied_stress_delta = Some(new_stress - old_stress);
    state.push_log(LOG_OUTCOME_STRESS_COMMITTED);
    true
}

/// Reverse a committed outcome: clear its condition, take back its stress
/// change, and return the applied block to the pending shape.
///
/// History entries are not retracted. Requires the outcome to currently
/// be applied; anything else is a no-op.
pub fn undo(state: &mut SessionState, character_id: &str, event_id: &str) -> bool {
    let Some(character) = state.character_mut(character_id) else {
        log::debug!("undo ignored: unknown character {character_id}");
        return false;
    };
    let Some(outcome) = character.last_roll.as_mut() else {
        log::debug!("undo ignored: no pending outcome on {character_id}");
        return false;
    };
    if outcome.event_id != event_id || !outcome.applied {
        log::debug!("undo ignored: {event_id} is not an applied outcome");
        return false;
    }

    let committed_stress = if outcome.stress_delta_applied {
        outcome.applied_stress_delta.unwrap_or(0)
    } else {
        0
    };
    let condition_id = outcome.applied_condition_id.clone();
    outcome.reset_applied();

    character.vitals.stress -= committed_stress;
    character.vitals.clamp();
    if let Some(condition_id) = condition_id
        && let Some(condition) = character.condition_mut(&condition_id)
        && condition.is_live()
    {
        condition.cleared_at = Some(Utc::now());
    }
    state.push_log(LOG_OUTCOME_UNDONE);
    true
}

/// Detach the pending outcome from a character without reversing anything.
///
/// The acknowledge-and-dismiss operation: history and any created
/// condition are untouched.
pub fn clear_outcome(state: &mut SessionState, character_id: &str) -> bool {
    let Some(character) = state.character_mut(character_id) else {
        log::debug!("clear_outcome ignored: unknown character {character_id}");
        return false;
    };
    if character.last_roll.take().is_none() {
        return false;
    }
    state.push_log(LOG_OUTCOME_DISMISSED);
    true
}
