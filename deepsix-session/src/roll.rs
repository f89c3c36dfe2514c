//! Roll engine: total computation, table resolution, duplicate policy.
//!
//! A trigger computes `die + stress - resolve + modifier`, resolves the
//! total against the severity's table, applies the severity-asymmetric
//! duplicate policy, and stores an immutable roll record. Panic repeats
//! escalate at trigger time; stress repeats collapse to a flat increment
//! at commit time (see [`crate::apply`]).

use rand::Rng;

use crate::constants::{
    DIE_MAX, DIE_MIN, LOG_ROLL_ESCALATED, LOG_ROLL_PANIC, LOG_ROLL_STRESS, MODIFIER_MAX,
    MODIFIER_MIN, RESOLVE_MAX, STRESS_MAX,
};
use crate::data::{Severity, TableSet};
use crate::state::{RollOutcome, SessionState};

/// Trigger a roll for a character, drawing the die from `rng`.
///
/// Unknown character ids are ignored. Returns whether state changed.
pub fn trigger<R: Rng + ?Sized>(
    state: &mut SessionState,
    tables: &TableSet,
    character_id: &str,
    severity: Severity,
    modifier: i32,
    rng: &mut R,
) -> bool {
    let die = rng.gen_range(DIE_MIN..=DIE_MAX);
    trigger_with_die(state, tables, character_id, severity, modifier, die)
}

/// Trigger a roll with a moderator-supplied die value.
///
/// This is the deterministic entry point: session replay and the GM's
/// manual-die override both route through it. The die is normalized to
/// the legal face range.
pub fn trigger_with_die(
    state: &mut SessionState,
    tables: &TableSet,
    character_id: &str,
    severity: Severity,
    modifier: i32,
    die: i32,
) -> bool {
    let Some(character) = state.character(character_id) else {
        log::debug!("trigger ignored: unknown character {character_id}");
        return false;
    };

    // Inputs may arrive out of range when upstream validation failed;
    // normalize before use rather than trusting the transport.
    let die = die.clamp(DIE_MIN, DIE_MAX);
    let stress_input = character.vitals.stress.clamp(0, STRESS_MAX);
    let resolve_input = character.vitals.resolve.clamp(0, RESOLVE_MAX);
    let modifier = modifier.clamp(MODIFIER_MIN, MODIFIER_MAX);
    let total = die + stress_input - resolve_input + modifier;

    let table = tables.table_for(severity);
    let mut entry = table.resolve_by_total(total);
    let mut duplicate_from = None;

    // A repeated severe outcome escalates rather than stacking: bump to
    // the next distinct entry when the character already carries a live
    // condition of the resolved kind. Stress rolls never bump here.
    if severity == Severity::Panic
        && entry.persistent
        && character.has_live_condition(&entry.id)
        && let Some(bumped) = table.next_distinct_higher(total, &entry.id)
    {
        duplicate_from = Some((entry.id.clone(), entry.label.clone()));
        entry = bumped;
    }

    let event_id = format!("roll-{}", state.next_seq());
    let outcome = RollOutcome {
        event_id,
        character_id: character_id.to_string(),
        severity,
        die,
        stress_input,
        resolve_input,
        modifier,
        total,
        entry_id: entry.id.clone(),
        label: entry.label.clone(),
        desc: entry.desc.clone(),
        entry_stress_delta: entry.stress_delta,
        entry_severity: entry.severity,
        persistent: entry.persistent,
        duplicate_adjusted: duplicate_from.is_some(),
        duplicate_from_id: duplicate_from.as_ref().map(|(id, _)| id.clone()),
        duplicate_from_label: duplicate_from.map(|(_, label)| label),
        choices: entry.choices.clone(),
        applied: false,
        applied_condition_id: None,
        applied_entry_id: None,
        applied_label: None,
        applied_desc: None,
        applied_stress_delta: None,
        stress_delta_applied: false,
        applied_stress_duplicate: false,
    };

    state.push_roll_log(outcome.clone());
    state.push_log(match severity {
        Severity::Stress => LOG_ROLL_STRESS,
        Severity::Panic => LOG_ROLL_PANIC,
    });
    if outcome.duplicate_adjusted {
        state.push_log(LOG_ROLL_ESCALATED);
    }
    state
        .character_mut(character_id)
        .expect("character checked above")
        .last_roll = Some(outcome);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::create_condition;
    use crate::constants::ROLL_LOG_RETENTION;
    use crate::state::Character;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn fixture() -> (SessionState, TableSet) {
        let mut state = SessionState::default();
        state.characters.push(Character {
            id: String::from("pc-1"),
            name: String::from("Imani"),
            ..Character::default()
        });
        (state, TableSet::builtin().clone())
    }

    #[test]
    fn trigger_records_outcome_and_history() {
        let (mut state, tables) = fixture();
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        assert!(trigger(&mut state, &tables, "pc-1", Severity::Stress, 0, &mut rng));

        let outcome = state.character("pc-1").unwrap().last_roll.clone().unwrap();
        assert!((DIE_MIN..=DIE_MAX).contains(&outcome.die));
        assert_eq!(outcome.total, outcome.die);
        assert!(!outcome.applied);
        assert_eq!(state.roll_log.len(), 1);
        assert_eq!(state.roll_log[0], outcome);
        assert_eq!(state.logs, vec![LOG_ROLL_STRESS]);
    }

    #[test]
    fn trigger_ignores_unknown_character() {
        let (mut state, tables) = fixture();
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        assert!(!trigger(&mut state, &tables, "ghost", Severity::Panic, 0, &mut rng));
        assert!(state.roll_log.is_empty());
    }

    #[test]
    fn total_uses_clamped_inputs() {
        let (mut state, tables) = fixture();
        {
            let vitals = &mut state.character_mut("pc-1").unwrap().vitals;
            vitals.stress = 4;
            vitals.resolve = 2;
        }
        // Modifier far out of range clamps to the bounded span.
        assert!(trigger_with_die(&mut state, &tables, "pc-1", Severity::Stress, 500, 3));
        let outcome = state.character("pc-1").unwrap().last_roll.clone().unwrap();
        assert_eq!(outcome.modifier, MODIFIER_MAX);
        assert_eq!(outcome.total, 3 + 4 - 2 + MODIFIER_MAX);
    }

    #[test]
    fn panic_duplicate_bumps_to_next_distinct_entry() {
        let (mut state, tables) = fixture();
        // die 2, stress 0, resolve 0 -> total 2 -> "tremors" (persistent).
        let resolved = tables.panic.resolve_by_total(2).id.clone();
        create_condition(&mut state, "pc-1", &resolved, "Tremors", 1).unwrap();
        state.logs.clear();

        assert!(trigger_with_die(&mut state, &tables, "pc-1", Severity::Panic, 0, 2));
        let outcome = state.character("pc-1").unwrap().last_roll.clone().unwrap();
        assert!(outcome.duplicate_adjusted);
        assert_eq!(outcome.duplicate_from_id.as_deref(), Some(resolved.as_str()));
        assert_ne!(outcome.entry_id, resolved);
        assert_eq!(state.logs, vec![LOG_ROLL_PANIC, LOG_ROLL_ESCALATED]);
    }

    #[test]
    fn stress_duplicate_never_bumps_at_trigger_time() {
        let (mut state, tables) = fixture();
        let resolved = tables.stress.resolve_by_total(7).id.clone();
        assert!(tables.stress.resolve_by_id(&resolved).unwrap().persistent);
        create_condition(&mut state, "pc-1", &resolved, "Fixation", 2).unwrap();

        assert!(trigger_with_die(&mut state, &tables, "pc-1", Severity::Stress, 6, 1));
        let outcome = state.character("pc-1").unwrap().last_roll.clone().unwrap();
        assert_eq!(outcome.entry_id, resolved);
        assert!(!outcome.duplicate_adjusted);
    }

    #[test]
    fn ceiling_roll_does_not_bump_past_table_top() {
        let (mut state, tables) = fixture();
        let top = tables.panic.entries.last().unwrap().id.clone();
        create_condition(&mut state, "pc-1", &top, "Terminal Shock", 4).unwrap();
        state.character_mut("pc-1").unwrap().vitals.stress = 10;

        assert!(trigger_with_die(&mut state, &tables, "pc-1", Severity::Panic, 10, 6));
        let outcome = state.character("pc-1").unwrap().last_roll.clone().unwrap();
        // No distinct higher entry exists; the original resolution stands.
        assert_eq!(outcome.entry_id, top);
        assert!(!outcome.duplicate_adjusted);
    }

    #[test]
    fn history_stays_bounded() {
        let (mut state, tables) = fixture();
        for _ in 0..(ROLL_LOG_RETENTION + 25) {
            assert!(trigger_with_die(&mut state, &tables, "pc-1", Severity::Stress, 0, 1));
        }
        assert_eq!(state.roll_log.len(), ROLL_LOG_RETENTION);
    }

    #[test]
    fn successive_triggers_replace_last_roll() {
        let (mut state, tables) = fixture();
        assert!(trigger_with_die(&mut state, &tables, "pc-1", Severity::Stress, 0, 1));
        let first = state.character("pc-1").unwrap().last_roll.clone().unwrap();
        assert!(trigger_with_die(&mut state, &tables, "pc-1", Severity::Panic, 0, 2));
        let second = state.character("pc-1").unwrap().last_roll.clone().unwrap();
        assert_ne!(first.event_id, second.event_id);
        assert_eq!(second.severity, Severity::Panic);
        // The superseded record survives untouched in history.
        assert_eq!(state.roll_log[0], first);
    }
}
