//! High-level session wrapper binding the outcome tables, the mutable
//! session state, and the deterministic RNG streams.
//!
//! This is the surface the transport layer drives: one command at a time,
//! run to completion, with a dirty flag the host drains after each
//! command to schedule persistence.

use std::rc::Rc;

use crate::apply;
use crate::conditions;
use crate::constants::{LOG_CHARACTER_ADDED, LOG_CHARACTER_REMOVED, LOG_SEED_SET};
use crate::data::{Severity, TableSet};
use crate::rng::RngBundle;
use crate::roll;
use crate::state::{Character, SessionState, Vitals};

/// A running companion session for one table of players.
///
/// Sessions share no state with each other; the host serializes command
/// handling per session.
#[derive(Debug, Clone)]
pub struct CompanionSession {
    tables: TableSet,
    state: SessionState,
    rng: Rc<RngBundle>,
    dirty: bool,
}

impl CompanionSession {
    /// Construct a fresh session from a name, seed, and validated tables.
    #[must_use]
    pub fn new(name: &str, seed: u64, tables: TableSet) -> Self {
        let state = SessionState {
            name: name.to_string(),
            seed,
            ..SessionState::default()
        };
        Self::from_state(state, tables)
    }

    /// Rebuild a session from a persisted state snapshot.
    #[must_use]
    pub fn from_state(state: SessionState, tables: TableSet) -> Self {
        let rng = Rc::new(RngBundle::from_user_seed(state.seed));
        Self {
            tables,
            state,
            rng,
            dirty: false,
        }
    }

    /// Borrow the underlying immutable session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Borrow the underlying mutable session state.
    pub const fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Apply a closure to the mutable session state.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.state)
    }

    /// Consume the session, returning the underlying state snapshot.
    #[must_use]
    pub fn into_state(self) -> SessionState {
        self.state
    }

    /// Borrow the tables this session resolves against.
    #[must_use]
    pub const fn tables(&self) -> &TableSet {
        &self.tables
    }

    /// Whether a mutation happened since the flag was last drained.
    ///
    /// The persistence collaborator polls this after each command to
    /// schedule an autosave; draining resets it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Deterministically reseed the session's RNG streams.
    pub fn reseed(&mut self, seed: u64) {
        self.state.seed = seed;
        self.rng = Rc::new(RngBundle::from_user_seed(seed));
        self.state.push_log(LOG_SEED_SET);
        self.dirty = true;
    }

    /// Add a character to the roster. Duplicate ids are ignored.
    pub fn add_character(&mut self, character_id: &str, name: &str) {
        if self.state.character(character_id).is_some() {
            log::debug!("add_character ignored: duplicate id {character_id}");
            return;
        }
        self.state.characters.push(Character {
            id: character_id.to_string(),
            name: name.to_string(),
            ..Character::default()
        });
        self.state.push_log(LOG_CHARACTER_ADDED);
        self.dirty = true;
    }

    /// Remove a character and everything attached to it.
    pub fn remove_character(&mut self, character_id: &str) {
        let before = self.state.characters.len();
        self.state
            .characters
            .retain(|character| character.id != character_id);
        if self.state.characters.len() != before {
            self.state.push_log(LOG_CHARACTER_REMOVED);
            self.dirty = true;
        }
    }

    /// Overwrite a character's vitals, clamped to legal ranges.
    pub fn set_vitals(&mut self, character_id: &str, vitals: Vitals) {
        let Some(character) = self.state.character_mut(character_id) else {
            log::debug!("set_vitals ignored: unknown character {character_id}");
            return;
        };
        character.vitals = vitals;
        character.vitals.clamp();
        self.dirty = true;
    }

    /// Shift a character's vitals by deltas, clamped to legal ranges.
    pub fn adjust_vitals(
        &mut self,
        character_id: &str,
        health_delta: i32,
        stress_delta: i32,
        resolve_delta: i32,
    ) {
        let Some(character) = self.state.character_mut(character_id) else {
            log::debug!("adjust_vitals ignored: unknown character {character_id}");
            return;
        };
        let vitals = &mut character.vitals;
        vitals.health = vitals.health.saturating_add(health_delta);
        vitals.stress = vitals.stress.saturating_add(stress_delta);
        vitals.resolve = vitals.resolve.saturating_add(resolve_delta);
        vitals.clamp();
        self.dirty = true;
    }

    /// Trigger a roll, drawing the die from the severity's seeded stream.
    pub fn trigger(&mut self, character_id: &str, severity: Severity, modifier: i32) {
        let mut stream = self.rng.stream(severity);
        let mutated = roll::trigger(
            &mut self.state,
            &self.tables,
            character_id,
            severity,
            modifier,
            &mut *stream,
        );
        drop(stream);
        self.dirty |= mutated;
    }

    /// Trigger a roll with a moderator-supplied die value.
    pub fn trigger_forced(
        &mut self,
        character_id: &str,
        severity: Severity,
        modifier: i32,
        die: i32,
    ) {
        self.dirty |= roll::trigger_with_die(
            &mut self.state,
            &self.tables,
            character_id,
            severity,
            modifier,
            die,
        );
    }

    /// Commit a pending outcome, optionally selecting a choice alternative.
    pub fn apply(&mut self, character_id: &str, event_id: &str, chosen_entry_id: Option<&str>) {
        self.dirty |= apply::apply(&mut self.state, character_id, event_id, chosen_entry_id);
    }

    /// Commit a pending outcome's stress delta.
    pub fn apply_stress_delta(&mut self, character_id: &str, event_id: &str) {
        self.dirty |= apply::apply_stress_delta(&mut self.state, character_id, event_id);
    }

    /// Reverse a committed outcome.
    pub fn undo(&mut self, character_id: &str, event_id: &str) {
        self.dirty |= apply::undo(&mut self.state, character_id, event_id);
    }

    /// Dismiss a character's pending outcome.
    pub fn clear_outcome(&mut self, character_id: &str) {
        self.dirty |= apply::clear_outcome(&mut self.state, character_id);
    }

    /// Clear a condition by id.
    pub fn clear_condition(&mut self, character_id: &str, condition_id: &str) {
        self.dirty |= conditions::clear_condition(&mut self.state, character_id, condition_id);
    }

    /// Manually toggle a named condition on or off.
    pub fn toggle_condition(&mut self, character_id: &str, kind: &str) {
        self.dirty |= conditions::toggle_condition(&mut self.state, character_id, kind);
    }

    /// Read-only query: does the character carry a live condition of `kind`?
    #[must_use]
    pub fn has_live_condition(&self, character_id: &str, kind: &str) -> bool {
        conditions::has_live_condition(&self.state, character_id, kind)
    }
}
