//! Session state: characters, conditions, roll records.
//!
//! [`SessionState`] is the explicit context object passed into every
//! operation. It is the snapshot the persistence collaborator stores and
//! the transport layer broadcasts; everything in it serializes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::{DEFAULT_MAX_HEALTH, RESOLVE_MAX, ROLL_LOG_RETENTION, STRESS_MAX};
use crate::data::{ChoiceSet, Severity};

/// Per-character vitals tracked by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: i32,
    pub max_health: i32,
    pub stress: i32,
    pub resolve: i32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: DEFAULT_MAX_HEALTH,
            max_health: DEFAULT_MAX_HEALTH,
            stress: 0,
            resolve: 0,
        }
    }
}

impl Vitals {
    pub fn clamp(&mut self) {
        self.max_health = self.max_health.max(1);
        self.health = self.health.clamp(0, self.max_health);
        self.stress = self.stress.clamp(0, STRESS_MAX);
        self.resolve = self.resolve.clamp(0, RESOLVE_MAX);
    }
}

/// A persistent effect attached to a character.
///
/// `kind` ties the condition back to the table entry (or manual name)
/// that produced it; duplicate detection matches on it. `cleared_at` is
/// never unset once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub kind: String,
    pub label: String,
    #[serde(default)]
    pub severity: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cleared_at: Option<DateTime<Utc>>,
}

impl Condition {
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.cleared_at.is_none()
    }
}

/// Immutable record of one triggered roll, plus its mutable applied block.
///
/// Lives in [`Character::last_roll`] until the next trigger replaces it;
/// an as-rolled copy is appended to the session roll log and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub event_id: String,
    pub character_id: String,
    pub severity: Severity,
    pub die: i32,
    pub stress_input: i32,
    pub resolve_input: i32,
    pub modifier: i32,
    pub total: i32,
    pub entry_id: String,
    pub label: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub entry_stress_delta: Option<i32>,
    #[serde(default)]
    pub entry_severity: u8,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub duplicate_adjusted: bool,
    #[serde(default)]
    pub duplicate_from_id: Option<String>,
    #[serde(default)]
    pub duplicate_from_label: Option<String>,
    #[serde(default)]
    pub choices: ChoiceSet,
    #[serde(default)]
    pub applied: bool,
    #[serde(default)]
    pub applied_condition_id: Option<String>,
    #[serde(default)]
    pub applied_entry_id: Option<String>,
    #[serde(default)]
    pub applied_label: Option<String>,
    #[serde(default)]
    pub applied_desc: Option<String>,
    /// Stress change actually committed, post-clamp. Undo subtracts it back.
    #[serde(default)]
    pub applied_stress_delta: Option<i32>,
    #[serde(default)]
    pub stress_delta_applied: bool,
    #[serde(default)]
    pub applied_stress_duplicate: bool,
}

impl RollOutcome {
    /// Reset the applied block to its initial pending shape.
    pub fn reset_applied(&mut self) {
        self.applied = false;
        self.applied_condition_id = None;
        self.applied_entry_id = None;
        self.applied_label = None;
        self.applied_desc = None;
        self.applied_stress_delta = None;
        self.stress_delta_applied = false;
        self.applied_stress_duplicate = false;
    }
}

/// One tracked party member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub last_roll: Option<RollOutcome>,
}

impl Character {
    /// True iff a live condition with the given kind exists.
    #[must_use]
    pub fn has_live_condition(&self, kind: &str) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.is_live() && condition.kind == kind)
    }

    #[must_use]
    pub fn condition(&self, condition_id: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|condition| condition.id == condition_id)
    }

    pub fn condition_mut(&mut self, condition_id: &str) -> Option<&mut Condition> {
        self.conditions
            .iter_mut()
            .find(|condition| condition.id == condition_id)
    }
}

/// Full in-memory session state: character roster, roll history, metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub name: String,
    pub seed: u64,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub roll_log: VecDeque<RollOutcome>,
    pub logs: Vec<String>,
    #[serde(default)]
    pub seq: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            name: String::new(),
            seed: 0,
            characters: Vec::new(),
            roll_log: VecDeque::new(),
            logs: Vec::new(),
            seq: 0,
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn character(&self, character_id: &str) -> Option<&Character> {
        self.characters
            .iter()
            .find(|character| character.id == character_id)
    }

    pub fn character_mut(&mut self, character_id: &str) -> Option<&mut Character> {
        self.characters
            .iter_mut()
            .find(|character| character.id == character_id)
    }

    /// Next value of the session-monotonic id counter.
    pub fn next_seq(&mut self) -> u64 {
        self.seq = self.seq.saturating_add(1);
        self.seq
    }

    pub fn push_log(&mut self, key: &str) {
        self.logs.push(String::from(key));
    }

    /// Append an as-rolled copy to the bounded roll history.
    ///
    /// Oldest entries drop silently once the retention count is reached.
    pub fn push_roll_log(&mut self, outcome: RollOutcome) {
        self.roll_log.push_back(outcome);
        while self.roll_log.len() > ROLL_LOG_RETENTION {
            self.roll_log.pop_front();
        }
    }
}
