//! Centralized tuning constants for Deepsix session logic.
//!
//! These values define the deterministic math for roll resolution and
//! vitals bookkeeping. Keeping them together ensures that session
//! behavior can only be adjusted via code changes reviewed in version
//! control, rather than through external JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_ROLL_STRESS: &str = "log.roll.stress";
pub(crate) const LOG_ROLL_PANIC: &str = "log.roll.panic";
pub(crate) const LOG_ROLL_ESCALATED: &str = "log.roll.escalated";
pub(crate) const LOG_OUTCOME_APPLIED: &str = "log.outcome.applied";
pub(crate) const LOG_OUTCOME_STRESS_COMMITTED: &str = "log.outcome.stress-committed";
pub(crate) const LOG_OUTCOME_UNDONE: &str = "log.outcome.undone";
pub(crate) const LOG_OUTCOME_DISMISSED: &str = "log.outcome.dismissed";
pub(crate) const LOG_CONDITION_ADDED: &str = "log.condition.added";
pub(crate) const LOG_CONDITION_CLEARED: &str = "log.condition.cleared";
pub(crate) const LOG_CHARACTER_ADDED: &str = "log.character.added";
pub(crate) const LOG_CHARACTER_REMOVED: &str = "log.character.removed";
pub(crate) const LOG_SEED_SET: &str = "log.seed-set";

// Die and modifier bounds --------------------------------------------------
pub(crate) const DIE_MIN: i32 = 1;
pub(crate) const DIE_MAX: i32 = 6;
pub(crate) const MODIFIER_MIN: i32 = -10;
pub(crate) const MODIFIER_MAX: i32 = 10;

// Vitals ceilings ----------------------------------------------------------
pub(crate) const STRESS_MAX: i32 = 10;
pub(crate) const RESOLVE_MAX: i32 = 10;
pub(crate) const DEFAULT_MAX_HEALTH: i32 = 10;

/// Flat stress increment used when a duplicate stress outcome is committed.
pub(crate) const DUPLICATE_STRESS_INCREMENT: i32 = 1;

/// Lowest total the roll engine can produce; tables must cover it.
pub(crate) const MIN_TOTAL: i32 = DIE_MIN - RESOLVE_MAX + MODIFIER_MIN;

// History retention --------------------------------------------------------
pub(crate) const ROLL_LOG_RETENTION: usize = 100;
