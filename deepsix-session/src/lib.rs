//! Deepsix Session Engine
//!
//! Platform-agnostic core logic for the Deepsix tabletop session
//! companion. This crate owns roll resolution against the static stress
//! and panic tables, the apply/undo outcome state machine, and the
//! condition ledger, without UI, network, or storage dependencies.
//! Transport and persistence are external collaborators reached through
//! the traits below.

pub mod apply;
pub mod conditions;
pub mod constants;
pub mod data;
pub mod rng;
pub mod roll;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use apply::{apply, apply_stress_delta, clear_outcome, undo};
pub use conditions::{clear_condition, create_condition, has_live_condition, toggle_condition};
pub use data::{ApplyChoice, ChoiceSet, OutcomeEntry, OutcomeTable, Severity, TableError, TableSet};
pub use rng::{CountingRng, RngBundle};
pub use roll::{trigger, trigger_with_die};
pub use session::CompanionSession;
pub use state::{Character, Condition, RollOutcome, SessionState, Vitals};

/// Trait for abstracting outcome-table loading
/// Platform-specific implementations should provide this
pub trait TableSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the stress and panic tables from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the table data cannot be loaded or parsed.
    fn load_tables(&self) -> Result<TableSet, Self::Error>;
}

/// Trait for abstracting session snapshot save/load operations
/// Platform-specific implementations should provide this
pub trait SnapshotStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_session(&self, save_name: &str, state: &SessionState) -> Result<(), Self::Error>;

    /// Load a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_session(&self, save_name: &str) -> Result<Option<SessionState>, Self::Error>;

    /// Delete a saved session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    fn delete_session(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Table source serving the tables embedded in this crate.
#[derive(Clone, Copy, Default)]
pub struct BuiltinTables;

impl TableSource for BuiltinTables {
    type Error = std::convert::Infallible;

    fn load_tables(&self) -> Result<TableSet, Self::Error> {
        Ok(TableSet::builtin().clone())
    }
}

/// Main engine for bootstrapping and persisting companion sessions
pub struct CompanionEngine<L, S>
where
    L: TableSource,
    S: SnapshotStore,
{
    table_source: L,
    store: S,
}

impl<L, S> CompanionEngine<L, S>
where
    L: TableSource,
    S: SnapshotStore,
{
    /// Create a new engine with the provided table source and store
    pub const fn new(table_source: L, store: S) -> Self {
        Self {
            table_source,
            store,
        }
    }

    /// Create a new session with the specified name and seed
    ///
    /// Tables are loaded and validated here; a table failing the
    /// contiguity invariant refuses the session rather than resolving
    /// rolls against an incomplete table.
    ///
    /// # Errors
    ///
    /// Returns an error if the tables cannot be loaded or fail validation.
    pub fn create_session(&self, name: &str, seed: u64) -> anyhow::Result<CompanionSession>
    where
        L::Error: Into<anyhow::Error>,
    {
        let tables = self.table_source.load_tables().map_err(Into::into)?;
        tables.validate()?;
        Ok(CompanionSession::new(name, seed, tables))
    }

    /// Save a session's state snapshot under its own name
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_session(&self, session: &CompanionSession) -> Result<(), S::Error> {
        self.store
            .save_session(&session.state().name, session.state())
    }

    /// Load a session snapshot and rehydrate it against fresh tables
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded, or if the
    /// freshly loaded tables fail validation.
    pub fn load_session(&self, save_name: &str) -> anyhow::Result<Option<CompanionSession>>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(state) = self.store.load_session(save_name).map_err(Into::into)? {
            let tables = self.table_source.load_tables().map_err(Into::into)?;
            tables.validate()?;
            Ok(Some(CompanionSession::from_state(state, tables)))
        } else {
            Ok(None)
        }
    }
}
