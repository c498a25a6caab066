//! Trait abstractions for state storage operations.
//!
//! This module defines the `StateStore` trait which abstracts persistence of
//! the in-progress reparent, enabling dependency injection and testability.

use reparent_git::Oid;

use crate::Result;
use crate::state::ReparentState;

/// Trait for the single per-repository reparent record.
///
/// A record exists exactly while a reparent is in progress. Alongside it the
/// store keeps a marker holding the detached commit the operation was anchored
/// at when the record was last written.
#[allow(clippy::missing_errors_doc)]
pub trait StateStore {
    /// Check if a reparent is in progress.
    fn is_in_progress(&self) -> bool;

    /// Load the current record.
    ///
    /// Returns `Error::NotInProgress` when there is none and
    /// `Error::StateParseError` when it cannot be parsed.
    fn load(&self) -> Result<ReparentState>;

    /// Write the record wholesale, then the marker holding `anchor`.
    fn save(&self, state: &ReparentState, anchor: Oid) -> Result<()>;

    /// Read the marker commit, if any.
    fn marker(&self) -> Result<Option<Oid>>;

    /// Remove the record and the marker.
    fn clear(&self) -> Result<()>;

    /// Replace the remaining commit list, keeping everything else.
    fn update(&self, remaining: Vec<Oid>, anchor: Oid) -> Result<()> {
        let mut state = self.load()?;
        state.remaining = remaining.into();
        self.save(&state, anchor)
    }
}
