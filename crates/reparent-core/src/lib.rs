//! # reparent-core
//!
//! Core library for git-reparent: moving the commits at the tip of the
//! current history onto a new parent, one cherry-pick at a time, with a
//! durable record so an interrupted operation can be continued or aborted
//! from a later process.

pub mod config;
pub mod engine;
pub mod error;
pub mod range;
pub mod state;
pub mod traits;

#[cfg(test)]
mod test_mocks;

pub use config::Config;
pub use engine::{
    AbortOutcome, Completion, Phase, PlanOutcome, ReparentEngine, ReparentPlan, ReparentRequest,
    ReplayOutcome, RestoredPosition, Session, Suspension,
};
pub use error::{Error, Result};
pub use range::RangeSpec;
pub use state::{ReparentState, StateFile};
pub use traits::StateStore;
