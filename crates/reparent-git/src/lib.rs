//! # reparent-git
//!
//! Git operations abstraction layer for git-reparent, built on git2-rs.
//! Provides reference resolution, commit range walks, detached checkouts,
//! branch moves and single-commit replay with native cherry-pick sessions.

mod backup;
mod error;
mod repository;
mod traits;

pub use backup::{backup_branch_name, create_backup_branch};
pub use error::{Error, Result};
pub use git2::Oid;
pub use repository::{CherryPickOutcome, Repository, short_id};
pub use traits::GitOps;
