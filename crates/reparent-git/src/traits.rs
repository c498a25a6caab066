//! Trait abstractions for git operations.
//!
//! This module defines the `GitOps` trait which abstracts the git operations
//! a reparent needs, enabling dependency injection and testability.

use std::path::Path;

use git2::Oid;

use crate::repository::{CherryPickOutcome, Repository};
use crate::Result;

/// Trait for git repository operations.
///
/// This trait abstracts git operations, allowing for:
/// - Dependency injection in the replay engine
/// - Mock implementations for testing
///
/// All operations are synchronous since git2 is a synchronous library.
#[allow(clippy::missing_errors_doc)]
pub trait GitOps {
    // === Repository Info ===

    /// Get the path to the .git directory.
    fn git_dir(&self) -> &Path;

    /// Get the current branch name, or `None` when HEAD is detached.
    fn head_branch(&self) -> Result<Option<String>>;

    /// Get the commit HEAD points at.
    fn head_commit(&self) -> Result<Oid>;

    // === Reference Resolution ===

    /// Check if a revision expression resolves to a commit.
    fn ref_exists(&self, reference: &str) -> bool;

    /// Resolve a revision expression to a commit id.
    fn resolve_commit(&self, reference: &str) -> Result<Oid>;

    /// Get the first line of a commit's message.
    fn commit_summary(&self, commit: Oid) -> Result<String>;

    /// Check if a commit has more than one parent.
    fn is_merge_commit(&self, commit: Oid) -> Result<bool>;

    /// List commits reachable from `tip` but not `boundary`, oldest first.
    fn commits_between(&self, boundary: Oid, tip: Oid) -> Result<Vec<Oid>>;

    // === Working Directory ===

    /// Require that the working directory is clean.
    fn require_clean(&self) -> Result<()>;

    // === Position ===

    /// Check if a branch exists.
    fn branch_exists(&self, name: &str) -> bool;

    /// Create a branch at a commit.
    fn create_branch_at(&self, name: &str, target: Oid) -> Result<()>;

    /// Checkout a branch.
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Checkout a commit, leaving HEAD detached.
    fn checkout_detached(&self, target: Oid) -> Result<()>;

    /// Force a branch to point at a commit.
    fn move_branch(&self, branch: &str, target: Oid) -> Result<()>;

    // === Replay ===

    /// Replay one commit on top of HEAD.
    ///
    /// Returns `Error::CherryPickConflict` when the replay stops on conflicts.
    fn cherry_pick(&self, commit: Oid) -> Result<CherryPickOutcome>;

    /// Check if a cherry-pick session is open.
    fn is_cherry_picking(&self) -> bool;

    /// Get files with conflicts in the index.
    fn conflicting_files(&self) -> Result<Vec<String>>;

    /// Commit the resolution of the open cherry-pick session.
    fn cherry_pick_continue(&self) -> Result<CherryPickOutcome>;

    /// Cancel the open cherry-pick session.
    fn cherry_pick_abort(&self) -> Result<()>;
}

impl GitOps for Repository {
    fn git_dir(&self) -> &Path {
        Self::git_dir(self)
    }

    fn head_branch(&self) -> Result<Option<String>> {
        Self::head_branch(self)
    }

    fn head_commit(&self) -> Result<Oid> {
        Self::head_commit(self)
    }

    fn ref_exists(&self, reference: &str) -> bool {
        Self::ref_exists(self, reference)
    }

    fn resolve_commit(&self, reference: &str) -> Result<Oid> {
        Self::resolve_commit(self, reference)
    }

    fn commit_summary(&self, commit: Oid) -> Result<String> {
        Self::commit_summary(self, commit)
    }

    fn is_merge_commit(&self, commit: Oid) -> Result<bool> {
        Self::is_merge_commit(self, commit)
    }

    fn commits_between(&self, boundary: Oid, tip: Oid) -> Result<Vec<Oid>> {
        Self::commits_between(self, boundary, tip)
    }

    fn require_clean(&self) -> Result<()> {
        Self::require_clean(self)
    }

    fn branch_exists(&self, name: &str) -> bool {
        Self::branch_exists(self, name)
    }

    fn create_branch_at(&self, name: &str, target: Oid) -> Result<()> {
        Self::create_branch_at(self, name, target)
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        Self::checkout(self, branch)
    }

    fn checkout_detached(&self, target: Oid) -> Result<()> {
        Self::checkout_detached(self, target)
    }

    fn move_branch(&self, branch: &str, target: Oid) -> Result<()> {
        Self::move_branch(self, branch, target)
    }

    fn cherry_pick(&self, commit: Oid) -> Result<CherryPickOutcome> {
        Self::cherry_pick(self, commit)
    }

    fn is_cherry_picking(&self) -> bool {
        Self::is_cherry_picking(self)
    }

    fn conflicting_files(&self) -> Result<Vec<String>> {
        Self::conflicting_files(self)
    }

    fn cherry_pick_continue(&self) -> Result<CherryPickOutcome> {
        Self::cherry_pick_continue(self)
    }

    fn cherry_pick_abort(&self) -> Result<()> {
        Self::cherry_pick_abort(self)
    }
}
