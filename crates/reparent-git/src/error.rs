//! Error types for reparent-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// Branch not found.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// Reference does not resolve to a commit.
    #[error("reference '{0}' does not exist")]
    RefNotFound(String),

    /// HEAD is detached (not on a branch).
    #[error("HEAD is detached - checkout a branch first")]
    DetachedHead,

    /// Working directory is dirty.
    #[error("there are uncommitted changes - commit or stash them first")]
    DirtyWorkingDirectory,

    /// Cherry-pick stopped with conflicts.
    #[error("cherry-pick conflict in: {0:?}")]
    CherryPickConflict(Vec<String>),

    /// The index still has conflict entries.
    #[error("unresolved conflicts in: {0:?}")]
    UnresolvedConflicts(Vec<String>),

    /// No cherry-pick session is open.
    #[error("no cherry-pick in progress")]
    NoCherryPickInProgress,

    /// Merge commits cannot be replayed as a single change set.
    #[error("commit {0} is a merge commit")]
    MergeCommit(String),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}
