//! Error types for reparent-core.

use std::path::PathBuf;

use crate::engine::Phase;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in reparent-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a Git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepository,

    /// `--number` and `--from` were both given.
    #[error("cannot specify both --number and --from")]
    ConflictingRange,

    /// `--number` was zero.
    #[error("--number must be a positive integer")]
    InvalidCount,

    /// A reparent is already suspended in this repository.
    #[error(
        "reparent already in progress - run `git reparent --continue` or `git reparent --abort`"
    )]
    AlreadyInProgress,

    /// No reparent is in progress.
    #[error("no reparent in progress")]
    NotInProgress,

    /// The commit range contains a merge commit.
    #[error("commit {0} is a merge commit and cannot be reparented")]
    MergeCommitInRange(String),

    /// Conflicts remain in the index after a `--continue`.
    #[error("unresolved conflicts remain in: {}", .0.join(", "))]
    UnresolvedConflicts(Vec<String>),

    /// HEAD was moved onto a branch while the reparent was suspended.
    #[error(
        "HEAD is on branch '{0}' but the reparent works on a detached HEAD - run `git reparent --abort`"
    )]
    PositionMoved(String),

    /// Commits were replayed but the branch could not be updated.
    #[error(
        "commits were replayed but branch '{branch}' could not be updated: {source} - fix the problem and run `git reparent --continue`"
    )]
    Finalization {
        /// The branch being moved.
        branch: String,
        /// The underlying git failure.
        #[source]
        source: reparent_git::Error,
    },

    /// A command asked for a phase change the state machine does not allow.
    #[error("illegal reparent transition from {from:?} to {to:?}")]
    IllegalTransition {
        /// Phase the engine was in.
        from: Phase,
        /// Phase that was requested.
        to: Phase,
    },

    /// State file parsing error.
    #[error("failed to parse {file}: {message} - use `git reparent --abort` to cancel the reparent")]
    StateParseError { file: PathBuf, message: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Git operation error.
    #[error("{0}")]
    Git(#[from] reparent_git::Error),
}
