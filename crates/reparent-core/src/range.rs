//! Commit range selection.
//!
//! A reparent always moves a contiguous run of commits ending at HEAD. The
//! run is bounded either by a count (`--number`) or by an exclusive lower
//! commit (`--from`).

use reparent_git::{GitOps, Oid};

use crate::error::{Error, Result};

/// How the range of commits to move is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// The last N commits on HEAD.
    Count(usize),
    /// Everything after the given commit, up to HEAD.
    From(String),
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl RangeSpec {
    /// Build a range from the `--number` / `--from` pair.
    ///
    /// # Errors
    /// Returns `Error::ConflictingRange` if both are given and
    /// `Error::InvalidCount` for a zero count.
    pub fn from_options(number: Option<usize>, from: Option<String>) -> Result<Self> {
        match (number, from) {
            (Some(_), Some(_)) => Err(Error::ConflictingRange),
            (Some(0), None) => Err(Error::InvalidCount),
            (Some(n), None) => Ok(Self::Count(n)),
            (None, Some(from)) => Ok(Self::From(from)),
            (None, None) => Ok(Self::default()),
        }
    }

    /// Revision expression naming the exclusive lower bound.
    #[must_use]
    pub fn boundary(&self) -> String {
        match self {
            Self::Count(n) => format!("HEAD~{n}"),
            Self::From(reference) => reference.clone(),
        }
    }
}

/// List the commits the range selects, oldest first.
///
/// # Errors
/// Returns error if the boundary does not resolve, for example when HEAD has
/// fewer than N ancestors.
pub fn extract_commits<G: GitOps + ?Sized>(git: &G, spec: &RangeSpec) -> Result<Vec<Oid>> {
    let boundary = git.resolve_commit(&spec.boundary())?;
    let head = git.head_commit()?;

    let commits = git.commits_between(boundary, head)?;
    tracing::debug!(
        "Range {} selects {} commit(s)",
        spec.boundary(),
        commits.len()
    );
    Ok(commits)
}
