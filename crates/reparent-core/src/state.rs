//! Persistence of the in-progress reparent inside the git directory.
//!
//! The record is a flat text file so it can be inspected (and, in a pinch,
//! edited) by hand:
//!
//! ```text
//! ORIGINAL_BRANCH=feature/x
//! ORIGINAL_HEAD=<commit-id>
//! NO_BRANCH=false
//! COMMITS=
//! <commit-id>
//! <commit-id>
//! ```

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reparent_git::Oid;

use crate::error::{Error, Result};
use crate::traits::StateStore;

/// The durable part of a reparent: what is left to replay and where to go
/// when it is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReparentState {
    /// Branch that was checked out when the reparent started.
    /// `None` when it started from a detached HEAD.
    pub original_branch: Option<String>,

    /// Commit HEAD pointed at when the reparent started.
    pub original_head: Option<Oid>,

    /// Leave the result detached instead of moving the branch.
    pub no_branch: bool,

    /// Commits still to replay, oldest first.
    pub remaining: VecDeque<Oid>,
}

impl ReparentState {
    /// Create a new record.
    #[must_use]
    pub fn new(
        original_branch: Option<String>,
        original_head: Option<Oid>,
        no_branch: bool,
        commits: Vec<Oid>,
    ) -> Self {
        Self {
            original_branch,
            original_head,
            no_branch,
            remaining: commits.into(),
        }
    }

    /// Check if every commit has been replayed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Copy of the commits still to replay.
    #[must_use]
    pub fn pending(&self) -> Vec<Oid> {
        self.remaining.iter().copied().collect()
    }

    /// Branch that finalizing will move, if any.
    #[must_use]
    pub fn branch_to_move(&self) -> Option<&str> {
        if self.no_branch {
            None
        } else {
            self.original_branch.as_deref()
        }
    }
}

impl fmt::Display for ReparentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ORIGINAL_BRANCH={}",
            self.original_branch.as_deref().unwrap_or_default()
        )?;
        if let Some(head) = self.original_head {
            writeln!(f, "ORIGINAL_HEAD={head}")?;
        }
        writeln!(f, "NO_BRANCH={}", self.no_branch)?;
        writeln!(f, "COMMITS=")?;
        for commit in &self.remaining {
            writeln!(f, "{commit}")?;
        }
        Ok(())
    }
}

impl FromStr for ReparentState {
    type Err = String;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let mut original_branch = None;
        let mut original_head = None;
        let mut no_branch = None;
        let mut remaining = VecDeque::new();
        let mut seen = HashSet::new();
        let mut in_commits = false;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            let number = number + 1;

            if in_commits {
                if line.is_empty() {
                    continue;
                }
                let oid = parse_oid(line).ok_or_else(|| {
                    format!("line {number}: '{line}' is not a full commit id")
                })?;
                if !seen.insert(oid) {
                    return Err(format!("line {number}: commit {oid} is listed twice"));
                }
                remaining.push_back(oid);
                continue;
            }

            if line.is_empty() {
                continue;
            }

            if line == "COMMITS=" {
                in_commits = true;
            } else if let Some(value) = line.strip_prefix("ORIGINAL_BRANCH=") {
                original_branch = Some((!value.is_empty()).then(|| value.to_string()));
            } else if let Some(value) = line.strip_prefix("ORIGINAL_HEAD=") {
                if !value.is_empty() {
                    let oid = parse_oid(value).ok_or_else(|| {
                        format!("line {number}: '{value}' is not a full commit id")
                    })?;
                    original_head = Some(oid);
                }
            } else if let Some(value) = line.strip_prefix("NO_BRANCH=") {
                no_branch = Some(match value {
                    "true" => true,
                    "false" => false,
                    other => {
                        return Err(format!(
                            "line {number}: NO_BRANCH must be true or false, got '{other}'"
                        ));
                    }
                });
            } else {
                return Err(format!("line {number}: unexpected '{line}'"));
            }
        }

        if !in_commits {
            return Err("missing COMMITS= section".into());
        }

        Ok(Self {
            original_branch: original_branch.ok_or("missing ORIGINAL_BRANCH")?,
            original_head,
            no_branch: no_branch.ok_or("missing NO_BRANCH")?,
            remaining,
        })
    }
}

fn parse_oid(text: &str) -> Option<Oid> {
    if text.len() != 40 {
        return None;
    }
    Oid::from_str(text).ok()
}

/// File-backed [`StateStore`] living in the git directory.
#[derive(Debug)]
pub struct StateFile {
    /// Path to the .git directory.
    git_dir: PathBuf,
}

impl StateFile {
    /// File names within the git directory.
    const STATE_FILE: &'static str = "git-reparent-state";
    const MARKER_FILE: &'static str = "REPARENT_HEAD";

    /// Create a new store for the given git directory.
    ///
    /// # Errors
    /// Returns error if the path is not a directory.
    pub fn new(git_dir: impl AsRef<Path>) -> Result<Self> {
        let git_dir = git_dir.as_ref();
        if !git_dir.is_dir() {
            return Err(Error::NotARepository);
        }

        Ok(Self {
            git_dir: git_dir.to_path_buf(),
        })
    }

    /// Path of the state record.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.git_dir.join(Self::STATE_FILE)
    }

    /// Path of the marker file.
    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.git_dir.join(Self::MARKER_FILE)
    }
}

/// Write `content` next to `path` and rename it into place.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl StateStore for StateFile {
    fn is_in_progress(&self) -> bool {
        self.state_path().exists() || self.marker_path().exists()
    }

    fn load(&self) -> Result<ReparentState> {
        let path = self.state_path();
        if !path.exists() {
            if self.marker_path().exists() {
                return Err(Error::StateParseError {
                    file: path,
                    message: format!("{} exists but the record is missing", Self::MARKER_FILE),
                });
            }
            return Err(Error::NotInProgress);
        }

        let content = fs::read_to_string(&path)?;
        let state = content
            .parse::<ReparentState>()
            .map_err(|message| Error::StateParseError {
                file: path.clone(),
                message,
            })?;

        tracing::debug!("Loaded reparent state from {}", path.display());
        Ok(state)
    }

    fn save(&self, state: &ReparentState, anchor: Oid) -> Result<()> {
        write_atomic(&self.state_path(), &state.to_string())?;
        write_atomic(&self.marker_path(), &format!("{anchor}\n"))?;

        tracing::debug!(
            "Saved reparent state ({} remaining) anchored at {}",
            state.remaining.len(),
            anchor
        );
        Ok(())
    }

    fn marker(&self) -> Result<Option<Oid>> {
        let path = self.marker_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let oid = parse_oid(content.trim()).ok_or_else(|| Error::StateParseError {
            file: path,
            message: "marker does not hold a commit id".into(),
        })?;
        Ok(Some(oid))
    }

    fn clear(&self) -> Result<()> {
        remove_if_exists(&self.state_path())?;
        remove_if_exists(&self.marker_path())?;
        tracing::debug!("Cleared reparent state");
        Ok(())
    }
}
