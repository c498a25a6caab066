//! Mock implementations for testing the engine.
//!
//! These mocks implement `GitOps` and `StateStore` over a small in-memory
//! commit graph so replay logic can be tested without real repositories.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use reparent_git::{CherryPickOutcome, Error as GitError, GitOps, Oid, Result as GitResult};

use crate::error::{Error, Result};
use crate::state::ReparentState;
use crate::traits::StateStore;

/// Where the mock HEAD points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockHead {
    Branch(String),
    Detached(Oid),
}

#[derive(Debug, Clone)]
struct MockCommit {
    summary: String,
    parent: Option<Oid>,
}

/// Mock implementation of `GitOps` for testing.
pub struct MockGitOps {
    pub head: RefCell<MockHead>,
    pub branches: RefCell<HashMap<String, Oid>>,
    commits: RefCell<HashMap<Oid, MockCommit>>,
    pub merges: RefCell<HashSet<Oid>>,
    pub already_applied: RefCell<HashSet<Oid>>,
    pub conflicts_on: RefCell<HashMap<Oid, Vec<String>>>,
    pub fail_on: RefCell<HashSet<Oid>>,
    /// Commit whose cherry-pick stopped on conflicts.
    pub pending: RefCell<Option<Oid>>,
    pub unresolved: RefCell<Vec<String>>,
    /// Original commits in the order they were applied.
    pub picked: RefCell<Vec<Oid>>,
    pub is_clean: Cell<bool>,
    pub fail_move_branch: Cell<bool>,
    pub fail_abort: Cell<bool>,
    next_id: Cell<u64>,
}

impl Default for MockGitOps {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitOps {
    pub fn new() -> Self {
        Self {
            head: RefCell::new(MockHead::Branch("main".to_string())),
            branches: RefCell::new(HashMap::new()),
            commits: RefCell::new(HashMap::new()),
            merges: RefCell::new(HashSet::new()),
            already_applied: RefCell::new(HashSet::new()),
            conflicts_on: RefCell::new(HashMap::new()),
            fail_on: RefCell::new(HashSet::new()),
            pending: RefCell::new(None),
            unresolved: RefCell::new(Vec::new()),
            picked: RefCell::new(Vec::new()),
            is_clean: Cell::new(true),
            fail_move_branch: Cell::new(false),
            fail_abort: Cell::new(false),
            next_id: Cell::new(1),
        }
    }

    fn new_commit(&self, summary: &str, parent: Option<Oid>) -> Oid {
        let n = self.next_id.get();
        self.next_id.set(n + 1);
        let oid = Oid::from_str(&format!("{n:040x}")).unwrap();
        self.commits.borrow_mut().insert(
            oid,
            MockCommit {
                summary: summary.to_string(),
                parent,
            },
        );
        oid
    }

    /// Create a linear history on `branch`, check it out and return the
    /// commits oldest first.
    pub fn add_history(&self, branch: &str, summaries: &[&str]) -> Vec<Oid> {
        let mut parent = self.branches.borrow().get(branch).copied();
        let mut created = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let oid = self.new_commit(summary, parent);
            created.push(oid);
            parent = Some(oid);
        }
        if let Some(tip) = parent {
            self.branches.borrow_mut().insert(branch.to_string(), tip);
        }
        *self.head.borrow_mut() = MockHead::Branch(branch.to_string());
        created
    }

    /// Create a single-commit branch without moving HEAD.
    pub fn add_branch(&self, branch: &str, summary: &str) -> Oid {
        let oid = self.new_commit(summary, None);
        self.branches.borrow_mut().insert(branch.to_string(), oid);
        oid
    }

    pub fn with_conflict_on(self, commit: Oid, files: &[&str]) -> Self {
        self.conflicts_on
            .borrow_mut()
            .insert(commit, files.iter().map(ToString::to_string).collect());
        self
    }

    /// Mark the conflicts of the open cherry-pick as resolved.
    pub fn resolve_conflicts(&self) {
        self.unresolved.borrow_mut().clear();
    }

    pub fn parent_of(&self, commit: Oid) -> Option<Oid> {
        self.commits.borrow().get(&commit).and_then(|c| c.parent)
    }

    pub fn summary_of(&self, commit: Oid) -> String {
        self.commits
            .borrow()
            .get(&commit)
            .map(|c| c.summary.clone())
            .unwrap_or_default()
    }

    pub fn branch_tip(&self, branch: &str) -> Option<Oid> {
        self.branches.borrow().get(branch).copied()
    }

    fn set_head_commit(&self, oid: Oid) {
        let head = self.head.borrow().clone();
        match head {
            MockHead::Branch(name) => {
                self.branches.borrow_mut().insert(name, oid);
            }
            MockHead::Detached(_) => *self.head.borrow_mut() = MockHead::Detached(oid),
        }
    }

    fn apply(&self, original: Oid) -> GitResult<Oid> {
        let head = self.head_commit()?;
        let summary = self.summary_of(original);
        let replayed = self.new_commit(&summary, Some(head));
        self.set_head_commit(replayed);
        self.picked.borrow_mut().push(original);
        Ok(replayed)
    }
}

impl GitOps for MockGitOps {
    fn git_dir(&self) -> &Path {
        Path::new("/mock/.git")
    }

    fn head_branch(&self) -> GitResult<Option<String>> {
        Ok(match &*self.head.borrow() {
            MockHead::Branch(name) => Some(name.clone()),
            MockHead::Detached(_) => None,
        })
    }

    fn head_commit(&self) -> GitResult<Oid> {
        match &*self.head.borrow() {
            MockHead::Branch(name) => self
                .branches
                .borrow()
                .get(name)
                .copied()
                .ok_or_else(|| GitError::BranchNotFound(name.clone())),
            MockHead::Detached(oid) => Ok(*oid),
        }
    }

    fn ref_exists(&self, reference: &str) -> bool {
        self.resolve_commit(reference).is_ok()
    }

    fn resolve_commit(&self, reference: &str) -> GitResult<Oid> {
        let not_found = || GitError::RefNotFound(reference.to_string());

        if let Some(oid) = self.branches.borrow().get(reference) {
            return Ok(*oid);
        }
        if reference == "HEAD" {
            return self.head_commit();
        }
        if let Some(count) = reference.strip_prefix("HEAD~") {
            let count: usize = count.parse().map_err(|_| not_found())?;
            let mut current = self.head_commit()?;
            for _ in 0..count {
                current = self.parent_of(current).ok_or_else(not_found)?;
            }
            return Ok(current);
        }
        if let Ok(oid) = Oid::from_str(reference) {
            if self.commits.borrow().contains_key(&oid) {
                return Ok(oid);
            }
        }
        self.commits
            .borrow()
            .iter()
            .find(|(_, c)| c.summary == reference)
            .map(|(oid, _)| *oid)
            .ok_or_else(not_found)
    }

    fn commit_summary(&self, commit: Oid) -> GitResult<String> {
        Ok(self.summary_of(commit))
    }

    fn is_merge_commit(&self, commit: Oid) -> GitResult<bool> {
        Ok(self.merges.borrow().contains(&commit))
    }

    fn commits_between(&self, boundary: Oid, tip: Oid) -> GitResult<Vec<Oid>> {
        let mut commits = Vec::new();
        let mut current = Some(tip);
        while let Some(oid) = current {
            if oid == boundary {
                break;
            }
            commits.push(oid);
            current = self.parent_of(oid);
        }
        commits.reverse();
        Ok(commits)
    }

    fn require_clean(&self) -> GitResult<()> {
        if self.is_clean.get() {
            Ok(())
        } else {
            Err(GitError::DirtyWorkingDirectory)
        }
    }

    fn branch_exists(&self, name: &str) -> bool {
        self.branches.borrow().contains_key(name)
    }

    fn create_branch_at(&self, name: &str, target: Oid) -> GitResult<()> {
        self.branches.borrow_mut().insert(name.to_string(), target);
        Ok(())
    }

    fn checkout(&self, branch: &str) -> GitResult<()> {
        if !self.branch_exists(branch) {
            return Err(GitError::BranchNotFound(branch.to_string()));
        }
        *self.head.borrow_mut() = MockHead::Branch(branch.to_string());
        Ok(())
    }

    fn checkout_detached(&self, target: Oid) -> GitResult<()> {
        *self.head.borrow_mut() = MockHead::Detached(target);
        Ok(())
    }

    fn move_branch(&self, branch: &str, target: Oid) -> GitResult<()> {
        if self.fail_move_branch.get() {
            return Err(GitError::BranchNotFound(branch.to_string()));
        }
        self.branches
            .borrow_mut()
            .insert(branch.to_string(), target);
        Ok(())
    }

    fn cherry_pick(&self, commit: Oid) -> GitResult<CherryPickOutcome> {
        if self.merges.borrow().contains(&commit) {
            return Err(GitError::MergeCommit(commit.to_string()));
        }
        if self.fail_on.borrow().contains(&commit) {
            return Err(GitError::RefNotFound(commit.to_string()));
        }
        if let Some(files) = self.conflicts_on.borrow().get(&commit) {
            *self.pending.borrow_mut() = Some(commit);
            self.unresolved.borrow_mut().clone_from(files);
            return Err(GitError::CherryPickConflict(files.clone()));
        }
        if self.already_applied.borrow().contains(&commit) {
            return Ok(CherryPickOutcome::AlreadyApplied);
        }
        Ok(CherryPickOutcome::Committed(self.apply(commit)?))
    }

    fn is_cherry_picking(&self) -> bool {
        self.pending.borrow().is_some()
    }

    fn conflicting_files(&self) -> GitResult<Vec<String>> {
        Ok(self.unresolved.borrow().clone())
    }

    fn cherry_pick_continue(&self) -> GitResult<CherryPickOutcome> {
        let Some(commit) = *self.pending.borrow() else {
            return Err(GitError::NoCherryPickInProgress);
        };
        let unresolved = self.unresolved.borrow().clone();
        if !unresolved.is_empty() {
            return Err(GitError::UnresolvedConflicts(unresolved));
        }
        *self.pending.borrow_mut() = None;
        Ok(CherryPickOutcome::Committed(self.apply(commit)?))
    }

    fn cherry_pick_abort(&self) -> GitResult<()> {
        if self.fail_abort.get() {
            return Err(GitError::NoCherryPickInProgress);
        }
        *self.pending.borrow_mut() = None;
        self.unresolved.borrow_mut().clear();
        Ok(())
    }
}

/// Mock implementation of `StateStore` for testing.
#[derive(Default)]
pub struct MockStateStore {
    pub state: RefCell<Option<ReparentState>>,
    pub marker: RefCell<Option<Oid>>,
    pub corrupt: Cell<bool>,
    /// Number of successful saves.
    pub saves: Cell<usize>,
}

impl MockStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(self, state: ReparentState, anchor: Oid) -> Self {
        *self.state.borrow_mut() = Some(state);
        *self.marker.borrow_mut() = Some(anchor);
        self
    }

    pub fn remaining(&self) -> Vec<Oid> {
        self.state
            .borrow()
            .as_ref()
            .map(|s| s.remaining.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl StateStore for MockStateStore {
    fn is_in_progress(&self) -> bool {
        self.corrupt.get() || self.state.borrow().is_some()
    }

    fn load(&self) -> Result<ReparentState> {
        if self.corrupt.get() {
            return Err(Error::StateParseError {
                file: "git-reparent-state".into(),
                message: "line 1: unexpected 'garbage'".into(),
            });
        }
        self.state.borrow().clone().ok_or(Error::NotInProgress)
    }

    fn save(&self, state: &ReparentState, anchor: Oid) -> Result<()> {
        *self.state.borrow_mut() = Some(state.clone());
        *self.marker.borrow_mut() = Some(anchor);
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn marker(&self) -> Result<Option<Oid>> {
        Ok(*self.marker.borrow())
    }

    fn clear(&self) -> Result<()> {
        *self.state.borrow_mut() = None;
        *self.marker.borrow_mut() = None;
        self.corrupt.set(false);
        Ok(())
    }
}
