//! Replay engine for reparent operations.
//!
//! A reparent detaches HEAD at the new parent, replays the selected commits
//! one cherry-pick at a time, and finally moves the original branch to the
//! new tip. Every step is written to the [`StateStore`] so a conflict can
//! suspend the operation and a later process can continue or abort it.

use std::cell::Cell;

use reparent_git::{CherryPickOutcome, GitOps, Oid, short_id};

use crate::error::{Error, Result};
use crate::range::{self, RangeSpec};
use crate::state::ReparentState;
use crate::traits::StateStore;

/// Phases of a reparent.
///
/// ```text
/// Idle -> Planning -> Replaying <-> Suspended
///                     Replaying  -> Finalizing -> Idle
/// Planning | Replaying | Suspended -> Aborting -> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No operation in progress.
    Idle,
    /// Validating the request and building the plan.
    Planning,
    /// Applying commits onto the new parent.
    Replaying,
    /// Stopped on a conflict, waiting for `--continue` or `--abort`.
    Suspended,
    /// Moving the branch and clearing state.
    Finalizing,
    /// Unwinding to the original position.
    Aborting,
}

impl Phase {
    /// Check if moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Planning)
                | (Self::Planning, Self::Replaying | Self::Idle | Self::Aborting)
                | (Self::Replaying, Self::Suspended | Self::Finalizing | Self::Aborting)
                | (Self::Suspended, Self::Replaying | Self::Aborting)
                | (Self::Finalizing | Self::Aborting, Self::Idle)
        )
    }
}

/// The persisted operation as seen by a new command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Nothing recorded.
    Idle,
    /// A reparent was started and has not finished.
    InProgress(ReparentState),
}

impl Session {
    /// Load the session from the store.
    ///
    /// # Errors
    /// Returns error if a record exists but cannot be read.
    pub fn load<S: StateStore + ?Sized>(store: &S) -> Result<Self> {
        if !store.is_in_progress() {
            return Ok(Self::Idle);
        }
        store.load().map(Self::InProgress)
    }

    /// Phase a new command starts from.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::InProgress(_) => Phase::Suspended,
        }
    }
}

/// What the user asked to reparent.
#[derive(Debug, Clone)]
pub struct ReparentRequest {
    /// Revision expression for the new parent.
    pub parent: String,
    /// Which commits to move.
    pub range: RangeSpec,
    /// Leave the result detached instead of moving the branch.
    pub no_branch: bool,
}

/// A validated reparent, ready to start.
#[derive(Debug, Clone)]
pub struct ReparentPlan {
    /// The parent as the user wrote it.
    pub parent_ref: String,
    /// The resolved new parent.
    pub parent: Oid,
    /// Commits to replay, oldest first.
    pub commits: Vec<Oid>,
    /// Branch checked out at planning time, `None` when detached.
    pub original_branch: Option<String>,
    /// HEAD at planning time.
    pub original_head: Oid,
    pub no_branch: bool,
}

impl ReparentPlan {
    /// Check if finalizing will move a branch.
    #[must_use]
    pub fn moves_branch(&self) -> bool {
        !self.no_branch && self.original_branch.is_some()
    }

    fn to_state(&self) -> ReparentState {
        ReparentState::new(
            self.original_branch.clone(),
            Some(self.original_head),
            self.no_branch,
            self.commits.clone(),
        )
    }
}

/// Result of planning.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    /// The range selected no commits.
    NothingToReparent,
    /// The plan can be started.
    Ready(ReparentPlan),
}

/// Details of a replay stopped on conflicts.
#[derive(Debug, Clone)]
pub struct Suspension {
    /// The commit left half-applied.
    pub commit: Oid,
    /// 1-based position of `commit` among the commits this run replays.
    pub position: usize,
    /// Number of commits this run replays.
    pub total: usize,
    /// Files with conflicts.
    pub files: Vec<String>,
    /// Commits recorded for after the conflicting one.
    pub remaining: usize,
}

/// Details of a finished reparent.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The last replayed commit.
    pub new_tip: Oid,
    /// The branch moved to `new_tip`, `None` when the result stays detached.
    pub branch: Option<String>,
    /// Commits replayed in this run.
    pub replayed: usize,
    /// Commits skipped because the new parent already had their changes.
    pub skipped: Vec<Oid>,
}

/// Result of running the replay.
#[derive(Debug, Clone)]
pub enum ReplayOutcome {
    Completed(Completion),
    Suspended(Suspension),
}

/// Where abort left HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoredPosition {
    Branch(String),
    Detached(Oid),
}

/// Result of an abort.
#[derive(Debug, Clone)]
pub struct AbortOutcome {
    /// `None` when the record was unreadable and HEAD was left as is.
    pub restored: Option<RestoredPosition>,
    /// Set when cancelling the cherry-pick failed.
    pub cancel_failure: Option<String>,
}

#[derive(Debug, Default)]
struct Progress {
    replayed: usize,
    skipped: Vec<Oid>,
}

/// Engine driving a reparent through its phases.
pub struct ReparentEngine<'a, G: GitOps, S: StateStore> {
    git: &'a G,
    store: &'a S,
    phase: Cell<Phase>,
}

impl<'a, G: GitOps, S: StateStore> ReparentEngine<'a, G, S> {
    /// Create a new engine.
    #[must_use]
    pub const fn new(git: &'a G, store: &'a S) -> Self {
        Self {
            git,
            store,
            phase: Cell::new(Phase::Idle),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    fn enter(&self, next: Phase) -> Result<()> {
        let from = self.phase.get();
        if !from.can_transition_to(next) {
            return Err(Error::IllegalTransition { from, to: next });
        }
        tracing::debug!("reparent phase {from:?} -> {next:?}");
        self.phase.set(next);
        Ok(())
    }

    /// Validate a request and build the plan.
    ///
    /// Nothing is written; a failed or empty plan returns the engine to idle.
    ///
    /// # Errors
    /// Returns error if a reparent is already in progress, the working tree is
    /// dirty, a reference does not resolve, or the range contains a merge.
    pub fn plan(&self, request: &ReparentRequest) -> Result<PlanOutcome> {
        if self.store.is_in_progress() {
            return Err(Error::AlreadyInProgress);
        }
        self.enter(Phase::Planning)?;

        let outcome = self.build_plan(request);
        if !matches!(outcome, Ok(PlanOutcome::Ready(_))) {
            self.phase.set(Phase::Idle);
        }
        outcome
    }

    fn build_plan(&self, request: &ReparentRequest) -> Result<PlanOutcome> {
        self.git.require_clean()?;

        let parent = self.git.resolve_commit(&request.parent)?;
        let original_branch = self.git.head_branch()?;
        let original_head = self.git.head_commit()?;

        let commits = range::extract_commits(self.git, &request.range)?;
        if commits.is_empty() {
            return Ok(PlanOutcome::NothingToReparent);
        }

        for &commit in &commits {
            if self.git.is_merge_commit(commit)? {
                return Err(Error::MergeCommitInRange(short_id(commit)));
            }
        }

        Ok(PlanOutcome::Ready(ReparentPlan {
            parent_ref: request.parent.clone(),
            parent,
            commits,
            original_branch,
            original_head,
            no_branch: request.no_branch,
        }))
    }

    /// Drop a plan without starting it.
    ///
    /// # Errors
    /// Returns error if no plan is pending.
    pub fn discard_plan(&self) -> Result<()> {
        self.enter(Phase::Idle)
    }

    /// Start a planned reparent.
    ///
    /// # Errors
    /// Returns error if another reparent is in progress, HEAD cannot be
    /// detached, or a commit fails to replay for a reason other than conflicts.
    pub fn start(&self, plan: &ReparentPlan) -> Result<ReplayOutcome> {
        if self.store.is_in_progress() {
            return Err(Error::AlreadyInProgress);
        }
        self.enter(Phase::Replaying)?;

        let state = plan.to_state();
        self.store.save(&state, plan.parent)?;

        tracing::info!(
            "Detaching HEAD at {} ({})",
            plan.parent_ref,
            short_id(plan.parent)
        );
        self.git.checkout_detached(plan.parent)?;

        self.replay(state, Progress::default(), plan.commits.len())
    }

    /// Continue a suspended reparent.
    ///
    /// Commits the resolution of an open cherry-pick, then replays what is
    /// left. With nothing left this only finalizes.
    ///
    /// # Errors
    /// Returns error if no reparent is in progress, conflicts are still
    /// unresolved, or HEAD was moved onto a branch in the meantime.
    pub fn continue_(&self) -> Result<ReplayOutcome> {
        let session = Session::load(self.store)?;
        self.phase.set(session.phase());
        let Session::InProgress(state) = session else {
            return Err(Error::NotInProgress);
        };
        self.enter(Phase::Replaying)?;

        if let Some(branch) = self.git.head_branch()? {
            let only_finalizing = state.is_complete()
                && !self.git.is_cherry_picking()
                && state.branch_to_move() == Some(branch.as_str());
            let replayed_tip = if only_finalizing {
                self.store.marker()?
            } else {
                None
            };
            let Some(replayed_tip) = replayed_tip else {
                self.phase.set(Phase::Suspended);
                return Err(Error::PositionMoved(branch));
            };
            // The branch still holds the pre-reparent tip; go back to the
            // replayed commits before moving it.
            tracing::info!("Returning to replayed tip {}", short_id(replayed_tip));
            self.git.checkout_detached(replayed_tip)?;
        }

        let mut progress = Progress::default();
        if self.git.is_cherry_picking() {
            match self.git.cherry_pick_continue() {
                Ok(CherryPickOutcome::Committed(oid)) => {
                    tracing::info!("Committed resolution as {}", short_id(oid));
                    progress.replayed += 1;
                }
                Ok(CherryPickOutcome::AlreadyApplied) => {
                    tracing::warn!("Resolved cherry-pick left no changes, nothing committed");
                }
                Err(reparent_git::Error::UnresolvedConflicts(files)) => {
                    self.phase.set(Phase::Suspended);
                    return Err(Error::UnresolvedConflicts(files));
                }
                Err(e) => return Err(e.into()),
            }
            self.store.update(state.pending(), self.git.head_commit()?)?;
        }

        let total = state.remaining.len();
        self.replay(state, progress, total)
    }

    fn replay(
        &self,
        mut state: ReparentState,
        mut progress: Progress,
        total: usize,
    ) -> Result<ReplayOutcome> {
        while let Some(commit) = state.remaining.pop_front() {
            let position = total - state.remaining.len();

            match self.git.cherry_pick(commit) {
                Ok(CherryPickOutcome::Committed(oid)) => {
                    tracing::debug!(
                        "[{position}/{total}] {} -> {}",
                        short_id(commit),
                        short_id(oid)
                    );
                    progress.replayed += 1;
                }
                Ok(CherryPickOutcome::AlreadyApplied) => {
                    tracing::warn!(
                        "[{position}/{total}] {} is already on the new parent, skipping",
                        short_id(commit)
                    );
                    progress.skipped.push(commit);
                }
                Err(reparent_git::Error::CherryPickConflict(files)) => {
                    self.store.update(state.pending(), self.git.head_commit()?)?;
                    self.enter(Phase::Suspended)?;
                    tracing::info!(
                        "Stopped at {} with {} conflicting file(s)",
                        short_id(commit),
                        files.len()
                    );
                    return Ok(ReplayOutcome::Suspended(Suspension {
                        commit,
                        position,
                        total,
                        files,
                        remaining: state.remaining.len(),
                    }));
                }
                Err(e) => return Err(e.into()),
            }

            self.store.update(state.pending(), self.git.head_commit()?)?;
        }

        self.finalize(&state, progress)
    }

    fn finalize(&self, state: &ReparentState, progress: Progress) -> Result<ReplayOutcome> {
        self.enter(Phase::Finalizing)?;
        let new_tip = self.git.head_commit()?;

        let branch = state.branch_to_move().map(ToString::to_string);
        if let Some(branch) = &branch {
            tracing::info!("Moving {branch} to {}", short_id(new_tip));
            self.git
                .move_branch(branch, new_tip)
                .and_then(|()| self.git.checkout(branch))
                .map_err(|source| Error::Finalization {
                    branch: branch.clone(),
                    source,
                })?;
        }

        self.store.clear()?;
        self.enter(Phase::Idle)?;

        Ok(ReplayOutcome::Completed(Completion {
            new_tip,
            branch,
            replayed: progress.replayed,
            skipped: progress.skipped,
        }))
    }

    /// Abort the reparent in progress and return to where it started.
    ///
    /// An unreadable record is still cleared, leaving HEAD where it is.
    ///
    /// # Errors
    /// Returns error if no reparent is in progress or the original position
    /// cannot be checked out. State is kept in the latter case.
    pub fn abort(&self) -> Result<AbortOutcome> {
        if !self.store.is_in_progress() {
            return Err(Error::NotInProgress);
        }
        self.phase.set(Phase::Suspended);
        self.enter(Phase::Aborting)?;

        let loaded = self.store.load();
        let cancel_failure = self.cancel_cherry_pick();

        let restored = match loaded {
            Ok(state) => self.restore_position(&state)?,
            Err(Error::StateParseError { file, message }) => {
                tracing::warn!(
                    "Discarding unreadable {}: {message}",
                    file.display()
                );
                None
            }
            Err(e) => return Err(e),
        };

        self.store.clear()?;
        self.enter(Phase::Idle)?;

        Ok(AbortOutcome {
            restored,
            cancel_failure,
        })
    }

    fn cancel_cherry_pick(&self) -> Option<String> {
        if !self.git.is_cherry_picking() {
            return None;
        }
        match self.git.cherry_pick_abort() {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to cancel cherry-pick: {e}");
                Some(e.to_string())
            }
        }
    }

    fn restore_position(&self, state: &ReparentState) -> Result<Option<RestoredPosition>> {
        if let Some(branch) = &state.original_branch {
            self.git.checkout(branch)?;
            return Ok(Some(RestoredPosition::Branch(branch.clone())));
        }
        if let Some(head) = state.original_head {
            self.git.checkout_detached(head)?;
            return Ok(Some(RestoredPosition::Detached(head)));
        }
        Ok(None)
    }
}
