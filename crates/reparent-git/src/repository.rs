//! Repository wrapper providing high-level git operations.

use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, CherrypickOptions, Oid, RepositoryState, ResetType, Signature, Sort, StatusOptions,
};

use crate::error::{Error, Result};

/// Result of replaying a single commit on top of HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CherryPickOutcome {
    /// A new commit was created.
    Committed(Oid),
    /// The change set is already present on HEAD; nothing was committed.
    AlreadyApplied,
}

/// Abbreviate a commit id to eight hex digits.
#[must_use]
pub fn short_id(oid: Oid) -> String {
    let full = oid.to_string();
    full[..8.min(full.len())].to_string()
}

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|_| Error::NotARepository)?;
        Ok(Self { inner })
    }

    /// Open the repository containing the current directory.
    ///
    /// # Errors
    /// Returns error if not inside a git repository.
    pub fn open_current() -> Result<Self> {
        Self::open(".")
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Check if a cherry-pick session is open (CHERRY_PICK_HEAD exists).
    #[must_use]
    pub fn is_cherry_picking(&self) -> bool {
        matches!(
            self.inner.state(),
            RepositoryState::CherryPick | RepositoryState::CherryPickSequence
        )
    }

    // === Reference resolution ===

    /// Resolve any revision expression to the commit it names.
    ///
    /// Annotated tags are peeled to their target commit.
    ///
    /// # Errors
    /// Returns `RefNotFound` if the expression does not name a commit.
    pub fn resolve_commit(&self, reference: &str) -> Result<Oid> {
        self.inner
            .revparse_single(reference)
            .and_then(|object| object.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|_| Error::RefNotFound(reference.into()))
    }

    /// Check if a revision expression resolves to a commit.
    #[must_use]
    pub fn ref_exists(&self, reference: &str) -> bool {
        self.resolve_commit(reference).is_ok()
    }

    /// Get the commit HEAD points at.
    ///
    /// # Errors
    /// Returns error if HEAD is unborn.
    pub fn head_commit(&self) -> Result<Oid> {
        Ok(self.inner.head()?.peel_to_commit()?.id())
    }

    /// Get the first line of a commit's message.
    ///
    /// # Errors
    /// Returns error if commit not found.
    pub fn commit_summary(&self, oid: Oid) -> Result<String> {
        let commit = self.inner.find_commit(oid)?;
        Ok(commit.summary().unwrap_or_default().to_string())
    }

    /// Check if a commit has more than one parent.
    ///
    /// # Errors
    /// Returns error if commit not found.
    pub fn is_merge_commit(&self, oid: Oid) -> Result<bool> {
        Ok(self.inner.find_commit(oid)?.parent_count() > 1)
    }

    // === Branch operations ===

    /// Get the name of the current branch.
    ///
    /// # Errors
    /// Returns error if HEAD is detached.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.inner.head()?;
        if !head.is_branch() {
            return Err(Error::DetachedHead);
        }

        head.shorthand()
            .map(String::from)
            .ok_or(Error::DetachedHead)
    }

    /// Get the current branch name, or `None` when HEAD is detached.
    ///
    /// # Errors
    /// Returns error if HEAD cannot be read.
    pub fn head_branch(&self) -> Result<Option<String>> {
        match self.current_branch() {
            Ok(name) => Ok(Some(name)),
            Err(Error::DetachedHead) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if a branch exists.
    #[must_use]
    pub fn branch_exists(&self, name: &str) -> bool {
        self.inner.find_branch(name, BranchType::Local).is_ok()
    }

    /// Create a new branch pointing at `target`.
    ///
    /// # Errors
    /// Returns error if the branch already exists or creation fails.
    pub fn create_branch_at(&self, name: &str, target: Oid) -> Result<()> {
        let commit = self.inner.find_commit(target)?;
        self.inner.branch(name, &commit, false)?;
        tracing::info!("Created branch '{}' at {}", name, short_id(target));
        Ok(())
    }

    /// Checkout a branch.
    ///
    /// # Errors
    /// Returns error if checkout fails.
    pub fn checkout(&self, branch_name: &str) -> Result<()> {
        let branch = self
            .inner
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(branch_name.into()))?;

        let reference = branch.get();
        let object = reference.peel(git2::ObjectType::Commit)?;

        self.inner.checkout_tree(&object, None)?;
        self.inner.set_head(&format!("refs/heads/{branch_name}"))?;

        tracing::info!("Switched to branch '{}'", branch_name);
        Ok(())
    }

    /// Checkout a commit directly, leaving HEAD detached.
    ///
    /// # Errors
    /// Returns error if the commit is missing or checkout fails.
    pub fn checkout_detached(&self, target: Oid) -> Result<()> {
        let commit = self.inner.find_commit(target)?;

        self.inner.checkout_tree(commit.as_object(), None)?;
        self.inner.set_head_detached(target)?;

        tracing::info!("Checked out {} (detached HEAD)", short_id(target));
        Ok(())
    }

    /// Force a local branch to point at `target` without touching the worktree.
    ///
    /// # Errors
    /// Returns error if the ref update fails.
    pub fn move_branch(&self, branch_name: &str, target: Oid) -> Result<()> {
        self.inner.reference(
            &format!("refs/heads/{branch_name}"),
            target,
            true,
            &format!("reparent: moving to {}", short_id(target)),
        )?;

        tracing::info!("Moved branch '{}' to {}", branch_name, short_id(target));
        Ok(())
    }

    // === Working directory state ===

    /// Check if the working directory is clean.
    ///
    /// # Errors
    /// Returns error if status check fails.
    pub fn is_clean(&self) -> Result<bool> {
        // Same view as `git status --porcelain`: untracked counts, ignored does not.
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(false)
            .include_ignored(false);

        let statuses = self.inner.statuses(Some(&mut opts))?;
        Ok(statuses.is_empty())
    }

    /// Ensure working directory is clean, returning error if not.
    ///
    /// # Errors
    /// Returns `DirtyWorkingDirectory` if there are uncommitted changes.
    pub fn require_clean(&self) -> Result<()> {
        if self.is_clean()? {
            Ok(())
        } else {
            Err(Error::DirtyWorkingDirectory)
        }
    }

    // === Commit range ===

    /// List commits reachable from `tip` but not from `boundary`, oldest first.
    ///
    /// # Errors
    /// Returns error if revwalk fails.
    pub fn commits_between(&self, boundary: Oid, tip: Oid) -> Result<Vec<Oid>> {
        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
        revwalk.push(tip)?;
        revwalk.hide(boundary)?;

        let commits = revwalk.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(commits)
    }

    // === Replay ===

    /// Replay a single commit on top of HEAD.
    ///
    /// On conflict the cherry-pick session is left open (CHERRY_PICK_HEAD,
    /// conflict markers in the worktree) so it can be resolved by hand or with
    /// `git cherry-pick --continue`.
    ///
    /// # Errors
    /// Returns `CherryPickConflict` with the conflicting paths, or any other
    /// error if the replay could not be attempted.
    pub fn cherry_pick(&self, oid: Oid) -> Result<CherryPickOutcome> {
        let commit = self.inner.find_commit(oid)?;
        if commit.parent_count() > 1 {
            return Err(Error::MergeCommit(short_id(oid)));
        }

        tracing::debug!("Cherry-picking commit {}", oid);

        let mut checkout = CheckoutBuilder::new();
        checkout.safe().allow_conflicts(true).conflict_style_merge(true);
        let mut opts = CherrypickOptions::new();
        opts.checkout_builder(checkout);

        self.inner.cherrypick(&commit, Some(&mut opts))?;

        let files = self.conflicting_files()?;
        if !files.is_empty() {
            tracing::debug!("Cherry-pick of {} stopped with conflicts", short_id(oid));
            return Err(Error::CherryPickConflict(files));
        }

        let message = commit.message().unwrap_or_default().to_string();
        self.commit_picked(&commit.author(), &message)
    }

    /// Get paths with conflict entries in the index.
    ///
    /// # Errors
    /// Returns error if the index cannot be read.
    pub fn conflicting_files(&self) -> Result<Vec<String>> {
        let index = self.inner.index()?;
        if !index.has_conflicts() {
            return Ok(vec![]);
        }

        let mut files = vec![];
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
            if let Some(entry) = entry {
                files.push(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }

        Ok(files)
    }

    /// Commit the resolution of an open cherry-pick session.
    ///
    /// The new commit keeps the picked commit's author and message.
    ///
    /// # Errors
    /// Returns `UnresolvedConflicts` if the index still has conflicts, or
    /// `NoCherryPickInProgress` if there is no session to continue.
    pub fn cherry_pick_continue(&self) -> Result<CherryPickOutcome> {
        if !self.is_cherry_picking() {
            return Err(Error::NoCherryPickInProgress);
        }

        let files = self.conflicting_files()?;
        if !files.is_empty() {
            return Err(Error::UnresolvedConflicts(files));
        }

        let picked = self
            .inner
            .find_reference("CHERRY_PICK_HEAD")?
            .peel_to_commit()?;

        let message = picked.message().unwrap_or_default().to_string();
        self.commit_picked(&picked.author(), &message)
    }

    /// Cancel an open cherry-pick session, resetting the worktree to HEAD.
    ///
    /// # Errors
    /// Returns error if the reset or state cleanup fails.
    pub fn cherry_pick_abort(&self) -> Result<()> {
        let head = self.inner.head()?.peel_to_commit()?;
        self.inner.reset(head.as_object(), ResetType::Hard, None)?;
        self.inner.cleanup_state()?;

        tracing::info!("Aborted cherry-pick, reset to {}", short_id(head.id()));
        Ok(())
    }

    /// Write the index as a commit on HEAD and close the cherry-pick session.
    fn commit_picked(&self, author: &Signature<'_>, message: &str) -> Result<CherryPickOutcome> {
        let head = self.inner.head()?.peel_to_commit()?;
        let tree_id = self.inner.index()?.write_tree()?;

        if tree_id == head.tree_id() {
            self.inner.cleanup_state()?;
            tracing::debug!("Change set already present on {}", short_id(head.id()));
            return Ok(CherryPickOutcome::AlreadyApplied);
        }

        let tree = self.inner.find_tree(tree_id)?;
        let committer = self.signature()?;
        let new_commit = self
            .inner
            .commit(Some("HEAD"), author, &committer, message, &tree, &[&head])?;
        self.inner.cleanup_state()?;

        tracing::info!("Committed {} on {}", short_id(new_commit), short_id(head.id()));
        Ok(CherryPickOutcome::Committed(new_commit))
    }

    // === Signature ===

    /// Get the default signature for commits.
    ///
    /// # Errors
    /// Returns error if git config doesn't have user.name/email.
    pub fn signature(&self) -> Result<Signature<'_>> {
        Ok(self.inner.signature()?)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_test_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = git2::Repository::init(temp.path()).unwrap();

        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        let wrapped = Repository { inner: repo };
        commit_file(&temp, &wrapped, "README.md", "# test\n", "Initial commit");
        (temp, wrapped)
    }

    fn commit_file(temp: &TempDir, repo: &Repository, name: &str, content: &str, msg: &str) -> Oid {
        fs::write(temp.path().join(name), content).unwrap();
        let git = &repo.inner;
        let mut index = git.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = git.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git.signature().unwrap();
        let parents: Vec<git2::Commit<'_>> = git
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        git.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_current_branch() {
        let (_temp, repo) = init_test_repo();
        let branch = repo.current_branch().unwrap();
        assert!(branch == "main" || branch == "master");
        assert_eq!(repo.head_branch().unwrap(), Some(branch));
    }

    #[test]
    fn test_head_branch_detached() {
        let (_temp, repo) = init_test_repo();
        let head = repo.head_commit().unwrap();

        repo.checkout_detached(head).unwrap();

        assert_eq!(repo.head_branch().unwrap(), None);
        assert!(matches!(repo.current_branch(), Err(Error::DetachedHead)));
    }

    #[test]
    fn test_resolve_commit_expressions() {
        let (temp, repo) = init_test_repo();
        let first = repo.head_commit().unwrap();
        let second = commit_file(&temp, &repo, "a.txt", "a\n", "Add a");

        assert_eq!(repo.resolve_commit("HEAD").unwrap(), second);
        assert_eq!(repo.resolve_commit("HEAD~1").unwrap(), first);
        assert_eq!(repo.resolve_commit(&first.to_string()).unwrap(), first);
        assert!(repo.ref_exists("HEAD~1"));
        assert!(!repo.ref_exists("HEAD~5"));
        assert!(matches!(
            repo.resolve_commit("no-such-branch"),
            Err(Error::RefNotFound(name)) if name == "no-such-branch"
        ));
    }

    #[test]
    fn test_commits_between_oldest_first() {
        let (temp, repo) = init_test_repo();
        let base = repo.head_commit().unwrap();
        let a = commit_file(&temp, &repo, "a.txt", "a\n", "Add a");
        let b = commit_file(&temp, &repo, "b.txt", "b\n", "Add b");
        let c = commit_file(&temp, &repo, "c.txt", "c\n", "Add c");

        let commits = repo.commits_between(base, c).unwrap();
        assert_eq!(commits, vec![a, b, c]);

        assert!(repo.commits_between(c, c).unwrap().is_empty());
    }

    #[test]
    fn test_is_clean() {
        let (temp, repo) = init_test_repo();

        assert!(repo.is_clean().unwrap());
        assert!(repo.require_clean().is_ok());

        fs::write(temp.path().join("new_file.txt"), "content").unwrap();
        assert!(!repo.is_clean().unwrap());
        assert!(matches!(
            repo.require_clean(),
            Err(Error::DirtyWorkingDirectory)
        ));
    }

    #[test]
    fn test_move_branch_and_checkout() {
        let (temp, repo) = init_test_repo();
        let original = repo.current_branch().unwrap();
        let base = repo.head_commit().unwrap();
        let tip = commit_file(&temp, &repo, "a.txt", "a\n", "Add a");

        repo.create_branch_at("feature/old", base).unwrap();
        assert!(repo.branch_exists("feature/old"));

        repo.move_branch("feature/old", tip).unwrap();
        repo.checkout("feature/old").unwrap();

        assert_eq!(repo.current_branch().unwrap(), "feature/old");
        assert_eq!(repo.head_commit().unwrap(), tip);
        assert_ne!(original, "feature/old");
    }

    #[test]
    fn test_cherry_pick_clean() {
        let (temp, repo) = init_test_repo();
        let base = repo.head_commit().unwrap();
        let picked = commit_file(&temp, &repo, "a.txt", "a\n", "Add a");

        repo.checkout_detached(base).unwrap();
        let outcome = repo.cherry_pick(picked).unwrap();

        let CherryPickOutcome::Committed(new_commit) = outcome else {
            panic!("expected a new commit, got {outcome:?}");
        };
        let commit = repo.inner.find_commit(new_commit).unwrap();
        assert_eq!(commit.parent_id(0).unwrap(), base);
        assert_eq!(commit.summary(), Some("Add a"));
        assert_eq!(
            commit.tree_id(),
            repo.inner.find_commit(picked).unwrap().tree_id()
        );
        assert!(!repo.is_cherry_picking());
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "a\n");
    }

    #[test]
    fn test_cherry_pick_already_applied() {
        let (temp, repo) = init_test_repo();
        let picked = commit_file(&temp, &repo, "a.txt", "a\n", "Add a");
        let head = repo.head_commit().unwrap();

        repo.checkout_detached(head).unwrap();
        assert_eq!(
            repo.cherry_pick(picked).unwrap(),
            CherryPickOutcome::AlreadyApplied
        );
        assert_eq!(repo.head_commit().unwrap(), head);
    }

    #[test]
    fn test_cherry_pick_conflict_continue() {
        let (temp, repo) = init_test_repo();
        let base = repo.head_commit().unwrap();
        let ours = commit_file(&temp, &repo, "shared.txt", "ours\n", "Ours");
        repo.checkout_detached(base).unwrap();
        let theirs = commit_file(&temp, &repo, "shared.txt", "theirs\n", "Theirs");

        repo.checkout_detached(ours).unwrap();
        let err = repo.cherry_pick(theirs).unwrap_err();
        assert!(matches!(err, Error::CherryPickConflict(ref files) if files == &["shared.txt"]));
        assert!(repo.is_cherry_picking());
        assert!(matches!(
            repo.cherry_pick_continue(),
            Err(Error::UnresolvedConflicts(_))
        ));

        fs::write(temp.path().join("shared.txt"), "resolved\n").unwrap();
        let mut index = repo.inner.index().unwrap();
        index.add_path(Path::new("shared.txt")).unwrap();
        index.write().unwrap();

        let outcome = repo.cherry_pick_continue().unwrap();
        let CherryPickOutcome::Committed(new_commit) = outcome else {
            panic!("expected a new commit, got {outcome:?}");
        };
        let commit = repo.inner.find_commit(new_commit).unwrap();
        assert_eq!(commit.parent_id(0).unwrap(), ours);
        assert_eq!(commit.summary(), Some("Theirs"));
        assert!(!repo.is_cherry_picking());
    }

    #[test]
    fn test_cherry_pick_abort_resets_worktree() {
        let (temp, repo) = init_test_repo();
        let base = repo.head_commit().unwrap();
        let ours = commit_file(&temp, &repo, "shared.txt", "ours\n", "Ours");
        repo.checkout_detached(base).unwrap();
        let theirs = commit_file(&temp, &repo, "shared.txt", "theirs\n", "Theirs");

        repo.checkout_detached(ours).unwrap();
        assert!(repo.cherry_pick(theirs).is_err());

        repo.cherry_pick_abort().unwrap();

        assert!(!repo.is_cherry_picking());
        assert!(repo.is_clean().unwrap());
        assert_eq!(repo.head_commit().unwrap(), ours);
        assert_eq!(
            fs::read_to_string(temp.path().join("shared.txt")).unwrap(),
            "ours\n"
        );
    }

    #[test]
    fn test_continue_without_session() {
        let (_temp, repo) = init_test_repo();
        assert!(matches!(
            repo.cherry_pick_continue(),
            Err(Error::NoCherryPickInProgress)
        ));
    }
}
