//! Backup branches preserving the pre-reparent position.

use chrono::NaiveDate;

use crate::repository::short_id;
use crate::{GitOps, Result};

/// Pick a backup branch name of the form `<prefix>/<label>/<YYYY-MM-DD>`.
///
/// Same-day backups get a `-2`, `-3`, ... suffix.
#[must_use]
pub fn backup_branch_name(
    prefix: &str,
    label: &str,
    date: NaiveDate,
    exists: impl Fn(&str) -> bool,
) -> String {
    let base = format!("{prefix}/{label}/{}", date.format("%Y-%m-%d"));
    if !exists(&base) {
        return base;
    }

    (2u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|name| !exists(name))
        .unwrap_or(base)
}

/// Create a backup branch at the current HEAD and return its name.
///
/// The label is the current branch, or the short HEAD id when detached.
///
/// # Errors
/// Returns error if HEAD cannot be read or the branch cannot be created.
pub fn create_backup_branch<G: GitOps + ?Sized>(
    git: &G,
    prefix: &str,
    today: NaiveDate,
) -> Result<String> {
    let head = git.head_commit()?;
    let label = git.head_branch()?.unwrap_or_else(|| short_id(head));

    let name = backup_branch_name(prefix, &label, today, |candidate| {
        git.branch_exists(candidate)
    });
    git.create_branch_at(&name, head)?;

    Ok(name)
}
