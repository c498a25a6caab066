//! Command-line flags and dispatch.

pub mod abort;
pub mod resume;
pub mod start;
pub mod utils;

use anyhow::{Result, bail};
use clap::Parser;
use reparent_core::RangeSpec;

pub use start::StartOptions;

/// Move the commits at the tip of HEAD onto a new parent.
#[derive(Parser)]
#[command(name = "git-reparent")]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "Examples:\n  \
    git reparent -p main                          # move the last commit onto main\n  \
    git reparent -p main -n 3                     # move the last 3 commits\n  \
    git reparent -p main --from abc1234           # move everything after abc1234\n  \
    git reparent -p main --backup --confirm       # back up and ask first\n  \
    git reparent --continue                       # after resolving conflicts\n  \
    git reparent --abort                          # give up and go back"
)]
#[allow(clippy::struct_excessive_bools)] // CLI options map directly to flags
pub struct Cli {
    /// New parent for the moved commits (branch, tag, commit or expression)
    #[arg(short, long, value_name = "REF")]
    pub parent: Option<String>,

    /// Number of commits to move [default: 1]
    #[arg(short, long, value_name = "N")]
    pub number: Option<usize>,

    /// Move every commit after REF up to HEAD
    #[arg(long, value_name = "REF")]
    pub from: Option<String>,

    /// Create a backup branch before reparenting
    #[arg(long)]
    pub backup: bool,

    /// Show a summary and ask for confirmation
    #[arg(long)]
    pub confirm: bool,

    /// Leave the result on a detached HEAD instead of moving the branch
    #[arg(long)]
    pub no_branch: bool,

    /// Continue after resolving conflicts
    #[arg(long = "continue")]
    pub continue_: bool,

    /// Abort and return to the original branch
    #[arg(long)]
    pub abort: bool,

    /// Suppress informational output
    #[arg(short, long)]
    pub quiet: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// What one invocation does.
#[derive(Debug)]
pub enum Mode {
    Start(StartOptions),
    Continue,
    Abort,
}

impl Cli {
    /// Check flag combinations and pick the mode.
    pub fn mode(&self) -> Result<Mode> {
        if self.continue_ && self.abort {
            bail!("cannot use --continue and --abort together");
        }

        if self.continue_ || self.abort {
            let flag = if self.continue_ { "--continue" } else { "--abort" };
            if self.has_start_options() {
                bail!("{flag} cannot be combined with reparent options");
            }
            return Ok(if self.continue_ {
                Mode::Continue
            } else {
                Mode::Abort
            });
        }

        let range = RangeSpec::from_options(self.number, self.from.clone())?;
        let Some(parent) = self.parent.clone() else {
            bail!("--parent is required");
        };

        Ok(Mode::Start(StartOptions {
            parent,
            range,
            backup: self.backup,
            confirm: self.confirm,
            no_branch: self.no_branch,
        }))
    }

    const fn has_start_options(&self) -> bool {
        self.parent.is_some()
            || self.number.is_some()
            || self.from.is_some()
            || self.backup
            || self.confirm
            || self.no_branch
    }
}
