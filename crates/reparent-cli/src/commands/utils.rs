use anyhow::{Context, Result, anyhow};
use reparent_core::{Config, StateFile};
use reparent_git::Repository;

/// Helper to open the repo and its reparent state.
///
/// Config is left alone so a broken config file never blocks recovery.
pub fn open_repo_and_state() -> Result<(Repository, StateFile)> {
    let repo = Repository::open_current().context("Not inside a git repository")?;
    let store = StateFile::new(repo.git_dir())?;
    Ok((repo, store))
}

/// Load `reparent.toml` from the repository's git directory.
pub fn load_config(repo: &Repository) -> Result<Config> {
    let config_path = Config::path_in(repo.git_dir());
    Config::load(&config_path).map_err(|e| anyhow!("Failed to load {}: {e}", config_path.display()))
}
