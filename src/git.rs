use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("'git' not found in PATH: {0}")]
    NotFound(#[from] which::Error),

    #[error("'{path}' is not a git repository")]
    NotARepository { path: PathBuf },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
}

fn run_git(repo: &Path, args: &[&str]) -> Result<Output, GitError> {
    let git = which::which("git")?;
    let output = Command::new(git).arg("-C").arg(repo).args(args).output()?;
    Ok(output)
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn ensure_repository(repo: &Path) -> Result<(), GitError> {
    let output = run_git(repo, &["rev-parse", "--git-dir"])?;
    if output.status.success() {
        Ok(())
    } else {
        Err(GitError::NotARepository {
            path: repo.to_path_buf(),
        })
    }
}

/// Most recent `v*` tag reachable from HEAD, or `None` when the repository
/// has no such tag yet.
pub fn latest_tag(repo: &Path) -> Result<Option<String>, GitError> {
    let output = run_git(
        repo,
        &["describe", "--tags", "--abbrev=0", "--match", "v*"],
    )?;
    if !output.status.success() {
        return Ok(None);
    }
    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!tag.is_empty()).then_some(tag))
}

/// Paths of files tracked at `rev` under `prefix`.
pub fn files_at_rev(repo: &Path, rev: &str, prefix: &Path) -> Result<Vec<String>, GitError> {
    let prefix = prefix.to_string_lossy();
    let output = run_git(
        repo,
        &["ls-tree", "-r", "--name-only", rev, "--", &prefix],
    )?;
    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: format!("ls-tree {}", rev),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(stdout_lines(&output))
}

/// Content of `path` as of `rev`, or `None` when the file did not exist
/// at that revision.
pub fn show_file(repo: &Path, rev: &str, path: &str) -> Result<Option<String>, GitError> {
    let output = run_git(repo, &["show", &format!("{}:{}", rev, path)])?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}
