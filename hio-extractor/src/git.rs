//! Publishing the export directory through git

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("git {step} exited with {status}")]
    GitStep { step: &'static str, status: ExitStatus },

    #[error("failed to run git {step}: {source}")]
    Spawn {
        step: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{0} is no git repository, but has files in it")]
    NotARepository(PathBuf),

    #[error("failed to inspect {path}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn git(dir: &Path, step: &'static str, args: &[&str]) -> Result<ExitStatus, PublishError> {
    tracing::debug!("Running git {} in {}", args.join(" "), dir.display());
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .map_err(|source| PublishError::Spawn { step, source })
}

fn git_checked(dir: &Path, step: &'static str, args: &[&str]) -> Result<(), PublishError> {
    let status = git(dir, step, args)?;
    if status.success() {
        Ok(())
    } else {
        Err(PublishError::GitStep { step, status })
    }
}

/// Make sure `dir` is a clone of `url`.
///
/// An existing repository is used as is. An empty directory gets cloned into;
/// anything else is refused.
pub fn init_repository(dir: &Path, url: &str) -> Result<(), PublishError> {
    if dir.join(".git").exists() {
        return Ok(());
    }

    let inspect = |source| PublishError::Inspect {
        path: dir.to_path_buf(),
        source,
    };
    if dir.read_dir().map_err(inspect)?.next().is_some() {
        return Err(PublishError::NotARepository(dir.to_path_buf()));
    }

    tracing::info!("Cloning {} into {}", url, dir.display());
    git_checked(dir, "clone", &["clone", url, "."])
}

/// Commit everything in `dir` and push it.
///
/// A failing commit is expected when nothing changed since the last run.
pub fn publish(dir: &Path) -> Result<(), PublishError> {
    git_checked(dir, "pull", &["pull", "--ff-only"])?;
    git_checked(dir, "add", &["add", "--all"])?;

    let message = chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.f")
        .to_string();
    let commit = git(dir, "commit", &["commit", "-m", &message])?;
    if !commit.success() {
        tracing::info!("Nothing to commit ({})", commit);
    }

    git_checked(dir, "push", &["push"])?;
    tracing::info!("Pushed export to remote");
    Ok(())
}
