//! Content resolution: reading a file as it exists at a given revision.

use crate::errors::PlotError;
use log::debug;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::{fs, io, result};
use thiserror::Error;

/// Reserved revision label for the live, possibly uncommitted working tree.
pub const WORKSPACE_REVISION: &str = "workspace";

/// Label of the most recent checkpoint, used when defaulting revisions.
pub const HEAD_REVISION: &str = "HEAD";

/// Why a `(file, revision)` pair could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The file does not exist at that revision.
    #[error("could not find '{path}' on revision '{revision}'")]
    NotFound { path: String, revision: String },
    /// Anything else: storage failure, bad revision, undecodable content.
    #[error("failed to read '{path}' at revision '{revision}': {reason}")]
    Storage {
        path: String,
        revision: String,
        reason: String,
    },
}

impl From<ResolveError> for PlotError {
    fn from(err: ResolveError) -> PlotError {
        match err {
            ResolveError::NotFound { path, revision } => {
                PlotError::NoMetricOnRevision { path, revision }
            }
            ResolveError::Storage {
                path,
                revision,
                reason,
            } => PlotError::Storage {
                path,
                revision,
                reason,
            },
        }
    }
}

/// Resolves file content across named revisions.
///
/// The reserved [WORKSPACE_REVISION] label reads the live working tree; any
/// other label reads the file as it existed at that checkpoint. A missing
/// file is reported as [ResolveError::NotFound], distinguishable from every
/// other failure.
pub trait ContentSource {
    fn resolve(&self, path: &str, revision: &str) -> result::Result<String, ResolveError>;

    /// Does the working tree differ from the most recent checkpoint?
    fn is_modified(&self) -> result::Result<bool, ResolveError>;
}

/// A [ContentSource] backed by a git repository, shelling out to `git`.
pub struct GitSource {
    root: PathBuf,
}

impl GitSource {
    pub fn new(root: impl Into<PathBuf>) -> GitSource {
        GitSource { root: root.into() }
    }

    fn git(&self, args: &[&str]) -> io::Result<Output> {
        debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
    }
}

impl ContentSource for GitSource {
    fn resolve(&self, path: &str, revision: &str) -> result::Result<String, ResolveError> {
        if revision == WORKSPACE_REVISION {
            return fs::read_to_string(self.root.join(path)).map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    not_found(path, revision)
                } else {
                    storage(path, revision, e)
                }
            });
        }
        let object = format!("{revision}:{path}");
        let output = self
            .git(&["show", &object])
            .map_err(|e| storage(path, revision, e))?;
        if output.status.success() {
            return String::from_utf8(output.stdout).map_err(|e| storage(path, revision, e));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        // git distinguishes a path missing at the revision from every other
        // failure only in its stderr wording
        if stderr.contains("does not exist in")
            || stderr.contains("exists on disk, but not in")
        {
            Err(not_found(path, revision))
        } else {
            Err(storage(path, revision, stderr.trim()))
        }
    }

    fn is_modified(&self) -> result::Result<bool, ResolveError> {
        let output = self
            .git(&["status", "--porcelain"])
            .map_err(|e| storage(".", WORKSPACE_REVISION, e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(storage(".", WORKSPACE_REVISION, stderr.trim()));
        }
        Ok(!output.stdout.is_empty())
    }
}

fn not_found(path: &str, revision: &str) -> ResolveError {
    ResolveError::NotFound {
        path: path.to_owned(),
        revision: revision.to_owned(),
    }
}

fn storage(path: &str, revision: &str, reason: impl ToString) -> ResolveError {
    ResolveError::Storage {
        path: path.to_owned(),
        revision: revision.to_owned(),
        reason: reason.to_string(),
    }
}
