use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::install::TargetReport;

/// Failure talking to the release feed or downloading an asset.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("download of {url} incomplete: body ended before {expected} bytes")]
    Truncated {
        url: String,
        expected: u64,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error("release metadata from {url} is malformed: {source}")]
    MalformedMetadata {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("asset `{name}` not found in release {tag}")]
    AssetNotFound { name: String, tag: String },
    #[error(transparent)]
    Install(#[from] InstallError),
    #[error("the default install location is only known on Windows (running on {os}); pass --root")]
    UnsupportedPlatform { os: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallStage {
    Read,
    Write,
    CreateDir,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstallStage::Read => "read",
            InstallStage::Write => "write",
            InstallStage::CreateDir => "create directory",
        })
    }
}

#[derive(Debug, Error)]
#[error("failed to {stage} {}: {source}", .path.display())]
pub struct TargetFailure {
    pub path: PathBuf,
    pub stage: InstallStage,
    #[source]
    pub source: io::Error,
}

impl TargetFailure {
    pub fn new(path: &Path, stage: InstallStage, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            stage,
            source,
        }
    }
}

/// One or more install targets failed. Targets that succeeded are kept in `completed`.
#[derive(Debug, Error)]
#[error("{} install target(s) failed{}", .failures.len(), list_failures(.failures))]
pub struct InstallError {
    pub completed: Vec<TargetReport>,
    pub failures: Vec<TargetFailure>,
}

impl InstallError {
    pub fn merge(&mut self, other: InstallError) {
        self.completed.extend(other.completed);
        self.failures.extend(other.failures);
    }
}

fn list_failures(failures: &[TargetFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n  {failure}"))
        .collect()
}
