//! Fingerprinting installer: writes fetched artifacts only where the bytes
//! on disk differ from the bytes that were downloaded.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{InstallError, InstallStage, TargetFailure};

mod fingerprint;
mod fs;

pub use fingerprint::Fingerprint;
pub use fs::{FileSystem, LocalFileSystem};

/// Which artifact a target receives, and therefore how a missing parent is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// Per host-version manifest. A missing parent means that host version is not installed.
    Manifest,
    /// The single plugin binary. Its parent directory is created on demand.
    Payload,
}

impl TargetKind {
    fn mode(self) -> u32 {
        match self {
            TargetKind::Manifest => 0o644,
            TargetKind::Payload => 0o755,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TargetKind::Manifest => "manifest",
            TargetKind::Payload => "payload",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
}

impl InstallTarget {
    pub fn manifest(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: TargetKind::Manifest,
        }
    }

    pub fn payload(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: TargetKind::Payload,
        }
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Nothing was there; the file was written.
    Created,
    /// Existing content differed and was overwritten.
    Updated,
    /// Existing content already matched.
    Unchanged,
    /// Manifest parent directory absent; host version not installed.
    SkippedUnsupported,
}

impl TargetOutcome {
    #[must_use]
    pub fn wrote(self) -> bool {
        matches!(self, TargetOutcome::Created | TargetOutcome::Updated)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetReport {
    pub path: PathBuf,
    pub outcome: TargetOutcome,
}

/// Bring every target in line with `desired`.
///
/// Targets are processed in order and a failing target does not stop the
/// rest; all failures come back together in one [`InstallError`].
pub fn reconcile<F: FileSystem>(
    fs: &F,
    targets: &[InstallTarget],
    desired: &[u8],
) -> Result<Vec<TargetReport>, InstallError> {
    let desired_fp = Fingerprint::of(desired);
    let mut reports = Vec::with_capacity(targets.len());
    let mut failures = Vec::new();

    for target in targets {
        match reconcile_one(fs, target, desired, desired_fp) {
            Ok(outcome) => reports.push(TargetReport {
                path: target.path.clone(),
                outcome,
            }),
            Err(failure) => {
                warn!("install: {failure}");
                failures.push(failure);
            }
        }
    }

    if failures.is_empty() {
        Ok(reports)
    } else {
        Err(InstallError {
            completed: reports,
            failures,
        })
    }
}

fn reconcile_one<F: FileSystem>(
    fs: &F,
    target: &InstallTarget,
    desired: &[u8],
    desired_fp: Fingerprint,
) -> Result<TargetOutcome, TargetFailure> {
    let path = target.path.as_path();

    if let Some(parent) = target.parent()
        && !fs.is_dir(parent)
    {
        match target.kind {
            TargetKind::Manifest => {
                debug!(
                    "install: skipping {} (no host directory {})",
                    path.display(),
                    parent.display()
                );
                return Ok(TargetOutcome::SkippedUnsupported);
            }
            TargetKind::Payload => {
                info!("install: creating directory {}", parent.display());
                fs.create_dir_all(parent)
                    .map_err(|source| TargetFailure::new(parent, InstallStage::CreateDir, source))?;
            }
        }
    }

    let outcome = match fs
        .read(path)
        .map_err(|source| TargetFailure::new(path, InstallStage::Read, source))?
    {
        None => TargetOutcome::Created,
        Some(current) => {
            let current_fp = Fingerprint::of(&current);
            debug!(
                "install: {} local {} remote {}",
                path.display(),
                current_fp,
                desired_fp
            );
            if current_fp == desired_fp {
                return Ok(TargetOutcome::Unchanged);
            }
            TargetOutcome::Updated
        }
    };

    fs.write(path, desired, target.kind.mode())
        .map_err(|source| TargetFailure::new(path, InstallStage::Write, source))?;
    info!(
        "install: wrote {} {} ({})",
        target.kind.label(),
        path.display(),
        if outcome == TargetOutcome::Created {
            "new"
        } else {
            "updated"
        }
    );
    Ok(outcome)
}
