use std::path::{Path, PathBuf};

use crate::install::InstallTarget;

pub const DEFAULT_OWNER: &str = "rtpearl0319";
pub const DEFAULT_REPO: &str = "GPSrvtTab";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_MANIFEST_ASSET: &str = "GPSTab.addin";
pub const DEFAULT_PAYLOAD_ASSET: &str = "GPSrvtTabWrapper.dll";
pub const DEFAULT_PAYLOAD_FILE: &str = "GPSrvtTab.dll";
pub const DEFAULT_HOST_VERSIONS: [&str; 5] = ["2025", "2024", "2023", "2022", "2021"];

const MANIFEST_DIR: &str = "Addins";
const PAYLOAD_DIR: &str = "DLLs";

/// Everything a run needs to know about where releases come from and where they go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallerConfig {
    pub owner: String,
    pub repo: String,
    pub api_base: String,
    /// Release asset installed once per host version.
    pub manifest_asset: String,
    /// Release asset holding the plugin binary.
    pub payload_asset: String,
    /// File name the payload is installed under.
    pub payload_file: String,
    /// Host versions probed for a manifest directory, in order.
    pub host_versions: Vec<String>,
    pub install_root: PathBuf,
}

impl InstallerConfig {
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            owner: DEFAULT_OWNER.to_owned(),
            repo: DEFAULT_REPO.to_owned(),
            api_base: DEFAULT_API_BASE.to_owned(),
            manifest_asset: DEFAULT_MANIFEST_ASSET.to_owned(),
            payload_asset: DEFAULT_PAYLOAD_ASSET.to_owned(),
            payload_file: DEFAULT_PAYLOAD_FILE.to_owned(),
            host_versions: DEFAULT_HOST_VERSIONS.iter().map(|v| (*v).to_owned()).collect(),
            install_root: install_root.into(),
        }
    }

    pub fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.install_root.join(MANIFEST_DIR)
    }

    pub fn payload_dir(&self) -> PathBuf {
        self.install_root.join(PAYLOAD_DIR)
    }

    /// One candidate per host version. Versions that are not installed are
    /// filtered out during reconciliation, not here.
    pub fn manifest_targets(&self) -> Vec<InstallTarget> {
        let dir = self.manifest_dir();
        self.host_versions
            .iter()
            .map(|version| InstallTarget::manifest(manifest_path(&dir, version, &self.manifest_asset)))
            .collect()
    }

    pub fn payload_target(&self) -> InstallTarget {
        InstallTarget::payload(self.payload_dir().join(&self.payload_file))
    }
}

fn manifest_path(dir: &Path, version: &str, file: &str) -> PathBuf {
    dir.join(version).join(file)
}
