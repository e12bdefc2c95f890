use log::info;
use serde::Deserialize;

use crate::config::InstallerConfig;
use crate::error::{InstallError, RetrievalError, UpdateError};
use crate::install::{self, FileSystem, TargetReport};
use crate::util::format_size;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

/// Looks up the most recent published release of a repository.
pub trait ReleaseResolver {
    fn latest_release(&self, config: &InstallerConfig) -> Result<ReleaseDescriptor, UpdateError>;
}

/// Downloads a whole asset into memory.
pub trait AssetFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, RetrievalError>;
}

/// Locator of the first asset whose name matches `name` exactly.
pub fn select_asset<'a>(release: &'a ReleaseDescriptor, name: &str) -> Result<&'a str, UpdateError> {
    release
        .assets
        .iter()
        .find(|asset| asset.name == name)
        .map(|asset| asset.url.as_str())
        .ok_or_else(|| UpdateError::AssetNotFound {
            name: name.to_owned(),
            tag: release.tag_name.clone(),
        })
}

#[derive(Debug, Clone)]
pub struct UpdateSummary {
    pub tag: String,
    pub manifests: Vec<TargetReport>,
    pub payload: Vec<TargetReport>,
}

impl UpdateSummary {
    pub fn writes(&self) -> usize {
        self.manifests
            .iter()
            .chain(&self.payload)
            .filter(|report| report.outcome.wrote())
            .count()
    }
}

/// Resolve the latest release, fetch both artifacts, and reconcile them into place.
///
/// Both assets are located and downloaded before anything is written, so a
/// missing asset or failed download leaves the machine untouched. Install
/// failures do not stop later targets; they are collected into one error.
pub fn run_update<R, A, F>(
    config: &InstallerConfig,
    resolver: &R,
    fetcher: &A,
    fs: &F,
) -> Result<UpdateSummary, UpdateError>
where
    R: ReleaseResolver,
    A: AssetFetcher,
    F: FileSystem,
{
    let release = resolver.latest_release(config)?;
    info!(
        "release: latest is {} with {} asset(s)",
        release.tag_name,
        release.assets.len()
    );

    let manifest_url = select_asset(&release, &config.manifest_asset)?;
    let payload_url = select_asset(&release, &config.payload_asset)?;

    let manifest_bytes = fetch_asset(fetcher, &config.manifest_asset, manifest_url)?;
    let payload_bytes = fetch_asset(fetcher, &config.payload_asset, payload_url)?;

    let manifests = install::reconcile(fs, &config.manifest_targets(), &manifest_bytes);
    let payload = install::reconcile(fs, &[config.payload_target()], &payload_bytes);

    match (manifests, payload) {
        (Ok(manifests), Ok(payload)) => Ok(UpdateSummary {
            tag: release.tag_name,
            manifests,
            payload,
        }),
        (Err(mut err), Ok(done)) => {
            err.completed.extend(done);
            Err(err.into())
        }
        (Ok(done), Err(err)) => {
            let mut combined = InstallError {
                completed: done,
                failures: Vec::new(),
            };
            combined.merge(err);
            Err(combined.into())
        }
        (Err(mut err), Err(other)) => {
            err.merge(other);
            Err(err.into())
        }
    }
}

fn fetch_asset<A: AssetFetcher>(fetcher: &A, name: &str, url: &str) -> Result<Vec<u8>, UpdateError> {
    info!("fetch: downloading {name}");
    let bytes = fetcher.fetch(url)?;
    info!("fetch: {name} ({})", format_size(bytes.len() as u64));
    Ok(bytes)
}
