use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{debug, error, info};

mod config;
mod env;
mod error;
mod install;
mod networking;
mod updater;
mod util;

use config::InstallerConfig;
use error::UpdateError;
use install::LocalFileSystem;
use networking::NetworkClient;
use updater::UpdateSummary;

#[derive(Parser, Debug)]
#[command(
    name = "addin-updater",
    author,
    version,
    about = "Installs the latest published plugin manifest and binary, skipping files that are already current"
)]
struct Cli {
    /// Print updater version and exit without checking for releases.
    #[arg(long)]
    version_only: bool,

    /// Install root holding the `Addins` and `DLLs` folders.
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Owner of the release repository.
    #[arg(long, default_value = config::DEFAULT_OWNER)]
    owner: String,

    /// Release repository name.
    #[arg(long, default_value = config::DEFAULT_REPO)]
    repo: String,

    /// Host version folder to install the manifest into. Repeat to probe several.
    #[arg(long = "host-version", value_name = "VERSION")]
    host_versions: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<InstallerConfig, UpdateError> {
        let root = match self.root {
            Some(root) => root,
            None if env::host_platform_supported() => env::default_install_root(),
            None => {
                return Err(UpdateError::UnsupportedPlatform {
                    os: std::env::consts::OS.to_owned(),
                });
            }
        };

        let mut config = InstallerConfig::new(root);
        config.owner = self.owner;
        config.repo = self.repo;
        if !self.host_versions.is_empty() {
            config.host_versions = self.host_versions;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.version_only {
        println!("addin-updater {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(summary) => {
            for report in summary.manifests.iter().chain(&summary.payload) {
                debug!("update: {} -> {:?}", report.path.display(), report.outcome);
            }
            info!(
                "update: release {} checked, {} file(s) written",
                summary.tag,
                summary.writes()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("update failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<UpdateSummary, UpdateError> {
    let config = cli.into_config()?;
    info!("update: installing into {}", config.install_root.display());
    let client = NetworkClient::new();
    updater::run_update(&config, &client, &client, &LocalFileSystem)
}
