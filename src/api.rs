use std::path::PathBuf;

use tracing::{debug, info};

use crate::downloader::{build_client, Downloader, ProgressFn};
use crate::error::{GrabError, Result};
use crate::install::{make_executable, Install};
use crate::progress::default_progress_fn;
use crate::project::Project;
use crate::release::{Asset, Release, ReleaseClient, DEFAULT_API_BASE};
use crate::select;

// ──────────────────────────────────────────────────────────────────────────────
// Api
// ──────────────────────────────────────────────────────────────────────────────

/// Top-level entry-point with a chainable builder API.
///
/// # Example
/// ```rust,no_run
/// use grab::Api;
///
/// #[tokio::main]
/// async fn main() {
///     Api::new()
///         .set_install_dir("~/bin")
///         .set_rename("barg")
///         .repo("tobyjoe/grab")
///         .grab()
///         .await
///         .unwrap();
/// }
/// ```
pub struct Api {
    install_dir: Option<String>,
    rename: Option<String>,
    dry_run: bool,
    proxy: Option<String>,
    api_base: String,
    progress: Option<ProgressFn>,
}

impl Api {
    /// Create a new `Api` with sensible defaults.
    ///
    /// Proxy is read from `HTTP_PROXY` / `HTTPS_PROXY` and the API base from
    /// `GRAB_API_URL`, falling back to the public GitHub API.
    pub fn new() -> Self {
        let proxy = env_var("HTTP_PROXY").or_else(|| env_var("HTTPS_PROXY"));
        let api_base = env_var("GRAB_API_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_owned());

        Self {
            install_dir: None,
            rename: None,
            dry_run: false,
            proxy,
            api_base,
            progress: Some(default_progress_fn()),
        }
    }

    /// Set the installation directory (builder). Defaults to `/usr/local/bin`
    /// on Unix-like systems and the working directory elsewhere.
    pub fn set_install_dir(mut self, dir: &str) -> Self {
        self.install_dir = Some(dir.to_owned());
        self
    }

    /// Save the asset under `name` instead of its remote file name (builder).
    pub fn set_rename(mut self, name: &str) -> Self {
        self.rename = Some(name.to_owned());
        self
    }

    /// Resolve and select, but do not download or install (builder).
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Override the progress callback (builder).
    pub fn set_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Disable progress output (builder).
    pub fn no_progress(mut self) -> Self {
        self.progress = None;
        self
    }

    /// Set an explicit HTTP/HTTPS proxy URL (builder).
    pub fn set_proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_owned());
        self
    }

    /// Point at a different GitHub API, e.g. an Enterprise host (builder).
    pub fn set_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_owned();
        self
    }

    /// Select a GitHub repository (`owner/repo`) and return a [`RepoApi`].
    pub fn repo(self, project: &str) -> RepoApi {
        RepoApi {
            api: self,
            project: project.to_owned(),
        }
    }
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

// ──────────────────────────────────────────────────────────────────────────────
// RepoApi
// ──────────────────────────────────────────────────────────────────────────────

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct Grabbed {
    /// Tag of the release the asset came from.
    pub tag: String,
    pub asset: Asset,
    /// Where the asset was (or, on a dry run, would have been) written.
    pub destination: PathBuf,
    /// `false` for dry runs.
    pub downloaded: bool,
}

/// Builder after a repository has been specified.
pub struct RepoApi {
    api: Api,
    project: String,
}

impl RepoApi {
    fn release_client(&self) -> Result<ReleaseClient> {
        let client = build_client(self.api.proxy.as_deref())?;
        Ok(ReleaseClient::new(client, &self.api.api_base))
    }

    /// Check that the repository exists and resolve its newest release.
    pub async fn release(&self) -> Result<Release> {
        let project: Project = self.project.parse()?;
        let client = self.release_client()?;

        info!("Grabbing from {project}...");
        client.repository(&project).await?;
        client.resolve_release(&project).await
    }

    /// Run the whole pipeline, asking on stdin which asset to take when the
    /// release has more than one.
    pub async fn grab(self) -> Result<Grabbed> {
        self.grab_with(|assets| {
            select::prompt_blocking(assets, std::io::stdin().lock(), std::io::stdout())
        })
        .await
    }

    /// Run the whole pipeline with a custom asset selector.
    ///
    /// `selector` only runs for releases with more than one asset and must
    /// return an index into the slice it receives.
    pub async fn grab_with<F>(self, selector: F) -> Result<Grabbed>
    where
        F: FnOnce(&[Asset]) -> Result<usize>,
    {
        let release = self.release().await?;
        let tag = release.tag_name;
        let mut assets = release.assets;

        let index = match assets.len() {
            0 => return Err(GrabError::NoAssets),
            1 => 0,
            _ => selector(&assets)?,
        };
        if index >= assets.len() {
            return Err(GrabError::SelectionOutOfRange {
                choice: index + 1,
                count: assets.len(),
            });
        }
        let asset = assets.swap_remove(index);
        debug!(asset = %asset.name, size = asset.size, "selected asset");

        let install = Install::resolve(
            &asset.browser_download_url,
            self.api.install_dir.as_deref(),
            self.api.rename.as_deref(),
        )?;
        let destination = install.destination();

        if self.api.dry_run {
            info!("Would download {} to {}", asset.browser_download_url, destination.display());
            info!("Dry-run completed");
            return Ok(Grabbed {
                tag,
                asset,
                destination,
                downloaded: false,
            });
        }

        info!("Copying to: {}", install.install_path.display());
        install.prepare()?;

        let client = build_client(self.api.proxy.as_deref())?;
        let downloader = Downloader::new(client, self.api.progress.clone());
        downloader
            .download(&asset.browser_download_url, &destination)
            .await?;
        make_executable(&destination)?;

        Ok(Grabbed {
            tag,
            asset,
            destination,
            downloaded: true,
        })
    }
}
