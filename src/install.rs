use std::path::{Path, PathBuf};

use tracing::{debug, info};
use url::Url;

use crate::error::{GrabError, Result};

/// Where a downloaded asset ends up on disk.
#[derive(Debug, Clone)]
pub struct Install {
    /// Directory the asset is written into.
    pub install_path: PathBuf,
    /// File name inside `install_path`.
    pub file_name: String,
}

impl Install {
    /// Resolve the destination for `download_url`.
    ///
    /// An empty or missing `dir` falls back to [`default_install_dir`]; an
    /// empty or missing `rename` keeps the last segment of the URL path.
    pub fn resolve(download_url: &str, dir: Option<&str>, rename: Option<&str>) -> Result<Self> {
        let install_path = match dir.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => expand_home(d),
            None => default_install_dir()?,
        };

        let file_name = match rename.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_owned(),
            None => file_name_from_url(download_url)?,
        };

        Ok(Self {
            install_path,
            file_name,
        })
    }

    /// Full path of the installed file.
    pub fn destination(&self) -> PathBuf {
        self.install_path.join(&self.file_name)
    }

    /// Make sure the install directory exists.
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.install_path).map_err(|source| GrabError::CreateFile {
            path: self.install_path.clone(),
            source,
        })
    }
}

/// `/usr/local/bin` on Unix-like systems, the working directory elsewhere.
pub fn default_install_dir() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(GrabError::NoWorkingDir)?;
    debug!("OS: {}", std::env::consts::OS);

    if cfg!(any(
        target_os = "macos",
        target_os = "dragonfly",
        target_os = "linux",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
    )) {
        Ok(PathBuf::from("/usr/local/bin"))
    } else {
        Ok(cwd)
    }
}

fn expand_home(dir: &str) -> PathBuf {
    let rest = match dir.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(dir),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(dir),
    }
}

fn file_name_from_url(download_url: &str) -> Result<String> {
    let url = Url::parse(download_url)?;
    let no_name = || GrabError::NoFileName(download_url.to_owned());

    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .ok_or_else(no_name)?;
    let name = urlencoding::decode(segment).map_err(|_| no_name())?;
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(no_name());
    }
    Ok(name.into_owned())
}

/// Set `0755` on the installed file.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|_| GrabError::NotExecutable(path.to_owned()))?;
    info!("Marked {} executable", path.display());
    Ok(())
}

#[cfg(not(unix))]
pub fn make_executable(path: &Path) -> Result<()> {
    debug!("skipping permission change for {} on this platform", path.display());
    Ok(())
}
