//! Error type shared by every stage of the grab pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, GrabError>;

#[derive(Debug, Error)]
pub enum GrabError {
    /// The positional argument is not of the form `owner/repo`.
    #[error("invalid project {0:?}, expected owner/repo")]
    InvalidProject(String),

    #[error("Cannot reach {0}")]
    Unreachable(String),

    #[error("Project does not exist: {0}")]
    ProjectNotFound(String),

    #[error("Unknown error ({0}) reaching: {1}")]
    UnknownStatus(u16, String),

    #[error("No tags or releases: {0}")]
    NoReleases(String),

    #[error("No assets to download")]
    NoAssets,

    #[error("You must select an asset to download")]
    NoSelection,

    #[error("Asset {choice} does not exist, pick a number between 1 and {count}")]
    SelectionOutOfRange { choice: usize, count: usize },

    #[error("Could not read selection: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Could not parse URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Could not determine a file name from {0}")]
    NoFileName(String),

    #[error("No working directory")]
    NoWorkingDir(#[source] std::io::Error),

    #[error("Could not create local file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not get remote file: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("Could not get remote file: server returned {0}")]
    DownloadStatus(reqwest::StatusCode),

    #[error("Could not copy local file: {0}")]
    Copy(#[source] std::io::Error),

    #[error("Could not make {} executable. Try with (sudo)?", .0.display())]
    NotExecutable(PathBuf),

    #[error("Could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("GitHub API error: {0}")]
    Api(String),
}

impl GrabError {
    /// Process exit code for this error. Usage mistakes follow `EX_USAGE`-style 2.
    pub fn exit_code(&self) -> u8 {
        match self {
            GrabError::InvalidProject(_) => 2,
            _ => 1,
        }
    }

    /// Whether the CLI should print its usage text alongside the message.
    pub fn is_usage(&self) -> bool {
        self.exit_code() == 2
    }
}
