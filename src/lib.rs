//! # grab
//!
//! Download the newest GitHub release asset of a project and install it as an
//! executable, with a chainable, builder-style API.
//!
//! The latest published release is preferred; projects that only push tags
//! fall back to the release attached to their newest tag. When a release has
//! several assets the caller picks one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grab::Api;
//!
//! #[tokio::main]
//! async fn main() {
//!     let grabbed = Api::new()
//!         .set_install_dir("./bin")
//!         .repo("tobyjoe/grab")
//!         .grab_with(|assets| {
//!             Ok(assets.iter().position(|a| a.name.contains("linux")).unwrap_or(0))
//!         })
//!         .await
//!         .unwrap();
//!     println!("installed {}", grabbed.destination.display());
//! }
//! ```

pub mod api;
pub mod downloader;
pub mod error;
pub mod install;
pub mod progress;
pub mod project;
pub mod release;
pub mod select;

pub use api::{Api, Grabbed, RepoApi};
pub use downloader::{Downloader, ProgressFn};
pub use error::{GrabError, Result};
pub use install::Install;
pub use progress::default_progress_fn;
pub use project::Project;
pub use release::{Asset, Release, ReleaseClient};
