use std::fmt;
use std::str::FromStr;

use crate::error::GrabError;

/// A GitHub project, identified by owner and repository name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub owner: String,
    pub repo: String,
}

impl Project {
    /// `github.com/owner/repo`, the form used when reporting lookup failures.
    pub fn web_path(&self) -> String {
        format!("github.com/{}/{}", self.owner, self.repo)
    }
}

impl FromStr for Project {
    type Err = GrabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GrabError::InvalidProject(s.to_owned());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let parts: Vec<&str> = trimmed.split('/').collect();
        let [owner, repo] = parts.as_slice() else {
            return Err(invalid());
        };

        let (owner, repo) = (owner.trim(), repo.trim());
        if owner.is_empty() || repo.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        })
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
