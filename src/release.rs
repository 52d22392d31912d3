use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{GrabError, Result};
use crate::project::Project;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_TIMEOUT: Duration = Duration::from_secs(30);

/// A published release and the files attached to it.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A single downloadable file of a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: TagCommit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCommit {
    pub sha: String,
}

/// Queries repository, release and tag metadata from the GitHub API.
pub struct ReleaseClient {
    client: Client,
    api_base: String,
}

impl ReleaseClient {
    pub fn new(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.to_owned(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|_| GrabError::Api(format!("{} cannot be used as an API base", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, url: Url) -> std::result::Result<Response, reqwest::Error> {
        debug!(%url, "GET");
        self.client
            .get(url)
            .timeout(API_TIMEOUT)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
    }

    /// Confirm that the repository exists.
    pub async fn repository(&self, project: &Project) -> Result<()> {
        let url = self.endpoint(&["repos", &project.owner, &project.repo])?;
        let resp = self
            .send(url)
            .await
            .map_err(|_| GrabError::Unreachable(project.web_path()))?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(GrabError::ProjectNotFound(project.web_path())),
            s => Err(GrabError::UnknownStatus(s.as_u16(), project.web_path())),
        }
    }

    /// The latest published release, or `None` when the project has none yet.
    pub async fn latest_release(&self, project: &Project) -> Result<Option<Release>> {
        let url = self.endpoint(&["repos", &project.owner, &project.repo, "releases", "latest"])?;
        let resp = self
            .send(url)
            .await
            .map_err(|_| GrabError::Unreachable(project.web_path()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(parse_json(resp).await?))
    }

    /// Tags of the project, newest first.
    pub async fn tags(&self, project: &Project) -> Result<Vec<Tag>> {
        let url = self.endpoint(&["repos", &project.owner, &project.repo, "tags"])?;
        let resp = self
            .send(url)
            .await
            .map_err(|_| GrabError::Unreachable(project.web_path()))?;
        parse_json(resp).await
    }

    pub async fn release_by_tag(&self, project: &Project, tag: &str) -> Result<Release> {
        let mut segments: Vec<&str> = vec!["repos", &project.owner, &project.repo, "releases", "tags"];
        segments.extend(tag.split('/'));
        let url = self.endpoint(&segments)?;
        let resp = self
            .send(url)
            .await
            .map_err(|_| GrabError::Unreachable(project.web_path()))?;
        parse_json(resp).await
    }

    /// The latest release, falling back to the release attached to the newest tag.
    pub async fn resolve_release(&self, project: &Project) -> Result<Release> {
        if let Some(release) = self.latest_release(project).await? {
            info!("Latest release: {}", release.tag_name);
            return Ok(release);
        }

        info!("No official releases yet. Checking pre-release tags...");
        let tags = self
            .tags(project)
            .await
            .map_err(no_releases)?;
        let tag = tags
            .first()
            .ok_or_else(|| GrabError::NoReleases("no tags found".to_owned()))?;
        info!("Latest tag: {} ({})", tag.name, tag.commit.sha);

        self.release_by_tag(project, &tag.name)
            .await
            .map_err(no_releases)
    }
}

/// Wrap a fallback failure without stacking the `Api` prefix into the message.
fn no_releases(err: GrabError) -> GrabError {
    match err {
        GrabError::Api(detail) => GrabError::NoReleases(detail),
        other => GrabError::NoReleases(other.to_string()),
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(GrabError::Api(format!("GitHub API returned {status}: {body}")));
    }
    resp.json()
        .await
        .map_err(|e| GrabError::Api(format!("unexpected response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ReleaseClient {
        ReleaseClient::new(Client::new(), base)
    }

    #[test]
    fn endpoint_joins_segments_onto_base() {
        let url = client("https://api.github.com")
            .endpoint(&["repos", "o", "r", "releases", "latest"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/o/r/releases/latest");
    }

    #[test]
    fn endpoint_keeps_enterprise_prefix() {
        let url = client("https://ghe.example.com/api/v3/")
            .endpoint(&["repos", "o", "r"])
            .unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/o/r");
    }

    #[test]
    fn no_releases_keeps_only_the_inner_detail() {
        let err = no_releases(GrabError::Api("GitHub API returned 404 Not Found: {}".into()));
        assert_eq!(err.to_string(), "No tags or releases: GitHub API returned 404 Not Found: {}");

        let err = no_releases(GrabError::Unreachable("github.com/o/r".into()));
        assert_eq!(err.to_string(), "No tags or releases: Cannot reach github.com/o/r");
    }

    #[tokio::test]
    async fn slash_in_tag_stays_a_path_separator() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/o/r/releases/tags/release/v1")
            .with_status(200)
            .with_body(r#"{"tag_name":"release/v1","assets":[]}"#)
            .create_async()
            .await;

        let project: Project = "o/r".parse().unwrap();
        let release = client(&server.url()).release_by_tag(&project, "release/v1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(release.tag_name, "release/v1");
    }

    #[test]
    fn release_tolerates_missing_optional_fields() {
        let json = r#"{"tag_name":"v1.2.0","assets":[{"name":"tool","browser_download_url":"https://example.com/tool"}]}"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v1.2.0");
        assert!(!release.prerelease);
        assert_eq!(release.assets[0].size, 0);
    }
}
