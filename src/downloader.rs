use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::{Client, NoProxy, Proxy};
use tracing::{debug, info};

use crate::error::{GrabError, Result};

/// Callback type for reporting download progress.
/// Arguments: file name, bytes downloaded, total bytes (0 if unknown), MiB/s, is_complete
pub type ProgressFn = Arc<dyn Fn(&str, u64, u64, f64, bool) + Send + Sync>;

/// Build an HTTP client, optionally with proxy support.
///
/// Only the connection phase is bounded here; API calls set their own
/// per-request timeout so that large downloads are never cut off.
pub fn build_client(proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .user_agent(concat!("grab/", env!("CARGO_PKG_VERSION")));
    if let Some(proxy_url) = proxy {
        let proxy = Proxy::all(proxy_url).map_err(GrabError::Client)?;
        builder = builder.proxy(proxy.no_proxy(NoProxy::from_env()));
    }
    builder.build().map_err(GrabError::Client)
}

/// Streams release assets to disk.
pub struct Downloader {
    client: Client,
    /// Optional progress callback.
    pub progress: Option<ProgressFn>,
}

impl Downloader {
    pub fn new(client: Client, progress: Option<ProgressFn>) -> Self {
        Self { client, progress }
    }

    /// Stream `url` into the file at `dest`, returning the number of bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading release asset: {url}");

        let resp = self.client.get(url).send().await.map_err(GrabError::Fetch)?;
        if !resp.status().is_success() {
            return Err(GrabError::DownloadStatus(resp.status()));
        }

        let total = resp.content_length().unwrap_or(0);
        let mut file = std::fs::File::create(dest).map_err(|source| GrabError::CreateFile {
            path: dest.to_owned(),
            source,
        })?;

        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_owned());
        let start = Instant::now();
        let mut downloaded: u64 = 0;
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(GrabError::Fetch)?;
            file.write_all(&chunk).map_err(GrabError::Copy)?;
            downloaded += chunk.len() as u64;
            self.report(&name, downloaded, total, start, false);
        }
        file.flush().map_err(GrabError::Copy)?;
        self.report(&name, downloaded, total, start, true);

        debug!(bytes = downloaded, path = %dest.display(), "download finished");
        Ok(downloaded)
    }

    fn report(&self, name: &str, downloaded: u64, total: u64, start: Instant, complete: bool) {
        if let Some(progress) = &self.progress {
            let elapsed = start.elapsed().as_secs_f64();
            let mib_per_sec = if elapsed > 0.0 {
                (downloaded as f64) / (1024.0 * 1024.0) / elapsed
            } else {
                0.0
            };
            progress(name, downloaded, total, mib_per_sec, complete);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn streams_body_and_reports_progress() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![7u8; 4096];
        let mock = server
            .mock("GET", "/download/v1/tool")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let calls: Arc<Mutex<Vec<(u64, u64, bool)>>> = Arc::default();
        let seen = calls.clone();
        let progress: ProgressFn = Arc::new(move |name: &str, current: u64, total: u64, _: f64, complete: bool| {
            assert_eq!(name, "tool");
            seen.lock().unwrap().push((current, total, complete));
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool");
        let downloader = Downloader::new(build_client(None).unwrap(), Some(progress));
        let written = downloader
            .download(&format!("{}/download/v1/tool", server.url()), &dest)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(written, 4096);
        assert_eq!(std::fs::read(&dest).unwrap(), body);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.last(), Some(&(4096, 4096, true)));
        assert!(calls[..calls.len() - 1].iter().all(|c| !c.2));
    }

    #[tokio::test]
    async fn unknown_length_is_reported_as_zero_total() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/download/v1/stream")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"first chunk ")?;
                w.write_all(b"second chunk")
            })
            .create_async()
            .await;

        let totals: Arc<Mutex<Vec<(u64, bool)>>> = Arc::default();
        let seen = totals.clone();
        let progress: ProgressFn = Arc::new(move |_: &str, _: u64, total: u64, _: f64, complete: bool| {
            seen.lock().unwrap().push((total, complete));
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("stream");
        let downloader = Downloader::new(build_client(None).unwrap(), Some(progress));
        let written = downloader
            .download(&format!("{}/download/v1/stream", server.url()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 24);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "first chunk second chunk");

        let totals = totals.lock().unwrap();
        assert!(totals.iter().all(|(total, _)| *total == 0));
        assert_eq!(totals.last(), Some(&(0, true)));
    }

    #[tokio::test]
    async fn failed_status_leaves_no_file() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing");
        let downloader = Downloader::new(build_client(None).unwrap(), None);
        let err = downloader
            .download(&format!("{}/missing", server.url()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, GrabError::DownloadStatus(s) if s.as_u16() == 404));
        assert!(!dest.exists());
    }
}
