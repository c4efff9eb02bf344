use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use serde::Deserialize;
use vidtrans_logging::{vt_info, vt_warn};

use crate::client::{map_reqwest_error, ReqwestBackend};
use crate::persist::{AtomicFileWriter, PersistError};
use crate::DownloadError;

pub const DEFAULT_DOWNLOAD_FILENAME: &str = "translated_video.mp4";

const DOWNLOAD_FAILED: &str = "Failed to download video";

/// Fetches a finished translation into a local directory.
#[async_trait::async_trait]
pub trait ResultDownloader: Send + Sync {
    /// `download_path` is the server-relative reference, e.g. `/api/download/t1`.
    async fn download(&self, download_path: &str, output_dir: &Path)
        -> Result<PathBuf, DownloadError>;
}

#[derive(Debug, Deserialize)]
struct DownloadErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait::async_trait]
impl ResultDownloader for ReqwestBackend {
    async fn download(
        &self,
        download_path: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let url = self
            .resolve(download_path)
            .map_err(|_| DownloadError::InvalidReference(download_path.to_string()))?;
        vt_info!("GET {}", url.path());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| DownloadError::Transport(map_reqwest_error(&err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<DownloadErrorBody>(&body)
                .ok()
                .and_then(|body| body.error.or(body.message))
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DOWNLOAD_FAILED.to_string());
            vt_warn!("Download failed with HTTP {}: {}", status.as_u16(), message);
            return Err(DownloadError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let filename = filename_from_disposition(response.headers())
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_FILENAME.to_string());

        let writer = AtomicFileWriter::new(output_dir.to_path_buf());
        let mut staged = off_runtime(move || writer.stage()).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| DownloadError::Transport(map_reqwest_error(&err)))?;
            staged = off_runtime(move || {
                staged.write_chunk(&chunk)?;
                Ok(staged)
            })
            .await?;
        }

        let written = staged.bytes_written();
        let target = off_runtime(move || staged.commit(&filename)).await?;
        vt_info!("Saved {} bytes to {}", written, target.display());
        Ok(target)
    }
}

/// Runs file IO on the blocking pool. The engine runtime is single-threaded
/// and also drives the poll timers.
pub(crate) async fn off_runtime<T, F>(job: F) -> Result<T, PersistError>
where
    F: FnOnce() -> Result<T, PersistError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| PersistError::Io(io::Error::from(err)))?
}

/// Extracts a safe file name from a `Content-Disposition` header.
///
/// Accepts `filename="x.mp4"` and RFC 5987 `filename*=UTF-8''x.mp4`, the latter
/// taking precedence. Directory components are stripped.
pub fn filename_from_disposition(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;

    let mut plain = None;
    let mut extended = None;
    for part in value.split(';') {
        let part = part.trim();
        if let Some(encoded) = strip_param(part, "filename*") {
            let encoded = encoded.trim_matches('"');
            let raw = encoded.rsplit('\'').next().unwrap_or(encoded);
            if let Ok(decoded) = urlencoding::decode(raw) {
                extended = Some(decoded.into_owned());
            }
        } else if let Some(name) = strip_param(part, "filename") {
            plain = Some(name.trim_matches('"').to_string());
        }
    }

    extended.or(plain).and_then(|name| sanitize(&name))
}

fn strip_param<'a>(part: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = part.split_once('=')?;
    name.trim().eq_ignore_ascii_case(key).then(|| value.trim())
}

fn sanitize(name: &str) -> Option<String> {
    // Servers on Windows may send backslash separators.
    let last = name.rsplit(['/', '\\']).next()?.trim();
    let name = Path::new(last).file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}
