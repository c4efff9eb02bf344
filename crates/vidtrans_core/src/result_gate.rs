use std::fmt;

use thiserror::Error;
use url::Url;

pub const DOWNLOAD_ROUTE: &str = "/api/download";

/// Server-relative reference to a finished translation, e.g. `/api/download/t1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRef {
    artifact_id: String,
    path: String,
}

impl DownloadRef {
    /// Builds the reference for an artifact id, percent-encoding it as one
    /// path segment.
    pub fn for_artifact(artifact_id: &str) -> Result<Self, InvalidArtifactId> {
        if matches!(artifact_id.trim(), "" | "." | "..") {
            return Err(InvalidArtifactId(artifact_id.to_string()));
        }

        // Only used to borrow the url crate's segment encoder.
        let mut scratch =
            Url::parse("http://localhost/").map_err(|_| InvalidArtifactId(artifact_id.into()))?;
        scratch
            .path_segments_mut()
            .map_err(|_| InvalidArtifactId(artifact_id.into()))?
            .clear()
            .extend(DOWNLOAD_ROUTE.trim_start_matches('/').split('/'))
            .push(artifact_id);

        Ok(Self {
            artifact_id: artifact_id.to_string(),
            path: scratch.path().to_string(),
        })
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for DownloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid artifact id {0:?}")]
pub struct InvalidArtifactId(pub String);

/// Holds at most one download reference; replaced on every enable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultGate {
    current: Option<DownloadRef>,
}

impl ResultGate {
    pub fn enable(&mut self, artifact_id: &str) -> Result<&DownloadRef, InvalidArtifactId> {
        self.current = None;
        let download = DownloadRef::for_artifact(artifact_id)?;
        Ok(self.current.insert(download))
    }

    pub fn disable(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&DownloadRef> {
        self.current.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.current.is_some()
    }
}
