use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Target languages offered by the translation backend, as `(code, name)`.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("hi", "Hindi"),
];

pub const DEFAULT_LANGUAGE: &str = "es";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a video file or enter a video URL.")]
    NoSource,
    #[error("Please enter a valid video URL")]
    InvalidUrl,
    #[error("Please select a valid video file.")]
    NotAVideo,
    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),
}

/// Lowercase two-letter language code sent as `target_language`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let code = raw.trim().to_ascii_lowercase();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_lowercase()) {
            Ok(Self(code))
        } else {
            Err(ValidationError::UnsupportedLanguage(raw.trim().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name for codes in [`SUPPORTED_LANGUAGES`].
    pub fn display_name(&self) -> Option<&'static str> {
        SUPPORTED_LANGUAGES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A local video file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
}

impl FileHandle {
    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Upload,
    UrlReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionSource {
    Upload(FileHandle),
    UrlReference(String),
}

impl SubmissionSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            SubmissionSource::Upload(_) => SourceKind::Upload,
            SubmissionSource::UrlReference(_) => SourceKind::UrlReference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub source: SubmissionSource,
    pub target_language: LanguageCode,
}

impl SubmissionRequest {
    /// Builds a request from the current form inputs.
    ///
    /// A selected file wins over a URL; the input model never holds both.
    pub fn from_inputs(
        file: Option<&FileHandle>,
        url: &str,
        target_language: &LanguageCode,
    ) -> Result<Self, ValidationError> {
        let source = match file {
            Some(file) if !file.is_video() => return Err(ValidationError::NotAVideo),
            Some(file) => SubmissionSource::Upload(file.clone()),
            None => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(ValidationError::NoSource);
                }
                SubmissionSource::UrlReference(validate_video_url(url)?)
            }
        };

        Ok(Self {
            source,
            target_language: target_language.clone(),
        })
    }
}

fn validate_video_url(raw: &str) -> Result<String, ValidationError> {
    let parsed = Url::parse(raw).map_err(|_| ValidationError::InvalidUrl)?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(raw.to_string()),
        _ => Err(ValidationError::InvalidUrl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(name: &str) -> FileHandle {
        FileHandle {
            path: PathBuf::from(name),
            file_name: name.to_string(),
            mime: "video/mp4".to_string(),
        }
    }

    #[test]
    fn language_code_normalizes_case_and_whitespace() {
        let code = LanguageCode::parse(" FR ").unwrap();
        assert_eq!(code.as_str(), "fr");
        assert_eq!(code.display_name(), Some("French"));
    }

    #[test]
    fn language_code_rejects_malformed_values() {
        assert!(LanguageCode::parse("spanish").is_err());
        assert!(LanguageCode::parse("e1").is_err());
        assert!(LanguageCode::parse("").is_err());
    }

    #[test]
    fn unknown_but_well_formed_language_passes_through() {
        let code = LanguageCode::parse("pt").unwrap();
        assert_eq!(code.display_name(), None);
    }

    #[test]
    fn file_takes_upload_path() {
        let file = video("clip.mp4");
        let request =
            SubmissionRequest::from_inputs(Some(&file), "", &LanguageCode::default()).unwrap();
        assert_eq!(request.source.kind(), SourceKind::Upload);
        assert_eq!(request.target_language.as_str(), "es");
    }

    #[test]
    fn url_is_trimmed_and_checked() {
        let request = SubmissionRequest::from_inputs(
            None,
            "  https://youtu.be/abc ",
            &LanguageCode::default(),
        )
        .unwrap();
        assert_eq!(
            request.source,
            SubmissionSource::UrlReference("https://youtu.be/abc".to_string())
        );

        let err = SubmissionRequest::from_inputs(None, "ftp://host/x", &LanguageCode::default())
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidUrl);
        let err = SubmissionRequest::from_inputs(None, "not a url", &LanguageCode::default())
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidUrl);
    }

    #[test]
    fn no_source_is_a_validation_error() {
        let err =
            SubmissionRequest::from_inputs(None, "   ", &LanguageCode::default()).unwrap_err();
        assert_eq!(err, ValidationError::NoSource);
    }

    #[test]
    fn non_video_file_is_rejected() {
        let mut file = video("notes.txt");
        file.mime = "text/plain".to_string();
        let err = SubmissionRequest::from_inputs(Some(&file), "", &LanguageCode::default())
            .unwrap_err();
        assert_eq!(err, ValidationError::NotAVideo);
    }
}
