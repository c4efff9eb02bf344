use std::path::{Path, PathBuf};
use std::time::Duration;

use vidtrans_core::{Effect, FileHandle, Msg, SubmissionRequest, SubmissionSource};
use vidtrans_engine::{EngineEvent, EngineHandle, PollEventKind, SubmitRequest, SubmitSource};
use vidtrans_logging::{short_id, vt_info, vt_warn};

/// What the session loop receives from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Msg(Msg),
    EngineStopped(String),
}

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    output_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, output_dir: PathBuf) -> Self {
        Self { engine, output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit {
                    generation,
                    request,
                } => {
                    vt_info!(
                        "Submit generation={} kind={:?} lang={}",
                        generation,
                        request.source.kind(),
                        request.target_language
                    );
                    self.engine.submit(generation, to_submit_request(&request));
                }
                Effect::StartPolling {
                    generation,
                    task_id,
                } => {
                    vt_info!(
                        "StartPolling generation={} task={}",
                        generation,
                        short_id(&task_id)
                    );
                    self.engine.start_polling(generation, task_id);
                }
                Effect::CancelPolling => self.engine.cancel_polling(),
                Effect::Download {
                    generation,
                    download,
                } => {
                    vt_info!("Download {} into {:?}", download.path(), self.output_dir);
                    self.engine
                        .download(generation, download.path(), self.output_dir.clone());
                }
            }
        }
    }

    pub fn next(&self, timeout: Duration) -> Option<Inbound> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

pub fn map_event(event: EngineEvent) -> Inbound {
    let msg = match event {
        EngineEvent::Submitted {
            generation,
            result: Ok(task_id),
        } => Msg::SubmissionAccepted {
            generation,
            task_id,
        },
        EngineEvent::Submitted {
            generation,
            result: Err(err),
        } => {
            vt_warn!("Submission generation {} failed: {:?}", generation, err);
            Msg::SubmissionRejected {
                generation,
                message: err.to_string(),
            }
        }
        EngineEvent::Poll(event) => {
            let generation = event.generation;
            match event.kind {
                PollEventKind::Progress { label, percent } => Msg::TaskProgress {
                    generation,
                    label,
                    percent,
                },
                PollEventKind::Succeeded { artifact_id } => Msg::TaskSucceeded {
                    generation,
                    artifact_id,
                },
                PollEventKind::Info { message } => Msg::TaskInfo {
                    generation,
                    message,
                },
                PollEventKind::Failed { cause, message } => {
                    vt_warn!(
                        "Task {} failed ({}): {}",
                        short_id(&event.task_id),
                        cause,
                        message
                    );
                    Msg::TaskFailed {
                        generation,
                        message,
                    }
                }
            }
        }
        EngineEvent::Downloaded { generation, result } => {
            Msg::DownloadFinished { generation, result }
        }
        EngineEvent::Stopped { reason } => return Inbound::EngineStopped(reason),
    };
    Inbound::Msg(msg)
}

pub fn to_submit_request(request: &SubmissionRequest) -> SubmitRequest {
    let source = match &request.source {
        SubmissionSource::Upload(file) => SubmitSource::Upload {
            path: file.path.clone(),
            file_name: file.file_name.clone(),
            mime: file.mime.clone(),
        },
        SubmissionSource::UrlReference(url) => SubmitSource::UrlReference(url.clone()),
    };
    SubmitRequest {
        source,
        target_language: request.target_language.to_string(),
    }
}

/// Builds a [`FileHandle`] for a local path, guessing the MIME type from the extension.
pub fn file_handle(path: &Path) -> FileHandle {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let mime = match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        _ => "application/octet-stream",
    };
    FileHandle {
        path: path.to_path_buf(),
        file_name,
        mime: mime.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use vidtrans_core::LanguageCode;
    use vidtrans_engine::{FailureCause, PollEvent, SubmissionError};

    use super::*;

    #[test]
    fn submission_results_map_to_messages() {
        assert_eq!(
            map_event(EngineEvent::Submitted {
                generation: 3,
                result: Ok("t1".into())
            }),
            Inbound::Msg(Msg::SubmissionAccepted {
                generation: 3,
                task_id: "t1".into()
            })
        );
        assert_eq!(
            map_event(EngineEvent::Submitted {
                generation: 3,
                result: Err(SubmissionError::Transport {
                    fallback: "Video upload failed",
                    detail: "connection refused".into()
                })
            }),
            Inbound::Msg(Msg::SubmissionRejected {
                generation: 3,
                message: "Video upload failed".into()
            })
        );
    }

    #[test]
    fn poll_events_keep_their_generation() {
        let event = EngineEvent::Poll(PollEvent {
            generation: 2,
            task_id: "t1".into(),
            kind: PollEventKind::Failed {
                cause: FailureCause::Transport,
                message: "Error checking task status".into(),
            },
        });
        assert_eq!(
            map_event(event),
            Inbound::Msg(Msg::TaskFailed {
                generation: 2,
                message: "Error checking task status".into()
            })
        );
    }

    #[test]
    fn stopped_engine_is_surfaced() {
        assert_eq!(
            map_event(EngineEvent::Stopped {
                reason: "command channel closed".into()
            }),
            Inbound::EngineStopped("command channel closed".into())
        );
    }

    #[test]
    fn file_handles_guess_video_mime() {
        let handle = file_handle(Path::new("/videos/Talk.MOV"));
        assert_eq!(handle.file_name, "Talk.MOV");
        assert_eq!(handle.mime, "video/quicktime");
        assert!(handle.is_video());

        assert!(!file_handle(Path::new("notes.txt")).is_video());
    }

    #[test]
    fn core_requests_convert_to_engine_requests() {
        let request = SubmissionRequest {
            source: SubmissionSource::Upload(file_handle(Path::new("clip.webm"))),
            target_language: LanguageCode::parse("de").unwrap(),
        };
        assert_eq!(
            to_submit_request(&request),
            SubmitRequest {
                source: SubmitSource::Upload {
                    path: PathBuf::from("clip.webm"),
                    file_name: "clip.webm".into(),
                    mime: "video/webm".into(),
                },
                target_language: "de".into(),
            }
        );
    }
}
