use vidtrans_core::{AppViewModel, DownloadStatus, DownloadView, Notice, Phase, Severity};

/// Turns successive view models into terminal lines, printing only what changed.
#[derive(Debug, Default)]
pub struct Renderer {
    last_status: Option<String>,
    last_notice: Option<Notice>,
    last_download: Option<DownloadView>,
}

impl Renderer {
    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut lines = Vec::new();

        let status = status_line(view);
        if self.last_status.as_ref() != Some(&status) {
            lines.push(status.clone());
            self.last_status = Some(status);
        }

        if view.notice != self.last_notice {
            if let Some(notice) = &view.notice {
                lines.push(notice_line(notice));
            }
            self.last_notice = view.notice.clone();
        }

        if view.download != self.last_download {
            if let Some(download) = &view.download {
                lines.push(download_line(download));
            }
            self.last_download = view.download.clone();
        }

        lines
    }
}

pub fn status_line(view: &AppViewModel) -> String {
    let label = view.progress_label.as_deref();
    match view.phase {
        Phase::Idle => "Ready".to_string(),
        Phase::Submitting => format!(
            "[{:>3}%] {}",
            view.progress_percent,
            label.unwrap_or("Submitting...")
        ),
        Phase::Polling => {
            let task = view.task_id.as_deref().unwrap_or("?");
            format!(
                "[{:>3}%] {} (task {})",
                view.progress_percent,
                label.unwrap_or(vidtrans_core::DEFAULT_PROGRESS_LABEL),
                task
            )
        }
        Phase::Succeeded => format!("[{:>3}%] Done", view.progress_percent),
        Phase::Info => format!("[{:>3}%] Finished", view.progress_percent),
        Phase::Failed => "[ -- ] Failed".to_string(),
    }
}

fn notice_line(notice: &Notice) -> String {
    let prefix = match notice.severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Error => "error",
    };
    format!("{prefix}: {}", notice.text)
}

fn download_line(download: &DownloadView) -> String {
    match &download.status {
        None => format!("Result available at {}", download.path),
        Some(DownloadStatus::InProgress) => format!("Downloading {} ...", download.path),
        Some(DownloadStatus::Saved(path)) => format!("Saved {}", path.display()),
        Some(DownloadStatus::Failed(message)) => format!("Download failed: {message}"),
    }
}
