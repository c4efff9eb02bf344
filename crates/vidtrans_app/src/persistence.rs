use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use vidtrans_engine::{ApiFlavor, AtomicFileWriter};
use vidtrans_logging::{vt_error, vt_info, vt_warn};

const STATE_FILENAME: &str = ".vidtrans_state.ron";

/// The most recently accepted task, so `watch` can resume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastTask {
    pub task_id: String,
    pub api: ApiFlavor,
    pub target_language: String,
    /// RFC 3339, UTC.
    pub submitted_at: String,
}

impl LastTask {
    pub fn now(
        task_id: impl Into<String>,
        api: ApiFlavor,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            api,
            target_language: target_language.into(),
            submitted_at: Utc::now().to_rfc3339(),
        }
    }
}

pub(crate) fn load_last_task(output_dir: &Path) -> Option<LastTask> {
    let path = output_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            vt_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str(&content) {
        Ok(task) => {
            vt_info!("Loaded last task from {:?}", path);
            Some(task)
        }
        Err(err) => {
            vt_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_last_task(output_dir: &Path, task: &LastTask) {
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(task, pretty) {
        Ok(text) => text,
        Err(err) => {
            vt_error!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    if let Err(err) = writer.write(STATE_FILENAME, content) {
        vt_error!(
            "Failed to write persisted state to {:?}: {}",
            output_dir,
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn last_task_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let task = LastTask::now("5f1c2a7e-task", ApiFlavor::Alternate, "ja");

        save_last_task(&output, &task);

        assert_eq!(load_last_task(&output), Some(task));
    }

    #[test]
    fn missing_or_corrupt_state_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_last_task(dir.path()), None);

        fs::write(dir.path().join(STATE_FILENAME), "not ron {").unwrap();
        assert_eq!(load_last_task(dir.path()), None);
    }

    #[test]
    fn submission_time_is_rfc3339() {
        let task = LastTask::now("t1", ApiFlavor::Primary, "es");
        assert!(chrono::DateTime::parse_from_rfc3339(&task.submitted_at).is_ok());
    }
}
