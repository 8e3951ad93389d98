//! Local JSON-lines run log.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::{ExperimentTracker, RunRecord, TrackingError, new_run_id};

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    /// Run id.
    pub run_id: String,
    /// When the run was finished.
    pub finished_at_utc: DateTime<Utc>,
    /// Logged metrics and params.
    #[serde(flatten)]
    pub record: RunRecord,
}

/// Appends one JSON object per finished run to a file.
pub struct JsonlTracker {
    path: PathBuf,
}

impl JsonlTracker {
    /// Creates a tracker writing to `path`. Parent directories are created
    /// on first write.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExperimentTracker for JsonlTracker {
    async fn start_run(&self, run_name: &str) -> Result<String, TrackingError> {
        let run_id = new_run_id();
        log::info!("Started run {run_id} ({run_name})");
        Ok(run_id)
    }

    async fn finish_run(&self, run_id: &str, record: &RunRecord) -> Result<(), TrackingError> {
        let entry = RunLogEntry {
            run_id: run_id.to_string(),
            finished_at_utc: Utc::now(),
            record: record.clone(),
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        log::info!("Recorded run {run_id} in {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_one_line_per_run() {
        let dir = std::env::temp_dir().join("film_hotspots_jsonl_tracker");
        let _ = std::fs::remove_dir_all(&dir);
        let tracker = JsonlTracker::new(dir.join("nested").join("runs.jsonl"));

        let mut record = RunRecord::new();
        record.metric("n_zones", 4.0).param("drift", "1");

        let first = tracker.start_run("city_evolution_retrain").await.unwrap();
        tracker.finish_run(&first, &record).await.unwrap();
        let second = tracker.start_run("city_evolution_retrain").await.unwrap();
        tracker.finish_run(&second, &RunRecord::new()).await.unwrap();

        let contents = std::fs::read_to_string(tracker.path()).unwrap();
        let entries: Vec<RunLogEntry> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].run_id, first);
        assert_eq!(entries[0].record, record);
        assert_eq!(entries[1].run_id, second);
        assert!(entries[1].record.metrics.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
