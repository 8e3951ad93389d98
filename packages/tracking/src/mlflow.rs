//! MLflow tracking server client (REST API 2.0).

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ExperimentTracker, RunRecord, TrackingError};

/// MLflow error code for a missing experiment.
const RESOURCE_DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";

/// Records runs in one MLflow experiment.
pub struct MlflowTracker {
    base_url: String,
    experiment: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GetExperimentResponse {
    experiment: Experiment,
}

#[derive(Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    experiment_id: &'a str,
    run_name: &'a str,
    start_time: i64,
}

#[derive(Deserialize)]
struct CreateRunResponse {
    run: Run,
}

#[derive(Deserialize)]
struct Run {
    info: RunInfo,
}

#[derive(Deserialize)]
struct RunInfo {
    run_id: String,
}

#[derive(Serialize)]
struct Metric<'a> {
    key: &'a str,
    value: f64,
    timestamp: i64,
    step: i64,
}

#[derive(Serialize)]
struct Param<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct LogBatchRequest<'a> {
    run_id: &'a str,
    metrics: Vec<Metric<'a>>,
    params: Vec<Param<'a>>,
}

impl<'a> LogBatchRequest<'a> {
    fn new(run_id: &'a str, record: &'a RunRecord, timestamp: i64) -> Self {
        Self {
            run_id,
            metrics: record
                .metrics
                .iter()
                .map(|(key, value)| Metric {
                    key,
                    value: *value,
                    timestamp,
                    step: 0,
                })
                .collect(),
            params: record
                .params
                .iter()
                .map(|(key, value)| Param { key, value })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct UpdateRunRequest<'a> {
    run_id: &'a str,
    status: &'a str,
    end_time: i64,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

impl MlflowTracker {
    /// Creates a client for the server at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, experiment: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            experiment: experiment.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/2.0/mlflow/{path}", self.base_url)
    }

    /// Reads a response body, mapping non-success statuses to
    /// [`TrackingError::Api`].
    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, TrackingError> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| format!("{}: {}", e.error_code, e.message))
                .unwrap_or(body);
            return Err(TrackingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TrackingError> {
        let resp = self.client.post(self.endpoint(path)).json(body).send().await?;
        Self::read(resp).await
    }

    /// Looks the experiment up by name, creating it if it does not exist.
    async fn experiment_id(&self) -> Result<String, TrackingError> {
        let resp = self
            .client
            .get(self.endpoint("experiments/get-by-name"))
            .query(&[("experiment_name", self.experiment.as_str())])
            .send()
            .await?;

        match Self::read::<GetExperimentResponse>(resp).await {
            Ok(found) => return Ok(found.experiment.experiment_id),
            Err(TrackingError::Api { message, .. })
                if message.starts_with(RESOURCE_DOES_NOT_EXIST) => {}
            Err(e) => return Err(e),
        }

        log::info!("Creating MLflow experiment {}", self.experiment);
        let created: CreateExperimentResponse = self
            .post(
                "experiments/create",
                &serde_json::json!({ "name": self.experiment }),
            )
            .await?;
        Ok(created.experiment_id)
    }
}

#[async_trait]
impl ExperimentTracker for MlflowTracker {
    async fn start_run(&self, run_name: &str) -> Result<String, TrackingError> {
        let experiment_id = self.experiment_id().await?;

        let created: CreateRunResponse = self
            .post(
                "runs/create",
                &CreateRunRequest {
                    experiment_id: &experiment_id,
                    run_name,
                    start_time: now_millis(),
                },
            )
            .await?;

        log::info!(
            "Started MLflow run {} in experiment {experiment_id}",
            created.run.info.run_id
        );
        Ok(created.run.info.run_id)
    }

    async fn finish_run(&self, run_id: &str, record: &RunRecord) -> Result<(), TrackingError> {
        let timestamp = now_millis();

        let batch = LogBatchRequest::new(run_id, record, timestamp);
        let _: serde_json::Value = self.post("runs/log-batch", &batch).await?;

        let _: serde_json::Value = self
            .post(
                "runs/update",
                &UpdateRunRequest {
                    run_id,
                    status: "FINISHED",
                    end_time: now_millis(),
                },
            )
            .await?;

        log::info!(
            "Logged {} metrics and {} params to MLflow run {run_id}",
            record.metrics.len(),
            record.params.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_trailing_slash() {
        let tracker = MlflowTracker::new("http://localhost:5000/", "exp");
        assert_eq!(
            tracker.endpoint("runs/create"),
            "http://localhost:5000/api/2.0/mlflow/runs/create"
        );
    }

    #[test]
    fn log_batch_serializes_mlflow_shape() {
        let mut record = RunRecord::new();
        record.metric("n_zones", 5.0).param("eps_km", "0.1");

        let batch = LogBatchRequest::new("abc", &record, 1);

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "run_id": "abc",
                "metrics": [{"key": "n_zones", "value": 5.0, "timestamp": 1, "step": 0}],
                "params": [{"key": "eps_km", "value": "0.1"}],
            })
        );
    }
}
