//! HTTP client for the Airflow stable REST API
//!
//! One instance is built at startup and shared by every request; the inner
//! `reqwest::Client` pools connections to the engine.

use async_trait::async_trait;
use gateway_common::RunId;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{DagRunAck, EngineError, RunStatusSnapshot, SubmissionRequest, WorkflowEngine};
use crate::config::EngineConfig;

/// Airflow REST API client
#[derive(Debug, Clone)]
pub struct AirflowClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl AirflowClient {
    /// Build a client with the configured base address, credentials and timeout
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn dag_runs_url(&self, dag_id: &str) -> String {
        format!("{}/dags/{}/dagRuns", self.base_url, dag_id)
    }

    /// Turn a response into JSON, mapping non-2xx to `EngineError::Request`.
    async fn read_json(response: Response) -> Result<Value, EngineError> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable response body: {e}>"));
            return Err(EngineError::Request {
                status_code: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| EngineError::Decode(e.to_string()))
    }
}

#[async_trait]
impl WorkflowEngine for AirflowClient {
    #[instrument(skip(self, request), fields(run_id = %request.dag_run_id))]
    async fn submit_run(
        &self,
        workflow: &str,
        request: &SubmissionRequest,
    ) -> Result<DagRunAck, EngineError> {
        let response = self
            .client
            .post(self.dag_runs_url(workflow))
            .basic_auth(&self.username, Some(&self.password))
            .json(request)
            .send()
            .await?;

        let ack = DagRunAck::from(Self::read_json(response).await?);
        debug!(state = ?ack.state, "Engine accepted run");
        Ok(ack)
    }

    #[instrument(skip(self))]
    async fn get_run_status(
        &self,
        workflow: &str,
        run_id: &RunId,
    ) -> Result<RunStatusSnapshot, EngineError> {
        let url = format!("{}/{}", self.dag_runs_url(workflow), run_id);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let snapshot = RunStatusSnapshot::from(Self::read_json(response).await?);
        debug!(state = %snapshot.state, "Fetched run status");
        Ok(snapshot)
    }
}
