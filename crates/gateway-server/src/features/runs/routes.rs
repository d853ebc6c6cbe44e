use crate::api::response::{ApiResponse, ErrorResponse};
use crate::engine::EngineError;
use crate::features::shared::validation::{self, ValidationError};
use crate::staging::Upload;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use gateway_common::{CommonError, RunId};
use serde::Deserialize;
use serde_json::json;

use super::{
    commands::{SubmitRunCommand, SubmitRunError},
    queries::{PollRunError, PollRunQuery},
    types::{UnknownWorkflow, Workflow},
    RunsState,
};

/// Multipart field carrying the uploaded files; may repeat.
const FILES_FIELD: &str = "files";

pub fn runs_routes() -> Router<RunsState> {
    Router::new()
        .route("/ingest/:workflow", post(submit_run))
        .route("/poll/:run_id", get(poll_run))
}

#[derive(Debug, Deserialize)]
struct PollParams {
    dag: Option<String>,
}

#[derive(Debug, Default)]
struct SubmissionForm {
    week_year: Option<String>,
    week_num: Option<String>,
    notify_email: Option<String>,
    uploads: Vec<Upload>,
}

impl SubmissionForm {
    async fn read(mut multipart: Multipart) -> Result<Self, RunsApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                FILES_FIELD => {
                    let filename = field.file_name().map(str::to_string);
                    let content = field.bytes().await?.to_vec();
                    form.uploads.push(Upload { filename, content });
                },
                "week_year" => form.week_year = Some(field.text().await?),
                "week_num" => form.week_num = Some(field.text().await?),
                "notify_email" => form.notify_email = Some(field.text().await?),
                other => tracing::debug!(field = %other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn into_command(self, workflow: Workflow) -> Result<SubmitRunCommand, ValidationError> {
        let week_year = self
            .week_year
            .ok_or(ValidationError::MissingField("week_year"))?;
        let week_num = self
            .week_num
            .ok_or(ValidationError::MissingField("week_num"))?;
        let notify_email = self
            .notify_email
            .map(|email| email.trim().to_string())
            .ok_or(ValidationError::MissingField("notify_email"))?;

        let period = validation::validate_period(
            validation::parse_integer("week_year", &week_year)?,
            validation::parse_integer("week_num", &week_num)?,
        )?;
        validation::validate_email(&notify_email)?;
        validation::validate_csv_uploads(&self.uploads)?;

        Ok(SubmitRunCommand {
            workflow,
            period,
            notify_email,
            uploads: self.uploads,
        })
    }
}

#[tracing::instrument(skip(state, multipart), fields(workflow = %workflow))]
async fn submit_run(
    State(state): State<RunsState>,
    Path(workflow): Path<String>,
    multipart: Multipart,
) -> Result<Response, RunsApiError> {
    let workflow: Workflow = workflow.parse()?;
    let command = SubmissionForm::read(multipart).await?.into_command(workflow)?;

    let response = super::commands::submit::handle(&state, command).await?;

    tracing::info!(
        run_id = %response.run_id,
        files = response.files.len(),
        "Run submitted via API"
    );

    Ok(ApiResponse::success(response).into_response())
}

#[tracing::instrument(skip(state, params), fields(run_id = %run_id))]
async fn poll_run(
    State(state): State<RunsState>,
    Path(run_id): Path<String>,
    Query(params): Query<PollParams>,
) -> Result<Response, RunsApiError> {
    let workflow: Workflow = params.dag.unwrap_or_default().parse()?;
    let run_id = RunId::parse(&run_id)?;

    let outcome = super::queries::poll::handle(&state, PollRunQuery { workflow, run_id }).await?;

    tracing::debug!(state = %outcome.state, "Run polled via API");

    Ok(ApiResponse::success(outcome).into_response())
}

#[derive(Debug)]
enum RunsApiError {
    Workflow(UnknownWorkflow),
    RunId(CommonError),
    Multipart(MultipartError),
    Validation(ValidationError),
    Submit(SubmitRunError),
    Poll(PollRunError),
}

impl From<UnknownWorkflow> for RunsApiError {
    fn from(err: UnknownWorkflow) -> Self {
        Self::Workflow(err)
    }
}

impl From<CommonError> for RunsApiError {
    fn from(err: CommonError) -> Self {
        Self::RunId(err)
    }
}

impl From<MultipartError> for RunsApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<ValidationError> for RunsApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<SubmitRunError> for RunsApiError {
    fn from(err: SubmitRunError) -> Self {
        Self::Submit(err)
    }
}

impl From<PollRunError> for RunsApiError {
    fn from(err: PollRunError) -> Self {
        Self::Poll(err)
    }
}

/// Status for a failed engine call: the engine's own status when it answered
/// and the caller is meant to see it, 502 otherwise.
fn engine_status(source: &EngineError, passthrough: bool) -> StatusCode {
    match source {
        EngineError::Request { status_code, .. } if passthrough => {
            StatusCode::from_u16(*status_code).unwrap_or(StatusCode::BAD_GATEWAY)
        },
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for RunsApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            RunsApiError::Workflow(_) => {
                ErrorResponse::new("INVALID_WORKFLOW", message).with_status(StatusCode::BAD_REQUEST)
            },
            RunsApiError::RunId(_) => {
                ErrorResponse::new("INVALID_RUN_ID", message).with_status(StatusCode::BAD_REQUEST)
            },
            RunsApiError::Multipart(e) => {
                ErrorResponse::new("INVALID_MULTIPART", message).with_status(e.status())
            },
            RunsApiError::Validation(_) => {
                ErrorResponse::new("VALIDATION_ERROR", message).with_status(StatusCode::BAD_REQUEST)
            },

            RunsApiError::Submit(SubmitRunError::Storage(_))
            | RunsApiError::Poll(PollRunError::Storage(_)) => {
                tracing::error!("Storage error on shared folder: {}", message);
                ErrorResponse::new("STORAGE_ERROR", "A storage error occurred")
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            },

            RunsApiError::Submit(SubmitRunError::Engine { ref source, .. }) => {
                let status = engine_status(source, true);
                let details = json!({ "engine_status": source.status_code() });
                ErrorResponse::with_details("ENGINE_ERROR", message, details).with_status(status)
            },
            RunsApiError::Poll(PollRunError::Engine { ref source, .. }) => {
                let status = engine_status(source, false);
                let details = json!({ "engine_status": source.status_code() });
                ErrorResponse::with_details("ENGINE_ERROR", message, details).with_status(status)
            },
            RunsApiError::Poll(PollRunError::MalformedResponse { .. }) => {
                ErrorResponse::new("MALFORMED_ENGINE_RESPONSE", message)
                    .with_status(StatusCode::BAD_GATEWAY)
            },
        }
    }
}

impl std::fmt::Display for RunsApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Workflow(e) => write!(f, "{}", e),
            Self::RunId(e) => write!(f, "{}", e),
            Self::Multipart(e) => write!(f, "Failed to read multipart form: {}", e.body_text()),
            Self::Validation(e) => write!(f, "{}", e),
            Self::Submit(e) => write!(f, "{}", e),
            Self::Poll(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::staging::StagingError;

    fn status_of(err: RunsApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_submit_engine_error_keeps_engine_status() {
        let err = RunsApiError::Submit(SubmitRunError::Engine {
            dag_id: "part1_ingestion",
            source: EngineError::Request {
                status_code: 409,
                body: "already exists".to_string(),
            },
        });
        assert_eq!(
            err.to_string(),
            "Failed to trigger workflow part1_ingestion: already exists"
        );
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_poll_engine_error_is_bad_gateway() {
        let err = RunsApiError::Poll(PollRunError::Engine {
            dag_id: "part2_qbo_export",
            run_id: RunId::parse("gw_1").unwrap(),
            source: EngineError::Request {
                status_code: 404,
                body: "not found".to_string(),
            },
        });
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(
            status_of(RunsApiError::Workflow(UnknownWorkflow("part9".to_string()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RunsApiError::Validation(ValidationError::NoFiles)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RunsApiError::RunId(CommonError::InvalidRunId("..".to_string()))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_error_is_internal() {
        let err = RunsApiError::Submit(SubmitRunError::Storage(StagingError::CreateFolder {
            path: "/shared/runs/gw_1".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
