use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use differing_core::{RepoError, RepoService};
use differing_types::{
    CommitId, CommitRecord, DiffId, DiffSummary, FileChangeRecord, FileContentPair,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub(crate) type AppState = Arc<RepoService>;
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct RepoInfo {
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: &'static str,
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmendRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendResponse {
    pub message: &'static str,
    pub new_commit: CommitId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn diff_id(raw: &str) -> Result<DiffId, ApiError> {
    raw.parse::<DiffId>()
        .map_err(|e| ApiError::from(RepoError::from(e)))
}

pub(crate) async fn repo_info(State(service): State<AppState>) -> Json<RepoInfo> {
    Json(RepoInfo {
        path: service.root().display().to_string(),
    })
}

pub(crate) async fn list_diffs(State(service): State<AppState>) -> ApiResult<Vec<DiffSummary>> {
    Ok(Json(service.list_diffs().await?))
}

pub(crate) async fn list_files(
    State(service): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Vec<FileChangeRecord>> {
    let Path(id) = id?;
    Ok(Json(service.list_files(&diff_id(&id)?).await?))
}

pub(crate) async fn list_commits(
    State(service): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Vec<CommitRecord>> {
    let Path(id) = id?;
    Ok(Json(service.list_commits(&diff_id(&id)?).await?))
}

pub(crate) async fn file_diff(
    State(service): State<AppState>,
    params: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult<FileContentPair> {
    let Path((id, path)) = params?;
    Ok(Json(service.resolve_content(&diff_id(&id)?, &path).await?))
}

pub(crate) async fn file_save(
    State(service): State<AppState>,
    params: Result<Path<(String, String)>, PathRejection>,
    body: Result<Json<SaveRequest>, JsonRejection>,
) -> ApiResult<SaveResponse> {
    let Path((id, path)) = params?;
    // The id only scopes the URL; saving always targets the working tree.
    diff_id(&id)?;
    let Json(body) = body?;
    let outcome = service.save_file(&path, body.content).await?;
    Ok(Json(SaveResponse {
        message: "File saved successfully",
        path: outcome.path,
    }))
}

pub(crate) async fn amend_message(
    State(service): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<AmendRequest>, JsonRejection>,
) -> ApiResult<AmendResponse> {
    let Path(id) = id?;
    let target = CommitId::new(&id).map_err(|e| ApiError::from(RepoError::from(e)))?;
    let Json(body) = body?;
    let outcome = service.amend(&target, &body.message).await?;
    Ok(Json(AmendResponse {
        message: "Commit message amended successfully",
        new_commit: outcome.new_commit,
        warning: outcome.warning,
    }))
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::not_found()
}
