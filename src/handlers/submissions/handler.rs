//! Submission handler implementations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppResult, middleware::auth::AuthenticatedUser, state::AppState};

use super::{
    request::{CreateChoiceSubmissionRequest, CreateSubmissionRequest},
    response::{RefreshSubmissionResponse, SubmissionResponse},
};

/// Judge a code submission; responds once the final state is known
pub async fn create_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<(StatusCode, Json<SubmissionResponse>)> {
    payload.validate()?;

    let detail = state.submissions().submit(auth_user.id, payload).await?;

    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// Grade a multiple-choice attempt
pub async fn create_choice_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<CreateChoiceSubmissionRequest>,
) -> AppResult<(StatusCode, Json<SubmissionResponse>)> {
    payload.validate()?;

    let detail = state.submissions().submit_choice(auth_user.id, payload).await?;

    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// Get submission by ID
pub async fn get_submission(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SubmissionResponse>> {
    let detail = state.submissions().get(id).await?;
    Ok(Json(detail.into()))
}

/// Current engine result for the submission's last token
pub async fn refresh_submission(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RefreshSubmissionResponse>> {
    let refreshed = state.submissions().refresh(id).await?;
    Ok(Json(refreshed.into()))
}
