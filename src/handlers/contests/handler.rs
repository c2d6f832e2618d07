//! Contest handler implementations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppResult, middleware::auth::AuthenticatedUser, state::AppState};

use super::{
    request::{CreateContestChoiceRequest, CreateContestSubmissionRequest},
    response::ContestSubmissionResponse,
};

/// Judge a code submission inside a contest
pub async fn create_contest_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(contest_id): Path<Uuid>,
    Json(payload): Json<CreateContestSubmissionRequest>,
) -> AppResult<(StatusCode, Json<ContestSubmissionResponse>)> {
    payload.validate()?;

    let detail = state
        .contests()
        .submit(contest_id, auth_user.id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// Grade a multiple-choice attempt inside a contest
pub async fn create_contest_choice_submission(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(contest_id): Path<Uuid>,
    Json(payload): Json<CreateContestChoiceRequest>,
) -> AppResult<(StatusCode, Json<ContestSubmissionResponse>)> {
    payload.validate()?;

    let detail = state
        .contests()
        .submit_choice(contest_id, auth_user.id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(detail.into())))
}
