use crate::errors::AppError;
use crate::identity::bearer_token;
use crate::models::{ChallengeView, IdentityResponse, SignInRequest, SignInResponse, TaskState};
use crate::state::AppState;
use crate::status::local_today;
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Html,
};

pub async fn index() -> Html<String> {
    Html(render_index())
}

pub async fn get_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChallengeView>, AppError> {
    let session = state.session_for(&headers).await?;
    Ok(Json(session.view(local_today()).await))
}

pub async fn open_day(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> Result<Json<ChallengeView>, AppError> {
    let session = state.session_for(&headers).await?;
    Ok(Json(session.open_day(index, local_today()).await?))
}

pub async fn close_dialog(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChallengeView>, AppError> {
    let session = state.session_for(&headers).await?;
    Ok(Json(session.close_dialog(local_today()).await))
}

pub async fn save_dialog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(tasks): Json<TaskState>,
) -> Result<Json<ChallengeView>, AppError> {
    let session = state.session_for(&headers).await?;
    Ok(Json(session.save_selected(tasks, local_today()).await?))
}

pub async fn reset_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChallengeView>, AppError> {
    let session = state.session_for(&headers).await?;
    Ok(Json(session.reset(local_today()).await))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let (token, grant) = state.identity.sign_in(&payload.user_id).await?;
    Ok(Json(SignInResponse {
        token,
        user_id: grant.user.to_string(),
        expires_at: grant.expires_at.to_rfc3339(),
    }))
}

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers).ok_or_else(|| AppError::unauthorized("not signed in"))?;
    state.end_session(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn whoami(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<IdentityResponse>, AppError> {
    let user_id = match bearer_token(&headers) {
        Some(token) => Some(
            state
                .identity
                .resolve(token)
                .await
                .ok_or_else(|| AppError::unauthorized("unknown or expired token"))?
                .to_string(),
        ),
        None => None,
    };
    Ok(Json(IdentityResponse { user_id }))
}
