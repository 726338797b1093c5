use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/challenge", get(handlers::get_challenge))
        .route("/api/days/:index/open", post(handlers::open_day))
        .route("/api/dialog/close", post(handlers::close_dialog))
        .route("/api/dialog/save", post(handlers::save_dialog))
        .route("/api/reset", post(handlers::reset_challenge))
        .route("/api/auth/sign-in", post(handlers::sign_in))
        .route("/api/auth/sign-out", post(handlers::sign_out))
        .route("/api/auth/me", get(handlers::whoami))
        .with_state(state)
}
