// Session gate for routes that `auth.require_login` protects.
use super::error::ApiError;
use super::{cookie_header, ApiState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub async fn require_session(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.require_login {
        let user = state
            .auth
            .as_ref()
            .and_then(|auth| auth.current_user(cookie_header(request.headers())));
        if user.is_none() {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}
