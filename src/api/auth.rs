use super::error::ApiError;
use super::{cookie_header, ApiState};
use crate::auth::session::{expired_session_cookie, session_cookie};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};

const LOGIN_FAILED_REDIRECT: &str = "/login";

pub async fn login(State(state): State<Arc<ApiState>>) -> Response {
    let Some(auth) = state.auth.as_ref() else {
        return ApiError::NotConfigured("GitHub login").into_response();
    };
    match auth.begin_login() {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            error!("Failed to start GitHub login: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

pub async fn callback(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(auth) = state.auth.as_ref() else {
        return ApiError::NotConfigured("GitHub login").into_response();
    };

    let (Some(code), Some(oauth_state)) = (params.code, params.state) else {
        warn!(
            "GitHub callback without code/state (error: {:?})",
            params.error
        );
        return Redirect::to(LOGIN_FAILED_REDIRECT).into_response();
    };

    match auth.complete_login(&code, &oauth_state).await {
        Ok((_user, cookie)) => (
            [(header::SET_COOKIE, session_cookie(&cookie))],
            Redirect::to("/"),
        )
            .into_response(),
        Err(e) => {
            warn!("GitHub login failed: {}", e);
            Redirect::to(LOGIN_FAILED_REDIRECT).into_response()
        }
    }
}

pub async fn logout(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if let Some(auth) = state.auth.as_ref() {
        auth.logout(cookie_header(&headers));
    }
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn me(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    let user = state
        .auth
        .as_ref()
        .and_then(|auth| auth.current_user(cookie_header(&headers)));
    match user {
        Some(user) => Json(user).into_response(),
        None => ApiError::Unauthorized.into_response(),
    }
}
