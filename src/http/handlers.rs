//! HTTP endpoint handler for the reload trigger

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    http::{auth::BearerAuth, responses},
    pipeline::ErrorReporter,
    service::TriggerHandler,
};

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub auth: BearerAuth,
    pub trigger: TriggerHandler,
    pub errors: ErrorReporter,
}

/// /api/reload - Run the reload action for an authenticated POST
pub async fn handle_reload(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    if method != Method::POST {
        warn!(method = %method, "Rejecting reload request with unsupported method");
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    if let Err(rejection) = state.auth.authorize(&headers) {
        warn!(reason = %rejection, "Rejecting unauthenticated reload request");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    info!("Running reload action");

    // The action may block for as long as it likes; keep it off the async workers
    let trigger = state.trigger.clone();
    match tokio::task::spawn_blocking(move || trigger()).await {
        Ok(Ok(())) => {
            info!("Reload action succeeded");
            StatusCode::OK.into_response()
        }
        Ok(Err(e)) => {
            let cause = format!("{:#}", e);
            warn!(error = %cause, "Reload action failed");
            responses::trigger_failure(&state.errors)
        }
        Err(e) => {
            error!(error = %e, "Reload action panicked");
            responses::trigger_failure(&state.errors)
        }
    }
}
