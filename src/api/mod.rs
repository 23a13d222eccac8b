use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::inference::context::RequestContext;
use crate::inference::service::Structurer;

pub mod handler;

#[derive(Clone)]
pub struct AppState {
    pub structurer: Arc<dyn Structurer>,
    /// Deadline shared by all backend attempts of one request, `None` disables it
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(structurer: Arc<dyn Structurer>, request_timeout: Option<Duration>) -> Self {
        Self {
            structurer,
            request_timeout,
        }
    }

    pub(crate) fn request_context(&self) -> RequestContext {
        match self.request_timeout {
            Some(timeout) => RequestContext::new().with_timeout(timeout),
            None => RequestContext::new(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // raw_text has no length cap
        .route(
            "/structure",
            post(handler::structure_text).layer(DefaultBodyLimit::disable()),
        )
        .route("/health", get(handler::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
