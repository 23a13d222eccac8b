use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::AppState;
use crate::bail_api;
use crate::error::ApiResult;
use crate::models::structure::{StructureRequest, StructureResponse};

/// The body is decoded by hand so that a missing or wrong content type is not rejected.
#[axum_macros::debug_handler]
pub(crate) async fn structure_text(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<(StatusCode, Json<StructureResponse>)> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => bail_api!(rejection.status(), rejection.body_text()),
    };
    let request: StructureRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, "Rejected request body");
            bail_api!(StatusCode::BAD_REQUEST, "invalid request body")
        }
    };
    if let Err(err) = request.validate() {
        bail_api!(StatusCode::BAD_REQUEST, err.to_string())
    }

    let ctx = state.request_context();
    // Cancels the context when the client goes away and this future is dropped
    let _cancel_on_drop = ctx.token().clone().drop_guard();

    let response = state.structurer.structure(&ctx, request).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
