// rest/routes/numa_topologies.rs — resource-provider NUMA topology routes.
//
// Request validation lives here, before the core is invoked: malformed
// bodies never reach the handlers. Status mapping:
//   policy denial → 403, missing record → 404, concurrent update → 409,
//   invalid body → 400, anything else → 500.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::policy::{AuthContext, Role};
use crate::topology::handlers::{self, NumaTopologiesView, TopologyError};
use crate::topology::model::CellMeasurement;
use crate::topology::store::StoreError;
use crate::AppContext;

type RestError = (StatusCode, Json<Value>);

// ─── Request body ─────────────────────────────────────────────────────────────

/// PUT body: at least one of the two producer lists must be present.
/// Unknown top-level fields are rejected, as are unknown fields inside each
/// cell measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PutNumaTopologiesRequest {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nova_numa_topology: Option<Vec<CellMeasurement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zun_numa_topology: Option<Vec<CellMeasurement>>,
}

fn validate_put(path_uuid: &str, body: &PutNumaTopologiesRequest) -> Result<(), String> {
    if body.uuid.is_empty() || body.uuid.len() > 255 {
        return Err("uuid must be between 1 and 255 characters".to_string());
    }
    if body.uuid != path_uuid {
        return Err("body uuid does not match the resource provider in the path".to_string());
    }
    if body.nova_numa_topology.is_none() && body.zun_numa_topology.is_none() {
        return Err(
            "at least one of nova_numa_topology or zun_numa_topology is required".to_string(),
        );
    }
    Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn auth_from_headers(ctx: &AppContext, headers: &HeaderMap) -> AuthContext {
    let role = headers
        .get("x-auth-role")
        .and_then(|v| v.to_str().ok())
        .map(Role::from_str)
        .unwrap_or_else(|| Role::from_str(&ctx.config.default_role));
    AuthContext::new(role)
}

fn bad_request(detail: String) -> RestError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": detail })))
}

fn map_error(err: TopologyError) -> RestError {
    let status = match &err {
        TopologyError::Policy(_) => StatusCode::FORBIDDEN,
        TopologyError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        TopologyError::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

// ─── GET /resource_providers/{uuid}/numa_topologies ──────────────────────────

pub async fn show(
    State(ctx): State<Arc<AppContext>>,
    Path(uuid): Path<String>,
    headers: HeaderMap,
) -> Result<Json<NumaTopologiesView>, RestError> {
    let auth = auth_from_headers(&ctx, &headers);
    let view = handlers::show_topologies(&ctx.store, &auth, &uuid)
        .await
        .map_err(map_error)?;
    Ok(Json(view))
}

// ─── PUT /resource_providers/{uuid}/numa_topologies ──────────────────────────

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    Path(uuid): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PutNumaTopologiesRequest>, RestError> {
    let request: PutNumaTopologiesRequest = serde_json::from_slice(&body)
        .map_err(|e| bad_request(format!("invalid NUMA topology payload: {e}")))?;
    validate_put(&uuid, &request).map_err(bad_request)?;

    let auth = auth_from_headers(&ctx, &headers);
    handlers::update_topologies(
        &ctx.store,
        &auth,
        &uuid,
        request.nova_numa_topology.as_deref(),
        request.zun_numa_topology.as_deref(),
    )
    .await
    .map_err(map_error)?;

    // Echo the accepted input back as the confirmation payload.
    Ok(Json(request))
}

// ─── DELETE /resource_providers/{uuid}/numa_topologies ───────────────────────

pub async fn destroy(
    State(ctx): State<Arc<AppContext>>,
    Path(uuid): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, RestError> {
    let auth = auth_from_headers(&ctx, &headers);
    handlers::delete_topologies(&ctx.store, &auth, &uuid)
        .await
        .map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
