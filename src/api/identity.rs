use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::engine::identity::{accept_mapping, resolve, ResolveOutcome};
use crate::model::identity_mapping::IdentityMapping;
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::identity_cache;

/// Columns the partial-update endpoint may touch.
const UPDATABLE_COLUMNS: &[&str] = &["external_name", "match_score", "is_active"];

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveRequest {
    #[schema(example = "E1")]
    pub external_code: String,
    #[schema(example = "John Doe")]
    pub external_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMapping {
    #[schema(example = "E1")]
    pub external_code: String,
    #[schema(example = "John Doe")]
    pub external_name: String,
    #[schema(example = 1)]
    pub employee_id: u64,
    /// Score to record; manual confirmations default to 1.0.
    #[schema(example = 0.72, nullable = true)]
    pub match_score: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MappingQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Only active mappings when true (the default).
    pub active_only: Option<bool>,
}

/// Resolve an external identity against the employee directory
///
/// Writes a mapping only when the match clears the auto-accept threshold;
/// proposals in the review band are returned without side effects.
#[utoipa::path(
    post,
    path = "/api/v1/identity/resolve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Resolution outcome", body = ResolveOutcome),
        (status = 500, description = "Internal server error")
    ),
    tag = "Identity"
)]
pub async fn resolve_identity(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<ResolveRequest>,
) -> actix_web::Result<impl Responder> {
    let policy = config.engine_policy().matching;
    let outcome = resolve(
        pool.get_ref(),
        &payload.external_code,
        &payload.external_name,
        &policy,
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Manually confirm a mapping (e.g. after a needs-review proposal)
#[utoipa::path(
    post,
    path = "/api/v1/identity/mappings",
    request_body = CreateMapping,
    responses(
        (status = 200, description = "Mapping accepted", body = Object, example = json!({
            "message": "Mapping accepted"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Identity"
)]
pub async fn create_mapping(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateMapping>,
) -> actix_web::Result<impl Responder> {
    accept_mapping(
        pool.get_ref(),
        &payload.external_code,
        &payload.external_name,
        payload.employee_id,
        payload.match_score.unwrap_or(1.0),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Mapping accepted"
    })))
}

/// List identity mappings
#[utoipa::path(
    get,
    path = "/api/v1/identity/mappings",
    params(MappingQuery),
    responses(
        (status = 200, description = "Identity mappings", body = [IdentityMapping]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Identity"
)]
pub async fn list_mappings(
    pool: web::Data<MySqlPool>,
    query: web::Query<MappingQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;
    let active_only = query.active_only.unwrap_or(true);

    let sql = if active_only {
        "SELECT * FROM identity_mappings WHERE is_active = 1 ORDER BY updated_at DESC LIMIT ? OFFSET ?"
    } else {
        "SELECT * FROM identity_mappings ORDER BY updated_at DESC LIMIT ? OFFSET ?"
    };

    let mappings = sqlx::query_as::<_, IdentityMapping>(sql)
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch identity mappings");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(mappings))
}

/// Partially update a mapping
#[utoipa::path(
    put,
    path = "/api/v1/identity/mappings/{mapping_id}",
    params(
        ("mapping_id", Path, description = "Mapping ID")
    ),
    responses(
        (status = 200, description = "Mapping updated"),
        (status = 404, description = "Mapping not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Identity"
)]
pub async fn update_mapping(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let mapping_id = path.into_inner();

    // Fetched first so the cache entry for the code can be dropped.
    let existing = sqlx::query_as::<_, IdentityMapping>(
        "SELECT * FROM identity_mappings WHERE id = ?",
    )
    .bind(mapping_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, mapping_id, "Failed to fetch identity mapping");
        ErrorInternalServerError("Database error")
    })?;

    let Some(existing) = existing else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Mapping not found"
        })));
    };

    let update = build_update_sql(
        "identity_mappings",
        &body,
        UPDATABLE_COLUMNS,
        "id",
        mapping_id,
    )?;

    execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    identity_cache::forget(&existing.external_code).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Mapping updated"
    })))
}

/// Deactivate a mapping (soft delete)
#[utoipa::path(
    delete,
    path = "/api/v1/identity/mappings/{mapping_id}",
    params(
        ("mapping_id", Path, description = "Mapping ID")
    ),
    responses(
        (status = 200, description = "Mapping deactivated"),
        (status = 404, description = "Mapping not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Identity"
)]
pub async fn deactivate_mapping(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let mapping_id = path.into_inner();

    let existing = sqlx::query_as::<_, IdentityMapping>(
        "SELECT * FROM identity_mappings WHERE id = ?",
    )
    .bind(mapping_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, mapping_id, "Failed to fetch identity mapping");
        ErrorInternalServerError("Database error")
    })?;

    let Some(existing) = existing else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Mapping not found"
        })));
    };

    sqlx::query("UPDATE identity_mappings SET is_active = 0 WHERE id = ?")
        .bind(mapping_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, mapping_id, "Failed to deactivate mapping");
            ErrorInternalServerError("Database error")
        })?;

    identity_cache::forget(&existing.external_code).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Mapping deactivated"
    })))
}
