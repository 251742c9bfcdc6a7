use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::model::operation_log::OperationLog;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct OperationQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by operation kind (ingest, auto_checkout, backfill).
    #[schema(example = "auto_checkout")]
    pub kind: Option<String>,
}

/// Recent batch invocations (sweeps, backfills, ingestions) for audit
#[utoipa::path(
    get,
    path = "/api/v1/operations",
    params(OperationQuery),
    responses(
        (status = 200, description = "Operation log rows, newest first", body = [OperationLog]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Operations"
)]
pub async fn list_operations(
    pool: web::Data<MySqlPool>,
    query: web::Query<OperationQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let rows = match &query.kind {
        Some(kind) => {
            sqlx::query_as::<_, OperationLog>(
                "SELECT * FROM operation_logs WHERE kind = ? ORDER BY id DESC LIMIT ? OFFSET ?",
            )
            .bind(kind)
            .bind(per_page as i64)
            .bind(offset as i64)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, OperationLog>(
                "SELECT * FROM operation_logs ORDER BY id DESC LIMIT ? OFFSET ?",
            )
            .bind(per_page as i64)
            .bind(offset as i64)
            .fetch_all(pool.get_ref())
            .await
        }
    }
    .map_err(|e| {
        error!(error = %e, "Failed to fetch operation logs");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}
