use actix_web::{web, HttpResponse, Responder};
use sqlx::MySqlPool;

use crate::engine::backfill::{backfill, preview, BackfillPreview, BackfillScope};
use crate::engine::BatchReport;

/// Backfill missing day entries as absent/holiday and reclassify stale
/// absent entries
#[utoipa::path(
    post,
    path = "/api/v1/backfill/run",
    request_body = BackfillScope,
    responses(
        (status = 200, description = "Backfill finished", body = BatchReport),
        (status = 500, description = "Internal server error")
    ),
    tag = "Backfill"
)]
pub async fn run_backfill(
    pool: web::Data<MySqlPool>,
    payload: web::Json<BackfillScope>,
) -> actix_web::Result<impl Responder> {
    let report = backfill(pool.get_ref(), &payload).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Dry-run: what a backfill over this scope would create or reclassify
#[utoipa::path(
    post,
    path = "/api/v1/backfill/preview",
    request_body = BackfillScope,
    responses(
        (status = 200, description = "Would-be creations and reclassifications", body = BackfillPreview),
        (status = 500, description = "Internal server error")
    ),
    tag = "Backfill"
)]
pub async fn preview_backfill(
    pool: web::Data<MySqlPool>,
    payload: web::Json<BackfillScope>,
) -> actix_web::Result<impl Responder> {
    let preview = preview(pool.get_ref(), &payload).await?;
    Ok(HttpResponse::Ok().json(preview))
}
