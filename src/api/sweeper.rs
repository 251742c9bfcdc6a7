use actix_web::{web, HttpResponse, Responder};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::config::Config;
use crate::engine::sweeper::{preview, sweep, SweepScope};
use crate::engine::BatchReport;
use crate::model::day_entry::{AttendanceView, DayEntry};

#[derive(serde::Serialize, ToSchema)]
pub struct SweepPreviewResponse {
    #[schema(example = 3)]
    pub count: usize,
    pub entries: Vec<AttendanceView>,
}

/// Close out open day entries with the default checkout time
///
/// Idempotent: a second run over the same scope affects zero records.
#[utoipa::path(
    post,
    path = "/api/v1/sweeper/run",
    request_body = SweepScope,
    responses(
        (status = 200, description = "Sweep finished", body = BatchReport),
        (status = 500, description = "Internal server error")
    ),
    tag = "Sweeper"
)]
pub async fn run_sweep(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<SweepScope>,
) -> actix_web::Result<impl Responder> {
    let report = sweep(pool.get_ref(), &payload, config.auto_checkout_time).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Dry-run: list the entries a sweep over this scope would close
#[utoipa::path(
    get,
    path = "/api/v1/sweeper/preview",
    params(
        ("date" = Option<String>, Query, description = "Single date (YYYY-MM-DD)"),
        ("from" = Option<String>, Query, description = "Range start (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Range end (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Entries an immediate sweep would touch", body = SweepPreviewResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Sweeper"
)]
pub async fn preview_sweep(
    pool: web::Data<MySqlPool>,
    query: web::Query<SweepScope>,
) -> actix_web::Result<impl Responder> {
    let entries = preview(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(SweepPreviewResponse {
        count: entries.len(),
        entries: entries.iter().map(DayEntry::effective_view).collect(),
    }))
}
