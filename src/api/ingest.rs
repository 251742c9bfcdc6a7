use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::config::Config;
use crate::engine::ingest::ingest_batch;
use crate::engine::normalize::ProviderPunchRecord;
use crate::engine::BatchReport;

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    pub records: Vec<ProviderPunchRecord>,
}

/// Ingest a batch of provider punch records
///
/// Safe to retry: already-seen punches are deduplicated, not re-applied.
#[utoipa::path(
    post,
    path = "/api/v1/punches/ingest",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Batch processed (possibly with per-record errors)", body = BatchReport),
        (status = 500, description = "Internal server error")
    ),
    tag = "Ingestion"
)]
pub async fn ingest_punches(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<IngestRequest>,
) -> actix_web::Result<impl Responder> {
    let policy = config.engine_policy();
    let report = ingest_batch(pool.get_ref(), &payload.records, &policy).await?;
    Ok(HttpResponse::Ok().json(report))
}
