use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::engine::overrides::{apply, clear, OverrideRequest};
use crate::model::day_entry::AttendanceView;

/// Apply a manual override to a day entry
///
/// Creates the entry on the fly when missing. The override wins on every
/// read path until cleared; derivation keeps the underlying columns current.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{employee_id}/{date}/override",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("date", Path, description = "Entry date (YYYY-MM-DD)")
    ),
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Override applied; effective view returned", body = AttendanceView),
        (status = 400, description = "Invalid override (missing reason, inconsistent times)"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Override"
)]
pub async fn submit_override(
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, NaiveDate)>,
    payload: web::Json<OverrideRequest>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, date) = path.into_inner();
    let entry = apply(pool.get_ref(), employee_id, date, &payload).await?;
    Ok(HttpResponse::Ok().json(entry.effective_view()))
}

/// Clear a manual override, returning the entry to its derived view
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/{employee_id}/{date}/override",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("date", Path, description = "Entry date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Override cleared; derived view returned", body = AttendanceView),
        (status = 404, description = "No day entry for that date"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Override"
)]
pub async fn clear_override(
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, NaiveDate)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, date) = path.into_inner();
    let entry = clear(pool.get_ref(), employee_id, date).await?;
    Ok(HttpResponse::Ok().json(entry.effective_view()))
}
