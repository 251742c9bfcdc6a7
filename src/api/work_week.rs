use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

use crate::model::work_week::WorkWeek;

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkWeekUpdate {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

/// Work-week configuration for an employee (default week when unset)
#[utoipa::path(
    get,
    path = "/api/v1/work-week/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Work-week flags", body = WorkWeek),
        (status = 500, description = "Internal server error")
    ),
    tag = "WorkWeek"
)]
pub async fn get_work_week(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let week = sqlx::query_as::<_, WorkWeek>(
        "SELECT * FROM work_week_configs WHERE employee_id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch work week");
        ErrorInternalServerError("Database error")
    })?
    .unwrap_or_else(|| WorkWeek::default_for(employee_id));

    Ok(HttpResponse::Ok().json(week))
}

/// Set the work-week configuration for an employee
///
/// Changing the week does not rewrite history by itself; run a backfill over
/// the affected range to reclassify stale absent entries.
#[utoipa::path(
    put,
    path = "/api/v1/work-week/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = WorkWeekUpdate,
    responses(
        (status = 200, description = "Work week saved"),
        (status = 500, description = "Internal server error")
    ),
    tag = "WorkWeek"
)]
pub async fn put_work_week(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<WorkWeekUpdate>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    sqlx::query(
        r#"
        INSERT INTO work_week_configs
            (employee_id, monday, tuesday, wednesday, thursday, friday, saturday, sunday)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            monday = VALUES(monday),
            tuesday = VALUES(tuesday),
            wednesday = VALUES(wednesday),
            thursday = VALUES(thursday),
            friday = VALUES(friday),
            saturday = VALUES(saturday),
            sunday = VALUES(sunday)
        "#,
    )
    .bind(employee_id)
    .bind(payload.monday)
    .bind(payload.tuesday)
    .bind(payload.wednesday)
    .bind(payload.thursday)
    .bind(payload.friday)
    .bind(payload.saturday)
    .bind(payload.sunday)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to save work week");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Work week saved"
    })))
}
