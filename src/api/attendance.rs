use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

use crate::engine::overrides::fetch_entry;
use crate::model::day_entry::{AttendanceView, DayEntry};
use crate::model::punch_log::PunchLog;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[schema(example = 1)]
    pub employee_id: Option<u64>,
    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(example = "2024-03-31", value_type = String, format = "date")]
    pub to: Option<NaiveDate>,
    /// Filter on the derived status column (overrides still win in the view).
    #[schema(example = "completed")]
    pub status: Option<String>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
    Str(String),
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceView>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// List day entries as their effective (override-aware) views
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance views", body = AttendanceListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();

    if let Some(employee_id) = query.employee_id {
        conditions.push("employee_id = ?");
        bindings.push(FilterValue::U64(employee_id));
    }

    if let Some(from) = query.from {
        conditions.push("entry_date >= ?");
        bindings.push(FilterValue::Date(from));
    }

    if let Some(to) = query.to {
        conditions.push("entry_date <= ?");
        bindings.push(FilterValue::Date(to));
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(FilterValue::Str(status.clone()));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM day_entries {}", where_clause);
    debug!(sql = %count_sql, "Counting day entries");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            FilterValue::U64(v) => count_query.bind(*v),
            FilterValue::Date(v) => count_query.bind(*v),
            FilterValue::Str(v) => count_query.bind(v.clone()),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count day entries");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM day_entries {} ORDER BY entry_date DESC, employee_id LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching day entries");

    let mut data_query = sqlx::query_as::<_, DayEntry>(&data_sql);
    for b in &bindings {
        data_query = match b {
            FilterValue::U64(v) => data_query.bind(*v),
            FilterValue::Date(v) => data_query.bind(*v),
            FilterValue::Str(v) => data_query.bind(v.clone()),
        };
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let entries = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch day entries");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: entries.iter().map(DayEntry::effective_view).collect(),
        page,
        per_page,
        total,
    }))
}

/// Effective view for one employee on one date
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{employee_id}/{date}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("date", Path, description = "Entry date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Effective attendance view", body = AttendanceView),
        (status = 404, description = "No day entry for that date"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn get_attendance_day(
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, NaiveDate)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, date) = path.into_inner();

    let entry = fetch_entry(pool.get_ref(), employee_id, date).await?;

    match entry {
        Some(entry) => Ok(HttpResponse::Ok().json(entry.effective_view())),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "No day entry for that employee/date"
        }))),
    }
}

/// Raw ledger events behind a day entry, for audit
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{employee_id}/{date}/punches",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("date", Path, description = "Entry date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Canonical events for that day", body = [PunchLog]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_day_punches(
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, NaiveDate)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, date) = path.into_inner();
    let day_start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let day_end = day_start + chrono::Duration::days(1);

    let punches = sqlx::query_as::<_, PunchLog>(
        r#"
        SELECT *
        FROM punch_logs
        WHERE employee_id = ? AND punched_at >= ? AND punched_at < ?
        ORDER BY punched_at
        "#,
    )
    .bind(employee_id)
    .bind(day_start)
    .bind(day_end)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, %date, "Failed to fetch punches");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(punches))
}
