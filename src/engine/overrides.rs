//! Manual override layer.
//!
//! Administrator corrections that freeze a day's displayed status
//! independently of derivation. Validation happens synchronously at
//! submission; an invalid request writes nothing. The audit triple
//! (who/when/why) is always recorded, and clearing an override returns the
//! entry to the derived view without touching derived columns.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::engine::EngineError;
use crate::model::day_entry::{DayEntry, ManualStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OverrideRequest {
    #[schema(example = "leave_granted")]
    pub status: ManualStatus,

    #[schema(example = "approved annual leave")]
    pub reason: String,

    /// Admin user applying the override.
    #[schema(example = 3)]
    pub overridden_by: u64,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_in_at: Option<NaiveDateTime>,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_out_at: Option<NaiveDateTime>,
}

/// Reject inconsistent submissions before anything is written.
pub fn validate(request: &OverrideRequest) -> Result<(), EngineError> {
    if request.reason.trim().is_empty() {
        return Err(EngineError::InvalidOverride(
            "a reason is required".to_string(),
        ));
    }

    if request.status.is_timeless()
        && (request.check_in_at.is_some() || request.check_out_at.is_some())
    {
        return Err(EngineError::InvalidOverride(format!(
            "status '{}' does not carry times",
            request.status
        )));
    }

    if let (Some(check_in), Some(check_out)) = (request.check_in_at, request.check_out_at) {
        if check_out <= check_in {
            return Err(EngineError::InvalidOverride(
                "check-out must be after check-in".to_string(),
            ));
        }
    }

    if request.check_in_at.is_none() && request.check_out_at.is_some() {
        return Err(EngineError::InvalidOverride(
            "check-out without check-in".to_string(),
        ));
    }

    Ok(())
}

pub async fn fetch_entry(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<DayEntry>, EngineError> {
    let entry = sqlx::query_as::<_, DayEntry>(
        "SELECT * FROM day_entries WHERE employee_id = ? AND entry_date = ?",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

/// Apply an override, creating the day entry on the fly when missing.
///
/// Timeless statuses clear the stored times; `present` stores the submitted
/// times as-is (no re-derivation) and leaves unsubmitted fields alone.
pub async fn apply(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    request: &OverrideRequest,
) -> Result<DayEntry, EngineError> {
    validate(request)?;

    if request.status.is_timeless() {
        sqlx::query(
            r#"
            INSERT INTO day_entries
                (employee_id, entry_date, status, manual_status, manual_override_by,
                 manual_override_at, manual_override_reason)
            VALUES (?, ?, 'not_started', ?, ?, NOW(), ?)
            ON DUPLICATE KEY UPDATE
                check_in_at = NULL,
                check_out_at = NULL,
                worked_minutes = NULL,
                manual_status = VALUES(manual_status),
                manual_override_by = VALUES(manual_override_by),
                manual_override_at = NOW(),
                manual_override_reason = VALUES(manual_override_reason)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(request.status.to_string())
        .bind(request.overridden_by)
        .bind(request.reason.trim())
        .execute(pool)
        .await?;
    } else {
        let worked_minutes = match (request.check_in_at, request.check_out_at) {
            (Some(check_in), Some(check_out)) => Some((check_out - check_in).num_minutes().max(0)),
            _ => None,
        };

        sqlx::query(
            r#"
            INSERT INTO day_entries
                (employee_id, entry_date, status, check_in_at, check_out_at, worked_minutes,
                 manual_status, manual_override_by, manual_override_at, manual_override_reason)
            VALUES (?, ?, 'not_started', ?, ?, ?, ?, ?, NOW(), ?)
            ON DUPLICATE KEY UPDATE
                check_in_at = COALESCE(VALUES(check_in_at), check_in_at),
                check_out_at = COALESCE(VALUES(check_out_at), check_out_at),
                worked_minutes = COALESCE(VALUES(worked_minutes), worked_minutes),
                manual_status = VALUES(manual_status),
                manual_override_by = VALUES(manual_override_by),
                manual_override_at = NOW(),
                manual_override_reason = VALUES(manual_override_reason)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(request.check_in_at)
        .bind(request.check_out_at)
        .bind(worked_minutes)
        .bind(request.status.to_string())
        .bind(request.overridden_by)
        .bind(request.reason.trim())
        .execute(pool)
        .await?;
    }

    tracing::info!(
        employee_id,
        %date,
        status = %request.status,
        by = request.overridden_by,
        "manual override applied"
    );

    fetch_entry(pool, employee_id, date)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("day entry {} {}", employee_id, date)))
}

/// Clear an override; derived columns are left exactly as derivation last
/// wrote them.
pub async fn clear(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<DayEntry, EngineError> {
    let result = sqlx::query(
        r#"
        UPDATE day_entries
        SET manual_status = NULL,
            manual_override_by = NULL,
            manual_override_at = NULL,
            manual_override_reason = NULL
        WHERE employee_id = ? AND entry_date = ?
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(EngineError::NotFound(format!(
            "day entry {} {}",
            employee_id, date
        )));
    }

    tracing::info!(employee_id, %date, "manual override cleared");

    fetch_entry(pool, employee_id, date)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("day entry {} {}", employee_id, date)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: ManualStatus) -> OverrideRequest {
        OverrideRequest {
            status,
            reason: "approved leave".to_string(),
            overridden_by: 3,
            check_in_at: None,
            check_out_at: None,
        }
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_reason_is_required() {
        let mut req = request(ManualStatus::Absent);
        req.reason = "   ".to_string();
        assert!(validate(&req).is_err());
    }

    #[test]
    fn test_timeless_status_rejects_times() {
        for status in [
            ManualStatus::Absent,
            ManualStatus::Holiday,
            ManualStatus::LeaveGranted,
        ] {
            let mut req = request(status);
            req.check_in_at = Some(at(9));
            assert!(validate(&req).is_err(), "{} accepted a time", status);
        }
    }

    #[test]
    fn test_present_with_times_must_be_ordered() {
        let mut req = request(ManualStatus::Present);
        req.check_in_at = Some(at(17));
        req.check_out_at = Some(at(9));
        assert!(validate(&req).is_err());

        req.check_in_at = Some(at(9));
        req.check_out_at = Some(at(17));
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn test_present_without_times_is_valid() {
        assert!(validate(&request(ManualStatus::Present)).is_ok());
    }

    #[test]
    fn test_checkout_alone_is_rejected() {
        let mut req = request(ManualStatus::Present);
        req.check_out_at = Some(at(17));
        assert!(validate(&req).is_err());
    }
}
