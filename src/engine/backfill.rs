//! Absence/holiday backfill.
//!
//! Two cooperating passes over a date range. Generation creates the missing
//! day entries: `absent` on configured work days, `holiday` otherwise.
//! Reclassification re-checks existing `absent` entries against the current
//! work-week configuration and flips them to `holiday` when the weekday is no
//! longer a work day. The reverse migration is deliberately absent: a
//! backfilled holiday stays a holiday until an administrator acts on it.
//! Neither pass touches entries with real attendance or a manual override.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::engine::{record_operation, BatchReport, EngineError};
use crate::model::day_entry::DayStatus;
use crate::model::operation_log::OperationKind;
use crate::model::work_week::WorkWeek;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BackfillScope {
    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(example = "2024-03-31", value_type = String, format = "date")]
    pub to: NaiveDate,
    /// Limit to these employees; all active employees when omitted.
    #[schema(nullable = true)]
    pub employee_ids: Option<Vec<u64>>,
}

impl BackfillScope {
    fn range(&self) -> (NaiveDate, NaiveDate) {
        if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        }
    }
}

/// Work day with no activity backfills as absent; a non-work day is a holiday.
pub fn classify_missing_day(date: NaiveDate, week: &WorkWeek) -> DayStatus {
    if week.is_work_day(date.weekday()) {
        DayStatus::Absent
    } else {
        DayStatus::Holiday
    }
}

fn dates_in(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = from;
    while current <= to {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

async fn scoped_employees(
    pool: &MySqlPool,
    scope: &BackfillScope,
) -> Result<Vec<u64>, EngineError> {
    match &scope.employee_ids {
        Some(ids) => Ok(ids.clone()),
        None => {
            let ids = sqlx::query_scalar::<_, u64>(
                "SELECT id FROM employees WHERE status = 'active' ORDER BY id",
            )
            .fetch_all(pool)
            .await?;
            Ok(ids)
        }
    }
}

async fn work_weeks(
    pool: &MySqlPool,
    employee_ids: &[u64],
) -> Result<HashMap<u64, WorkWeek>, EngineError> {
    let rows = sqlx::query_as::<_, WorkWeek>("SELECT * FROM work_week_configs")
        .fetch_all(pool)
        .await?;

    let mut by_employee: HashMap<u64, WorkWeek> =
        rows.into_iter().map(|w| (w.employee_id, w)).collect();

    for id in employee_ids {
        by_employee
            .entry(*id)
            .or_insert_with(|| WorkWeek::default_for(*id));
    }

    Ok(by_employee)
}

async fn existing_entries(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<HashSet<(u64, NaiveDate)>, EngineError> {
    let rows = sqlx::query_as::<_, (u64, NaiveDate)>(
        "SELECT employee_id, entry_date FROM day_entries WHERE entry_date BETWEEN ? AND ?",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BackfillPreviewItem {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "2024-03-02", value_type = String, format = "date")]
    pub entry_date: NaiveDate,
    #[schema(example = "holiday")]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BackfillPreview {
    pub would_create: Vec<BackfillPreviewItem>,
    pub would_reclassify: Vec<BackfillPreviewItem>,
}

async fn reclassify_candidates(
    pool: &MySqlPool,
    scope: &BackfillScope,
    weeks: &HashMap<u64, WorkWeek>,
) -> Result<Vec<(u64, u64, NaiveDate)>, EngineError> {
    let (from, to) = scope.range();

    let rows = sqlx::query_as::<_, (u64, u64, NaiveDate)>(
        r#"
        SELECT id, employee_id, entry_date
        FROM day_entries
        WHERE entry_date BETWEEN ? AND ?
          AND status = 'absent'
          AND manual_status IS NULL
        ORDER BY entry_date, employee_id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let scoped: Option<HashSet<u64>> = scope
        .employee_ids
        .as_ref()
        .map(|ids| ids.iter().copied().collect());

    Ok(rows
        .into_iter()
        .filter(|(_, employee_id, _)| {
            scoped
                .as_ref()
                .map(|ids| ids.contains(employee_id))
                .unwrap_or(true)
        })
        .filter(|(_, employee_id, entry_date)| {
            let week = weeks.get(employee_id);
            match week {
                Some(week) => !week.is_work_day(entry_date.weekday()),
                // No config row: default week, where absent stays absent on
                // Mon-Fri and flips on weekends.
                None => !WorkWeek::default_for(*employee_id).is_work_day(entry_date.weekday()),
            }
        })
        .collect())
}

/// Dry-run both passes without writing.
pub async fn preview(
    pool: &MySqlPool,
    scope: &BackfillScope,
) -> Result<BackfillPreview, EngineError> {
    let (from, to) = scope.range();
    let employees = scoped_employees(pool, scope).await?;
    let weeks = work_weeks(pool, &employees).await?;
    let existing = existing_entries(pool, from, to).await?;

    let mut would_create = Vec::new();
    for employee_id in &employees {
        let week = weeks
            .get(employee_id)
            .cloned()
            .unwrap_or_else(|| WorkWeek::default_for(*employee_id));
        for date in dates_in(from, to) {
            if existing.contains(&(*employee_id, date)) {
                continue;
            }
            would_create.push(BackfillPreviewItem {
                employee_id: *employee_id,
                entry_date: date,
                status: classify_missing_day(date, &week).to_string(),
            });
        }
    }

    let would_reclassify = reclassify_candidates(pool, scope, &weeks)
        .await?
        .into_iter()
        .map(|(_, employee_id, entry_date)| BackfillPreviewItem {
            employee_id,
            entry_date,
            status: DayStatus::Holiday.to_string(),
        })
        .collect();

    Ok(BackfillPreview {
        would_create,
        would_reclassify,
    })
}

/// Run generation then reclassification over the scope. Per-unit failures are
/// collected and the run continues; one operation-log row covers the run.
pub async fn backfill(
    pool: &MySqlPool,
    scope: &BackfillScope,
) -> Result<BatchReport, EngineError> {
    let (from, to) = scope.range();
    let employees = scoped_employees(pool, scope).await?;
    let weeks = work_weeks(pool, &employees).await?;
    let existing = existing_entries(pool, from, to).await?;

    let mut report = BatchReport::default();

    // Pass 1: generation. INSERT IGNORE rides the (employee, date) unique
    // key, so a row created since the snapshot is a silent no-op.
    for employee_id in &employees {
        let week = weeks
            .get(employee_id)
            .cloned()
            .unwrap_or_else(|| WorkWeek::default_for(*employee_id));

        for date in dates_in(from, to) {
            if existing.contains(&(*employee_id, date)) {
                continue;
            }

            let status = classify_missing_day(date, &week);
            let result = sqlx::query(
                "INSERT IGNORE INTO day_entries (employee_id, entry_date, status) VALUES (?, ?, ?)",
            )
            .bind(employee_id)
            .bind(date)
            .bind(status.to_string())
            .execute(pool)
            .await;

            match result {
                Ok(_) => report.record_ok(),
                Err(e) => {
                    tracing::error!(error = %e, employee_id, %date, "backfill insert failed");
                    report.record_err(format!("employee {} {}: {}", employee_id, date, e));
                }
            }
        }
    }

    // Pass 2: reclassification, absent -> holiday only. The guard repeats
    // the predicate so an entry that gained punches or an override since the
    // snapshot is left alone.
    for (id, employee_id, entry_date) in reclassify_candidates(pool, scope, &weeks).await? {
        let result = sqlx::query(
            r#"
            UPDATE day_entries
            SET status = 'holiday'
            WHERE id = ? AND status = 'absent' AND manual_status IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await;

        match result {
            Ok(_) => report.record_ok(),
            Err(e) => {
                tracing::error!(error = %e, employee_id, %entry_date, "reclassify failed");
                report.record_err(format!("employee {} {}: {}", employee_id, entry_date, e));
            }
        }
    }

    let scope_text = format!("{}..{} ({} employees)", from, to, employees.len());
    let op_uuid = record_operation(pool, OperationKind::Backfill, &scope_text, &report).await?;
    tracing::info!(
        op_uuid = %op_uuid,
        scope = %scope_text,
        attempted = report.attempted,
        failed = report.failed,
        "backfill finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturday_backfills_as_holiday() {
        let week = WorkWeek::default_for(1);
        // 2024-03-02 is a Saturday.
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(classify_missing_day(date, &week), DayStatus::Holiday);
    }

    #[test]
    fn test_tuesday_backfills_as_absent() {
        let week = WorkWeek::default_for(1);
        // 2024-03-05 is a Tuesday.
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(classify_missing_day(date, &week), DayStatus::Absent);
    }

    #[test]
    fn test_custom_week_flips_classification() {
        let mut week = WorkWeek::default_for(1);
        week.saturday = true;
        week.tuesday = false;

        let saturday = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(classify_missing_day(saturday, &week), DayStatus::Absent);
        assert_eq!(classify_missing_day(tuesday, &week), DayStatus::Holiday);
    }

    #[test]
    fn test_dates_in_is_inclusive() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let dates = dates_in(from, to);
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0], from);
        assert_eq!(dates[2], to);
    }

    #[test]
    fn test_single_day_range() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(dates_in(date, date), vec![date]);
    }
}
