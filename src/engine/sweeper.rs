//! Auto-checkout sweeper.
//!
//! Closes out day entries that were checked in but never checked out, using
//! a configured default checkout time-of-day. Selection is by predicate
//! (check-in present, checkout null, status in_progress, no override), so a
//! second run over the same scope finds nothing — idempotence falls out of
//! the predicate rather than any bookkeeping.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::engine::{record_operation, BatchReport, EngineError};
use crate::model::day_entry::DayEntry;
use crate::model::operation_log::OperationKind;

/// What a sweep run covers: today, one date, or an inclusive range.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct SweepScope {
    #[schema(example = "2024-03-01", value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,
    #[schema(example = "2024-03-01", value_type = String, format = "date", nullable = true)]
    pub from: Option<NaiveDate>,
    #[schema(example = "2024-03-07", value_type = String, format = "date", nullable = true)]
    pub to: Option<NaiveDate>,
}

impl SweepScope {
    /// Collapse to an inclusive date range; `today` anchors the default.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        if let Some(date) = self.date {
            (date, date)
        } else {
            match (self.from, self.to) {
                (Some(from), Some(to)) if from <= to => (from, to),
                (Some(from), Some(to)) => (to, from),
                (Some(from), None) => (from, today.max(from)),
                (None, Some(to)) => (today.min(to), to),
                (None, None) => (today, today),
            }
        }
    }
}

/// Default checkout instant and recomputed minutes for one open entry.
pub fn auto_checkout_fields(
    entry_date: NaiveDate,
    check_in_at: NaiveDateTime,
    default_checkout: NaiveTime,
) -> (NaiveDateTime, i64) {
    let check_out_at = entry_date.and_time(default_checkout);
    let worked_minutes = (check_out_at - check_in_at).num_minutes().max(0);
    (check_out_at, worked_minutes)
}

const SELECT_OPEN: &str = r#"
    SELECT id, entry_date, check_in_at
    FROM day_entries
    WHERE entry_date BETWEEN ? AND ?
      AND check_in_at IS NOT NULL
      AND check_out_at IS NULL
      AND status = 'in_progress'
      AND manual_status IS NULL
    ORDER BY entry_date, employee_id
"#;

/// Dry-run: the entries a sweep over this scope would close, without writing.
pub async fn preview(
    pool: &MySqlPool,
    scope: &SweepScope,
) -> Result<Vec<DayEntry>, EngineError> {
    let (from, to) = scope.resolve(Local::now().date_naive());

    let entries = sqlx::query_as::<_, DayEntry>(
        r#"
        SELECT *
        FROM day_entries
        WHERE entry_date BETWEEN ? AND ?
          AND check_in_at IS NOT NULL
          AND check_out_at IS NULL
          AND status = 'in_progress'
          AND manual_status IS NULL
        ORDER BY entry_date, employee_id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Close every open entry in scope. Per-entry failures are collected and the
/// run continues; the invocation is written to the operation log either way.
pub async fn sweep(
    pool: &MySqlPool,
    scope: &SweepScope,
    default_checkout: NaiveTime,
) -> Result<BatchReport, EngineError> {
    let (from, to) = scope.resolve(Local::now().date_naive());
    let mut report = BatchReport::default();

    let open = sqlx::query_as::<_, (u64, NaiveDate, NaiveDateTime)>(SELECT_OPEN)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

    for (id, entry_date, check_in_at) in open {
        let (check_out_at, worked_minutes) =
            auto_checkout_fields(entry_date, check_in_at, default_checkout);

        // Re-guarded on check_out_at so a concurrent sweeper racing us turns
        // this into a no-op instead of a double write.
        let result = sqlx::query(
            r#"
            UPDATE day_entries
            SET check_out_at = ?,
                worked_minutes = ?,
                status = 'completed',
                modification_reason = 'auto checkout'
            WHERE id = ? AND check_out_at IS NULL
            "#,
        )
        .bind(check_out_at)
        .bind(worked_minutes)
        .bind(id)
        .execute(pool)
        .await;

        match result {
            Ok(_) => report.record_ok(),
            Err(e) => {
                tracing::error!(error = %e, entry_id = id, "auto checkout failed");
                report.record_err(format!("entry {}: {}", id, e));
            }
        }
    }

    let scope_text = format!("{}..{}", from, to);
    let op_uuid = record_operation(pool, OperationKind::AutoCheckout, &scope_text, &report).await?;
    tracing::info!(
        op_uuid = %op_uuid,
        scope = %scope_text,
        attempted = report.attempted,
        failed = report.failed,
        "auto checkout sweep finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_auto_checkout_nine_to_five() {
        let check_in = d(1).and_hms_opt(9, 0, 0).unwrap();
        let five_pm = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let (check_out, minutes) = auto_checkout_fields(d(1), check_in, five_pm);
        assert_eq!(check_out, d(1).and_hms_opt(17, 0, 0).unwrap());
        assert_eq!(minutes, 480);
    }

    #[test]
    fn test_check_in_after_default_clamps_to_zero() {
        let check_in = d(1).and_hms_opt(18, 30, 0).unwrap();
        let five_pm = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let (_, minutes) = auto_checkout_fields(d(1), check_in, five_pm);
        assert_eq!(minutes, 0);
    }

    #[test]
    fn test_scope_single_date_wins() {
        let scope = SweepScope {
            date: Some(d(5)),
            from: Some(d(1)),
            to: Some(d(10)),
        };
        assert_eq!(scope.resolve(d(20)), (d(5), d(5)));
    }

    #[test]
    fn test_scope_defaults_to_today() {
        let scope = SweepScope {
            date: None,
            from: None,
            to: None,
        };
        assert_eq!(scope.resolve(d(20)), (d(20), d(20)));
    }

    #[test]
    fn test_scope_reversed_range_is_normalized() {
        let scope = SweepScope {
            date: None,
            from: Some(d(10)),
            to: Some(d(1)),
        };
        assert_eq!(scope.resolve(d(20)), (d(1), d(10)));
    }
}
