//! Day-entry derivation.
//!
//! Folds the punch ledger for one (employee, date) into the authoritative
//! day entry. Selection is a min/max over the event set — earliest check-in,
//! latest check-out strictly after it — so the result is deterministic
//! regardless of the order events were inserted. Writes are an upsert on the
//! (employee_id, entry_date) unique key and touch derived columns only; the
//! manual_* columns belong to the override layer and are never written here.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::engine::late::LatePolicy;
use crate::engine::EngineError;
use crate::model::day_entry::DayStatus;
use crate::model::punch_log::EventKind;

/// The day's boundary instants as selected from the event set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DayBoundary {
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
}

/// Earliest check-in, latest check-out strictly after it. Checkouts with no
/// preceding check-in, or at/before it, are ignored.
pub fn fold_events(events: &[(NaiveDateTime, EventKind)]) -> DayBoundary {
    let check_in = events
        .iter()
        .filter(|(_, kind)| *kind == EventKind::CheckIn)
        .map(|(at, _)| *at)
        .min();

    let check_out = check_in.and_then(|check_in| {
        events
            .iter()
            .filter(|(at, kind)| *kind == EventKind::CheckOut && *at > check_in)
            .map(|(at, _)| *at)
            .max()
    });

    DayBoundary {
        check_in,
        check_out,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedDay {
    pub check_in_at: Option<NaiveDateTime>,
    pub check_out_at: Option<NaiveDateTime>,
    pub worked_minutes: Option<i64>,
    pub status: DayStatus,
    pub is_late: bool,
}

pub fn derive_fields(boundary: &DayBoundary, late: &LatePolicy) -> DerivedDay {
    let worked_minutes = match (boundary.check_in, boundary.check_out) {
        (Some(check_in), Some(check_out)) => {
            Some((check_out - check_in).num_minutes().max(0))
        }
        _ => None,
    };

    let status = match (boundary.check_in, boundary.check_out) {
        (Some(_), Some(_)) => DayStatus::Completed,
        (Some(_), None) => DayStatus::InProgress,
        _ => DayStatus::NotStarted,
    };

    let is_late = boundary
        .check_in
        .map(|check_in| late.is_late(check_in))
        .unwrap_or(false);

    DerivedDay {
        check_in_at: boundary.check_in,
        check_out_at: boundary.check_out,
        worked_minutes,
        status,
        is_late,
    }
}

async fn events_for_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Vec<(NaiveDateTime, EventKind)>, EngineError> {
    let day_start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let day_end = day_start + Duration::days(1);

    let rows = sqlx::query_as::<_, (NaiveDateTime, String)>(
        r#"
        SELECT punched_at, kind
        FROM punch_logs
        WHERE employee_id = ? AND punched_at >= ? AND punched_at < ?
        "#,
    )
    .bind(employee_id)
    .bind(day_start)
    .bind(day_end)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(at, kind)| (at, kind.parse().unwrap_or(EventKind::Unknown)))
        .collect())
}

/// Re-derive the day entry for one (employee, date).
///
/// Always runs, even when a manual override exists — the override wins at
/// the read boundary, not by skipping derivation. A `not_started` result
/// leaves an existing status (e.g. a backfilled `absent`/`holiday`) alone.
pub async fn derive_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    late: &LatePolicy,
    remark: Option<&str>,
) -> Result<DerivedDay, EngineError> {
    let events = events_for_day(pool, employee_id, date).await?;
    let derived = derive_fields(&fold_events(&events), late);

    let modification_reason = remark.map(|r| format!("provider remark: {}", r));

    sqlx::query(
        r#"
        INSERT INTO day_entries
            (employee_id, entry_date, check_in_at, check_out_at, worked_minutes, status, is_late, modification_reason)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            check_in_at = VALUES(check_in_at),
            check_out_at = VALUES(check_out_at),
            worked_minutes = VALUES(worked_minutes),
            status = IF(VALUES(status) = 'not_started', status, VALUES(status)),
            is_late = VALUES(is_late),
            modification_reason = COALESCE(VALUES(modification_reason), modification_reason)
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(derived.check_in_at)
    .bind(derived.check_out_at)
    .bind(derived.worked_minutes)
    .bind(derived.status.to_string())
    .bind(derived.is_late)
    .bind(modification_reason)
    .execute(pool)
    .await?;

    tracing::debug!(employee_id, %date, status = %derived.status, "day entry derived");
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn late_policy() -> LatePolicy {
        LatePolicy {
            workday_start: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            grace_minutes: 15,
        }
    }

    #[test]
    fn test_fold_picks_earliest_in_latest_out() {
        let events = vec![
            (at(9, 30), EventKind::CheckIn),
            (at(9, 0), EventKind::CheckIn),
            (at(12, 0), EventKind::CheckOut),
            (at(17, 0), EventKind::CheckOut),
        ];
        let boundary = fold_events(&events);
        assert_eq!(boundary.check_in, Some(at(9, 0)));
        assert_eq!(boundary.check_out, Some(at(17, 0)));
    }

    #[test]
    fn test_fold_is_order_independent() {
        let mut events = vec![
            (at(17, 0), EventKind::CheckOut),
            (at(9, 0), EventKind::CheckIn),
            (at(12, 0), EventKind::CheckOut),
            (at(9, 30), EventKind::CheckIn),
        ];
        let forward = fold_events(&events);
        events.reverse();
        assert_eq!(fold_events(&events), forward);
    }

    #[test]
    fn test_fold_ignores_checkout_at_or_before_check_in() {
        let events = vec![
            (at(9, 0), EventKind::CheckIn),
            (at(9, 0), EventKind::CheckOut),
            (at(8, 0), EventKind::CheckOut),
        ];
        let boundary = fold_events(&events);
        assert_eq!(boundary.check_in, Some(at(9, 0)));
        assert!(boundary.check_out.is_none());
    }

    #[test]
    fn test_fold_without_check_in_yields_no_boundary() {
        let events = vec![(at(17, 0), EventKind::CheckOut)];
        let boundary = fold_events(&events);
        assert!(boundary.check_in.is_none());
        assert!(boundary.check_out.is_none());
    }

    #[test]
    fn test_fold_ignores_unknown_events() {
        let events = vec![
            (at(9, 0), EventKind::Unknown),
            (at(10, 0), EventKind::CheckIn),
        ];
        assert_eq!(fold_events(&events).check_in, Some(at(10, 0)));
    }

    #[test]
    fn test_completed_day_with_minutes() {
        let boundary = DayBoundary {
            check_in: Some(at(9, 0)),
            check_out: Some(at(17, 30)),
        };
        let derived = derive_fields(&boundary, &late_policy());
        assert_eq!(derived.status, DayStatus::Completed);
        assert_eq!(derived.worked_minutes, Some(510));
        assert!(!derived.is_late);
    }

    #[test]
    fn test_open_day_is_in_progress() {
        let boundary = DayBoundary {
            check_in: Some(at(10, 50)),
            check_out: None,
        };
        let derived = derive_fields(&boundary, &late_policy());
        assert_eq!(derived.status, DayStatus::InProgress);
        assert!(derived.worked_minutes.is_none());
        assert!(derived.is_late);
    }

    #[test]
    fn test_no_events_is_not_started() {
        let derived = derive_fields(&DayBoundary::default(), &late_policy());
        assert_eq!(derived.status, DayStatus::NotStarted);
        assert!(!derived.is_late);
    }

    #[test]
    fn test_worked_minutes_clamped_at_zero() {
        // Cannot occur given the normalizer's ordering guarantee, but the
        // arithmetic must not go negative regardless.
        let boundary = DayBoundary {
            check_in: Some(at(17, 0)),
            check_out: Some(at(9, 0)),
        };
        let derived = derive_fields(&boundary, &late_policy());
        assert_eq!(derived.worked_minutes, Some(0));
    }
}
