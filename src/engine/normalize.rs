//! Punch normalization.
//!
//! Turns one raw provider record (locale-formatted date plus in/out
//! time-of-day strings) into zero, one, or two canonical events. The in-time
//! must parse or the whole record is rejected; the out-time only counts as a
//! real checkout when it parses and lands strictly after the in-time, which
//! guards against providers that echo the check-in into both fields while the
//! day is still open.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::engine::EngineError;
use crate::model::punch_log::{EventKind, EventSource, NewPunchEvent};
use crate::utils::punch_filter;

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Per-employee daily record as the biometric provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderPunchRecord {
    #[schema(example = "E1")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "09:05")]
    pub in_time: String,

    #[schema(example = "17:32")]
    pub out_time: String,

    #[schema(example = "08:27", nullable = true)]
    pub total_time: Option<String>,

    #[schema(example = "00:00", nullable = true)]
    pub overtime: Option<String>,

    #[schema(example = "01:00", nullable = true)]
    pub break_time: Option<String>,

    #[schema(example = "P", nullable = true)]
    pub status_code: Option<String>,

    /// Day/month/year, provider-local.
    #[schema(example = "01/03/2024")]
    pub date: String,

    #[schema(example = "device sync", nullable = true)]
    pub remark: Option<String>,

    #[schema(example = "N", nullable = true)]
    pub early_out: Option<String>,

    #[schema(example = "Y", nullable = true)]
    pub late_in: Option<String>,

    #[schema(example = "terminal-04", nullable = true)]
    pub terminal: Option<String>,
}

/// A provider record reduced to its authoritative instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPunch {
    pub date: NaiveDate,
    pub check_in: NaiveDateTime,
    /// None when the day is still open or the provider echoed/garbled the
    /// out-time. Never at or before `check_in`.
    pub check_out: Option<NaiveDateTime>,
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn malformed(record: &ProviderPunchRecord, detail: impl Into<String>) -> EngineError {
    EngineError::MalformedPunch {
        code: record.employee_code.clone(),
        date: record.date.clone(),
        detail: detail.into(),
    }
}

/// Reduce a provider record to its canonical instants.
pub fn normalize(record: &ProviderPunchRecord) -> Result<NormalizedPunch, EngineError> {
    let date = NaiveDate::parse_from_str(record.date.trim(), DATE_FORMAT)
        .map_err(|_| malformed(record, format!("unparseable date '{}'", record.date)))?;

    let in_time = parse_time(&record.in_time)
        .ok_or_else(|| malformed(record, format!("unparseable in-time '{}'", record.in_time)))?;
    let check_in = date.and_time(in_time);

    // Out-time is best-effort: anything that does not parse, or is not
    // strictly after the check-in, means the day is still open.
    let check_out = parse_time(&record.out_time)
        .map(|t| date.and_time(t))
        .filter(|out| *out > check_in);

    Ok(NormalizedPunch {
        date,
        check_in,
        check_out,
    })
}

/// Expand a normalized punch into ledger events carrying the raw record for
/// audit.
pub fn to_events(
    record: &ProviderPunchRecord,
    punch: &NormalizedPunch,
    employee_id: u64,
) -> Vec<NewPunchEvent> {
    let raw_payload = serde_json::to_string(record).ok();

    let mut events = vec![NewPunchEvent {
        employee_id,
        punched_at: punch.check_in,
        kind: EventKind::CheckIn,
        source: EventSource::Provider,
        device: record.terminal.clone(),
        raw_payload: raw_payload.clone(),
    }];

    if let Some(check_out) = punch.check_out {
        events.push(NewPunchEvent {
            employee_id,
            punched_at: check_out,
            kind: EventKind::CheckOut,
            source: EventSource::Provider,
            device: record.terminal.clone(),
            raw_payload,
        });
    }

    events
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    /// Dedup key already present; silently skipped, not an error.
    Duplicate,
}

/// Append one event to the ledger unless its dedup key is already present.
///
/// The cuckoo filter answers "definitely new" cheaply; a possible hit is
/// confirmed against the table before giving up, since the filter admits
/// false positives. A concurrent writer racing us surfaces as a duplicate-key
/// violation and is treated the same as a filter-confirmed duplicate.
pub async fn append_event(
    pool: &MySqlPool,
    event: &NewPunchEvent,
) -> Result<AppendOutcome, EngineError> {
    let key = event.dedup_key();

    if punch_filter::might_contain(&key) {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM punch_logs WHERE employee_id = ? AND punched_at = ? AND kind = ?",
        )
        .bind(event.employee_id)
        .bind(event.punched_at)
        .bind(event.kind.to_string())
        .fetch_one(pool)
        .await?;

        if existing > 0 {
            return Ok(AppendOutcome::Duplicate);
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO punch_logs (employee_id, punched_at, kind, source, device, raw_payload)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.employee_id)
    .bind(event.punched_at)
    .bind(event.kind.to_string())
    .bind(event.source.to_string())
    .bind(&event.device)
    .bind(&event.raw_payload)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            punch_filter::insert(&key);
            Ok(AppendOutcome::Inserted)
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    punch_filter::insert(&key);
                    return Ok(AppendOutcome::Duplicate);
                }
            }
            Err(EngineError::Store(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(in_time: &str, out_time: &str, date: &str) -> ProviderPunchRecord {
        ProviderPunchRecord {
            employee_code: "E1".to_string(),
            name: "John Doe".to_string(),
            in_time: in_time.to_string(),
            out_time: out_time.to_string(),
            total_time: None,
            overtime: None,
            break_time: None,
            status_code: None,
            date: date.to_string(),
            remark: None,
            early_out: None,
            late_in: None,
            terminal: Some("terminal-04".to_string()),
        }
    }

    #[test]
    fn test_full_day_yields_check_in_and_check_out() {
        let punch = normalize(&record("09:05", "17:32", "01/03/2024")).unwrap();
        assert_eq!(punch.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(punch.check_in.time(), NaiveTime::from_hms_opt(9, 5, 0).unwrap());
        assert_eq!(
            punch.check_out.unwrap().time(),
            NaiveTime::from_hms_opt(17, 32, 0).unwrap()
        );
    }

    #[test]
    fn test_echoed_out_time_is_an_open_day() {
        // Provider echoes the check-in into both fields while the day is open.
        let punch = normalize(&record("09:05", "09:05", "01/03/2024")).unwrap();
        assert!(punch.check_out.is_none());

        let events = to_events(&record("09:05", "09:05", "01/03/2024"), &punch, 7);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::CheckIn);
    }

    #[test]
    fn test_out_before_in_is_dropped() {
        let punch = normalize(&record("09:05", "08:00", "01/03/2024")).unwrap();
        assert!(punch.check_out.is_none());
    }

    #[test]
    fn test_unparseable_out_time_is_not_an_error() {
        let punch = normalize(&record("09:05", "--:--", "01/03/2024")).unwrap();
        assert!(punch.check_out.is_none());
    }

    #[test]
    fn test_unparseable_in_time_rejects_the_record() {
        let err = normalize(&record("late", "17:00", "01/03/2024")).unwrap_err();
        assert!(err.to_string().contains("E1"));
        assert!(err.to_string().contains("in-time"));
    }

    #[test]
    fn test_unparseable_date_rejects_the_record() {
        assert!(normalize(&record("09:05", "17:00", "2024-03-01")).is_err());
    }

    #[test]
    fn test_seconds_precision_accepted() {
        let punch = normalize(&record("09:05:30", "17:00:01", "01/03/2024")).unwrap();
        assert_eq!(punch.check_in.time(), NaiveTime::from_hms_opt(9, 5, 30).unwrap());
        assert!(punch.check_out.is_some());
    }

    #[test]
    fn test_events_carry_raw_payload_and_device() {
        let rec = record("09:05", "17:32", "01/03/2024");
        let punch = normalize(&rec).unwrap();
        let events = to_events(&rec, &punch, 7);
        assert_eq!(events.len(), 2);
        for event in &events {
            assert_eq!(event.employee_id, 7);
            assert_eq!(event.device.as_deref(), Some("terminal-04"));
            assert!(event.raw_payload.as_deref().unwrap().contains("\"E1\""));
        }
    }
}
