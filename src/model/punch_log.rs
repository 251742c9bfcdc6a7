use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// One normalized punch for one employee. Immutable once written;
/// (employee_id, punched_at, kind) is the dedup key.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PunchLog {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(value_type = String, format = "date-time")]
    pub punched_at: NaiveDateTime,

    #[schema(example = "check_in")]
    pub kind: String,

    #[schema(example = "provider")]
    pub source: String,

    #[schema(example = "terminal-04", nullable = true)]
    pub device: Option<String>,

    /// Raw provider record as received, kept for audit only.
    #[schema(nullable = true)]
    pub raw_payload: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CheckIn,
    CheckOut,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Provider,
    Manual,
}

/// A canonical event ready to be appended to the ledger.
#[derive(Debug, Clone)]
pub struct NewPunchEvent {
    pub employee_id: u64,
    pub punched_at: NaiveDateTime,
    pub kind: EventKind,
    pub source: EventSource,
    pub device: Option<String>,
    pub raw_payload: Option<String>,
}

impl NewPunchEvent {
    /// Key used by both the cuckoo pre-filter and the DB unique index.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}|{}", self.employee_id, self.punched_at, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_event_kind_round_trips_as_snake_case() {
        assert_eq!(EventKind::CheckIn.to_string(), "check_in");
        assert_eq!("check_out".parse::<EventKind>().unwrap(), EventKind::CheckOut);
        assert!("CHECKIN".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_dedup_key_distinguishes_kind() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mk = |kind| NewPunchEvent {
            employee_id: 7,
            punched_at: at,
            kind,
            source: EventSource::Provider,
            device: None,
            raw_payload: None,
        };
        assert_ne!(
            mk(EventKind::CheckIn).dedup_key(),
            mk(EventKind::CheckOut).dedup_key()
        );
    }
}
