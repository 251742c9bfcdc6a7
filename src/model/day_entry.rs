use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// The single authoritative attendance row for one employee on one calendar
/// date. Upserts are keyed on (employee_id, entry_date); rows are never
/// deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DayEntry {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub entry_date: NaiveDate,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_in_at: Option<NaiveDateTime>,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_out_at: Option<NaiveDateTime>,

    #[schema(example = 480, nullable = true)]
    pub worked_minutes: Option<i64>,

    #[schema(example = "completed")]
    pub status: String,

    pub is_late: bool,

    /// When set, wins over the derived status on every read path.
    #[schema(example = "leave_granted", nullable = true)]
    pub manual_status: Option<String>,

    #[schema(example = 3, nullable = true)]
    pub manual_override_by: Option<u64>,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub manual_override_at: Option<NaiveDateTime>,

    #[schema(example = "on approved sick leave", nullable = true)]
    pub manual_override_reason: Option<String>,

    #[schema(example = "auto checkout", nullable = true)]
    pub modification_reason: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

/// Derived lifecycle status stored in `day_entries.status`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    NotStarted,
    InProgress,
    Completed,
    Absent,
    Holiday,
}

/// Administrator-authored display status. `Present` keeps whatever times were
/// submitted; the other three are timeless and clear the stored times.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ManualStatus {
    Present,
    Absent,
    Holiday,
    LeaveGranted,
}

impl ManualStatus {
    /// Statuses that carry no times. Submitting times alongside one of these
    /// is rejected, and the stored times are cleared when it is applied.
    pub fn is_timeless(&self) -> bool {
        !matches!(self, ManualStatus::Present)
    }
}

/// What downstream consumers (payroll, dashboards, reports) see for a day.
/// Built exclusively by [`DayEntry::effective_view`] so the override
/// precedence rule lives in exactly one place.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceView {
    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub entry_date: NaiveDate,

    #[schema(example = "completed")]
    pub status: String,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_in_at: Option<NaiveDateTime>,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub check_out_at: Option<NaiveDateTime>,

    #[schema(example = 480, nullable = true)]
    pub worked_minutes: Option<i64>,

    pub is_late: bool,

    pub overridden: bool,

    #[schema(example = "on approved sick leave", nullable = true)]
    pub override_reason: Option<String>,
}

impl DayEntry {
    pub fn derived_status(&self) -> DayStatus {
        self.status.parse().unwrap_or(DayStatus::NotStarted)
    }

    pub fn manual(&self) -> Option<ManualStatus> {
        self.manual_status.as_deref().and_then(|s| s.parse().ok())
    }

    /// Compose-at-read-time precedence rule: if a manual override is present
    /// the view is forced from it, otherwise the derived columns are shown.
    /// Derivation keeps running underneath an override; only the view freezes.
    pub fn effective_view(&self) -> AttendanceView {
        match self.manual() {
            Some(manual) if manual.is_timeless() => AttendanceView {
                employee_id: self.employee_id,
                entry_date: self.entry_date,
                status: manual.to_string(),
                check_in_at: None,
                check_out_at: None,
                worked_minutes: None,
                is_late: false,
                overridden: true,
                override_reason: self.manual_override_reason.clone(),
            },
            Some(manual) => AttendanceView {
                employee_id: self.employee_id,
                entry_date: self.entry_date,
                status: manual.to_string(),
                check_in_at: self.check_in_at,
                check_out_at: self.check_out_at,
                worked_minutes: self.worked_minutes,
                is_late: self.is_late,
                overridden: true,
                override_reason: self.manual_override_reason.clone(),
            },
            None => AttendanceView {
                employee_id: self.employee_id,
                entry_date: self.entry_date,
                status: self.status.clone(),
                check_in_at: self.check_in_at,
                check_out_at: self.check_out_at,
                worked_minutes: self.worked_minutes,
                is_late: self.is_late,
                overridden: false,
                override_reason: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry() -> DayEntry {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        DayEntry {
            id: 1,
            employee_id: 7,
            entry_date: date,
            check_in_at: date.and_hms_opt(9, 5, 0),
            check_out_at: date.and_hms_opt(17, 30, 0),
            worked_minutes: Some(505),
            status: "completed".to_string(),
            is_late: false,
            manual_status: None,
            manual_override_by: None,
            manual_override_at: None,
            manual_override_reason: None,
            modification_reason: None,
            created_at: date.and_hms_opt(9, 5, 0).unwrap(),
            updated_at: date.and_hms_opt(17, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_view_without_override_shows_derived_columns() {
        let view = entry().effective_view();
        assert_eq!(view.status, "completed");
        assert!(!view.overridden);
        assert_eq!(view.worked_minutes, Some(505));
    }

    #[test]
    fn test_timeless_override_clears_times_in_view() {
        let mut e = entry();
        e.manual_status = Some("leave_granted".to_string());
        e.manual_override_reason = Some("approved annual leave".to_string());

        let view = e.effective_view();
        assert_eq!(view.status, "leave_granted");
        assert!(view.overridden);
        assert!(view.check_in_at.is_none());
        assert!(view.check_out_at.is_none());
        assert!(view.worked_minutes.is_none());
        assert!(!view.is_late);
    }

    #[test]
    fn test_present_override_keeps_stored_times() {
        let mut e = entry();
        e.manual_status = Some("present".to_string());

        let view = e.effective_view();
        assert_eq!(view.status, "present");
        assert!(view.overridden);
        assert_eq!(view.worked_minutes, Some(505));
        assert!(view.check_in_at.is_some());
    }

    #[test]
    fn test_override_status_frozen_while_derived_columns_move() {
        let mut e = entry();
        e.manual_status = Some("absent".to_string());

        // A later punch re-derives the underlying columns.
        e.status = "in_progress".to_string();
        e.check_out_at = None;
        e.worked_minutes = None;

        let view = e.effective_view();
        assert_eq!(view.status, "absent");
    }

    #[test]
    fn test_unknown_status_string_falls_back_to_not_started() {
        let mut e = entry();
        e.status = "mystery".to_string();
        assert_eq!(e.derived_status(), DayStatus::NotStarted);
    }

    #[test]
    fn test_timeless_covers_all_but_present() {
        assert!(!ManualStatus::Present.is_timeless());
        assert!(ManualStatus::Absent.is_timeless());
        assert!(ManualStatus::Holiday.is_timeless());
        assert!(ManualStatus::LeaveGranted.is_timeless());
    }
}
