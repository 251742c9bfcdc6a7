use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-employee work-week flags. A missing row means the default week
/// (Monday through Friday) applies.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct WorkWeek {
    #[schema(example = 1)]
    pub employee_id: u64,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl WorkWeek {
    pub fn default_for(employee_id: u64) -> Self {
        WorkWeek {
            employee_id,
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
            updated_at: NaiveDateTime::default(),
        }
    }

    pub fn is_work_day(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_week_is_monday_through_friday() {
        let week = WorkWeek::default_for(1);
        assert!(week.is_work_day(Weekday::Mon));
        assert!(week.is_work_day(Weekday::Fri));
        assert!(!week.is_work_day(Weekday::Sat));
        assert!(!week.is_work_day(Weekday::Sun));
    }

    #[test]
    fn test_custom_week_overrides_default() {
        let mut week = WorkWeek::default_for(1);
        week.saturday = true;
        week.monday = false;
        assert!(week.is_work_day(Weekday::Sat));
        assert!(!week.is_work_day(Weekday::Mon));
    }
}
