//! Lateness policy.
//!
//! One pure function, called from every site that needs the decision. The
//! policy is "workday start plus a grace window"; a check-in is late when its
//! time of day falls strictly after the window, evaluated on the check-in's
//! own calendar day.

use chrono::{Duration, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone)]
pub struct LatePolicy {
    pub workday_start: NaiveTime,
    pub grace_minutes: i64,
}

impl LatePolicy {
    /// Latest tolerated check-in time of day.
    pub fn threshold(&self) -> NaiveTime {
        self.workday_start + Duration::minutes(self.grace_minutes)
    }

    pub fn is_late(&self, check_in: NaiveDateTime) -> bool {
        check_in.time() > self.threshold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn policy() -> LatePolicy {
        LatePolicy {
            workday_start: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            grace_minutes: 15,
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    // Shared vector: the policy used to live in two places (a remote primary
    // and a local fallback); any reimplementation must reproduce this table
    // exactly.
    const VECTORS: &[(u32, u32, bool)] = &[
        (9, 0, false),
        (10, 30, false),
        (10, 44, false),
        (10, 45, false), // threshold itself is on time
        (10, 46, true),
        (10, 50, true),
        (23, 59, true),
        (0, 0, false),
    ];

    #[test]
    fn test_late_vector_table() {
        let policy = policy();
        for &(h, m, expected) in VECTORS {
            assert_eq!(
                policy.is_late(at(h, m)),
                expected,
                "check-in {:02}:{:02}",
                h,
                m
            );
        }
    }

    #[test]
    fn test_threshold_is_start_plus_grace() {
        assert_eq!(policy().threshold(), NaiveTime::from_hms_opt(10, 45, 0).unwrap());
    }

    #[test]
    fn test_zero_grace_means_start_is_the_threshold() {
        let policy = LatePolicy {
            workday_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            grace_minutes: 0,
        };
        assert!(!policy.is_late(at(9, 0)));
        assert!(policy.is_late(at(9, 1)));
    }
}
