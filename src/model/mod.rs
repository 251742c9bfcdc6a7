pub mod day_entry;
pub mod employee;
pub mod identity_mapping;
pub mod operation_log;
pub mod punch_log;
pub mod work_week;
