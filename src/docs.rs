use crate::api::attendance::{AttendanceListResponse, AttendanceQuery};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::identity::{CreateMapping, MappingQuery, ResolveRequest};
use crate::api::ingest::IngestRequest;
use crate::api::operations::OperationQuery;
use crate::api::sweeper::SweepPreviewResponse;
use crate::api::work_week::WorkWeekUpdate;
use crate::engine::backfill::{BackfillPreview, BackfillPreviewItem, BackfillScope};
use crate::engine::identity::{MatchCandidate, MatchDecision, ResolveOutcome};
use crate::engine::normalize::ProviderPunchRecord;
use crate::engine::overrides::OverrideRequest;
use crate::engine::sweeper::SweepScope;
use crate::engine::BatchReport;
use crate::model::day_entry::{AttendanceView, DayEntry, DayStatus, ManualStatus};
use crate::model::employee::Employee;
use crate::model::identity_mapping::IdentityMapping;
use crate::model::operation_log::OperationLog;
use crate::model::punch_log::{EventKind, EventSource, PunchLog};
use crate::model::work_week::WorkWeek;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Worktrack Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance Reconciliation Service

This API folds raw biometric punches into one authoritative attendance
record per employee per day.

### Key Features
- **Provider Ingestion**
  - Normalize daily punch records, deduplicate, and derive day entries
- **Identity Resolution**
  - Map provider employee codes to internal employees with fuzzy matching
- **Auto Checkout**
  - Close forgotten open days with a configured default checkout time
- **Absence/Holiday Backfill**
  - Fill silent days per each employee's work-week configuration
- **Manual Overrides**
  - Admin corrections that win over derived data until cleared

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
- Batch operations report attempted/succeeded/failed counts plus errors

### Usage
Use this API to build:
- Attendance dashboards
- Payroll inputs
- HR reporting

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::ingest::ingest_punches,

        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance_day,
        crate::api::attendance::list_day_punches,

        crate::api::overrides::submit_override,
        crate::api::overrides::clear_override,

        crate::api::sweeper::run_sweep,
        crate::api::sweeper::preview_sweep,

        crate::api::backfill::run_backfill,
        crate::api::backfill::preview_backfill,

        crate::api::identity::resolve_identity,
        crate::api::identity::create_mapping,
        crate::api::identity::list_mappings,
        crate::api::identity::update_mapping,
        crate::api::identity::deactivate_mapping,

        crate::api::work_week::get_work_week,
        crate::api::work_week::put_work_week,

        crate::api::operations::list_operations,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee
    ),
    components(
        schemas(
            IngestRequest,
            ProviderPunchRecord,
            BatchReport,
            AttendanceQuery,
            AttendanceListResponse,
            AttendanceView,
            DayEntry,
            DayStatus,
            ManualStatus,
            OverrideRequest,
            SweepScope,
            SweepPreviewResponse,
            BackfillScope,
            BackfillPreview,
            BackfillPreviewItem,
            ResolveRequest,
            ResolveOutcome,
            MatchDecision,
            MatchCandidate,
            CreateMapping,
            MappingQuery,
            IdentityMapping,
            WorkWeek,
            WorkWeekUpdate,
            OperationQuery,
            OperationLog,
            PunchLog,
            EventKind,
            EventSource,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            Employee
        )
    ),
    tags(
        (name = "Ingestion", description = "Provider punch ingestion"),
        (name = "Attendance", description = "Day entry views"),
        (name = "Override", description = "Manual override APIs"),
        (name = "Sweeper", description = "Auto-checkout batch APIs"),
        (name = "Backfill", description = "Absence/holiday backfill APIs"),
        (name = "Identity", description = "Identity mapping APIs"),
        (name = "WorkWeek", description = "Work-week configuration APIs"),
        (name = "Operations", description = "Batch operation audit log"),
        (name = "Employee", description = "Employee directory APIs"),
    )
)]
pub struct ApiDoc;
