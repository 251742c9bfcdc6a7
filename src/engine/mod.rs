pub mod backfill;
pub mod derive;
pub mod identity;
pub mod ingest;
pub mod late;
pub mod normalize;
pub mod overrides;
pub mod sweeper;

use actix_web::HttpResponse;
use derive_more::Display;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::operation_log::OperationKind;

pub use identity::MatchPolicy;
pub use late::LatePolicy;

/// Policy knobs the engine runs under, assembled from `Config` at startup.
#[derive(Debug, Clone)]
pub struct EnginePolicy {
    pub late: LatePolicy,
    pub auto_checkout: chrono::NaiveTime,
    pub matching: MatchPolicy,
}

#[derive(Debug, Display)]
pub enum EngineError {
    #[display(fmt = "no matching employee for provider code {} ({})", code, name)]
    UnresolvedIdentity { code: String, name: String },

    #[display(fmt = "malformed punch for {} on {}: {}", code, date, detail)]
    MalformedPunch {
        code: String,
        date: String,
        detail: String,
    },

    #[display(fmt = "invalid override: {}", _0)]
    InvalidOverride(String),

    #[display(fmt = "{} not found", _0)]
    NotFound(String),

    #[display(fmt = "database error: {}", _0)]
    Store(sqlx::Error),
}

impl std::error::Error for EngineError {}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::Store(e)
    }
}

impl actix_web::ResponseError for EngineError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            EngineError::UnresolvedIdentity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::MalformedPunch { .. } | EngineError::InvalidOverride(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Never leak driver details to the caller.
            EngineError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "message": message }))
    }
}

/// Outcome of a batch operation. Batches never abort on one record's
/// failure; they accumulate errors and report partial success.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct BatchReport {
    #[schema(example = 12)]
    pub attempted: u64,
    #[schema(example = 11)]
    pub succeeded: u64,
    #[schema(example = 1)]
    pub failed: u64,
    #[schema(example = json!(["no matching employee for provider code E9 (Jane Roe)"]))]
    pub errors: Vec<String>,
}

impl BatchReport {
    pub fn record_ok(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_err(&mut self, error: impl std::fmt::Display) {
        self.attempted += 1;
        self.failed += 1;
        self.errors.push(error.to_string());
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Persist one operation-log row for a batch invocation. Scheduled runs have
/// no interactive caller, so this is their audit trail.
pub async fn record_operation(
    pool: &MySqlPool,
    kind: OperationKind,
    scope: &str,
    report: &BatchReport,
) -> Result<String, EngineError> {
    let op_uuid = Uuid::new_v4().to_string();
    let errors = if report.errors.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&report.errors).unwrap_or_default())
    };

    sqlx::query(
        r#"
        INSERT INTO operation_logs
            (op_uuid, kind, scope, success, records_attempted, records_succeeded, records_failed, errors)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&op_uuid)
    .bind(kind.to_string())
    .bind(scope)
    .bind(report.is_success())
    .bind(report.attempted as i64)
    .bind(report.succeeded as i64)
    .bind(report.failed as i64)
    .bind(errors)
    .execute(pool)
    .await?;

    Ok(op_uuid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report_counts() {
        let mut report = BatchReport::default();
        report.record_ok();
        report.record_ok();
        report.record_err("boom");
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors, vec!["boom".to_string()]);
        assert!(!report.is_success());
    }

    #[test]
    fn test_empty_report_is_success() {
        assert!(BatchReport::default().is_success());
    }
}
