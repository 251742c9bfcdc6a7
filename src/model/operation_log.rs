use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Audit row written for every sweep/backfill/ingest invocation.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OperationLog {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "7f8f2a4e-4bb1-4fd0-9f5e-0c1d9f6a2b3c")]
    pub op_uuid: String,

    #[schema(example = "auto_checkout")]
    pub kind: String,

    #[schema(example = "2024-03-01..2024-03-01")]
    pub scope: String,

    pub success: bool,

    #[schema(example = 12)]
    pub records_attempted: i64,

    #[schema(example = 11)]
    pub records_succeeded: i64,

    #[schema(example = 1)]
    pub records_failed: i64,

    /// Human-readable error list, serialized as a JSON array.
    #[schema(nullable = true)]
    pub errors: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Ingest,
    AutoCheckout,
    Backfill,
}
