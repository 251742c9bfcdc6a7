use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Association between an external provider employee code and an internal
/// employee. At most one active mapping per external_code; rows are
/// deactivated, never deleted, while punch logs still reference the employee.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct IdentityMapping {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "E1")]
    pub external_code: String,

    #[schema(example = "John Doe")]
    pub external_name: String,

    #[schema(example = 1)]
    pub employee_id: u64,

    /// Similarity score recorded at acceptance time, in [0, 1].
    #[schema(example = 0.92)]
    pub match_score: f64,

    pub is_active: bool,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}
