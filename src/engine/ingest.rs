//! Provider batch ingestion.
//!
//! Drives one provider record through the whole pipeline: identity
//! resolution, normalization, ledger append, day-entry derivation. A failing
//! record is recorded and skipped; the batch always runs to the end.
//! Re-ingesting the same batch is a no-op: the ledger dedup key swallows the
//! events and the derivation upsert rewrites identical values.

use sqlx::MySqlPool;

use crate::engine::normalize::{self, ProviderPunchRecord};
use crate::engine::{derive, identity, record_operation, BatchReport, EngineError, EnginePolicy};
use crate::model::operation_log::OperationKind;

async fn ingest_one(
    pool: &MySqlPool,
    record: &ProviderPunchRecord,
    policy: &EnginePolicy,
) -> Result<(), EngineError> {
    let employee_id = identity::resolve_for_ingest(
        pool,
        &record.employee_code,
        &record.name,
        &policy.matching,
    )
    .await?;

    let punch = normalize::normalize(record)?;

    for event in normalize::to_events(record, &punch, employee_id) {
        normalize::append_event(pool, &event).await?;
    }

    derive::derive_day(
        pool,
        employee_id,
        punch.date,
        &policy.late,
        record.remark.as_deref(),
    )
    .await?;

    Ok(())
}

/// Ingest a provider batch. Returns the per-record outcome tally; the
/// invocation is written to the operation log for audit either way.
pub async fn ingest_batch(
    pool: &MySqlPool,
    records: &[ProviderPunchRecord],
    policy: &EnginePolicy,
) -> Result<BatchReport, EngineError> {
    let mut report = BatchReport::default();

    for record in records {
        match ingest_one(pool, record, policy).await {
            Ok(()) => report.record_ok(),
            Err(e) => {
                tracing::warn!(
                    employee_code = %record.employee_code,
                    date = %record.date,
                    error = %e,
                    "provider record skipped"
                );
                report.record_err(e);
            }
        }
    }

    let scope = format!("provider batch ({} records)", records.len());
    let op_uuid = record_operation(pool, OperationKind::Ingest, &scope, &report).await?;
    tracing::info!(
        op_uuid = %op_uuid,
        attempted = report.attempted,
        failed = report.failed,
        "provider ingestion finished"
    );

    Ok(report)
}
