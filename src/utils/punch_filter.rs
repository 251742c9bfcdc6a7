use anyhow::{anyhow, Result};
use autoscale_cuckoo_filter::CuckooFilter;
use chrono::NaiveDateTime;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on punch volume and retention.
const FILTER_CAPACITY: usize = 1_000_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Membership filter over punch dedup keys (employee|instant|kind). A miss
/// proves the punch is new; a hit still needs confirmation against the table.
static PUNCH_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

/// Check if a dedup key might have been seen (false positives possible)
pub fn might_contain(dedup_key: &str) -> bool {
    PUNCH_FILTER
        .read()
        .expect("punch filter poisoned")
        .contains(&dedup_key.to_string())
}

/// Insert a single dedup key into the filter
pub fn insert(dedup_key: &str) {
    PUNCH_FILTER
        .write()
        .expect("punch filter poisoned")
        .add(&dedup_key.to_string());
}

/// Warm up the punch filter from recent ledger rows using streaming + batching
pub async fn warmup_punch_filter(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (u64, NaiveDateTime, String)>(
        r#"
        SELECT employee_id, punched_at, kind
        FROM punch_logs
        WHERE punched_at >= NOW() - INTERVAL ? DAY
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (employee_id, punched_at, kind) =
            row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(format!("{}|{}|{}", employee_id, punched_at, kind));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!(
        "Punch filter warmup complete: {} events (last {} days)",
        total,
        days
    );
    Ok(())
}

/// Insert a batch of dedup keys
fn insert_batch(keys: &[String]) {
    let mut filter = PUNCH_FILTER.write().expect("punch filter poisoned");

    for dedup_key in keys {
        filter.add(dedup_key);
    }
}
