use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// external provider code => internal employee id, for accepted mappings only.
pub static IDENTITY_CACHE: Lazy<Cache<String, u64>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(200_000) // tune based on workforce size
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

#[inline]
fn key(external_code: &str) -> String {
    external_code.trim().to_lowercase()
}

/// Record an accepted mapping
pub async fn remember(external_code: &str, employee_id: u64) {
    IDENTITY_CACHE.insert(key(external_code), employee_id).await;
}

/// Cached employee id for a provider code, if any
pub async fn get(external_code: &str) -> Option<u64> {
    IDENTITY_CACHE.get(&key(external_code)).await
}

/// Drop a code after its mapping is deactivated
pub async fn forget(external_code: &str) {
    IDENTITY_CACHE.invalidate(&key(external_code)).await;
}

/// Batch remember mappings
async fn batch_remember(mappings: &[(String, u64)]) {
    let futures: Vec<_> = mappings
        .iter()
        .map(|(code, employee_id)| IDENTITY_CACHE.insert(key(code), *employee_id))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load all ACTIVE identity mappings into the in-memory cache (batched)
pub async fn warmup_identity_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, u64)>(
        r#"
        SELECT external_code, employee_id
        FROM identity_mappings
        WHERE is_active = 1
        ORDER BY updated_at DESC
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let mapping = row?;
        batch.push(mapping);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining mappings
    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    log::info!(
        "Identity cache warmup complete: {} active mappings",
        total_count
    );

    Ok(())
}
