//! Identity resolution.
//!
//! Maps an external provider (code, display name) pair to an internal
//! employee. Exact case-insensitive name matches score 1.0, substring
//! containment 0.8, everything else character-level edit-distance
//! similarity. Scores below `min_score` are no match; scores at or above
//! `auto_accept_score` create a mapping automatically; the band in between
//! is proposed for manual confirmation and writes nothing.

use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::engine::EngineError;
use crate::utils::identity_cache;

/// Thresholds are empirically chosen, so they stay configuration.
#[derive(Debug, Clone)]
pub struct MatchPolicy {
    pub min_score: f64,
    pub auto_accept_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchDecision {
    AutoAccept,
    NeedsReview,
    NoMatch,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchCandidate {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = 0.87)]
    pub score: f64,
}

/// Outcome of resolving one external identity.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveOutcome {
    /// Set when resolution succeeded (existing mapping or auto-accept).
    pub employee_id: Option<u64>,
    pub decision: MatchDecision,
    /// Best candidate found by fuzzy matching, if any cleared `min_score`.
    pub candidate: Option<MatchCandidate>,
    /// True when this call created a new mapping row.
    pub created_mapping: bool,
}

/// Classic Levenshtein distance over characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Similarity of two display names in [0, 1].
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }

    let max_len = a.chars().count().max(b.chars().count());
    let dist = edit_distance(&a, &b);
    (1.0 - dist as f64 / max_len as f64).clamp(0.0, 1.0)
}

pub fn classify(score: f64, policy: &MatchPolicy) -> MatchDecision {
    if score >= policy.auto_accept_score {
        MatchDecision::AutoAccept
    } else if score >= policy.min_score {
        MatchDecision::NeedsReview
    } else {
        MatchDecision::NoMatch
    }
}

/// Deterministic best match over `(employee_id, full name)` candidates:
/// highest score wins, ties broken by the lower employee id.
pub fn best_match(external_name: &str, candidates: &[(u64, String)]) -> Option<MatchCandidate> {
    let mut best: Option<MatchCandidate> = None;

    for (employee_id, employee_name) in candidates {
        let score = name_similarity(external_name, employee_name);
        let better = match &best {
            None => true,
            Some(current) => {
                score > current.score || (score == current.score && *employee_id < current.employee_id)
            }
        };
        if better {
            best = Some(MatchCandidate {
                employee_id: *employee_id,
                employee_name: employee_name.clone(),
                score,
            });
        }
    }

    best
}

async fn lookup_mapping(pool: &MySqlPool, external_code: &str) -> Result<Option<u64>, EngineError> {
    let row = sqlx::query_scalar::<_, u64>(
        "SELECT employee_id FROM identity_mappings WHERE external_code = ? AND is_active = 1",
    )
    .bind(external_code)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

async fn active_employees(pool: &MySqlPool) -> Result<Vec<(u64, String)>, EngineError> {
    let rows = sqlx::query_as::<_, (u64, String, String)>(
        "SELECT id, first_name, last_name FROM employees WHERE status = 'active'",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, first, last)| (id, format!("{} {}", first, last)))
        .collect())
}

/// Record an accepted mapping. Any other active mapping for the code is
/// deactivated first so the one-active-mapping-per-code invariant holds.
pub async fn accept_mapping(
    pool: &MySqlPool,
    external_code: &str,
    external_name: &str,
    employee_id: u64,
    score: f64,
) -> Result<(), EngineError> {
    sqlx::query("UPDATE identity_mappings SET is_active = 0 WHERE external_code = ? AND is_active = 1")
        .bind(external_code)
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO identity_mappings (external_code, external_name, employee_id, match_score, is_active)
        VALUES (?, ?, ?, ?, 1)
        "#,
    )
    .bind(external_code)
    .bind(external_name)
    .bind(employee_id)
    .bind(score)
    .execute(pool)
    .await?;

    identity_cache::remember(external_code, employee_id).await;
    tracing::info!(external_code, employee_id, score, "identity mapping accepted");
    Ok(())
}

/// Resolve one external identity. Writes a mapping only on auto-accept;
/// proposals and rejections leave the store untouched.
pub async fn resolve(
    pool: &MySqlPool,
    external_code: &str,
    external_name: &str,
    policy: &MatchPolicy,
) -> Result<ResolveOutcome, EngineError> {
    if let Some(employee_id) = identity_cache::get(external_code).await {
        return Ok(ResolveOutcome {
            employee_id: Some(employee_id),
            decision: MatchDecision::AutoAccept,
            candidate: None,
            created_mapping: false,
        });
    }

    if let Some(employee_id) = lookup_mapping(pool, external_code).await? {
        identity_cache::remember(external_code, employee_id).await;
        return Ok(ResolveOutcome {
            employee_id: Some(employee_id),
            decision: MatchDecision::AutoAccept,
            candidate: None,
            created_mapping: false,
        });
    }

    let candidates = active_employees(pool).await?;
    let best = best_match(external_name, &candidates);

    match best {
        Some(candidate) => match classify(candidate.score, policy) {
            MatchDecision::AutoAccept => {
                accept_mapping(pool, external_code, external_name, candidate.employee_id, candidate.score)
                    .await?;
                Ok(ResolveOutcome {
                    employee_id: Some(candidate.employee_id),
                    decision: MatchDecision::AutoAccept,
                    candidate: Some(candidate),
                    created_mapping: true,
                })
            }
            MatchDecision::NeedsReview => Ok(ResolveOutcome {
                employee_id: None,
                decision: MatchDecision::NeedsReview,
                candidate: Some(candidate),
                created_mapping: false,
            }),
            MatchDecision::NoMatch => Ok(ResolveOutcome {
                employee_id: None,
                decision: MatchDecision::NoMatch,
                candidate: None,
                created_mapping: false,
            }),
        },
        None => Ok(ResolveOutcome {
            employee_id: None,
            decision: MatchDecision::NoMatch,
            candidate: None,
            created_mapping: false,
        }),
    }
}

/// Resolution as the ingestion pipeline needs it: an id or a per-record
/// error that skips the record and lets the batch continue.
pub async fn resolve_for_ingest(
    pool: &MySqlPool,
    external_code: &str,
    external_name: &str,
    policy: &MatchPolicy,
) -> Result<u64, EngineError> {
    let outcome = resolve(pool, external_code, external_name, policy).await?;
    outcome.employee_id.ok_or_else(|| EngineError::UnresolvedIdentity {
        code: external_code.to_string(),
        name: external_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> MatchPolicy {
        MatchPolicy {
            min_score: 0.3,
            auto_accept_score: 0.85,
        }
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        assert_eq!(name_similarity("John Doe", "john doe"), 1.0);
        assert_eq!(name_similarity("  John Doe ", "JOHN DOE"), 1.0);
    }

    #[test]
    fn test_substring_containment_scores_point_eight() {
        assert_eq!(name_similarity("John", "John Doe"), 0.8);
        assert_eq!(name_similarity("John Doe Jr", "john doe"), 0.8);
    }

    #[test]
    fn test_edit_distance_similarity() {
        // "jon doe" vs "john doe": one insertion over eight chars.
        let score = name_similarity("Jon Doe", "John Doe");
        assert!((score - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_empty_name_never_matches() {
        assert_eq!(name_similarity("", "John Doe"), 0.0);
        assert_eq!(name_similarity("   ", "John Doe"), 0.0);
    }

    #[test]
    fn test_edit_distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_classify_thresholds() {
        let p = policy();
        assert_eq!(classify(0.9, &p), MatchDecision::AutoAccept);
        assert_eq!(classify(0.85, &p), MatchDecision::AutoAccept);
        assert_eq!(classify(0.5, &p), MatchDecision::NeedsReview);
        assert_eq!(classify(0.3, &p), MatchDecision::NeedsReview);
        assert_eq!(classify(0.29, &p), MatchDecision::NoMatch);
    }

    #[test]
    fn test_best_match_picks_highest_score() {
        let candidates = vec![
            (1, "Alice Smith".to_string()),
            (2, "John Doe".to_string()),
            (3, "Jane Doe".to_string()),
        ];
        let best = best_match("john doe", &candidates).unwrap();
        assert_eq!(best.employee_id, 2);
        assert_eq!(best.score, 1.0);
    }

    #[test]
    fn test_best_match_tie_breaks_on_lower_id() {
        let candidates = vec![(9, "John Doe".to_string()), (4, "John Doe".to_string())];
        let best = best_match("John Doe", &candidates).unwrap();
        assert_eq!(best.employee_id, 4);
    }

    #[test]
    fn test_best_match_empty_candidates() {
        assert!(best_match("John Doe", &[]).is_none());
    }
}
