use std::collections::HashMap;

use crate::models::ScoredCandidate;

/// Maximum number of results sharing one primary category
pub const CATEGORY_CAP: usize = 2;

/// Greedy per-category quota selection
///
/// Walks `scored` in order and admits a candidate while its primary category
/// has fewer than `cap` admissions, stopping at `count` results. There is no
/// backfill: when the cap rejects too many candidates the result is short.
pub fn select_diverse(
    scored: Vec<ScoredCandidate>,
    count: usize,
    cap: usize,
) -> Vec<ScoredCandidate> {
    let available = scored.len();
    let mut per_category: HashMap<String, usize> = HashMap::new();
    let mut selected = Vec::with_capacity(count.min(available));

    for candidate in scored {
        if selected.len() >= count {
            break;
        }

        let admitted = per_category
            .entry(candidate.primary_category.clone())
            .or_insert(0);
        if *admitted >= cap {
            continue;
        }

        *admitted += 1;
        selected.push(candidate);
    }

    if selected.len() < count {
        tracing::info!(
            requested = count,
            selected = selected.len(),
            available = available,
            "Diversity cap left fewer results than requested"
        );
    }

    selected
}
