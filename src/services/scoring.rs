use std::cmp::Ordering;
use std::collections::HashMap;

use crate::{
    models::{Candidate, ScoredCandidate},
    services::taste_profile::TasteProfile,
};

pub const SIMILARITY_WEIGHT: f64 = 0.6;
pub const INTRINSIC_WEIGHT: f64 = 0.2;
pub const AFFINITY_WEIGHT: f64 = 0.2;
/// Assumed intrinsic score when a movie has none
pub const DEFAULT_INTRINSIC_SCORE: f64 = 5.0;

/// Fraction of the candidate's categories found in the affinity map
pub fn category_affinity(categories: &[String], affinity: &HashMap<String, u8>) -> f64 {
    if categories.is_empty() {
        return 0.0;
    }

    let hits = categories
        .iter()
        .filter(|category| affinity.contains_key(*category))
        .count();

    hits as f64 / categories.len() as f64
}

/// Blended relevance score in `[0, 1]`
///
/// `0.6 * similarity + 0.2 * intrinsic / 10 + 0.2 * affinity`, each input
/// clamped to `[0, 1]`.
pub fn blended_score(candidate: &Candidate, affinity: &HashMap<String, u8>) -> f64 {
    let similarity = candidate.similarity.clamp(0.0, 1.0);
    let intrinsic = (candidate
        .movie
        .intrinsic_score
        .unwrap_or(DEFAULT_INTRINSIC_SCORE)
        / 10.0)
        .clamp(0.0, 1.0);
    let affinity = category_affinity(&candidate.movie.categories, affinity);

    SIMILARITY_WEIGHT * similarity + INTRINSIC_WEIGHT * intrinsic + AFFINITY_WEIGHT * affinity
}

/// Descending by score, then ascending by id
fn by_score_then_id(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| a.candidate.movie.id.cmp(&b.candidate.movie.id))
}

/// Drops already-rated titles, scores the rest and sorts them best first
pub fn score_candidates(candidates: Vec<Candidate>, profile: &TasteProfile) -> Vec<ScoredCandidate> {
    let before = candidates.len();

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .filter(|candidate| !profile.is_excluded(&candidate.movie.title))
        .map(|candidate| {
            let final_score = blended_score(&candidate, &profile.category_affinity);
            let primary_category = candidate.movie.primary_category().to_string();
            ScoredCandidate {
                candidate,
                final_score,
                primary_category,
            }
        })
        .collect();

    scored.sort_by(by_score_then_id);

    tracing::debug!(
        candidates = before,
        excluded = before - scored.len(),
        scored = scored.len(),
        "Candidates scored"
    );

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieId, ReferenceMovie};
    use std::collections::HashSet;

    fn candidate(
        id: MovieId,
        title: &str,
        categories: &[&str],
        intrinsic: Option<f64>,
        similarity: f64,
    ) -> Candidate {
        Candidate {
            movie: ReferenceMovie {
                id,
                title: title.to_string(),
                categories: categories.iter().map(|c| c.to_string()).collect(),
                intrinsic_score: intrinsic,
                synopsis: None,
                director: None,
                release_year: None,
                poster_ref: None,
                embedding: None,
            },
            similarity,
        }
    }

    fn profile(excluded: &[&str], affinity: &[(&str, u8)]) -> TasteProfile {
        TasteProfile {
            document: String::new(),
            excluded_titles: excluded.iter().map(|t| t.to_lowercase()).collect::<HashSet<_>>(),
            category_affinity: affinity
                .iter()
                .map(|(c, r)| (c.to_string(), *r))
                .collect(),
        }
    }

    #[test]
    fn test_category_affinity_fraction() {
        let affinity: HashMap<String, u8> = [("Sci-Fi".to_string(), 9)].into_iter().collect();
        let categories = vec!["Sci-Fi".to_string(), "Drama".to_string()];

        assert_eq!(category_affinity(&categories, &affinity), 0.5);
        assert_eq!(category_affinity(&[], &affinity), 0.0);
    }

    #[test]
    fn test_blended_score_formula() {
        let affinity: HashMap<String, u8> = [("Sci-Fi".to_string(), 9)].into_iter().collect();
        let c = candidate(1, "Interstellar", &["Sci-Fi", "Drama"], Some(8.0), 0.9);

        // 0.6 * 0.9 + 0.2 * 0.8 + 0.2 * 0.5
        let expected = 0.54 + 0.16 + 0.1;
        assert!((blended_score(&c, &affinity) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_blended_score_defaults_unknown_intrinsic_to_midpoint() {
        let c = candidate(1, "Mystery Film", &[], None, 0.5);

        // 0.6 * 0.5 + 0.2 * 0.5 + 0
        assert!((blended_score(&c, &HashMap::new()) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_blended_score_stays_in_unit_range() {
        let affinity: HashMap<String, u8> = [("Drama".to_string(), 10)].into_iter().collect();

        let high = candidate(1, "Max", &["Drama"], Some(10.0), 1.0);
        let low = candidate(2, "Min", &["Horror"], Some(0.0), -0.3);

        assert!((blended_score(&high, &affinity) - 1.0).abs() < 1e-9);
        assert_eq!(blended_score(&low, &affinity), 0.0);
    }

    #[test]
    fn test_score_candidates_excludes_rated_titles() {
        let candidates = vec![
            candidate(1, "Inception", &["Sci-Fi"], Some(8.8), 0.99),
            candidate(2, "Tenet", &["Sci-Fi"], Some(7.3), 0.8),
        ];

        let scored = score_candidates(candidates, &profile(&["INCEPTION"], &[]));

        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].candidate.movie.title, "Tenet");
    }

    #[test]
    fn test_score_candidates_sorted_with_id_tiebreak() {
        let candidates = vec![
            candidate(7, "B", &["Drama"], Some(7.0), 0.5),
            candidate(3, "A", &["Drama"], Some(7.0), 0.5),
            candidate(5, "C", &["Drama"], Some(9.0), 0.9),
        ];

        let scored = score_candidates(candidates, &profile(&[], &[]));
        let ids: Vec<MovieId> = scored.iter().map(|s| s.candidate.movie.id).collect();

        assert_eq!(ids, vec![5, 3, 7]);
    }

    #[test]
    fn test_affinity_can_reorder_close_matches() {
        let candidates = vec![
            candidate(1, "Plain", &["Romance"], Some(7.0), 0.80),
            candidate(2, "Favourite Genre", &["Thriller"], Some(7.0), 0.75),
        ];

        let scored = score_candidates(candidates, &profile(&[], &[("Thriller", 9)]));

        assert_eq!(scored[0].candidate.movie.id, 2);
        assert_eq!(scored[0].primary_category, "Thriller");
    }

    #[test]
    fn test_primary_category_sentinel() {
        let scored = score_candidates(
            vec![candidate(1, "Untagged", &[], None, 0.5)],
            &profile(&[], &[]),
        );
        assert_eq!(scored[0].primary_category, "Unknown");
    }
}
