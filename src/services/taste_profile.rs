use std::collections::{HashMap, HashSet};

use crate::{
    error::{AppError, AppResult},
    models::{RatedInput, ReferenceMovie},
};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 10;
/// Ratings at or above this are strong likes
pub const STRONG_LIKE_THRESHOLD: u8 = 8;
/// Ratings at or below this are dislikes
pub const DISLIKE_THRESHOLD: u8 = 4;

const STRONG_LIKE_HEADING: &str = "Movies I loved (rated 8-10):";
const NEUTRAL_HEADING: &str = "Movies I found okay (rated 5-7):";
const DISLIKE_HEADING: &str = "Movies I disliked (rated 1-4):";
const MORE_OF_HEADING: &str = "I want more of this:";
const LESS_OF_HEADING: &str = "I want less of this:";

/// A rating in `[1, 10]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> AppResult<Self> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, value
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    fn bucket(self) -> Bucket {
        if self.0 >= STRONG_LIKE_THRESHOLD {
            Bucket::StrongLike
        } else if self.0 <= DISLIKE_THRESHOLD {
            Bucket::Dislike
        } else {
            Bucket::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    StrongLike,
    Neutral,
    Dislike,
}

/// How a rated title was matched against the corpus
///
/// An unresolved title can only be built with a non-blank description.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ReferenceMovie),
    Unresolved { title: String, description: String },
}

impl Resolution {
    pub fn unresolved(title: &str, description: Option<&str>) -> AppResult<Self> {
        let description = description.map(str::trim).unwrap_or_default();
        if description.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "\"{}\" was not found in the catalog; a description is required",
                title.trim()
            )));
        }

        Ok(Resolution::Unresolved {
            title: title.trim().to_string(),
            description: description.to_string(),
        })
    }
}

/// A validated rated movie
#[derive(Debug, Clone, PartialEq)]
pub struct RatedMovie {
    pub rating: Rating,
    pub resolution: Resolution,
}

impl RatedMovie {
    /// The line this movie contributes to the profile document
    fn render(&self) -> String {
        match &self.resolution {
            Resolution::Resolved(movie) => format!(
                "{} | {} | {} | User rating: {}/10",
                movie.title,
                movie.categories.join(", "),
                movie.synopsis.as_deref().unwrap_or("N/A"),
                self.rating.value()
            ),
            Resolution::Unresolved { title, description } => format!(
                "{} | {} | User rating: {}/10",
                title,
                description,
                self.rating.value()
            ),
        }
    }
}

/// Structured summary of a user's taste, used as the semantic query
#[derive(Debug, Clone, PartialEq)]
pub struct TasteProfile {
    /// Plain-text document that gets embedded
    pub document: String,
    /// Lower-cased titles the user already rated
    pub excluded_titles: HashSet<String>,
    /// Category → highest rating seen, from strong likes only
    pub category_affinity: HashMap<String, u8>,
}

impl TasteProfile {
    pub fn is_excluded(&self, title: &str) -> bool {
        self.excluded_titles.contains(&title.trim().to_lowercase())
    }
}

/// Checks the request-level shape of the ratings before any lookup
pub fn validate_ratings(ratings: &[RatedInput]) -> AppResult<Vec<Rating>> {
    if ratings.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one rated movie is required".to_string(),
        ));
    }

    ratings
        .iter()
        .map(|input| {
            if input.title.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "Rated movie title cannot be empty".to_string(),
                ));
            }
            Rating::new(input.rating)
        })
        .collect()
}

/// Resolves each rated input against `catalog` (case-insensitive exact title)
///
/// When several catalog entries share a title the first one wins, so callers
/// should pass the catalog in a stable order.
pub fn resolve_ratings(
    ratings: &[RatedInput],
    catalog: &[ReferenceMovie],
) -> AppResult<Vec<RatedMovie>> {
    let validated = validate_ratings(ratings)?;

    let mut by_title: HashMap<String, &ReferenceMovie> = HashMap::new();
    for movie in catalog {
        by_title.entry(movie.title.to_lowercase()).or_insert(movie);
    }

    ratings
        .iter()
        .zip(validated)
        .map(|(input, rating)| {
            let resolution = match by_title.get(&input.title.trim().to_lowercase()) {
                Some(movie) => Resolution::Resolved((*movie).clone()),
                None => Resolution::unresolved(&input.title, input.description.as_deref())?,
            };
            Ok(RatedMovie { rating, resolution })
        })
        .collect()
}

/// Builds the taste profile from validated ratings and optional free text
pub fn build_profile(
    rated: &[RatedMovie],
    likes: Option<&str>,
    dislikes: Option<&str>,
) -> TasteProfile {
    let mut strong = Vec::new();
    let mut neutral = Vec::new();
    let mut disliked = Vec::new();
    let mut excluded_titles = HashSet::new();
    let mut category_affinity: HashMap<String, u8> = HashMap::new();

    for movie in rated {
        let title = match &movie.resolution {
            Resolution::Resolved(reference) => &reference.title,
            Resolution::Unresolved { title, .. } => title,
        };
        excluded_titles.insert(title.trim().to_lowercase());

        let bucket = movie.rating.bucket();
        if bucket == Bucket::StrongLike {
            if let Resolution::Resolved(reference) = &movie.resolution {
                for category in &reference.categories {
                    let best = category_affinity.entry(category.clone()).or_insert(0);
                    *best = (*best).max(movie.rating.value());
                }
            }
        }

        let line = movie.render();
        match bucket {
            Bucket::StrongLike => strong.push(line),
            Bucket::Neutral => neutral.push(line),
            Bucket::Dislike => disliked.push(line),
        }
    }

    let mut sections = Vec::new();
    for (heading, lines) in [
        (STRONG_LIKE_HEADING, &strong),
        (NEUTRAL_HEADING, &neutral),
        (DISLIKE_HEADING, &disliked),
    ] {
        if !lines.is_empty() {
            sections.push(format!("{}\n{}", heading, lines.join("\n")));
        }
    }

    for (heading, text) in [(MORE_OF_HEADING, likes), (LESS_OF_HEADING, dislikes)] {
        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            sections.push(format!("{}\n{}", heading, text));
        }
    }

    TasteProfile {
        document: sections.join("\n\n"),
        excluded_titles,
        category_affinity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(title: &str, categories: &[&str], synopsis: Option<&str>) -> ReferenceMovie {
        ReferenceMovie {
            id: 1,
            title: title.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            intrinsic_score: Some(8.8),
            synopsis: synopsis.map(str::to_string),
            director: None,
            release_year: None,
            poster_ref: None,
            embedding: None,
        }
    }

    fn input(title: &str, rating: i64, description: Option<&str>) -> RatedInput {
        RatedInput {
            title: title.to_string(),
            rating,
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(10).is_ok());
        assert!(matches!(Rating::new(0), Err(AppError::InvalidInput(_))));
        assert!(matches!(Rating::new(11), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_rating_buckets() {
        assert_eq!(Rating::new(8).unwrap().bucket(), Bucket::StrongLike);
        assert_eq!(Rating::new(7).unwrap().bucket(), Bucket::Neutral);
        assert_eq!(Rating::new(5).unwrap().bucket(), Bucket::Neutral);
        assert_eq!(Rating::new(4).unwrap().bucket(), Bucket::Dislike);
    }

    #[test]
    fn test_empty_ratings_rejected() {
        let result = resolve_ratings(&[], &[]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_blank_title_rejected() {
        let result = validate_ratings(&[input("  ", 5, Some("something"))]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_unresolved_without_description_rejected() {
        let result = resolve_ratings(&[input("Obscure Indie", 6, Some("   "))], &[]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = resolve_ratings(&[input("Obscure Indie", 6, None)], &[]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_resolution_is_case_insensitive() {
        let catalog = vec![reference("Inception", &["Sci-Fi", "Thriller"], None)];
        let rated = resolve_ratings(&[input("inception", 9, None)], &catalog).unwrap();

        assert!(matches!(rated[0].resolution, Resolution::Resolved(_)));
    }

    #[test]
    fn test_duplicate_titles_resolve_to_first_entry() {
        let mut original = reference("Dune", &["Sci-Fi"], Some("1984 cut"));
        original.id = 7;
        let mut remake = reference("DUNE", &["Adventure"], Some("2021 cut"));
        remake.id = 42;

        let rated = resolve_ratings(&[input("dune", 8, None)], &[original, remake]).unwrap();

        match &rated[0].resolution {
            Resolution::Resolved(movie) => assert_eq!(movie.id, 7),
            other => panic!("expected a resolved movie, got {:?}", other),
        }
    }

    #[test]
    fn test_resolved_and_unresolved_lines() {
        let catalog = vec![reference(
            "Inception",
            &["Sci-Fi", "Thriller"],
            Some("A thief enters dreams."),
        )];
        let rated = resolve_ratings(
            &[
                input("Inception", 9, None),
                input("Home Video", 3, Some("Shaky family footage")),
            ],
            &catalog,
        )
        .unwrap();

        assert_eq!(
            rated[0].render(),
            "Inception | Sci-Fi, Thriller | A thief enters dreams. | User rating: 9/10"
        );
        assert_eq!(
            rated[1].render(),
            "Home Video | Shaky family footage | User rating: 3/10"
        );
    }

    #[test]
    fn test_missing_synopsis_rendered_as_na() {
        let rated = RatedMovie {
            rating: Rating::new(6).unwrap(),
            resolution: Resolution::Resolved(reference("Heat", &["Crime"], None)),
        };
        assert_eq!(rated.render(), "Heat | Crime | N/A | User rating: 6/10");
    }

    #[test]
    fn test_document_sections_and_order() {
        let catalog = vec![
            reference("Inception", &["Sci-Fi", "Thriller"], None),
            reference("Cats", &["Musical"], None),
        ];
        let rated = resolve_ratings(
            &[input("Cats", 2, None), input("Inception", 9, None)],
            &catalog,
        )
        .unwrap();

        let profile = build_profile(&rated, Some("slow-burn mysteries"), Some("  "));

        let expected = "Movies I loved (rated 8-10):\n\
            Inception | Sci-Fi, Thriller | N/A | User rating: 9/10\n\n\
            Movies I disliked (rated 1-4):\n\
            Cats | Musical | N/A | User rating: 2/10\n\n\
            I want more of this:\n\
            slow-burn mysteries";
        assert_eq!(profile.document, expected);
        assert!(!profile.document.contains(NEUTRAL_HEADING));
        assert!(!profile.document.contains(LESS_OF_HEADING));
    }

    #[test]
    fn test_affinity_only_from_strong_likes_with_max_rating() {
        let catalog = vec![
            reference("Inception", &["Sci-Fi", "Thriller"], None),
            reference("Arrival", &["Sci-Fi", "Drama"], None),
            reference("Se7en", &["Crime", "Thriller"], None),
        ];
        let rated = resolve_ratings(
            &[
                input("Inception", 8, None),
                input("Arrival", 10, None),
                input("Se7en", 6, None),
            ],
            &catalog,
        )
        .unwrap();

        let profile = build_profile(&rated, None, None);

        assert_eq!(profile.category_affinity.get("Sci-Fi"), Some(&10));
        assert_eq!(profile.category_affinity.get("Thriller"), Some(&8));
        assert_eq!(profile.category_affinity.get("Drama"), Some(&10));
        assert_eq!(profile.category_affinity.get("Crime"), None);
    }

    #[test]
    fn test_exclusion_set_covers_all_rated_titles() {
        let catalog = vec![reference("Inception", &["Sci-Fi"], None)];
        let rated = resolve_ratings(
            &[
                input("INCEPTION", 9, None),
                input("My Cousin's Film", 2, Some("a home movie")),
            ],
            &catalog,
        )
        .unwrap();

        let profile = build_profile(&rated, None, None);

        assert!(profile.is_excluded("Inception"));
        assert!(profile.is_excluded("my cousin's film"));
        assert_eq!(profile.excluded_titles.len(), 2);
    }
}
