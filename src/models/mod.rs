use serde::{Deserialize, Serialize};

/// Sentinel primary category for movies without any category
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Identifier of a movie in the reference corpus
pub type MovieId = i64;

/// A movie from the reference corpus
///
/// Immutable reference data. The embedding is filled in out of band by the
/// corpus loader; movies without one are never returned by retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReferenceMovie {
    pub id: MovieId,
    pub title: String,
    /// Ordered genres; the first one is the primary category
    pub categories: Vec<String>,
    /// Pre-existing quality rating on a 0-10 scale
    pub intrinsic_score: Option<f64>,
    pub synopsis: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub poster_ref: Option<String>,
    #[serde(default, skip_serializing)]
    #[sqlx(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl ReferenceMovie {
    /// First category, or the `Unknown` sentinel
    pub fn primary_category(&self) -> &str {
        self.categories
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CATEGORY)
    }
}

/// One nearest-neighbor hit: corpus id and `1 - cosine distance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: MovieId,
    pub similarity: f64,
}

/// A retrieved movie joined with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie: ReferenceMovie,
    pub similarity: f64,
}

/// A candidate after blended scoring
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub final_score: f64,
    /// Used by diversity selection only, never returned to the caller
    pub primary_category: String,
}

// ============================================================================
// Request Types
// ============================================================================

/// A movie the user rated, as submitted by the client
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RatedInput {
    pub title: String,
    pub rating: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for `POST /api/v1/recommendations`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub ratings: Vec<RatedInput>,
    #[serde(default)]
    pub likes: Option<String>,
    #[serde(default)]
    pub dislikes: Option<String>,
    #[serde(default)]
    pub match_count: Option<i64>,
    #[serde(default)]
    pub feedback: Option<FeedbackState>,
}

/// Request body for `POST /api/v1/search`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub description: String,
    #[serde(default)]
    pub match_count: Option<i64>,
}

// ============================================================================
// Feedback Types
// ============================================================================

/// A delivered recommendation the user reacted to
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeedbackMarker {
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackDirection {
    More,
    Less,
}

/// Feedback accumulated by the caller between runs
///
/// Owned by the caller and resubmitted with every request; the service never
/// stores it.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackState {
    #[serde(default)]
    pub more_like_this: Vec<FeedbackMarker>,
    #[serde(default)]
    pub less_like_this: Vec<FeedbackMarker>,
}

/// Request body for `POST /api/v1/feedback`
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub state: FeedbackState,
    pub direction: FeedbackDirection,
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// A single recommended movie returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: MovieId,
    pub movie_title: String,
    pub genres: Vec<String>,
    pub imdb_rating: Option<f64>,
    pub overview: Option<String>,
    pub director: Option<String>,
    pub released_year: Option<i32>,
    pub poster_link: Option<String>,
    pub similarity: f64,
    pub final_score: f64,
    pub explanation: Option<String>,
    /// False once the caller already gave feedback on this title
    pub feedback_eligible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}

/// A movie returned by plain description search, in raw similarity order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieMatch {
    pub id: MovieId,
    pub movie_title: String,
    pub genres: Vec<String>,
    pub imdb_rating: Option<f64>,
    pub overview: Option<String>,
    pub director: Option<String>,
    pub released_year: Option<i32>,
    pub poster_link: Option<String>,
    pub similarity: f64,
}

impl From<Candidate> for MovieMatch {
    fn from(candidate: Candidate) -> Self {
        let movie = candidate.movie;
        Self {
            id: movie.id,
            movie_title: movie.title,
            genres: movie.categories,
            imdb_rating: movie.intrinsic_score,
            overview: movie.synopsis,
            director: movie.director,
            released_year: movie.release_year,
            poster_link: movie.poster_ref,
            similarity: candidate.similarity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub movies: Vec<MovieMatch>,
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Request body for `models/{model}:embedContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiEmbedRequest {
    pub model: String,
    pub content: GeminiContent,
    pub output_dimensionality: usize,
}

#[derive(Debug, Deserialize)]
pub struct GeminiEmbedResponse {
    pub embedding: Option<GeminiEmbedding>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiEmbedding {
    #[serde(default)]
    pub values: Vec<f32>,
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerateRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub response_mime_type: String,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct GeminiGenerateResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidateContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

impl GeminiGenerateResponse {
    /// Concatenated text of the first candidate, if any
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(categories: &[&str]) -> ReferenceMovie {
        ReferenceMovie {
            id: 1,
            title: "Heat".to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            intrinsic_score: Some(8.3),
            synopsis: None,
            director: Some("Michael Mann".to_string()),
            release_year: Some(1995),
            poster_ref: None,
            embedding: Some(vec![0.1, 0.2]),
        }
    }

    #[test]
    fn test_primary_category() {
        assert_eq!(movie(&["Crime", "Drama"]).primary_category(), "Crime");
        assert_eq!(movie(&[]).primary_category(), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_reference_movie_never_serializes_embedding() {
        let json = serde_json::to_value(movie(&["Crime"])).unwrap();
        assert!(json.get("embedding").is_none());
    }

    #[test]
    fn test_recommendation_request_camel_case() {
        let json = r#"{
            "ratings": [{"title": "Inception", "rating": 9}],
            "likes": "mind-bending plots",
            "matchCount": 5,
            "feedback": {"lessLikeThis": [{"title": "Saw", "categories": ["Horror"]}]}
        }"#;

        let request: RecommendationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.ratings.len(), 1);
        assert_eq!(request.ratings[0].description, None);
        assert_eq!(request.match_count, Some(5));
        assert_eq!(request.dislikes, None);

        let feedback = request.feedback.unwrap();
        assert!(feedback.more_like_this.is_empty());
        assert_eq!(feedback.less_like_this[0].title, "Saw");
    }

    #[test]
    fn test_candidate_to_movie_match() {
        let candidate = Candidate {
            movie: movie(&["Crime"]),
            similarity: 0.75,
        };

        let matched = MovieMatch::from(candidate);
        assert_eq!(matched.movie_title, "Heat");
        assert_eq!(matched.genres, vec!["Crime".to_string()]);
        assert_eq!(matched.imdb_rating, Some(8.3));
        assert_eq!(matched.released_year, Some(1995));
        assert_eq!(matched.similarity, 0.75);
    }

    #[test]
    fn test_gemini_generate_response_text() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "[{\"id\": 1,"}, {"text": " \"explanation\": \"x\"}]"}]}}
            ]
        }"#;

        let response: GeminiGenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.text().as_deref(),
            Some(r#"[{"id": 1, "explanation": "x"}]"#)
        );
    }

    #[test]
    fn test_gemini_generate_response_without_candidates() {
        let response: GeminiGenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), None);
    }
}
