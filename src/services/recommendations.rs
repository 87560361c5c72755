use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{
        Candidate, MovieId, MovieMatch, Recommendation, RecommendationRequest,
        RecommendationResponse, ReferenceMovie, SearchRequest, SearchResponse,
    },
    services::{
        diversity::{select_diverse, CATEGORY_CAP},
        explanation::{ExplanationGenerator, ExplanationSubject},
        providers::{Embedder, MovieCatalog, NearestNeighborIndex, TextGenerator},
        scoring::score_candidates,
        taste_profile::{build_profile, resolve_ratings, validate_ratings},
    },
};

pub const DEFAULT_MATCH_COUNT: usize = 10;
pub const MAX_MATCH_COUNT: usize = 20;

/// Validates the requested result count, defaulting to 10
pub fn validate_match_count(requested: Option<i64>) -> AppResult<usize> {
    match requested {
        None => Ok(DEFAULT_MATCH_COUNT),
        Some(count) if (1..=MAX_MATCH_COUNT as i64).contains(&count) => Ok(count as usize),
        Some(count) => Err(AppError::InvalidInput(format!(
            "matchCount must be between 1 and {}, got {}",
            MAX_MATCH_COUNT, count
        ))),
    }
}

/// Turns ratings and preference text into ranked, diversified, explained movies
///
/// Pipeline:
/// 1. Resolve rated titles against the corpus and build the taste profile
/// 2. Embed the profile document
/// 3. Retrieve nearest neighbors (more than requested, for diversity headroom)
/// 4. Score: exclusion of rated titles, then blended relevance
/// 5. Select under the per-category cap
/// 6. Explain the selection (best effort)
///
/// Holds no per-request state; every call rebuilds everything from its input.
pub struct RecommendationService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn NearestNeighborIndex>,
    catalog: Arc<dyn MovieCatalog>,
    explainer: ExplanationGenerator,
    retrieval_limit: usize,
}

impl RecommendationService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn NearestNeighborIndex>,
        catalog: Arc<dyn MovieCatalog>,
        generator: Arc<dyn TextGenerator>,
        retrieval_limit: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            catalog,
            explainer: ExplanationGenerator::new(generator),
            retrieval_limit,
        }
    }

    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> AppResult<RecommendationResponse> {
        let start = Instant::now();

        let match_count = validate_match_count(request.match_count)?;
        validate_ratings(&request.ratings)?;

        let titles: Vec<String> = request.ratings.iter().map(|r| r.title.clone()).collect();
        let known = self.catalog.find_by_titles(&titles).await?;
        let rated = resolve_ratings(&request.ratings, &known)?;

        let feedback = request.feedback.unwrap_or_default();
        if !feedback.is_empty() {
            tracing::debug!(
                more_like_this = feedback.more_like_this.len(),
                less_like_this = feedback.less_like_this.len(),
                "Folding feedback into preference text"
            );
        }
        let likes = feedback.fold_likes(request.likes.as_deref());
        let dislikes = feedback.fold_dislikes(request.dislikes.as_deref());
        let profile = build_profile(&rated, likes.as_deref(), dislikes.as_deref());

        tracing::info!(
            ratings = rated.len(),
            resolved = known.len(),
            affinity_categories = profile.category_affinity.len(),
            match_count = match_count,
            "Taste profile built"
        );

        let query = self.embedder.embed(&profile.document).await?;
        let candidates = self.retrieve(&query, self.retrieval_limit).await?;
        let retrieved = candidates.len();

        let scored = score_candidates(candidates, &profile);
        let selected = select_diverse(scored, match_count, CATEGORY_CAP);

        let subjects: Vec<ExplanationSubject> = selected
            .iter()
            .map(|s| ExplanationSubject::from(&s.candidate.movie))
            .collect();
        let mut explanations = self.explainer.explain(&profile.document, &subjects).await;

        let recommendations: Vec<Recommendation> = selected
            .into_iter()
            .map(|scored| {
                let movie = scored.candidate.movie;
                Recommendation {
                    explanation: explanations.remove(&movie.id),
                    feedback_eligible: feedback.is_eligible(&movie.title),
                    id: movie.id,
                    movie_title: movie.title,
                    genres: movie.categories,
                    imdb_rating: movie.intrinsic_score,
                    overview: movie.synopsis,
                    director: movie.director,
                    released_year: movie.release_year,
                    poster_link: movie.poster_ref,
                    similarity: scored.candidate.similarity,
                    final_score: scored.final_score,
                }
            })
            .collect();

        tracing::info!(
            retrieved = retrieved,
            returned = recommendations.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations computed"
        );

        Ok(RecommendationResponse { recommendations })
    }

    /// Plain description search: embed, retrieve, return in similarity order
    pub async fn search(&self, request: SearchRequest) -> AppResult<SearchResponse> {
        let match_count = validate_match_count(request.match_count)?;
        let description = request.description.trim();
        if description.is_empty() {
            return Err(AppError::InvalidInput(
                "Description cannot be empty".to_string(),
            ));
        }

        let query = self.embedder.embed(description).await?;
        let movies: Vec<MovieMatch> = self
            .retrieve(&query, match_count)
            .await?
            .into_iter()
            .map(MovieMatch::from)
            .collect();

        tracing::info!(returned = movies.len(), "Description search completed");

        Ok(SearchResponse { movies })
    }

    /// Nearest neighbors joined with their full records, in similarity order
    async fn retrieve(&self, query: &[f32], limit: usize) -> AppResult<Vec<Candidate>> {
        let neighbors = self.index.nearest(query, limit).await?;
        let ids: Vec<MovieId> = neighbors.iter().map(|n| n.id).collect();

        let mut records: HashMap<MovieId, ReferenceMovie> = self
            .catalog
            .fetch_by_ids(&ids)
            .await?
            .into_iter()
            .map(|movie| (movie.id, movie))
            .collect();

        let candidates: Vec<Candidate> = neighbors
            .iter()
            .filter_map(|neighbor| {
                records.remove(&neighbor.id).map(|movie| Candidate {
                    movie,
                    similarity: neighbor.similarity,
                })
            })
            .collect();

        if candidates.len() < neighbors.len() {
            tracing::warn!(
                neighbors = neighbors.len(),
                joined = candidates.len(),
                "Some retrieved ids had no corpus record"
            );
        }

        Ok(candidates)
    }
}
