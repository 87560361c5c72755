/// In-memory corpus
///
/// Holds the whole reference corpus in a `Vec` and answers nearest-neighbor
/// queries with an exact cosine scan. Used for tests and for running the
/// service locally against a small fixture corpus.
use std::collections::{HashMap, HashSet};

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, Neighbor, ReferenceMovie},
    services::providers::{MovieCatalog, NearestNeighborIndex},
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    movies: Vec<ReferenceMovie>,
}

impl InMemoryCorpus {
    pub fn new(movies: Vec<ReferenceMovie>) -> Self {
        Self { movies }
    }
}

/// Cosine similarity of two vectors, 0.0 for empty, mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[async_trait::async_trait]
impl NearestNeighborIndex for InMemoryCorpus {
    async fn nearest(&self, query: &[f32], limit: usize) -> AppResult<Vec<Neighbor>> {
        if query.is_empty() {
            return Err(AppError::Retrieval("Query vector is empty".to_string()));
        }

        let mut neighbors: Vec<Neighbor> = self
            .movies
            .iter()
            .filter_map(|movie| {
                let embedding = movie.embedding.as_ref()?;
                Some(Neighbor {
                    id: movie.id,
                    similarity: cosine_similarity(query, embedding),
                })
            })
            .collect();

        neighbors.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.id.cmp(&b.id))
        });
        neighbors.truncate(limit);

        Ok(neighbors)
    }
}

#[async_trait::async_trait]
impl MovieCatalog for InMemoryCorpus {
    async fn find_by_titles(&self, titles: &[String]) -> AppResult<Vec<ReferenceMovie>> {
        let wanted: HashSet<String> = titles.iter().map(|t| t.trim().to_lowercase()).collect();

        let mut found: Vec<ReferenceMovie> = self
            .movies
            .iter()
            .filter(|movie| wanted.contains(&movie.title.to_lowercase()))
            .cloned()
            .collect();
        found.sort_by_key(|movie| movie.id);

        Ok(found)
    }

    async fn fetch_by_ids(&self, ids: &[MovieId]) -> AppResult<Vec<ReferenceMovie>> {
        let by_id: HashMap<MovieId, &ReferenceMovie> =
            self.movies.iter().map(|movie| (movie.id, movie)).collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.get(id).map(|movie| (*movie).clone()))
            .collect())
    }
}
