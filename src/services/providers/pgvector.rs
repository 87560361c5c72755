/// Postgres + pgvector corpus
///
/// Expects a `movies` table with a `vector(D)` column named `embedding`.
/// Similarity is computed in the database as `1 - (embedding <=> query)`,
/// where `<=>` is pgvector's cosine distance operator.
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, Neighbor, ReferenceMovie},
    services::providers::{MovieCatalog, NearestNeighborIndex},
};

const MOVIE_COLUMNS: &str = r#"
    id,
    title,
    COALESCE(genres, ARRAY[]::text[]) AS categories,
    imdb_rating::float8 AS intrinsic_score,
    overview AS synopsis,
    director,
    released_year AS release_year,
    poster_link AS poster_ref
"#;

#[derive(Clone)]
pub struct PgCorpus {
    db_pool: PgPool,
}

impl PgCorpus {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

/// Renders a vector in pgvector's text input format, e.g. `[0.1,0.2]`
fn to_vector_literal(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[derive(sqlx::FromRow)]
struct NeighborRow {
    id: MovieId,
    similarity: f64,
}

#[async_trait::async_trait]
impl NearestNeighborIndex for PgCorpus {
    async fn nearest(&self, query: &[f32], limit: usize) -> AppResult<Vec<Neighbor>> {
        let rows: Vec<NeighborRow> = sqlx::query_as(
            r#"
            SELECT id, (1 - (embedding <=> $1::vector))::float8 AS similarity
            FROM movies
            WHERE embedding IS NOT NULL
            ORDER BY embedding <=> $1::vector
            LIMIT $2
            "#,
        )
        .bind(to_vector_literal(query))
        .bind(limit as i64)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Nearest-neighbor query failed");
            AppError::Retrieval(e.to_string())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| Neighbor {
                id: row.id,
                similarity: row.similarity,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl MovieCatalog for PgCorpus {
    async fn find_by_titles(&self, titles: &[String]) -> AppResult<Vec<ReferenceMovie>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let lowered: Vec<String> = titles.iter().map(|t| t.trim().to_lowercase()).collect();
        let sql = format!(
            "SELECT {} FROM movies WHERE lower(title) = ANY($1) ORDER BY id",
            MOVIE_COLUMNS
        );

        let movies = sqlx::query_as::<_, ReferenceMovie>(&sql)
            .bind(&lowered)
            .fetch_all(&self.db_pool)
            .await?;

        Ok(movies)
    }

    async fn fetch_by_ids(&self, ids: &[MovieId]) -> AppResult<Vec<ReferenceMovie>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {} FROM movies WHERE id = ANY($1)", MOVIE_COLUMNS);

        let movies = sqlx::query_as::<_, ReferenceMovie>(&sql)
            .bind(ids)
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| AppError::Retrieval(e.to_string()))?;

        Ok(movies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_vector_literal() {
        assert_eq!(to_vector_literal(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
    }

    #[test]
    fn test_to_vector_literal_empty() {
        assert_eq!(to_vector_literal(&[]), "[]");
    }
}
