use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, ReferenceMovie},
    services::providers::TextGenerator,
};

/// The fields of a selected movie the model is allowed to talk about
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExplanationSubject {
    pub id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub overview: Option<String>,
}

impl From<&ReferenceMovie> for ExplanationSubject {
    fn from(movie: &ReferenceMovie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            genres: movie.categories.clone(),
            overview: movie.synopsis.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(MovieId),
    Text(String),
}

impl RawId {
    fn into_id(self) -> Option<MovieId> {
        match self {
            RawId::Number(id) => Some(id),
            RawId::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawExplanation {
    id: RawId,
    explanation: String,
}

/// Builds the single prompt for a whole batch of selected movies
pub fn build_prompt(profile_document: &str, subjects: &[ExplanationSubject]) -> AppResult<String> {
    let movies = serde_json::to_string_pretty(subjects)
        .map_err(|e| AppError::Internal(format!("Failed to serialize subjects: {}", e)))?;

    Ok(format!(
        "You explain movie recommendations.\n\n\
         The user's taste profile:\n{profile}\n\n\
         Recommended movies (JSON):\n{movies}\n\n\
         For every movie above write one or two sentences explaining why it fits this user. \
         Use only the title, genres and overview given here and the taste profile; \
         do not invent cast, plot details, awards or any other facts. \
         Respond with a JSON array only, exactly one element per movie id, \
         in the form [{{\"id\": <id>, \"explanation\": \"...\"}}].",
        profile = profile_document,
        movies = movies,
    ))
}

/// Strips an optional Markdown code fence around the model's JSON
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses the model's reply into an id → explanation map
///
/// Ids that were not asked about and blank explanations are dropped.
pub fn parse_explanations(
    text: &str,
    subjects: &[ExplanationSubject],
) -> AppResult<HashMap<MovieId, String>> {
    let raw: Vec<RawExplanation> = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AppError::ExternalApi(format!("Unparseable explanation response: {}", e)))?;

    let mut explanations = HashMap::new();
    for entry in raw {
        let Some(id) = entry.id.into_id() else {
            continue;
        };
        let explanation = entry.explanation.trim();
        if explanation.is_empty() || !subjects.iter().any(|s| s.id == id) {
            continue;
        }
        explanations.entry(id).or_insert_with(|| explanation.to_string());
    }

    Ok(explanations)
}

/// Best-effort explanation of a batch of selected movies
pub struct ExplanationGenerator {
    generator: Arc<dyn TextGenerator>,
}

impl ExplanationGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    async fn try_explain(
        &self,
        profile_document: &str,
        subjects: &[ExplanationSubject],
    ) -> AppResult<HashMap<MovieId, String>> {
        let prompt = build_prompt(profile_document, subjects)?;
        let reply = self.generator.generate(&prompt).await?;
        parse_explanations(&reply, subjects)
    }

    /// Explains all subjects with one generation call
    ///
    /// Never fails: any upstream or parse error yields an empty map, so
    /// every item ends up without an explanation.
    pub async fn explain(
        &self,
        profile_document: &str,
        subjects: &[ExplanationSubject],
    ) -> HashMap<MovieId, String> {
        if subjects.is_empty() {
            return HashMap::new();
        }

        match self.try_explain(profile_document, subjects).await {
            Ok(explanations) => {
                tracing::info!(
                    requested = subjects.len(),
                    explained = explanations.len(),
                    "Explanations generated"
                );
                explanations
            }
            Err(e) => {
                tracing::warn!(error = %e, "Explanation generation failed, returning without explanations");
                HashMap::new()
            }
        }
    }
}
