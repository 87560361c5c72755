use crate::{
    error::{AppError, AppResult},
    models::{FeedbackDirection, FeedbackMarker, FeedbackState},
};

fn normalize(title: &str) -> String {
    title.trim().to_lowercase()
}

impl FeedbackMarker {
    /// `"title (cat1, cat2)"`, or just the title without categories
    pub fn fragment(&self) -> String {
        if self.categories.is_empty() {
            self.title.trim().to_string()
        } else {
            format!("{} ({})", self.title.trim(), self.categories.join(", "))
        }
    }
}

/// Appends feedback fragments to optional free text, `"; "`-separated
fn fold_into(text: Option<&str>, markers: &[FeedbackMarker]) -> Option<String> {
    let parts: Vec<String> = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .into_iter()
        .chain(markers.iter().map(FeedbackMarker::fragment))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

impl FeedbackState {
    /// Whether the title can still receive a more/less action
    pub fn is_eligible(&self, title: &str) -> bool {
        let title = normalize(title);
        !self
            .more_like_this
            .iter()
            .chain(self.less_like_this.iter())
            .any(|marker| normalize(&marker.title) == title)
    }

    /// Returns a new state with the marker added
    ///
    /// Each title accepts a single feedback action in either direction.
    pub fn record(&self, direction: FeedbackDirection, marker: FeedbackMarker) -> AppResult<Self> {
        if marker.title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Feedback title cannot be empty".to_string(),
            ));
        }

        if !self.is_eligible(&marker.title) {
            return Err(AppError::InvalidInput(format!(
                "\"{}\" already received feedback",
                marker.title.trim()
            )));
        }

        let mut next = self.clone();
        match direction {
            FeedbackDirection::More => next.more_like_this.push(marker),
            FeedbackDirection::Less => next.less_like_this.push(marker),
        }
        Ok(next)
    }

    /// Likes text with "more like this" markers folded in
    pub fn fold_likes(&self, likes: Option<&str>) -> Option<String> {
        fold_into(likes, &self.more_like_this)
    }

    /// Dislikes text with "less like this" markers folded in
    pub fn fold_dislikes(&self, dislikes: Option<&str>) -> Option<String> {
        fold_into(dislikes, &self.less_like_this)
    }

    pub fn is_empty(&self) -> bool {
        self.more_like_this.is_empty() && self.less_like_this.is_empty()
    }
}
