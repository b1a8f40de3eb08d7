use serde::Serialize;
use time::{macros::format_description, OffsetDateTime};
use tracing::debug;

use crate::state::AppState;

pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Qualitative verdict derived from the reviewer's watchlist score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    #[serde(rename = "Recommended")]
    Recommended,
    #[serde(rename = "Mixed Feelings")]
    MixedFeelings,
    #[serde(rename = "Not Recommended")]
    NotRecommended,
}

/// Absent scores count as 0.
pub fn recommendation_label(score: Option<i32>) -> Recommendation {
    match score.unwrap_or(0) {
        s if s >= 7 => Recommendation::Recommended,
        s if s >= 5 => Recommendation::MixedFeelings,
        _ => Recommendation::NotRecommended,
    }
}

/// `05 Nov 2024`
pub fn format_review_date(at: OffsetDateTime) -> String {
    let fmt = format_description!("[day] [month repr:short] [year]");
    at.format(&fmt).unwrap_or_else(|_| at.date().to_string())
}

/// Stored title, else the remote title, else [`UNKNOWN_TITLE`].
pub async fn resolve_movie_title(state: &AppState, movie_id: i64, local: Option<String>) -> String {
    if let Some(title) = local.filter(|t| !t.trim().is_empty()) {
        return title;
    }
    match state.catalog.movie(movie_id).await {
        Ok(details) => details.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        Err(e) => {
            debug!(error = %e, movie_id, "remote title lookup failed");
            UNKNOWN_TITLE.to_string()
        }
    }
}
