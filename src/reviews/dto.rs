use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reviews::{
    repo_types::ReviewRow,
    services::{format_review_date, recommendation_label, Recommendation},
};

#[derive(Debug, Default, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResource {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: i64,
    pub body: Option<String>,
    pub user_name: String,
    pub user_pfp: Option<String>,
    pub movie_title: String,
    pub date: String,
    pub recommendation_message: Recommendation,
}

impl ReviewResource {
    pub fn new(row: ReviewRow, movie_title: String, user_pfp: Option<String>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            movie_id: row.movie_id,
            body: row.body,
            user_name: row.user_name,
            user_pfp,
            movie_title,
            date: format_review_date(row.created_at),
            recommendation_message: recommendation_label(row.score),
        }
    }
}

pub const REVIEW_PLACEHOLDER: &str = "type your review here";

/// The caller's review of a movie, or the placeholder text when there is none yet.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserReview {
    Found(ReviewResource),
    Placeholder(&'static str),
}
