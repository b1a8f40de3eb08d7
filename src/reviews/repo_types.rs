use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: i64,
    pub body: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Review joined with its author, the cached movie title and the author's watchlist score.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: i64,
    pub body: Option<String>,
    pub created_at: OffsetDateTime,
    pub user_name: String,
    pub user_pfp: Option<String>,
    pub movie_title: Option<String>,
    /// Score of the author's earliest watchlist entry for the same movie.
    pub score: Option<i32>,
}
