use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::catalog::{RemoteGenre, RemoteMovie};

/// Locally stored movie. Every descriptive column may be empty for placeholder rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub runtime: Option<i32>,
    pub status: Option<String>,
    pub vote_average: Option<f64>,
    pub production_name: Option<String>,
    pub duration: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Search result row, local or remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MovieSummary {
    pub id: i64,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
}

impl From<RemoteMovie> for MovieSummary {
    fn from(m: RemoteMovie) -> Self {
        Self {
            id: m.id,
            title: m.title,
            poster_path: m.poster_path,
            release_date: m.release_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

impl From<RemoteGenre> for Genre {
    fn from(g: RemoteGenre) -> Self {
        Self {
            id: g.id,
            name: g.name,
        }
    }
}
