use serde::{Deserialize, Serialize};

use crate::catalog::{RemoteMovie, RemoteMovieDetails};
use crate::movies::repo_types::{Genre, Movie};

#[derive(Debug, Deserialize)]
pub struct MovieSearchQuery {
    #[serde(default)]
    pub query: Option<String>,
}

/// Compact movie shape used by recommendation and curated lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub id: i64,
    pub title: Option<String>,
    pub poster_path: Option<String>,
}

impl From<RemoteMovie> for MovieCard {
    fn from(m: RemoteMovie) -> Self {
        Self {
            id: m.id,
            title: m.title,
            poster_path: m.poster_path,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductionCompanyName {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub genres: Vec<Genre>,
    pub overview: Option<String>,
    pub production_companies: ProductionCompanyName,
    pub runtime: Option<i32>,
    pub status: Option<String>,
    /// One decimal, e.g. `"8.7"`.
    pub vote_average: Option<String>,
}

pub fn format_vote(vote: Option<f64>) -> Option<String> {
    vote.map(|v| format!("{:.1}", v))
}

impl MovieDetails {
    /// `overview` replaces the remote overview (it is usually a translation of it).
    pub fn from_remote(details: RemoteMovieDetails, overview: Option<String>) -> Self {
        let production = details
            .production_companies
            .into_iter()
            .next()
            .map(|c| c.name);
        Self {
            id: details.id,
            title: details.title,
            poster_path: details.poster_path,
            release_date: details.release_date,
            genres: details.genres.into_iter().map(Genre::from).collect(),
            overview,
            production_companies: ProductionCompanyName { name: production },
            runtime: details.runtime,
            status: details.status,
            vote_average: format_vote(details.vote_average),
        }
    }

    pub fn from_local(movie: Movie, genres: Vec<Genre>) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            poster_path: movie.poster_path,
            release_date: movie.release_date,
            genres,
            overview: movie.overview,
            production_companies: ProductionCompanyName {
                name: movie.production_name,
            },
            runtime: movie.runtime,
            status: movie.status,
            vote_average: format_vote(movie.vote_average),
        }
    }
}

/// Body of `POST /movies`; `id` is the remote catalog id.
#[derive(Debug, Default, Deserialize)]
pub struct MovieInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub production_name: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    /// Genre ids to link; `None` leaves the links untouched on update.
    #[serde(default)]
    pub genres: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct MovieWithGenres {
    #[serde(flatten)]
    pub movie: Movie,
    pub genres: Vec<Genre>,
}
