use serde::{Deserialize, Serialize};

/// Row of a search, list, recommendation or discover result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMovie {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGenre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductionCompany {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteMovieDetails {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<RemoteGenre>,
    #[serde(default)]
    pub production_companies: Vec<ProductionCompany>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl RemoteMovieDetails {
    /// Details carrying only an id and genres.
    pub fn with_genres(id: i64, genres: Vec<RemoteGenre>) -> Self {
        Self {
            id,
            title: None,
            poster_path: None,
            release_date: None,
            overview: None,
            genres,
            production_companies: Vec::new(),
            runtime: None,
            status: None,
            vote_average: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    pub results: Vec<T>,
}

/// TMDB error body: `{"status_code": 34, "status_message": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    pub status_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieList {
    TopRated,
    Popular,
    Upcoming,
    NowPlaying,
}

impl MovieList {
    pub fn path(self) -> &'static str {
        match self {
            MovieList::TopRated => "/movie/top_rated",
            MovieList::Popular => "/movie/popular",
            MovieList::Upcoming => "/movie/upcoming",
            MovieList::NowPlaying => "/movie/now_playing",
        }
    }

    /// Parses the `/recs/{kind}` path segment.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "top-rated" => Some(MovieList::TopRated),
            "popular" => Some(MovieList::Popular),
            "upcoming" => Some(MovieList::Upcoming),
            "now-playing" => Some(MovieList::NowPlaying),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MovieList::TopRated => "Top rated",
            MovieList::Popular => "Popular",
            MovieList::Upcoming => "Upcoming",
            MovieList::NowPlaying => "Now Playing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_tolerate_missing_fields() {
        let body = r#"{"id": 333623, "genres": [{"id": 28, "name": "Action"}]}"#;
        let details: RemoteMovieDetails = serde_json::from_str(body).unwrap();
        assert_eq!(details.id, 333623);
        assert_eq!(details.genres.len(), 1);
        assert!(details.production_companies.is_empty());
        assert_eq!(details.vote_average, None);
    }

    #[test]
    fn null_poster_is_accepted() {
        let body = r#"{"results": [{"id": 1, "title": "A", "poster_path": null}]}"#;
        let page: Page<RemoteMovie> = serde_json::from_str(body).unwrap();
        assert_eq!(page.results[0].poster_path, None);
    }

    #[test]
    fn list_slugs() {
        assert_eq!(MovieList::from_slug("now-playing"), Some(MovieList::NowPlaying));
        assert_eq!(MovieList::from_slug("top-rated").map(MovieList::path), Some("/movie/top_rated"));
        assert_eq!(MovieList::from_slug("dynamic"), None);
    }
}
