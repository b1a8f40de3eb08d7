use serde::{Deserialize, Serialize};

use crate::watchlists::repo_types::WatchlistEntry;

/// Body of `POST /watchlists` and `PATCH /watchlists/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct WatchlistRequest {
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub status_id: Option<i32>,
    #[serde(default)]
    pub score: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct StatusGroup {
    pub status_id: i32,
    pub count: usize,
    pub movies: Vec<WatchlistEntry>,
}

/// Groups entries by status, groups ordered by first appearance.
pub fn group_by_status(entries: Vec<WatchlistEntry>) -> Vec<StatusGroup> {
    let mut groups: Vec<StatusGroup> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|g| g.status_id == entry.status_id) {
            Some(group) => {
                group.count += 1;
                group.movies.push(entry);
            }
            None => groups.push(StatusGroup {
                status_id: entry.status_id,
                count: 1,
                movies: vec![entry],
            }),
        }
    }
    groups
}
