use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::watchlists::repo_types::{Status, StatusCount, WatchlistEntry};

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<WatchlistEntry>> {
    let rows = sqlx::query_as::<_, WatchlistEntry>(
        r#"
        SELECT id, user_id, movie_id, status_id, score, created_at, updated_at
          FROM watchlists
         WHERE user_id = $1
         ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list watchlist")?;
    Ok(rows)
}

pub async fn list_by_status(
    db: &PgPool,
    user_id: Uuid,
    status_id: i32,
) -> anyhow::Result<Vec<WatchlistEntry>> {
    let rows = sqlx::query_as::<_, WatchlistEntry>(
        r#"
        SELECT id, user_id, movie_id, status_id, score, created_at, updated_at
          FROM watchlists
         WHERE user_id = $1 AND status_id = $2
         ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .bind(status_id)
    .fetch_all(db)
    .await
    .context("list watchlist by status")?;
    Ok(rows)
}

/// Movie ids in watchlist order, repeated ids included.
pub async fn movie_ids(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        SELECT movie_id
          FROM watchlists
         WHERE user_id = $1
         ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("watchlist movie ids")?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    movie_id: i64,
    status_id: i32,
    score: Option<i32>,
) -> anyhow::Result<WatchlistEntry> {
    let entry = sqlx::query_as::<_, WatchlistEntry>(
        r#"
        INSERT INTO watchlists (user_id, movie_id, status_id, score)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, movie_id, status_id, score, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(status_id)
    .bind(score)
    .fetch_one(db)
    .await
    .context("insert watchlist entry")?;
    Ok(entry)
}

pub async fn find_owned(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<WatchlistEntry>> {
    let entry = sqlx::query_as::<_, WatchlistEntry>(
        r#"
        SELECT id, user_id, movie_id, status_id, score, created_at, updated_at
          FROM watchlists
         WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find watchlist entry")?;
    Ok(entry)
}

/// Replaces movie, status and score. `None` when the entry is missing or foreign.
pub async fn update_owned(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    movie_id: i64,
    status_id: i32,
    score: Option<i32>,
) -> anyhow::Result<Option<WatchlistEntry>> {
    let entry = sqlx::query_as::<_, WatchlistEntry>(
        r#"
        UPDATE watchlists
           SET movie_id = $3, status_id = $4, score = $5, updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, movie_id, status_id, score, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(movie_id)
    .bind(status_id)
    .bind(score)
    .fetch_optional(db)
    .await
    .context("update watchlist entry")?;
    Ok(entry)
}

pub async fn delete_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM watchlists WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete watchlist entry")?;
    Ok(res.rows_affected() > 0)
}

/// Every status with the user's entry count, zero included.
pub async fn status_counts(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<StatusCount>> {
    let rows = sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT s.id, s.name, COUNT(w.id) AS count
          FROM statuses s
          LEFT JOIN watchlists w ON w.status_id = s.id AND w.user_id = $1
         GROUP BY s.id, s.name
         ORDER BY s.id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("watchlist status counts")?;
    Ok(rows)
}

pub async fn list_statuses(db: &PgPool) -> anyhow::Result<Vec<Status>> {
    let rows = sqlx::query_as::<_, Status>(r#"SELECT id, name FROM statuses ORDER BY id"#)
        .fetch_all(db)
        .await
        .context("list statuses")?;
    Ok(rows)
}
