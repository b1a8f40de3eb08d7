use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::reviews::repo_types::{Review, ReviewRow};

const REVIEW_ROWS: &str = r#"
    SELECT r.id, r.user_id, r.movie_id, r.body, r.created_at,
           u.username AS user_name,
           u.pfp      AS user_pfp,
           m.title    AS movie_title,
           (SELECT w.score
              FROM watchlists w
             WHERE w.user_id = r.user_id AND w.movie_id = r.movie_id
             ORDER BY w.created_at, w.id
             LIMIT 1) AS score
      FROM reviews r
      JOIN users u       ON u.id = r.user_id
      LEFT JOIN movies m ON m.id = r.movie_id
"#;

/// Every review, newest first.
pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<ReviewRow>> {
    let sql = format!("{REVIEW_ROWS} ORDER BY r.created_at DESC, r.id");
    let rows = sqlx::query_as::<_, ReviewRow>(&sql)
        .fetch_all(db)
        .await
        .context("list reviews")?;
    Ok(rows)
}

pub async fn list_for_movie(db: &PgPool, movie_id: i64) -> anyhow::Result<Vec<ReviewRow>> {
    let sql = format!("{REVIEW_ROWS} WHERE r.movie_id = $1 ORDER BY r.created_at DESC, r.id");
    let rows = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(movie_id)
        .fetch_all(db)
        .await
        .context("list movie reviews")?;
    Ok(rows)
}

pub async fn latest_for_movie(db: &PgPool, movie_id: i64) -> anyhow::Result<Option<ReviewRow>> {
    let sql = format!(
        "{REVIEW_ROWS} WHERE r.movie_id = $1 ORDER BY r.created_at DESC, r.id LIMIT 1"
    );
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(movie_id)
        .fetch_optional(db)
        .await
        .context("latest movie review")?;
    Ok(row)
}

/// The user's first review of the movie.
pub async fn find_for_user(
    db: &PgPool,
    user_id: Uuid,
    movie_id: i64,
) -> anyhow::Result<Option<ReviewRow>> {
    let sql = format!(
        "{REVIEW_ROWS} WHERE r.movie_id = $1 AND r.user_id = $2 ORDER BY r.created_at, r.id LIMIT 1"
    );
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(movie_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("find user review")?;
    Ok(row)
}

pub async fn find_row(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ReviewRow>> {
    let sql = format!("{REVIEW_ROWS} WHERE r.id = $1");
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find review")?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    movie_id: i64,
    body: Option<&str>,
) -> anyhow::Result<Review> {
    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (user_id, movie_id, body)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, movie_id, body, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(body)
    .fetch_one(db)
    .await
    .context("insert review")?;
    Ok(review)
}

/// `None` when the review does not exist or belongs to someone else.
pub async fn update_owned(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    body: &str,
) -> anyhow::Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(
        r#"
        UPDATE reviews
           SET body = $3, updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, movie_id, body, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(body)
    .fetch_optional(db)
    .await
    .context("update review")?;
    Ok(review)
}

pub async fn delete_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM reviews WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete review")?;
    Ok(res.rows_affected() > 0)
}
