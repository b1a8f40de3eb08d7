use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db::contains_pattern;
use crate::movies::dto::MovieInput;
use crate::movies::repo_types::{Genre, Movie, MovieSummary};

/// Local movies whose title contains `term`, case-insensitively, in storage order.
pub async fn search_by_title(db: &PgPool, term: &str) -> anyhow::Result<Vec<MovieSummary>> {
    let rows = sqlx::query_as::<_, MovieSummary>(
        r#"
        SELECT id, title, poster_path, release_date
          FROM movies
         WHERE title ILIKE $1 ESCAPE '\'
         ORDER BY created_at, id
        "#,
    )
    .bind(contains_pattern(term))
    .fetch_all(db)
    .await
    .context("search movies by title")?;
    Ok(rows)
}

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<MovieSummary>> {
    let rows = sqlx::query_as::<_, MovieSummary>(
        r#"
        SELECT id, title, poster_path, release_date
          FROM movies
         ORDER BY created_at, id
        "#,
    )
    .fetch_all(db)
    .await
    .context("list movies")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: i64) -> anyhow::Result<Option<Movie>> {
    let movie = sqlx::query_as::<_, Movie>(
        r#"
        SELECT id, title, poster_path, release_date, overview, runtime, status,
               vote_average, production_name, duration, created_at, updated_at
          FROM movies
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find movie")?;
    Ok(movie)
}

pub async fn exists(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let (exists,): (bool,) =
        sqlx::query_as(r#"SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1)"#)
            .bind(id)
            .fetch_one(db)
            .await
            .context("movie exists")?;
    Ok(exists)
}

/// Id-only row for a movie referenced before its details are stored.
pub async fn insert_placeholder(db: &PgPool, id: i64) -> anyhow::Result<()> {
    sqlx::query(r#"INSERT INTO movies (id) VALUES ($1) ON CONFLICT (id) DO NOTHING"#)
        .bind(id)
        .execute(db)
        .await
        .context("insert placeholder movie")?;
    Ok(())
}

pub async fn genres_of(db: &PgPool, movie_id: i64) -> anyhow::Result<Vec<Genre>> {
    let rows = sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.id, g.name
          FROM genres g
          JOIN movie_genres mg ON mg.genre_id = g.id
         WHERE mg.movie_id = $1
         ORDER BY g.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(db)
    .await
    .context("genres of movie")?;
    Ok(rows)
}

/// Ids from `ids` that are not in the genre table.
pub async fn unknown_genres(db: &PgPool, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        SELECT requested.id
          FROM UNNEST($1::BIGINT[]) AS requested(id)
         WHERE NOT EXISTS (SELECT 1 FROM genres g WHERE g.id = requested.id)
        "#,
    )
    .bind(ids)
    .fetch_all(db)
    .await
    .context("check genre ids")?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

async fn sync_genres_tx(
    tx: &mut Transaction<'_, Postgres>,
    movie_id: i64,
    genre_ids: &[i64],
) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM movie_genres WHERE movie_id = $1"#)
        .bind(movie_id)
        .execute(&mut **tx)
        .await
        .context("clear movie genres")?;
    sqlx::query(
        r#"
        INSERT INTO movie_genres (movie_id, genre_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(movie_id)
    .bind(genre_ids)
    .execute(&mut **tx)
    .await
    .context("link movie genres")?;
    Ok(())
}

pub async fn create(db: &PgPool, id: i64, input: &MovieInput) -> anyhow::Result<Movie> {
    let mut tx = db.begin().await.context("begin tx")?;
    let movie = sqlx::query_as::<_, Movie>(
        r#"
        INSERT INTO movies (id, title, poster_path, release_date, overview, runtime, status,
                            vote_average, production_name, duration)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, title, poster_path, release_date, overview, runtime, status,
                  vote_average, production_name, duration, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.poster_path)
    .bind(&input.release_date)
    .bind(&input.overview)
    .bind(input.runtime)
    .bind(&input.status)
    .bind(input.vote_average)
    .bind(&input.production_name)
    .bind(&input.duration)
    .fetch_one(&mut *tx)
    .await
    .context("insert movie")?;

    if let Some(genres) = &input.genres {
        sync_genres_tx(&mut tx, id, genres).await?;
    }
    tx.commit().await.context("commit tx")?;
    Ok(movie)
}

/// Overwrites the provided columns; `None` when the movie does not exist.
pub async fn update(db: &PgPool, id: i64, input: &MovieInput) -> anyhow::Result<Option<Movie>> {
    let mut tx = db.begin().await.context("begin tx")?;
    let movie = sqlx::query_as::<_, Movie>(
        r#"
        UPDATE movies
           SET title           = COALESCE($2, title),
               poster_path     = COALESCE($3, poster_path),
               release_date    = COALESCE($4, release_date),
               overview        = COALESCE($5, overview),
               runtime         = COALESCE($6, runtime),
               status          = COALESCE($7, status),
               vote_average    = COALESCE($8, vote_average),
               production_name = COALESCE($9, production_name),
               duration        = COALESCE($10, duration),
               updated_at      = now()
         WHERE id = $1
        RETURNING id, title, poster_path, release_date, overview, runtime, status,
                  vote_average, production_name, duration, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.poster_path)
    .bind(&input.release_date)
    .bind(&input.overview)
    .bind(input.runtime)
    .bind(&input.status)
    .bind(input.vote_average)
    .bind(&input.production_name)
    .bind(&input.duration)
    .fetch_optional(&mut *tx)
    .await
    .context("update movie")?;

    let Some(movie) = movie else {
        return Ok(None);
    };
    if let Some(genres) = &input.genres {
        sync_genres_tx(&mut tx, id, genres).await?;
    }
    tx.commit().await.context("commit tx")?;
    Ok(Some(movie))
}

/// Deletes the movie and, through cascades, its genre links, reviews and watchlist entries.
pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<Movie>> {
    let movie = sqlx::query_as::<_, Movie>(
        r#"
        DELETE FROM movies
         WHERE id = $1
        RETURNING id, title, poster_path, release_date, overview, runtime, status,
                  vote_average, production_name, duration, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("delete movie")?;
    Ok(movie)
}
