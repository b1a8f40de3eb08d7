use crate::auth::repo_types::{ProfileChanges, User};
use crate::db::contains_pattern;
use sqlx::PgPool;
use uuid::Uuid;

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, token, pfp, is_admin, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, token, pfp, is_admin, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Resolve the owner of a session token.
    pub async fn find_by_token(db: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, token, pfp, is_admin, created_at, updated_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, token, pfp, is_admin, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Replace (or clear, with `None`) the session token.
    pub async fn set_token(db: &PgPool, id: Uuid, token: Option<&str>) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET token = $2, updated_at = now() WHERE id = $1"#)
            .bind(id)
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        changes: ProfileChanges,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username      = COALESCE($2, username),
                   email         = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   pfp           = COALESCE($5, pfp),
                   updated_at    = now()
             WHERE id = $1
            RETURNING id, username, email, password_hash, token, pfp, is_admin, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.pfp)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn list_non_admin(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, token, pfp, is_admin, created_at, updated_at
            FROM users
            WHERE NOT is_admin
            ORDER BY created_at
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Users whose email or username contains `term`.
    pub async fn search(db: &PgPool, term: &str) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, token, pfp, is_admin, created_at, updated_at
            FROM users
            WHERE email ILIKE $1 ESCAPE '\' OR username ILIKE $1 ESCAPE '\'
            ORDER BY created_at
            "#,
        )
        .bind(contains_pattern(term))
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}
