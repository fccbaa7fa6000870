use sqlx::PgPool;

use crate::models::Consumer;

pub async fn create(pool: &PgPool, name: &str, token_hash: &str) -> Result<Consumer, sqlx::Error> {
    sqlx::query_as::<_, Consumer>(
        "INSERT INTO consumers (name, token_hash) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(token_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_token_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<Consumer>, sqlx::Error> {
    sqlx::query_as::<_, Consumer>("SELECT * FROM consumers WHERE token_hash = $1")
        .bind(token_hash)
        .fetch_optional(pool)
        .await
}
