use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, ProductConfig};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<ProductConfig, sqlx::Error> {
    let product = sqlx::query_as(
        "INSERT INTO products (name, winner_count, dividend_rate) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(product.name)
    .bind(product.winner_count)
    .bind(product.dividend_rate)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<ProductConfig>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}
