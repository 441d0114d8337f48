use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::Uuid,
};

/// One (user, target) relation kind managed through idempotent add/remove.
/// The uniqueness constraint on the table is the actual race guard; the
/// service never pre-reads to decide whether an insert will succeed.
pub struct ToggleRelation {
    pub table: &'static str,
    pub user_column: &'static str,
    pub target_column: &'static str,
    pub already_exists: &'static str,
    pub not_found: &'static str,
}

pub const FAVORITES: ToggleRelation = ToggleRelation {
    table: "favorites",
    user_column: "user_id",
    target_column: "recipe_id",
    already_exists: "Recipe is already in favorites",
    not_found: "Recipe is not in favorites",
};

pub const SHOPPING_CART: ToggleRelation = ToggleRelation {
    table: "shopping_cart",
    user_column: "user_id",
    target_column: "recipe_id",
    already_exists: "Recipe is already in the shopping cart",
    not_found: "Recipe is not in the shopping cart",
};

pub const FOLLOWS: ToggleRelation = ToggleRelation {
    table: "follows",
    user_column: "user_id",
    target_column: "author_id",
    already_exists: "Already subscribed to this user",
    not_found: "Not subscribed to this user",
};

pub async fn add(
    relation: &ToggleRelation,
    user_id: Uuid,
    target_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let query = format!(
        "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        relation.table, relation.user_column, relation.target_column
    );

    let result = sqlx::query(&query)
        .bind(user_id)
        .bind(target_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::AlreadyExists(relation.already_exists.to_string()));
    }

    Ok(())
}

pub async fn remove(
    relation: &ToggleRelation,
    user_id: Uuid,
    target_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let query = format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
        relation.table, relation.user_column, relation.target_column
    );

    let result = sqlx::query(&query)
        .bind(user_id)
        .bind(target_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::NotFound(relation.not_found.to_string()));
    }

    Ok(())
}
