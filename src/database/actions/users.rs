use sqlx::{Pool, Postgres};

use crate::{
    error::{is_unique_violation, Error, QueryError},
    schema::{User, Uuid},
};

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Creates the profile row only. Credentials live with the identity
/// provider, not in this store.
pub async fn create_user(
    pool: &Pool<Postgres>,
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
) -> Result<i32, Error> {
    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    ",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(&*pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::AlreadyExists(String::from(
                "A user with the same email or username already exists",
            ))
        } else {
            QueryError::from(e).into()
        }
    })?;

    Ok(id.0)
}

/// Deleting a user cascades their favorites, cart entries and follows;
/// their recipes survive with a null author.
pub async fn delete_user(pool: &Pool<Postgres>, user_id: Uuid) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::NotFound(String::from(
            "No user exists with the given id",
        )));
    }

    Ok(())
}
