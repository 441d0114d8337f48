use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    pagination::PageContext,
    schema::{SubscriptionProfile, SubscriptionRow, Uuid},
    toggle::{self, FOLLOWS},
    SUBSCRIPTION_COUNT_PER_PAGE,
};

use super::users::get_user_by_id;

/// Checked before any storage call; a self-follow never reaches the store.
pub fn ensure_not_self(user_id: Uuid, author_id: Uuid) -> Result<(), Error> {
    if user_id == author_id {
        return Err(Error::SelfReference(String::from(
            "Cannot subscribe to yourself",
        )));
    }

    Ok(())
}

pub async fn is_subscribed(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT author_id FROM follows WHERE user_id = $1 AND author_id = $2
    ",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn count_author_recipes(author_id: Uuid, pool: &Pool<Postgres>) -> Result<i64, Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.0)
}

pub async fn subscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionProfile, Error> {
    ensure_not_self(user_id, author_id)?;

    let author = get_user_by_id(pool, author_id).await?.ok_or_else(|| {
        Error::NotFound(String::from("No user exists with the given id"))
    })?;

    toggle::add(&FOLLOWS, user_id, author_id, pool).await?;

    let recipes_count = count_author_recipes(author_id, pool).await?;

    Ok(SubscriptionProfile {
        id: author.id,
        email: author.email,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
        recipes_count,
    })
}

pub async fn unsubscribe(user_id: Uuid, author_id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    toggle::remove(&FOLLOWS, user_id, author_id, pool).await
}

pub async fn fetch_subscriptions(
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionProfile>, Error> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as("
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            COUNT(uu) OVER() AS count
        FROM follows f
        INNER JOIN users u ON u.id = f.author_id
        LEFT JOIN users uu ON uu.id = u.id
        WHERE f.user_id = $1
        ORDER BY f.id
        LIMIT $2 OFFSET $3
    ")
        .bind(user_id)
        .bind(SUBSCRIPTION_COUNT_PER_PAGE)
        .bind(offset)
        .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let rows: Vec<SubscriptionProfile> = rows
        .into_iter()
        .map(|row| SubscriptionProfile::from(row))
        .collect();
    let page = PageContext::from_rows(rows, total_count, SUBSCRIPTION_COUNT_PER_PAGE, offset);

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_follow_is_rejected() {
        assert!(matches!(
            ensure_not_self(4, 4),
            Err(Error::SelfReference(_))
        ));
    }

    #[test]
    fn distinct_users_pass_the_precheck() {
        assert!(ensure_not_self(4, 5).is_ok());
    }
}
