use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{is_foreign_key_violation, is_unique_violation, Error, QueryError},
    form::{RecipeFilter, RecipeQuery},
    pagination::PageContext,
    schema::{NewRecipe, Recipe, RecipeDetails, RecipeIngredientRow, RecipeRow, Tag, Uuid},
    RECIPE_COUNT_PER_PAGE,
};

use super::{favorites, shopping_cart, users};

/// Lists recipes newest-first, applying at most one membership filter plus
/// an optional tag-slug filter. Anonymous viewers fall back to the
/// unfiltered listing when an identity-bound filter was requested.
pub async fn fetch_recipes(
    query: RecipeQuery,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let rows: Vec<RecipeRow> = match (&query.filter, viewer) {
        (RecipeFilter::Author(author_id), _) => {
            if users::get_user_by_id(pool, *author_id).await?.is_none() {
                return Err(Error::NotFound(String::from(
                    "No user exists with the given id",
                )));
            }

            if query.tags.is_empty() {
                sqlx::query_as("SELECT r.*, COUNT(rr) OVER() FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id WHERE r.author_id = $1 ORDER BY r.id DESC LIMIT $2 OFFSET $3")
                    .bind(author_id)
                    .bind(RECIPE_COUNT_PER_PAGE)
                    .bind(query.offset)
                    .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
            } else {
                sqlx::query_as("SELECT r.*, COUNT(rr) OVER() FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id WHERE r.author_id = $1 AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE t.slug = ANY($2)) ORDER BY r.id DESC LIMIT $3 OFFSET $4")
                    .bind(author_id)
                    .bind(&query.tags)
                    .bind(RECIPE_COUNT_PER_PAGE)
                    .bind(query.offset)
                    .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
            }
        }
        (RecipeFilter::Favorited, Some(user_id)) => {
            if query.tags.is_empty() {
                sqlx::query_as("SELECT r.*, COUNT(rr) OVER() FROM favorites f INNER JOIN recipes r ON r.id = f.recipe_id LEFT JOIN recipes rr ON rr.id = r.id WHERE f.user_id = $1 ORDER BY r.id DESC LIMIT $2 OFFSET $3")
                    .bind(user_id)
                    .bind(RECIPE_COUNT_PER_PAGE)
                    .bind(query.offset)
                    .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
            } else {
                sqlx::query_as("SELECT r.*, COUNT(rr) OVER() FROM favorites f INNER JOIN recipes r ON r.id = f.recipe_id LEFT JOIN recipes rr ON rr.id = r.id WHERE f.user_id = $1 AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE t.slug = ANY($2)) ORDER BY r.id DESC LIMIT $3 OFFSET $4")
                    .bind(user_id)
                    .bind(&query.tags)
                    .bind(RECIPE_COUNT_PER_PAGE)
                    .bind(query.offset)
                    .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
            }
        }
        (RecipeFilter::InShoppingCart, Some(user_id)) => {
            if query.tags.is_empty() {
                sqlx::query_as("SELECT r.*, COUNT(rr) OVER() FROM shopping_cart sc INNER JOIN recipes r ON r.id = sc.recipe_id LEFT JOIN recipes rr ON rr.id = r.id WHERE sc.user_id = $1 ORDER BY r.id DESC LIMIT $2 OFFSET $3")
                    .bind(user_id)
                    .bind(RECIPE_COUNT_PER_PAGE)
                    .bind(query.offset)
                    .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
            } else {
                sqlx::query_as("SELECT r.*, COUNT(rr) OVER() FROM shopping_cart sc INNER JOIN recipes r ON r.id = sc.recipe_id LEFT JOIN recipes rr ON rr.id = r.id WHERE sc.user_id = $1 AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE t.slug = ANY($2)) ORDER BY r.id DESC LIMIT $3 OFFSET $4")
                    .bind(user_id)
                    .bind(&query.tags)
                    .bind(RECIPE_COUNT_PER_PAGE)
                    .bind(query.offset)
                    .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
            }
        }
        _ => {
            if query.tags.is_empty() {
                sqlx::query_as("SELECT r.*, COUNT(rr) OVER() FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id ORDER BY r.id DESC LIMIT $1 OFFSET $2")
                    .bind(RECIPE_COUNT_PER_PAGE)
                    .bind(query.offset)
                    .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
            } else {
                sqlx::query_as("SELECT r.*, COUNT(rr) OVER() FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id WHERE r.id IN (SELECT rt.recipe_id FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE t.slug = ANY($1)) ORDER BY r.id DESC LIMIT $2 OFFSET $3")
                    .bind(&query.tags)
                    .bind(RECIPE_COUNT_PER_PAGE)
                    .bind(query.offset)
                    .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
            }
        }
    };

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, query.offset);
    Ok(page)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredientRow>, Error> {
    let rows: Vec<RecipeIngredientRow> = sqlx::query_as("
        SELECT ri.ingredient_id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
    ")
    .bind(recipe_id)
    .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let rows: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Creates the recipe row together with all of its ingredient and tag links
/// in one transaction. Nothing persists unless every row goes in.
pub async fn create_recipe(
    author_id: Uuid,
    recipe: NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<i32, Error> {
    recipe.validate()?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&recipe.name)
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    insert_recipe_links(id.0, &recipe, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(id.0)
}

/// Replaces the recipe fields and ALL of its junction rows; associations are
/// never merged with the previous set.
pub async fn update_recipe(
    recipe_id: Uuid,
    recipe: NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    recipe.validate()?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let result =
        sqlx::query("UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5")
            .bind(&recipe.name)
            .bind(&recipe.image)
            .bind(&recipe.text)
            .bind(recipe.cooking_time)
            .bind(recipe_id)
            .execute(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::NotFound(String::from(
            "No recipe exists with the given id",
        )));
    }

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    insert_recipe_links(recipe_id, &recipe, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}

async fn insert_recipe_links(
    recipe_id: i32,
    recipe: &NewRecipe,
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    for part in &recipe.ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(part.id)
        .bind(part.amount)
        .execute(&mut **tr)
        .await
        .map_err(|e| ingredient_link_error(e))?;
    }

    for tag_id in &recipe.tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tr)
            .await
            .map_err(|e| tag_link_error(e))?;
    }

    Ok(())
}

fn ingredient_link_error(error: sqlx::Error) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateIngredient(String::from(
            "The same ingredient is listed twice for the recipe",
        ))
    } else if is_foreign_key_violation(&error) {
        Error::Validation(String::from("No ingredient exists with the given id"))
    } else {
        QueryError::from(error).into()
    }
}

fn tag_link_error(error: sqlx::Error) -> Error {
    if is_unique_violation(&error) {
        Error::Validation(String::from("The same tag is listed twice for the recipe"))
    } else if is_foreign_key_violation(&error) {
        Error::Validation(String::from("No tag exists with the given id"))
    } else {
        QueryError::from(error).into()
    }
}

/// Junction rows, favorites and cart entries go with the recipe (cascade).
pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::NotFound(String::from(
            "No recipe exists with the given id",
        )));
    }

    Ok(())
}

/// View-model mapping for a single recipe. Membership flags are computed
/// for the viewer and stay false for anonymous requests.
pub async fn recipe_details(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetails, Error> {
    let recipe = get_recipe(id, pool).await?.ok_or_else(|| {
        Error::NotFound(String::from("No recipe exists with the given id"))
    })?;

    let ingredients = list_recipe_ingredients(id, pool).await?;
    let tags = list_recipe_tags(id, pool).await?;

    let author = match recipe.author_id {
        Some(author_id) => users::get_user_by_id(pool, author_id).await?,
        None => None,
    };

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(user_id) => (
            favorites::is_favorite(id, user_id, pool).await?,
            shopping_cart::is_in_shopping_cart(id, user_id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetails {
        id: recipe.id,
        author,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        ingredients,
        tags,
        is_favorited,
        is_in_shopping_cart,
    })
}
