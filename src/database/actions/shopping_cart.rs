use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::{CartIngredientRow, Recipe, ShoppingListLine, Uuid},
    toggle::{self, SHOPPING_CART},
    SHOPPING_LIST_FILENAME,
};

use super::recipes::get_recipe;

pub async fn is_in_shopping_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM shopping_cart WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn add_to_shopping_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool).await?.ok_or_else(|| {
        Error::NotFound(String::from("No recipe exists with the given id"))
    })?;

    toggle::add(&SHOPPING_CART, user_id, id, pool).await?;

    Ok(recipe)
}

pub async fn remove_from_shopping_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    toggle::remove(&SHOPPING_CART, user_id, id, pool).await
}

/// Walks the user's cart entries in insertion order and aggregates the
/// ingredient lines. An empty cart yields an empty list.
pub async fn build_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListLine>, Error> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        ORDER BY sc.id, ri.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(aggregate_cart_rows(rows))
}

/// Groups by (name, measurement_unit) and sums amounts, preserving the
/// first-seen order of each group. Ingredients sharing a name but not a
/// unit stay separate.
pub fn aggregate_cart_rows(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListLine> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut lines: Vec<ShoppingListLine> = Vec::new();

    for row in rows {
        let key = (row.name.clone(), row.measurement_unit.clone());
        match index.get(&key) {
            Some(&at) => lines[at].amount += row.amount as i64,
            None => {
                index.insert(key, lines.len());
                lines.push(ShoppingListLine {
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    amount: row.amount as i64,
                });
            }
        }
    }

    lines
}

pub fn render_shopping_list(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{} ({}) - {}\n", line.name, line.measurement_unit, line.amount))
        .collect()
}

/// Reply for `GET /recipes/download_shopping_cart`.
pub fn shopping_list_attachment(text: String) -> impl warp::Reply {
    warp::reply::with_header(
        warp::reply::with_header(text, "Content-Type", "text/plain; charset=utf-8"),
        "Content-Disposition",
        format!("attachment; filename={SHOPPING_LIST_FILENAME}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn amounts_sum_within_a_group() {
        let lines = aggregate_cart_rows(vec![row("Salt", "g", 5), row("Salt", "g", 3)]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].amount, 8);
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let lines = aggregate_cart_rows(vec![row("Sugar", "g", 100), row("Sugar", "kg", 1)]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].measurement_unit, "g");
        assert_eq!(lines[1].measurement_unit, "kg");
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let lines = aggregate_cart_rows(vec![
            row("Flour", "g", 200),
            row("Egg", "pcs", 2),
            row("Flour", "g", 100),
        ]);
        assert_eq!(
            lines,
            vec![
                ShoppingListLine {
                    name: String::from("Flour"),
                    measurement_unit: String::from("g"),
                    amount: 300,
                },
                ShoppingListLine {
                    name: String::from("Egg"),
                    measurement_unit: String::from("pcs"),
                    amount: 2,
                },
            ]
        );
    }

    #[test]
    fn empty_cart_yields_no_lines() {
        assert!(aggregate_cart_rows(vec![]).is_empty());
        assert_eq!(render_shopping_list(&[]), "");
    }

    #[test]
    fn lines_render_name_unit_and_total() {
        let lines = aggregate_cart_rows(vec![
            row("Flour", "g", 200),
            row("Egg", "pcs", 2),
            row("Flour", "g", 100),
        ]);
        assert_eq!(
            render_shopping_list(&lines),
            "Flour (g) - 300\nEgg (pcs) - 2\n"
        );
    }
}
