use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use super::error::Error;
use super::schema::{IngredientAmount, NewRecipe, Uuid};

pub type FormData = HashMap<String, Value>;

pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, Error>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| Error::Validation(format!("Invalid value for {key}"))),
            None => Err(Error::Validation(format!("Missing field {key}"))),
        }
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(Value::Number(n)) => n
                .to_string()
                .parse()
                .map_err(|_e| Error::Validation(format!("Invalid number for {key}"))),
            Some(Value::String(s)) => s
                .parse()
                .map_err(|_e| Error::Validation(format!("Invalid number for {key}"))),
            Some(_) => Err(Error::Validation(format!("Invalid number for {key}"))),
            None => Err(Error::Validation(format!("Missing field {key}"))),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, Error> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(Error::Validation(format!("Invalid value for {key}"))),
            },
            None => Err(Error::Validation(format!("Missing field {key}"))),
        }
    }

    pub fn raw(&self, key: &str) -> Result<&Value, Error> {
        self.inner
            .get(key)
            .ok_or_else(|| Error::Validation(format!("Missing field {key}")))
    }
}

/// Parses and validates a recipe payload. The image field is expected to be
/// an already-stored path; data URIs are resolved by the media boundary
/// before the form reaches this point.
pub fn parse_recipe_form(form: &Form) -> Result<NewRecipe, Error> {
    let recipe = NewRecipe {
        name: form.get_str("name")?,
        image: form.get_str("image")?,
        text: form.get_str("text")?,
        cooking_time: form.get_number("cooking_time")?,
        ingredients: parse_ingredient_list(form.raw("ingredients")?)?,
        tags: parse_id_list(form.raw("tags")?)?,
    };
    recipe.validate()?;

    Ok(recipe)
}

fn parse_ingredient_list(value: &Value) -> Result<Vec<IngredientAmount>, Error> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::Validation(String::from("Ingredients must be a list")))?;

    items
        .iter()
        .map(|item| {
            let id = item.get("id").and_then(Value::as_i64).ok_or_else(|| {
                Error::Validation(String::from("Ingredient id must be a number"))
            })?;
            let amount = item
                .get("amount")
                .and_then(|v| match v {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.parse().ok(),
                    _ => None,
                })
                .ok_or_else(|| {
                    Error::Validation(String::from("Ingredient amount must be a number"))
                })?;

            Ok(IngredientAmount {
                id: id as Uuid,
                amount: amount as i32,
            })
        })
        .collect()
}

fn parse_id_list(value: &Value) -> Result<Vec<Uuid>, Error> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::Validation(String::from("Tags must be a list")))?;

    items
        .iter()
        .map(|item| {
            item.as_i64()
                .map(|id| id as Uuid)
                .ok_or_else(|| Error::Validation(String::from("Tag id must be a number")))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeFilter {
    None,
    Author(Uuid),
    Favorited,
    InShoppingCart,
}

#[derive(Debug, Clone)]
pub struct RecipeQuery {
    pub filter: RecipeFilter,
    pub tags: Vec<String>,
    pub offset: i64,
}

/// A membership filter triggers only when the parameter is present AND
/// truthy; `is_favorited=0` is ignored.
fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl RecipeQuery {
    pub fn from_params(params: &[(String, String)]) -> Result<Self, Error> {
        let mut filter = RecipeFilter::None;
        let mut tags = vec![];
        let mut offset: i64 = 0;

        for (key, value) in params {
            match key.as_str() {
                "tags" => tags.push(value.clone()),
                "offset" => {
                    offset = value
                        .parse()
                        .map_err(|_e| Error::Validation(String::from("Offset must be a number")))?;
                }
                "author" => {
                    let id = value.parse().map_err(|_e| {
                        Error::Validation(String::from("Author id must be a number"))
                    })?;
                    set_filter(&mut filter, RecipeFilter::Author(id))?;
                }
                "is_favorited" if is_truthy(value) => {
                    set_filter(&mut filter, RecipeFilter::Favorited)?;
                }
                "is_in_shopping_cart" if is_truthy(value) => {
                    set_filter(&mut filter, RecipeFilter::InShoppingCart)?;
                }
                _ => {}
            }
        }

        Ok(Self {
            filter,
            tags,
            offset: offset.max(0),
        })
    }
}

fn set_filter(slot: &mut RecipeFilter, filter: RecipeFilter) -> Result<(), Error> {
    if *slot != RecipeFilter::None {
        return Err(Error::Validation(String::from(
            "Recipe filters are mutually exclusive",
        )));
    }
    *slot = filter;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn recipe_form_parses_amounts_from_numbers_and_strings() {
        let data: FormData = [
            (String::from("name"), json!("Pancakes")),
            (String::from("image"), json!("recipe/images/p.png")),
            (String::from("text"), json!("Mix and fry")),
            (String::from("cooking_time"), json!("25")),
            (
                String::from("ingredients"),
                json!([{"id": 1, "amount": 200}, {"id": 2, "amount": "2"}]),
            ),
            (String::from("tags"), json!([1, 2])),
        ]
        .into_iter()
        .collect();

        let recipe = parse_recipe_form(&Form::from_data(data)).unwrap();
        assert_eq!(recipe.cooking_time, 25);
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[1].amount, 2);
        assert_eq!(recipe.tags, vec![1, 2]);
    }

    #[test]
    fn recipe_form_rejects_duplicate_ingredients() {
        let data: FormData = [
            (String::from("name"), json!("Pancakes")),
            (String::from("image"), json!("recipe/images/p.png")),
            (String::from("text"), json!("Mix and fry")),
            (String::from("cooking_time"), json!(25)),
            (
                String::from("ingredients"),
                json!([{"id": 1, "amount": 200}, {"id": 1, "amount": 100}]),
            ),
            (String::from("tags"), json!([])),
        ]
        .into_iter()
        .collect();

        assert!(matches!(
            parse_recipe_form(&Form::from_data(data)),
            Err(Error::DuplicateIngredient(_))
        ));
    }

    #[test]
    fn recipe_form_requires_every_field() {
        let data: FormData = [(String::from("name"), json!("Pancakes"))]
            .into_iter()
            .collect();
        assert!(matches!(
            parse_recipe_form(&Form::from_data(data)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn query_defaults_to_no_filter() {
        let query = RecipeQuery::from_params(&params(&[])).unwrap();
        assert_eq!(query.filter, RecipeFilter::None);
        assert!(query.tags.is_empty());
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn falsy_membership_parameter_is_ignored() {
        let query = RecipeQuery::from_params(&params(&[("is_favorited", "0")])).unwrap();
        assert_eq!(query.filter, RecipeFilter::None);

        let query = RecipeQuery::from_params(&params(&[("is_favorited", "true")])).unwrap();
        assert_eq!(query.filter, RecipeFilter::Favorited);
    }

    #[test]
    fn membership_filters_are_mutually_exclusive() {
        let result = RecipeQuery::from_params(&params(&[
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "1"),
        ]));
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = RecipeQuery::from_params(&params(&[("author", "3"), ("is_favorited", "1")]));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn repeated_tags_accumulate() {
        let query = RecipeQuery::from_params(&params(&[
            ("tags", "breakfast"),
            ("tags", "dinner"),
            ("is_in_shopping_cart", "1"),
        ]))
        .unwrap();
        assert_eq!(query.tags, vec!["breakfast", "dinner"]);
        assert_eq!(query.filter, RecipeFilter::InShoppingCart);
    }

    #[test]
    fn author_filter_parses_the_id() {
        let query = RecipeQuery::from_params(&params(&[("author", "7")])).unwrap();
        assert_eq!(query.filter, RecipeFilter::Author(7));

        assert!(RecipeQuery::from_params(&params(&[("author", "x")])).is_err());
    }
}
