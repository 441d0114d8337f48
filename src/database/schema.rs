use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

pub type Uuid = i32;

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,

    pub count: i64,
}

/// One ingredient line of a recipe, joined with the ingredient identity.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredientRow {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetails {
    pub id: Uuid,
    pub author: Option<User>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub tags: Vec<Tag>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub recipes_count: i64,

    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes_count: i64,
}

impl From<SubscriptionRow> for SubscriptionProfile {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            is_subscribed: true,
            recipes_count: row.recipes_count,
        }
    }
}

/// HEX color code, `#` followed by six uppercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagColor(String);

impl TagColor {
    pub fn parse(value: &str) -> Result<Self, Error> {
        let digits = value.strip_prefix('#').ok_or_else(|| {
            Error::Validation(String::from("Color must be a HEX code like #AB01FF"))
        })?;

        if digits.len() != 6
            || !digits
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        {
            return Err(Error::Validation(String::from(
                "Color must be a HEX code like #AB01FF",
            )));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<Value> for TagColor {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => Self::parse(value),
            None => Err(Error::Validation(String::from(
                "Failed to parse value as string",
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Uuid>,
}

impl NewRecipe {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(String::from(
                "Recipe name must not be empty",
            )));
        }
        if self.cooking_time < 1 {
            return Err(Error::Validation(String::from(
                "Cooking time must be at least 1",
            )));
        }

        let mut seen: HashSet<Uuid> = HashSet::new();
        for part in &self.ingredients {
            if part.amount < 1 {
                return Err(Error::Validation(String::from(
                    "Ingredient amount must be at least 1",
                )));
            }
            if !seen.insert(part.id) {
                return Err(Error::DuplicateIngredient(String::from(
                    "The same ingredient is listed twice for the recipe",
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> NewRecipe {
        NewRecipe {
            name: String::from("Pancakes"),
            image: String::from("recipe/images/pancakes.png"),
            text: String::from("Mix and fry"),
            cooking_time: 20,
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 2 },
            ],
            tags: vec![1],
        }
    }

    #[test]
    fn valid_recipe_passes() {
        assert!(recipe().validate().is_ok());
    }

    #[test]
    fn zero_cooking_time_is_rejected() {
        let mut recipe = recipe();
        recipe.cooking_time = 0;
        assert!(matches!(recipe.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let mut recipe = recipe();
        recipe.ingredients[0].amount = 0;
        assert!(matches!(recipe.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn repeated_ingredient_id_is_rejected() {
        let mut recipe = recipe();
        recipe.ingredients[1].id = recipe.ingredients[0].id;
        assert!(matches!(
            recipe.validate(),
            Err(Error::DuplicateIngredient(_))
        ));
    }

    #[test]
    fn tag_color_accepts_uppercase_hex() {
        assert!(TagColor::parse("#AB01FF").is_ok());
        assert_eq!(TagColor::parse("#AB01FF").unwrap().as_str(), "#AB01FF");
    }

    #[test]
    fn tag_color_rejects_malformed_codes() {
        assert!(TagColor::parse("AB01FF").is_err());
        assert!(TagColor::parse("#ab01ff").is_err());
        assert!(TagColor::parse("#AB01F").is_err());
        assert!(TagColor::parse("#AB01FF0").is_err());
        assert!(TagColor::parse("#AB01FG").is_err());
    }
}
