pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 10;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

pub const SESSION_KEY: &[u8] = b"secret";
