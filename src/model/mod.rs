//! Domain model

pub mod drink;

pub use drink::{
    seed_drinks, validate_title, Drink, DrinkLong, DrinkShort, Ingredient, ModelError, NewDrink,
    Recipe, RecipeInput, ShortIngredient,
};
