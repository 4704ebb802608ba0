//! Drink records and their projections
//!
//! A drink's recipe is persisted as serialized JSON: an array of
//! ingredients. The short projection hides ingredient names and is what the
//! public menu shows; the long projection is the full recipe.

use serde::{Deserialize, Serialize};

/// Longest accepted drink title
pub const MAX_TITLE_LEN: usize = 80;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid title: {0}")]
    InvalidTitle(String),

    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),
}

/// One part of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Ingredient with its name redacted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

impl From<&Ingredient> for ShortIngredient {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            color: ingredient.color.clone(),
            parts: ingredient.parts,
        }
    }
}

/// A validated, non-empty list of ingredients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe(Vec<Ingredient>);

impl Recipe {
    pub fn new(ingredients: Vec<Ingredient>) -> Result<Self, ModelError> {
        if ingredients.is_empty() {
            return Err(ModelError::InvalidRecipe(
                "recipe needs at least one ingredient".into(),
            ));
        }
        Ok(Self(ingredients))
    }

    /// Parse a persisted recipe
    pub fn from_json(serialized: &str) -> Result<Self, ModelError> {
        let input: RecipeInput = serde_json::from_str(serialized)
            .map_err(|e| ModelError::InvalidRecipe(e.to_string()))?;
        match input {
            RecipeInput::Serialized(_) => Err(ModelError::InvalidRecipe(
                "recipe is a doubly encoded string".into(),
            )),
            other => other.into_recipe(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.0
    }
}

/// Recipe as a client may send it
///
/// A string is taken to be recipe JSON that is already serialized.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Serialized(String),
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl RecipeInput {
    pub fn into_recipe(self) -> Result<Recipe, ModelError> {
        match self {
            RecipeInput::Serialized(json) => Recipe::from_json(&json),
            RecipeInput::Many(ingredients) => Recipe::new(ingredients),
            RecipeInput::One(ingredient) => Recipe::new(vec![ingredient]),
        }
    }
}

/// Trim and bound a drink title
pub fn validate_title(title: &str) -> Result<String, ModelError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ModelError::InvalidTitle("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ModelError::InvalidTitle(format!(
            "title longer than {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

/// Persisted drink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    /// Serialized [`Recipe`]
    pub recipe: String,
}

/// Drink about to be inserted; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: String,
}

impl NewDrink {
    pub fn new(title: &str, recipe: RecipeInput) -> Result<Self, ModelError> {
        Ok(Self {
            title: validate_title(title)?,
            recipe: recipe.into_recipe()?.to_json(),
        })
    }

    pub fn with_id(self, id: i64) -> Drink {
        Drink {
            id,
            title: self.title,
            recipe: self.recipe,
        }
    }
}

/// Public menu view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkShort {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

/// Full view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkLong {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    pub fn parsed_recipe(&self) -> Result<Recipe, ModelError> {
        Recipe::from_json(&self.recipe)
    }

    pub fn short(&self) -> Result<DrinkShort, ModelError> {
        let recipe = self.parsed_recipe()?;
        Ok(DrinkShort {
            id: self.id,
            title: self.title.clone(),
            recipe: recipe.ingredients().iter().map(ShortIngredient::from).collect(),
        })
    }

    pub fn long(&self) -> Result<DrinkLong, ModelError> {
        let recipe = self.parsed_recipe()?;
        Ok(DrinkLong {
            id: self.id,
            title: self.title.clone(),
            recipe: recipe.0,
        })
    }

    /// Apply a partial update; fields left `None` are kept
    pub fn apply(
        &mut self,
        title: Option<&str>,
        recipe: Option<RecipeInput>,
    ) -> Result<(), ModelError> {
        let title = title.map(validate_title).transpose()?;
        let recipe = recipe.map(RecipeInput::into_recipe).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(recipe) = recipe {
            self.recipe = recipe.to_json();
        }
        Ok(())
    }
}

/// The sample menu written on reset
pub fn seed_drinks() -> Vec<NewDrink> {
    vec![NewDrink {
        title: "water".to_string(),
        recipe: r#"[{"name":"water","color":"blue","parts":1}]"#.to_string(),
    }]
}
