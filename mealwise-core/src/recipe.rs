//! Recipe request and validated result types.

use serde::{Deserialize, Serialize};

/// An ingredient the user has on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PantryItem {
    pub name: String,
    pub count: u32,
}

impl PantryItem {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Placeholder used when a profile omits a preference field.
pub const NO_PREFERENCE: &str = "no information";

/// Food style preferences for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Styles and foods to favour
    pub good: String,
    /// Foods and ingredients to exclude
    pub bad: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            good: NO_PREFERENCE.to_string(),
            bad: NO_PREFERENCE.to_string(),
        }
    }
}

/// A recipe ingredient as declared by generated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub count: i64,
}

/// A generated recipe document that passed structural validation.
///
/// `document` is the full accepted JSON; `ingredients` is the typed view of
/// `recipe.ingredients` that validation guaranteed to be non-empty with
/// integral counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecipe {
    pub document: serde_json::Value,
    pub ingredients: Vec<RecipeIngredient>,
    /// 1-based attempt number that produced this document
    pub attempt: u32,
}

impl ValidatedRecipe {
    /// The recipe title, if the document carries one.
    pub fn name(&self) -> Option<&str> {
        self.document
            .get("recipe")
            .and_then(|r| r.get("name"))
            .and_then(|n| n.as_str())
    }
}
