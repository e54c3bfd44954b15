//! Recipe inputs read from disk: user preference profiles and pantry lists.

use mealwise_core::{
    MealwiseResult, PantryItem, StorageError, UserPreferences, ValidationError, NO_PREFERENCE,
};
use serde_json::Value;
use std::path::Path;

/// Pick user `index` from a `{"users": [{"good": .., "bad": ..}]}` document.
///
/// Missing or null fields fall back to [`NO_PREFERENCE`]; non-string values
/// are kept as their JSON text.
pub fn preferences_from_value(
    document: &Value,
    index: usize,
) -> Result<UserPreferences, ValidationError> {
    let users = document
        .get("users")
        .ok_or_else(|| ValidationError::RequiredFieldMissing {
            field: "users".to_string(),
        })?
        .as_array()
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "users".to_string(),
            reason: "not a list".to_string(),
        })?;

    let user = users.get(index).ok_or_else(|| ValidationError::InvalidValue {
        field: "users".to_string(),
        reason: format!("index {} out of range for {} users", index, users.len()),
    })?;

    Ok(UserPreferences {
        good: preference_field(user, "good"),
        bad: preference_field(user, "bad"),
    })
}

fn preference_field(user: &Value, key: &str) -> String {
    match user.get(key) {
        None | Some(Value::Null) => NO_PREFERENCE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Load a preference document and pick user `index`.
pub fn load_preferences(path: &Path, index: usize) -> MealwiseResult<UserPreferences> {
    let document = read_json(path)?;
    Ok(preferences_from_value(&document, index)?)
}

/// Load a pantry list: `[{"name": .., "count": ..}]`.
pub fn load_pantry(path: &Path) -> MealwiseResult<Vec<PantryItem>> {
    let document = read_json(path)?;
    serde_json::from_value(document).map_err(|e| {
        ValidationError::InvalidValue {
            field: "pantry".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn read_json(path: &Path) -> MealwiseResult<Value> {
    let contents = std::fs::read_to_string(path).map_err(|e| StorageError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        ValidationError::MalformedJson {
            reason: format!("{}: {}", path.display(), e),
        }
        .into()
    })
}
