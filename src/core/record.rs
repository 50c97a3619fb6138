use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::scale::{MAX_SERVINGS, MIN_SERVINGS};
use crate::core::reference::{FoodId, ReferenceFood};
use crate::core::types::{Amount, RoundedNutrition};

/// Amount of one ingredient line in a resolved record
#[derive(Debug, Clone, PartialEq)]
pub enum LineAmount {
    /// Structured per-serving amount. `servings` is set once the line has
    /// gone through quantity scaling and only affects display.
    Measured { original: Amount, servings: Option<u32> },
    /// Free text with no structured source; never rescaled
    Text(String),
}

impl LineAmount {
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Measured {
                original,
                servings: None,
            } => original.display(),
            Self::Measured {
                original,
                servings: Some(q),
            } => original.display_scaled(*q),
            Self::Text(s) => s.clone(),
        }
    }

    #[must_use]
    pub fn original(&self) -> Option<Amount> {
        match self {
            Self::Measured { original, .. } => Some(*original),
            Self::Text(_) => None,
        }
    }
}

/// One ingredient of a resolved record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "IngredientLineWire", try_from = "IngredientLineWire")]
pub struct IngredientLine {
    pub name: String,
    pub amount: LineAmount,
}

impl IngredientLine {
    pub fn measured(name: impl Into<String>, amount: Amount) -> Self {
        Self {
            name: name.into(),
            amount: LineAmount::Measured {
                original: amount,
                servings: None,
            },
        }
    }

    pub fn text(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: LineAmount::Text(amount.into()),
        }
    }
}

/// Serialized form: the display string next to the structured original.
/// The string is written for readers and is never parsed back.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngredientLineWire {
    name: String,
    amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    servings: Option<u32>,
}

impl From<IngredientLine> for IngredientLineWire {
    fn from(line: IngredientLine) -> Self {
        let amount = line.amount.display();
        match line.amount {
            LineAmount::Measured { original, servings } => Self {
                name: line.name,
                amount,
                original_amount: Some(original),
                servings,
            },
            LineAmount::Text(_) => Self {
                name: line.name,
                amount,
                original_amount: None,
                servings: None,
            },
        }
    }
}

impl TryFrom<IngredientLineWire> for IngredientLine {
    type Error = String;

    fn try_from(wire: IngredientLineWire) -> Result<Self, Self::Error> {
        if let Some(servings) = wire.servings {
            if !(MIN_SERVINGS..=MAX_SERVINGS).contains(&servings) {
                return Err(format!(
                    "servings for '{}' must be between {MIN_SERVINGS} and {MAX_SERVINGS}, got {servings}",
                    wire.name
                ));
            }
        }
        let amount = match wire.original_amount {
            Some(original) => LineAmount::Measured {
                original,
                servings: wire.servings,
            },
            None => LineAmount::Text(wire.amount),
        };
        Ok(Self {
            name: wire.name,
            amount,
        })
    }
}

/// Link from a record to the completed food its totals came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub id: FoodId,
    pub name: String,
}

impl From<&ReferenceFood> for ReferenceLink {
    fn from(food: &ReferenceFood) -> Self {
        Self {
            id: food.id.clone(),
            name: food.name.clone(),
        }
    }
}

/// A resolved nutrition record: the unit of display and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionData {
    pub food_name: String,
    pub ingredients: Vec<IngredientLine>,
    pub nutrition: RoundedNutrition,

    /// Catalog entry the totals were taken from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceLink>,
}

impl NutritionData {
    /// Flatten into the shape the log store persists
    pub fn to_log_entry(
        &self,
        user_id: impl Into<String>,
        logged_at: DateTime<Utc>,
        image_url: Option<String>,
    ) -> FoodLogEntry {
        FoodLogEntry {
            user_id: user_id.into(),
            food_name: self.food_name.clone(),
            calories: self.nutrition.calories,
            protein: self.nutrition.protein,
            fat: self.nutrition.fat,
            carbs: self.nutrition.carbs,
            logged_at,
            image_url,
        }
    }
}

/// Flattened, primitive-only form of a record for the food log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLogEntry {
    pub user_id: String,
    pub food_name: String,
    pub calories: u32,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub logged_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
