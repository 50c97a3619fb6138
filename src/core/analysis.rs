use serde::{Deserialize, Serialize};

use crate::core::ingredient::Ingredient;

/// Raw output of the inference service, as received.
///
/// Ingredients are kept as untyped JSON so that one malformed entry can be
/// dropped on its own instead of failing the whole response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub is_food: bool,

    #[serde(default)]
    pub food_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub ingredients: Vec<serde_json::Value>,
}

impl ApiResponse {
    /// A food response built from already-typed ingredients
    pub fn food(food_name: impl Into<String>, ingredients: &[Ingredient]) -> Self {
        Self {
            is_food: true,
            food_name: food_name.into(),
            description: None,
            ingredients: ingredients
                .iter()
                .filter_map(|i| serde_json::to_value(i).ok())
                .collect(),
        }
    }

    /// A "not food" response carrying the model's description
    pub fn not_food(description: impl Into<String>) -> Self {
        Self {
            is_food: false,
            food_name: String::new(),
            description: Some(description.into()),
            ingredients: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A food analysis whose ingredients passed validation.
///
/// This is the unit the reconciliation engine works on; it is copied,
/// never mutated, by each correction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodAnalysis {
    pub food_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub ingredients: Vec<Ingredient>,
}

impl FoodAnalysis {
    pub fn new(food_name: impl Into<String>, ingredients: Vec<Ingredient>) -> Self {
        Self {
            food_name: food_name.into(),
            description: None,
            ingredients,
        }
    }

    /// Sum of all ingredient amounts (g and ml counted alike)
    #[must_use]
    pub fn total_amount(&self) -> f64 {
        self.ingredients.iter().map(|i| i.amount).sum()
    }
}
