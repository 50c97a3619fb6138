use serde::{Deserialize, Serialize};

use crate::core::types::Nutrition;

/// Unique identifier for a food in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoodId(pub String);

impl FoodId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for FoodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A known food in the reference catalog.
///
/// Nutrition is absolute for the whole recorded serving of `unit_weight`
/// grams (or millilitres), for dishes and raw ingredients alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceFood {
    /// Unique identifier
    pub id: FoodId,

    /// Name as the inference service is expected to emit it
    pub name: String,

    /// Weight (g) or volume (ml) of the recorded serving
    pub unit_weight: f64,

    /// Nutrition for the whole serving
    pub nutrition: Nutrition,

    /// Free-form notes about the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReferenceFood {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_weight: f64,
        nutrition: Nutrition,
    ) -> Self {
        Self {
            id: FoodId::new(id),
            name: name.into(),
            unit_weight,
            nutrition,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Nutrition scaled to 100 units (`nutrition * 100 / unit_weight`).
    ///
    /// Returns `None` when the serving size is zero, negative or not a
    /// number, since no density can be derived from it.
    #[must_use]
    pub fn per_100_units(&self) -> Option<Nutrition> {
        if !self.unit_weight.is_finite() || self.unit_weight <= 0.0 {
            return None;
        }
        let density = self.nutrition.scaled(100.0 / self.unit_weight);
        density.is_finite().then_some(density)
    }

    /// Nutrition for an arbitrary amount of this food
    #[must_use]
    pub fn nutrition_for_amount(&self, amount: f64) -> Option<Nutrition> {
        self.per_100_units().map(|d| d.scaled(amount / 100.0))
    }
}
