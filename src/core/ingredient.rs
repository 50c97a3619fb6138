use serde::{Deserialize, Serialize};

use crate::core::types::{Amount, Nutrition, Unit};

/// A validated ingredient from the inference service.
///
/// `nutrition_per_100g` is a density per 100 units of `unit` (grams or
/// millilitres alike).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: Unit,
    pub nutrition_per_100g: Nutrition,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: f64, unit: Unit, nutrition_per_100g: Nutrition) -> Self {
        Self {
            name: name.into(),
            amount,
            unit,
            nutrition_per_100g,
        }
    }

    #[must_use]
    pub fn quantity(&self) -> Amount {
        Amount::new(self.amount, self.unit)
    }

    /// Absolute nutrition contributed by this ingredient (`per100 * amount / 100`)
    #[must_use]
    pub fn contribution(&self) -> Nutrition {
        self.nutrition_per_100g.scaled(self.amount / 100.0)
    }

    /// Same ingredient with a different density
    #[must_use]
    pub fn with_density(&self, nutrition_per_100g: Nutrition) -> Self {
        Self {
            nutrition_per_100g,
            ..self.clone()
        }
    }
}
