use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::record::{IngredientLine, LineAmount, NutritionData};
use crate::core::types::{round_calories, round_one_decimal, Amount, NutrientField};

/// Smallest selectable serving count
pub const MIN_SERVINGS: u32 = 1;

/// Largest selectable serving count
pub const MAX_SERVINGS: u32 = 99;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("serving count must be between {MIN_SERVINGS} and {MAX_SERVINGS}, got {0}")]
    OutOfRange(i64),

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidNutrient { field: NutrientField, value: f64 },

    #[error("food name must not be empty")]
    EmptyName,

    #[error("ingredient lines disagree on servings ({0} vs {1})")]
    MixedServings(u32, u32),
}

/// A serving multiplier in `1..=99`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct ServingCount(u32);

impl ServingCount {
    pub const ONE: Self = Self(1);

    /// Validate a serving count
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::OutOfRange`] outside `1..=99`.
    pub fn new(count: i64) -> Result<Self, ScaleError> {
        u32::try_from(count)
            .ok()
            .filter(|c| (MIN_SERVINGS..=MAX_SERVINGS).contains(c))
            .map(Self)
            .ok_or(ScaleError::OutOfRange(count))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ServingCount {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<i64> for ServingCount {
    type Error = ScaleError;

    fn try_from(count: i64) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<ServingCount> for u32 {
    fn from(count: ServingCount) -> Self {
        count.0
    }
}

impl std::fmt::Display for ServingCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Servings a record's measured lines were already scaled to.
///
/// Unscaled lines count as one serving. A record without measured lines is
/// taken as a single serving.
///
/// # Errors
///
/// Returns [`ScaleError::OutOfRange`] for a line outside `1..=99` and
/// [`ScaleError::MixedServings`] when lines disagree.
pub fn record_servings(record: &NutritionData) -> Result<ServingCount, ScaleError> {
    let mut found: Option<ServingCount> = None;
    for line in &record.ingredients {
        if let LineAmount::Measured { servings, .. } = line.amount {
            let line_servings = ServingCount::new(i64::from(servings.unwrap_or(1)))?;
            match found {
                Some(q) if q != line_servings => {
                    return Err(ScaleError::MixedServings(q.get(), line_servings.get()));
                }
                _ => found = Some(line_servings),
            }
        }
    }
    Ok(found.unwrap_or(ServingCount::ONE))
}

/// Scale a record by `quantity`.
///
/// Nutrition is the record's rounded nutrition times `quantity`, rounded
/// again. Measured ingredient lines keep their original amount and display
/// at the composed serving count, so scaling a record already at `a`
/// servings by `b` matches scaling its single serving by `a * b`. Free-text
/// lines pass through.
///
/// # Errors
///
/// Returns [`ScaleError::OutOfRange`] when the composed serving count leaves
/// `1..=99`, or any error from [`record_servings`].
pub fn calculate_nutrition_by_quantity(
    record: &NutritionData,
    quantity: ServingCount,
) -> Result<NutritionData, ScaleError> {
    let base = record_servings(record)?;
    let total = ServingCount::new(i64::from(base.get()) * i64::from(quantity.get()))?;
    Ok(scale_record(record, quantity, total))
}

fn scale_record(record: &NutritionData, quantity: ServingCount, total: ServingCount) -> NutritionData {
    let q = f64::from(quantity.get());
    let nutrition = record.nutrition.as_nutrition().scaled(q).rounded();

    let ingredients = record
        .ingredients
        .iter()
        .map(|line| match &line.amount {
            LineAmount::Measured { original, .. } => IngredientLine {
                name: line.name.clone(),
                amount: LineAmount::Measured {
                    original: *original,
                    servings: Some(total.get()),
                },
            },
            LineAmount::Text(_) => line.clone(),
        })
        .collect();

    NutritionData {
        food_name: record.food_name.clone(),
        ingredients,
        nutrition,
        reference: record.reference.clone(),
    }
}

/// Fold displayed serving counts into the amounts, leaving every measured
/// line at one serving
fn bake_servings(record: &mut NutritionData) {
    for line in &mut record.ingredients {
        if let LineAmount::Measured { original, servings } = &line.amount {
            let q = f64::from(servings.unwrap_or(1));
            line.amount = LineAmount::Measured {
                original: Amount::new(original.value * q, original.unit),
                servings: None,
            };
        }
    }
}

/// Serving-count state for one displayed record.
///
/// The record passed in becomes the single serving: any serving count it
/// already carries is folded into its amounts. Quantity changes always
/// re-derive from that original.
/// Edits apply to what is displayed, detach the catalog link and become the
/// new original at quantity 1, so later quantity changes scale the edited
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingSession {
    original: NutritionData,
    quantity: ServingCount,
    current: NutritionData,
}

impl ServingSession {
    pub fn new(mut original: NutritionData) -> Self {
        bake_servings(&mut original);
        Self {
            current: original.clone(),
            original,
            quantity: ServingCount::ONE,
        }
    }

    pub fn original(&self) -> &NutritionData {
        &self.original
    }

    pub fn quantity(&self) -> ServingCount {
        self.quantity
    }

    pub fn current(&self) -> &NutritionData {
        &self.current
    }

    /// Show the record at `quantity` servings
    pub fn set_quantity(&mut self, quantity: ServingCount) -> &NutritionData {
        self.quantity = quantity;
        self.current = scale_record(&self.original, quantity, quantity);
        &self.current
    }

    /// Rename the displayed food
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::EmptyName`] when the trimmed name is empty.
    pub fn rename(&mut self, food_name: &str) -> Result<&NutritionData, ScaleError> {
        let food_name = food_name.trim();
        if food_name.is_empty() {
            return Err(ScaleError::EmptyName);
        }
        let mut edited = self.current.clone();
        edited.food_name = food_name.to_string();
        Ok(self.commit(edited))
    }

    /// Overwrite one displayed nutrient value
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::InvalidNutrient`] for negative or non-finite
    /// values.
    pub fn edit_nutrient(&mut self, field: NutrientField, value: f64) -> Result<&NutritionData, ScaleError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ScaleError::InvalidNutrient { field, value });
        }
        let mut edited = self.current.clone();
        match field {
            NutrientField::Calories => edited.nutrition.calories = round_calories(value),
            NutrientField::Protein => edited.nutrition.protein = round_one_decimal(value),
            NutrientField::Fat => edited.nutrition.fat = round_one_decimal(value),
            NutrientField::Carbs => edited.nutrition.carbs = round_one_decimal(value),
        }
        Ok(self.commit(edited))
    }

    fn commit(&mut self, mut edited: NutritionData) -> &NutritionData {
        edited.reference = None;
        // What was displayed becomes the new single serving
        bake_servings(&mut edited);
        debug!(food = %edited.food_name, "record edited, detached from catalog");

        self.original = edited.clone();
        self.current = edited;
        self.quantity = ServingCount::ONE;
        &self.current
    }
}
