use serde::{Deserialize, Serialize};

/// Round half-up to the nearest integer, never below zero
#[must_use]
pub fn round_calories(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Checked positive above
    {
        value.round() as u32
    }
}

/// Round to one decimal place, never below zero
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}

/// Unrounded nutrition values.
///
/// Depending on context these are absolute values (a whole serving or a
/// total) or a density per 100 units of an ingredient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl Nutrition {
    #[must_use]
    pub const fn new(calories: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            calories,
            protein,
            fat,
            carbs,
        }
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Multiply every field by `factor`
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            fat: self.fat * factor,
            carbs: self.carbs * factor,
        }
    }

    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            fat: self.fat + other.fat,
            carbs: self.carbs + other.carbs,
        }
    }

    #[must_use]
    pub fn get(&self, field: NutrientField) -> f64 {
        match field {
            NutrientField::Calories => self.calories,
            NutrientField::Protein => self.protein,
            NutrientField::Fat => self.fat,
            NutrientField::Carbs => self.carbs,
        }
    }

    pub fn set(&mut self, field: NutrientField, value: f64) {
        match field {
            NutrientField::Calories => self.calories = value,
            NutrientField::Protein => self.protein = value,
            NutrientField::Fat => self.fat = value,
            NutrientField::Carbs => self.carbs = value,
        }
    }

    /// True when every field is a finite number
    #[must_use]
    pub fn is_finite(&self) -> bool {
        NutrientField::ALL.iter().all(|f| self.get(*f).is_finite())
    }

    /// Round for display and persistence: integer calories, one-decimal macros
    #[must_use]
    pub fn rounded(&self) -> RoundedNutrition {
        RoundedNutrition {
            calories: round_calories(self.calories),
            protein: round_one_decimal(self.protein),
            fat: round_one_decimal(self.fat),
            carbs: round_one_decimal(self.carbs),
        }
    }
}

/// Nutrition as persisted and displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundedNutrition {
    pub calories: u32,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl RoundedNutrition {
    #[must_use]
    pub fn as_nutrition(&self) -> Nutrition {
        Nutrition {
            calories: f64::from(self.calories),
            protein: self.protein,
            fat: self.fat,
            carbs: self.carbs,
        }
    }
}

/// One of the four tracked nutrients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NutrientField {
    Calories,
    Protein,
    Fat,
    Carbs,
}

impl NutrientField {
    pub const ALL: [Self; 4] = [Self::Calories, Self::Protein, Self::Fat, Self::Carbs];
}

impl std::fmt::Display for NutrientField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calories => write!(f, "calories"),
            Self::Protein => write!(f, "protein"),
            Self::Fat => write!(f, "fat"),
            Self::Carbs => write!(f, "carbs"),
        }
    }
}

/// Measurement unit of an ingredient amount.
///
/// Grams and millilitres are treated identically for density math: 1 ml
/// scales a per-100 density exactly like 1 g. No mass/volume conversion
/// is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "ml")]
    Milliliter,
}

impl Unit {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gram => "g",
            Self::Milliliter => "ml",
        }
    }

    /// Parse the unit strings the inference service emits
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "g" | "G" => Some(Self::Gram),
            "ml" | "mL" | "ML" => Some(Self::Milliliter),
            _ => None,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured quantity: value plus unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    pub unit: Unit,
}

impl Amount {
    #[must_use]
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// `"300g"`, `"12.5ml"`: shortest round-trip number formatting
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{}", self.value, self.unit)
    }

    /// `"900.0g"`: the value multiplied by `quantity`, fixed to one decimal
    #[must_use]
    pub fn display_scaled(&self, quantity: u32) -> String {
        format!("{:.1}{}", self.value * f64::from(quantity), self.unit)
    }
}

/// Which catalog a reference food came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    /// Whole dishes and packaged products
    CompletedFood,
    /// Raw components
    Ingredient,
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompletedFood => write!(f, "completed food"),
            Self::Ingredient => write!(f, "ingredient"),
        }
    }
}

/// Confidence tier of a name match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Similar,
    Exact,
}
