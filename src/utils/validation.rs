//! Upstream data-quality checks on raw inference output.
//!
//! The inference service is trusted for shape only. Every ingredient is
//! checked on its own: a malformed one is dropped, a bad nutrient field is
//! clamped to zero, and either case leaves an [`IngredientWarning`] behind
//! instead of failing the whole response.

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::core::analysis::{ApiResponse, FoodAnalysis};
use crate::core::ingredient::Ingredient;
use crate::core::types::{NutrientField, Nutrition, Unit};

/// Maximum number of ingredients taken from a single response (DOS protection)
pub const MAX_INGREDIENTS: usize = 200;

/// Reasons an ingredient is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("ingredient is not a JSON object")]
    NotAnObject,
    #[error("missing or empty name")]
    MissingName,
    #[error("missing amount")]
    MissingAmount,
    #[error("amount is not a finite number: {0}")]
    InvalidAmount(String),
    #[error("amount is negative: {0}")]
    NegativeAmount(f64),
    #[error("missing unit")]
    MissingUnit,
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
    #[error("too many ingredients: only the first {MAX_INGREDIENTS} are used")]
    TooManyIngredients,
}

/// Why a nutrient field was replaced with zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampReason {
    Missing,
    Negative,
    NotFinite,
}

/// A data-quality problem found while validating one response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IngredientWarning {
    /// The ingredient was removed from the analysis
    Dropped {
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(serialize_with = "serialize_display")]
        reason: ValidationError,
    },
    /// One nutrient field was replaced with 0
    Clamped {
        index: usize,
        name: String,
        field: NutrientField,
        reason: ClampReason,
    },
}

impl std::fmt::Display for IngredientWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dropped {
                index,
                name: Some(name),
                reason,
            } => write!(f, "ingredient #{index} '{name}' dropped: {reason}"),
            Self::Dropped {
                index,
                name: None,
                reason,
            } => write!(f, "ingredient #{index} dropped: {reason}"),
            Self::Clamped {
                index,
                name,
                field,
                reason,
            } => {
                let why = match reason {
                    ClampReason::Missing => "missing",
                    ClampReason::Negative => "negative",
                    ClampReason::NotFinite => "not a finite number",
                };
                write!(f, "ingredient #{index} '{name}': {field} {why}, using 0")
            }
        }
    }
}

fn serialize_display<S: Serializer>(value: &ValidationError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Validate a food response into an analysis the engine can trust.
///
/// The food name and every kept ingredient name are trimmed. Ingredients
/// beyond [`MAX_INGREDIENTS`] are dropped with a single warning.
pub fn validate_response(response: &ApiResponse) -> (FoodAnalysis, Vec<IngredientWarning>) {
    let mut warnings = Vec::new();
    let mut ingredients = Vec::with_capacity(response.ingredients.len().min(MAX_INGREDIENTS));

    for (index, raw) in response.ingredients.iter().enumerate() {
        if index >= MAX_INGREDIENTS {
            warnings.push(IngredientWarning::Dropped {
                index,
                name: None,
                reason: ValidationError::TooManyIngredients,
            });
            break;
        }

        match validate_ingredient(index, raw, &mut warnings) {
            Ok(ingredient) => ingredients.push(ingredient),
            Err(reason) => warnings.push(IngredientWarning::Dropped {
                index,
                name: raw_name(raw),
                reason,
            }),
        }
    }

    for warning in &warnings {
        warn!("{warning}");
    }

    let mut analysis = FoodAnalysis::new(response.food_name.trim(), ingredients);
    analysis.description.clone_from(&response.description);
    (analysis, warnings)
}

/// Validate a single raw ingredient.
///
/// Clamped nutrient fields are reported through `warnings`; a rejected
/// ingredient is reported through the error.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the name, amount or unit is unusable.
pub fn validate_ingredient(
    index: usize,
    raw: &Value,
    warnings: &mut Vec<IngredientWarning>,
) -> Result<Ingredient, ValidationError> {
    let object = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingName)?;

    let amount = parse_amount(object.get("amount"))?;
    let unit = parse_unit(object.get("unit"))?;

    let density_source = object.get("nutritionPer100g");
    let mut density = Nutrition::zero();
    for field in NutrientField::ALL {
        let value = density_source.and_then(|d| d.get(field.to_string()));
        match parse_nutrient(value) {
            Ok(v) => density.set(field, v),
            Err(reason) => warnings.push(IngredientWarning::Clamped {
                index,
                name: name.to_string(),
                field,
                reason,
            }),
        }
    }

    Ok(Ingredient::new(name, amount, unit, density))
}

fn raw_name(raw: &Value) -> Option<String> {
    raw.get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Numbers, or strings holding a number (`"150"`)
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_amount(value: Option<&Value>) -> Result<f64, ValidationError> {
    let value = match value {
        None | Some(Value::Null) => return Err(ValidationError::MissingAmount),
        Some(v) => v,
    };

    let amount = as_number(value)
        .filter(|a| a.is_finite())
        .ok_or_else(|| ValidationError::InvalidAmount(value.to_string()))?;

    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(amount)
}

fn parse_unit(value: Option<&Value>) -> Result<Unit, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingUnit),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::MissingUnit),
        Some(Value::String(s)) => Unit::parse(s).ok_or_else(|| ValidationError::UnknownUnit(s.clone())),
        Some(other) => Err(ValidationError::UnknownUnit(other.to_string())),
    }
}

fn parse_nutrient(value: Option<&Value>) -> Result<f64, ClampReason> {
    let value = match value {
        None | Some(Value::Null) => return Err(ClampReason::Missing),
        Some(v) => v,
    };
    let number = as_number(value)
        .filter(|n| n.is_finite())
        .ok_or(ClampReason::NotFinite)?;
    if number < 0.0 {
        return Err(ClampReason::Negative);
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response_with(ingredients: Vec<Value>) -> ApiResponse {
        ApiResponse {
            is_food: true,
            food_name: " 정식 ".to_string(),
            description: None,
            ingredients,
        }
    }

    fn good_ingredient(name: &str) -> Value {
        json!({
            "name": name,
            "amount": 100,
            "unit": "g",
            "nutritionPer100g": {"calories": 100, "protein": 5, "fat": 2, "carbs": 10}
        })
    }

    #[test]
    fn test_valid_ingredient_passes() {
        let (analysis, warnings) = validate_response(&response_with(vec![good_ingredient("밥")]));
        assert!(warnings.is_empty());
        assert_eq!(analysis.food_name, "정식");
        assert_eq!(analysis.ingredients.len(), 1);
        assert!((analysis.ingredients[0].nutrition_per_100g.calories - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_amount_dropped() {
        let raw = json!({"name": "김치", "unit": "g", "nutritionPer100g": {}});
        let (analysis, warnings) = validate_response(&response_with(vec![raw, good_ingredient("밥")]));
        assert_eq!(analysis.ingredients.len(), 1);
        assert_eq!(analysis.ingredients[0].name, "밥");
        assert_eq!(
            warnings[0],
            IngredientWarning::Dropped {
                index: 0,
                name: Some("김치".to_string()),
                reason: ValidationError::MissingAmount,
            }
        );
    }

    #[test]
    fn test_amount_rules() {
        let mut warnings = Vec::new();
        let base = |amount: Value| json!({"name": "x", "amount": amount, "unit": "g"});

        assert!(matches!(
            validate_ingredient(0, &base(json!(-5)), &mut warnings),
            Err(ValidationError::NegativeAmount(_))
        ));
        assert!(matches!(
            validate_ingredient(0, &base(json!("한 공기")), &mut warnings),
            Err(ValidationError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_ingredient(0, &base(json!("NaN")), &mut warnings),
            Err(ValidationError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_ingredient(0, &base(Value::Null), &mut warnings),
            Err(ValidationError::MissingAmount)
        ));

        // Numeric strings and zero are accepted
        let parsed = validate_ingredient(0, &base(json!("150")), &mut warnings).unwrap();
        assert!((parsed.amount - 150.0).abs() < f64::EPSILON);
        let zero = validate_ingredient(0, &base(json!(0)), &mut warnings).unwrap();
        assert!(zero.amount.abs() < f64::EPSILON);
    }

    #[test]
    fn test_unit_rules() {
        let mut warnings = Vec::new();
        let with_unit = |unit: Value| json!({"name": "x", "amount": 10, "unit": unit});

        assert!(matches!(
            validate_ingredient(0, &json!({"name": "x", "amount": 10}), &mut warnings),
            Err(ValidationError::MissingUnit)
        ));
        assert!(matches!(
            validate_ingredient(0, &with_unit(json!("cup")), &mut warnings),
            Err(ValidationError::UnknownUnit(_))
        ));
        assert!(matches!(
            validate_ingredient(0, &with_unit(json!(3)), &mut warnings),
            Err(ValidationError::UnknownUnit(_))
        ));
        let ml = validate_ingredient(0, &with_unit(json!("ml")), &mut warnings).unwrap();
        assert_eq!(ml.unit, Unit::Milliliter);
    }

    #[test]
    fn test_name_rules() {
        let mut warnings = Vec::new();
        assert!(matches!(
            validate_ingredient(0, &json!({"name": "   ", "amount": 1, "unit": "g"}), &mut warnings),
            Err(ValidationError::MissingName)
        ));
        assert!(matches!(
            validate_ingredient(0, &json!({"amount": 1, "unit": "g"}), &mut warnings),
            Err(ValidationError::MissingName)
        ));
        assert!(matches!(
            validate_ingredient(0, &json!("김치 50g"), &mut warnings),
            Err(ValidationError::NotAnObject)
        ));
        let trimmed = validate_ingredient(0, &json!({"name": " 두부 ", "amount": 1, "unit": "g"}), &mut warnings).unwrap();
        assert_eq!(trimmed.name, "두부");
    }

    #[test]
    fn test_bad_nutrients_clamped() {
        let raw = json!({
            "name": "소스",
            "amount": 30,
            "unit": "g",
            "nutritionPer100g": {"calories": -20, "protein": "abc", "fat": 1.5}
        });
        let mut warnings = Vec::new();
        let ingredient = validate_ingredient(3, &raw, &mut warnings).unwrap();

        assert_eq!(ingredient.nutrition_per_100g, Nutrition::new(0.0, 0.0, 1.5, 0.0));
        assert_eq!(warnings.len(), 3);
        assert!(warnings.contains(&IngredientWarning::Clamped {
            index: 3,
            name: "소스".to_string(),
            field: NutrientField::Calories,
            reason: ClampReason::Negative,
        }));
        assert!(warnings.contains(&IngredientWarning::Clamped {
            index: 3,
            name: "소스".to_string(),
            field: NutrientField::Carbs,
            reason: ClampReason::Missing,
        }));
    }

    #[test]
    fn test_too_many_ingredients() {
        let raw: Vec<Value> = (0..MAX_INGREDIENTS + 5).map(|i| good_ingredient(&format!("재료{i}"))).collect();
        let (analysis, warnings) = validate_response(&response_with(raw));
        assert_eq!(analysis.ingredients.len(), MAX_INGREDIENTS);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_warning_serialization() {
        let warning = IngredientWarning::Dropped {
            index: 1,
            name: None,
            reason: ValidationError::MissingUnit,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["action"], "dropped");
        assert_eq!(json["reason"], "missing unit");
        assert!(json.get("name").is_none());
        assert_eq!(warning.to_string(), "ingredient #1 dropped: missing unit");
    }
}
