use tracing::warn;

use crate::core::ingredient::Ingredient;
use crate::core::types::{Nutrition, RoundedNutrition};

/// Sum the absolute nutrition of a list of ingredients (unrounded).
///
/// Each ingredient contributes `per100 * amount / 100`. Grams and
/// millilitres are summed alike. A contribution that is not finite is
/// skipped so one bad ingredient cannot poison the total.
pub fn calculate_total_nutrition(ingredients: &[Ingredient]) -> Nutrition {
    ingredients.iter().fold(Nutrition::zero(), |total, ingredient| {
        let contribution = ingredient.contribution();
        if contribution.is_finite() {
            total.add(&contribution)
        } else {
            warn!(name = %ingredient.name, "skipping ingredient with non-finite nutrition");
            total
        }
    })
}

/// Round totals for display: calories half-up to an integer, macros to one
/// decimal, all clamped at zero
pub fn round_nutrition_values(nutrition: &Nutrition) -> RoundedNutrition {
    nutrition.rounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Unit;

    #[test]
    fn test_single_ingredient() {
        let ingredients = vec![Ingredient::new("두부", 200.0, Unit::Gram, Nutrition::new(50.0, 5.0, 2.5, 1.0))];
        let total = calculate_total_nutrition(&ingredients);
        assert!((total.calories - 100.0).abs() < 1e-9);
        assert!((total.protein - 10.0).abs() < 1e-9);
        assert!((total.fat - 5.0).abs() < 1e-9);
        assert!((total.carbs - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_doubling_amount_doubles_total() {
        let density = Nutrition::new(50.0, 5.0, 2.5, 1.0);
        let single = calculate_total_nutrition(&[Ingredient::new("두부", 200.0, Unit::Gram, density)]);
        let double = calculate_total_nutrition(&[Ingredient::new("두부", 400.0, Unit::Gram, density)]);
        for field in crate::core::types::NutrientField::ALL {
            assert!((double.get(field) - 2.0 * single.get(field)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sum_mixed_units() {
        let ingredients = vec![
            Ingredient::new("밥", 210.0, Unit::Gram, Nutrition::new(143.0, 2.6, 0.3, 31.4)),
            Ingredient::new("우유", 200.0, Unit::Milliliter, Nutrition::new(65.0, 3.2, 3.6, 4.8)),
        ];
        let total = calculate_total_nutrition(&ingredients);
        assert!((total.calories - (300.3 + 130.0)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_list_is_zero() {
        assert_eq!(calculate_total_nutrition(&[]), Nutrition::zero());
        assert_eq!(round_nutrition_values(&Nutrition::zero()), RoundedNutrition::default());
    }

    #[test]
    fn test_non_finite_contribution_skipped() {
        let ingredients = vec![
            Ingredient::new("밥", 100.0, Unit::Gram, Nutrition::new(143.0, 2.6, 0.3, 31.4)),
            Ingredient::new("이상값", f64::MAX, Unit::Gram, Nutrition::new(f64::MAX, 1.0, 1.0, 1.0)),
        ];
        let total = calculate_total_nutrition(&ingredients);
        assert!((total.calories - 143.0).abs() < 1e-9);
    }

    #[test]
    fn test_pork_belly_rounding() {
        let ingredients = vec![Ingredient::new(
            "돼지고기 삼겹살",
            300.0,
            Unit::Gram,
            Nutrition::new(331.0, 17.2, 28.4, 0.0),
        )];
        let rounded = round_nutrition_values(&calculate_total_nutrition(&ingredients));
        assert_eq!(rounded.calories, 993);
        assert!((rounded.protein - 51.6).abs() < 1e-9);
        assert!((rounded.fat - 85.2).abs() < 1e-9);
        assert!(rounded.carbs.abs() < 1e-9);
    }
}
