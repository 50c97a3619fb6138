use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::aggregate::{calculate_total_nutrition, round_nutrition_values};
use crate::analysis::reconcile::{
    DishResolution, IngredientCorrection, ReconcileConfig, Reconciliation, ReconciliationEngine,
};
use crate::catalog::store::ReferenceDatabase;
use crate::core::analysis::{ApiResponse, FoodAnalysis};
use crate::core::record::{IngredientLine, NutritionData, ReferenceLink};
use crate::utils::validation::{validate_response, IngredientWarning};

/// Message returned when the inference service says the input is not food
pub const NOT_FOOD_MESSAGE: &str = "not recognized as food";

/// A resolved food with everything that shaped it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodReport {
    pub record: NutritionData,
    pub warnings: Vec<IngredientWarning>,
    pub dish: DishResolution,
    pub corrections: Vec<IngredientCorrection>,
}

/// Outcome of analyzing one inference response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisResult {
    Food(FoodReport),
    NotFood {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl AnalysisResult {
    pub fn is_food(&self) -> bool {
        matches!(self, Self::Food(_))
    }

    pub fn record(&self) -> Option<&NutritionData> {
        match self {
            Self::Food(report) => Some(&report.record),
            Self::NotFood { .. } => None,
        }
    }
}

/// Raw inference output in, resolved nutrition record out.
///
/// Validation, reconciliation and aggregation run in that order. A "not
/// food" response stops before any of them.
pub struct NutritionPipeline<'a> {
    db: &'a ReferenceDatabase,
    engine: ReconciliationEngine<'a>,
}

impl<'a> NutritionPipeline<'a> {
    /// Create a pipeline with default thresholds
    pub fn new(db: &'a ReferenceDatabase) -> Self {
        Self::with_config(db, ReconcileConfig::default())
    }

    /// Create a pipeline with custom thresholds
    pub fn with_config(db: &'a ReferenceDatabase, config: ReconcileConfig) -> Self {
        Self {
            db,
            engine: ReconciliationEngine::with_config(db, config),
        }
    }

    pub fn engine(&self) -> &ReconciliationEngine<'a> {
        &self.engine
    }

    /// Run the full analysis for one inference response
    pub fn process_api_response(&self, response: &ApiResponse) -> AnalysisResult {
        if !response.is_food {
            info!("input not recognized as food");
            return AnalysisResult::NotFood {
                message: NOT_FOOD_MESSAGE.to_string(),
                description: response.description.clone(),
            };
        }

        let (analysis, warnings) = validate_response(response);
        let Reconciliation {
            analysis: corrected,
            dish,
            corrections,
        } = self.engine.validate_and_correct(&analysis);

        let mut record = self.build_record(&corrected);
        if let DishResolution::SimilarOverridden { reference, .. } = &dish {
            record.reference = Some(reference.clone());
        }

        debug!(
            food = %record.food_name,
            calories = record.nutrition.calories,
            corrections = corrections.len(),
            warnings = warnings.len(),
            "analysis complete"
        );

        AnalysisResult::Food(FoodReport {
            record,
            warnings,
            dish,
            corrections,
        })
    }

    /// Build the record for an already corrected analysis.
    ///
    /// When the dish name equals a completed food, the totals are that
    /// food's own nutrition; otherwise they are summed from the ingredients.
    pub fn build_record(&self, analysis: &FoodAnalysis) -> NutritionData {
        let ingredients = analysis
            .ingredients
            .iter()
            .map(|i| IngredientLine::measured(i.name.clone(), i.quantity()))
            .collect();

        let (nutrition, reference) = match self.db.find_completed_food(&analysis.food_name) {
            Some(dish) => (dish.nutrition.rounded(), Some(ReferenceLink::from(dish))),
            None => (
                round_nutrition_values(&calculate_total_nutrition(&analysis.ingredients)),
                None,
            ),
        };

        NutritionData {
            food_name: analysis.food_name.clone(),
            ingredients,
            nutrition,
            reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingredient::Ingredient;
    use crate::core::record::LineAmount;
    use crate::core::reference::ReferenceFood;
    use crate::core::types::{Amount, Nutrition, Unit};
    use serde_json::json;

    #[test]
    fn test_not_food_short_circuits() {
        let db = ReferenceDatabase::new();
        let pipeline = NutritionPipeline::new(&db);
        let result = pipeline.process_api_response(&ApiResponse::not_food("a laptop on a desk"));
        assert_eq!(
            result,
            AnalysisResult::NotFood {
                message: NOT_FOOD_MESSAGE.to_string(),
                description: Some("a laptop on a desk".to_string()),
            }
        );
        assert!(result.record().is_none());
    }

    #[test]
    fn test_not_food_ignores_ingredients() {
        let db = ReferenceDatabase::new();
        let pipeline = NutritionPipeline::new(&db);
        let mut response = ApiResponse::not_food("plastic fruit");
        response.ingredients = vec![json!({"name": "사과", "amount": 100, "unit": "g"})];
        assert!(!pipeline.process_api_response(&response).is_food());
    }

    #[test]
    fn test_pork_belly_with_empty_catalog() {
        let db = ReferenceDatabase::new();
        let pipeline = NutritionPipeline::new(&db);
        let response = ApiResponse::food(
            "삼겹살",
            &[Ingredient::new("돼지고기 삼겹살", 300.0, Unit::Gram, Nutrition::new(331.0, 17.2, 28.4, 0.0))],
        );

        let result = pipeline.process_api_response(&response);
        let record = result.record().unwrap();
        assert_eq!(record.nutrition.calories, 993);
        assert!((record.nutrition.protein - 51.6).abs() < 1e-9);
        assert!((record.nutrition.fat - 85.2).abs() < 1e-9);
        assert!(record.nutrition.carbs.abs() < 1e-9);
        assert_eq!(record.ingredients[0].amount.display(), "300g");
        assert!(record.reference.is_none());
    }

    #[test]
    fn test_exact_match_dominates_amounts() {
        let db = ReferenceDatabase::load_embedded().unwrap();
        let pipeline = NutritionPipeline::new(&db);
        for amount in [50.0, 100.0, 350.0] {
            let response = ApiResponse::food(
                "닭가슴살",
                &[Ingredient::new("닭가슴살", amount, Unit::Gram, Nutrition::new(120.0, 20.0, 2.0, 0.0))],
            );
            let record = pipeline.process_api_response(&response).record().cloned().unwrap();
            assert_eq!(record.nutrition.calories, 165);
            assert_eq!(record.reference.map(|r| r.name), Some("닭가슴살".to_string()));
        }
    }

    #[test]
    fn test_malformed_ingredient_warns() {
        let db = ReferenceDatabase::new();
        let pipeline = NutritionPipeline::new(&db);
        let response = ApiResponse {
            is_food: true,
            food_name: "간식".to_string(),
            description: None,
            ingredients: vec![
                json!({"name": "과자", "amount": "많이", "unit": "g"}),
                json!({"name": "우유", "amount": 200, "unit": "ml",
                       "nutritionPer100g": {"calories": 65, "protein": 3.2, "fat": 3.6, "carbs": 4.8}}),
            ],
        };

        match pipeline.process_api_response(&response) {
            AnalysisResult::Food(report) => {
                assert_eq!(report.warnings.len(), 1);
                assert_eq!(report.record.ingredients.len(), 1);
                assert_eq!(report.record.nutrition.calories, 130);
                assert_eq!(
                    report.record.ingredients[0].amount,
                    LineAmount::Measured {
                        original: Amount::new(200.0, Unit::Milliliter),
                        servings: None,
                    }
                );
            }
            AnalysisResult::NotFood { .. } => panic!("expected food"),
        }
    }

    #[test]
    fn test_overridden_dish_links_reference() {
        let db = ReferenceDatabase::from_parts(
            vec![ReferenceFood::new("cf_kimbap", "김밥", 250.0, Nutrition::new(420.0, 11.0, 9.0, 72.0))],
            Vec::new(),
        );
        let pipeline = NutritionPipeline::new(&db);
        let response = ApiResponse::food(
            "김밮",
            &[Ingredient::new("김밥 한 줄", 250.0, Unit::Gram, Nutrition::new(400.0, 4.0, 4.0, 40.0))],
        );

        match pipeline.process_api_response(&response) {
            AnalysisResult::Food(report) => {
                assert!(matches!(report.dish, DishResolution::SimilarOverridden { .. }));
                assert_eq!(report.record.nutrition.calories, 420);
                assert_eq!(report.record.reference.map(|r| r.name), Some("김밥".to_string()));
            }
            AnalysisResult::NotFood { .. } => panic!("expected food"),
        }
    }

    #[test]
    fn test_serialized_status_tag() {
        let db = ReferenceDatabase::new();
        let pipeline = NutritionPipeline::new(&db);
        let not_food = serde_json::to_value(pipeline.process_api_response(&ApiResponse::not_food("a cat"))).unwrap();
        assert_eq!(not_food["status"], "not_food");
        assert_eq!(not_food["message"], NOT_FOOD_MESSAGE);

        let food = serde_json::to_value(pipeline.process_api_response(&ApiResponse::food("물", &[]))).unwrap();
        assert_eq!(food["status"], "food");
        assert_eq!(food["record"]["foodName"], "물");
    }
}
