//! End-to-end tests over the library: inference response in, scaled and
//! scored record out.

use nutri_solver::analysis::reconcile::DishResolution;
use nutri_solver::{
    calculate_nutrition_by_quantity, AnalysisResult, ApiResponse, FoodReport, HealthScorer, Ingredient,
    NutrientField, Nutrition, NutritionPipeline, ReferenceDatabase, ServingCount, ServingSession, Unit, Verdict,
};

fn analyze(db: &ReferenceDatabase, response: &ApiResponse) -> FoodReport {
    match NutritionPipeline::new(db).process_api_response(response) {
        AnalysisResult::Food(report) => report,
        AnalysisResult::NotFood { .. } => panic!("expected a food result"),
    }
}

fn pork_belly() -> ApiResponse {
    ApiResponse::food(
        "삼겹살",
        &[Ingredient::new(
            "돼지고기 삼겹살",
            300.0,
            Unit::Gram,
            Nutrition::new(331.0, 17.2, 28.4, 0.0),
        )],
    )
}

#[test]
fn test_pork_belly_end_to_end() {
    let db = ReferenceDatabase::load_embedded().unwrap();
    let report = analyze(&db, &pork_belly());

    assert_eq!(report.dish, DishResolution::None);
    assert!(report.corrections.is_empty());
    assert_eq!(report.record.nutrition.calories, 993);
    assert!((report.record.nutrition.protein - 51.6).abs() < 1e-9);
    assert!((report.record.nutrition.fat - 85.2).abs() < 1e-9);

    let doubled = calculate_nutrition_by_quantity(&report.record, ServingCount::new(2).unwrap()).unwrap();
    assert_eq!(doubled.nutrition.calories, 1986);
    assert!((doubled.nutrition.protein - 103.2).abs() < 1e-9);
    assert!((doubled.nutrition.fat - 170.4).abs() < 1e-9);
    assert_eq!(doubled.ingredients[0].amount.display(), "600.0g");

    let scorer = HealthScorer::embedded().unwrap();
    let health = scorer.score_record(&report.record);
    assert_eq!(health.score, 1);
    assert_eq!(health.verdict, Verdict::Reconsider);

    let alternatives = scorer.suggest_alternatives(&db, 3);
    assert!(!alternatives.is_empty());
    assert!(alternatives.iter().all(|a| a.score.verdict == Verdict::Pass));
}

#[test]
fn test_exact_dish_uses_catalog_serving() {
    let db = ReferenceDatabase::load_embedded().unwrap();
    let response = ApiResponse::food(
        "닭가슴살",
        &[Ingredient::new("닭가슴살", 200.0, Unit::Gram, Nutrition::new(120.0, 22.0, 2.0, 0.0))],
    );
    let report = analyze(&db, &response);

    assert!(matches!(report.dish, DishResolution::Exact { .. }));
    assert_eq!(report.record.nutrition.calories, 165);
    assert_eq!(report.record.reference.as_ref().map(|r| r.id.0.as_str()), Some("cf_chicken_breast"));

    let scorer = HealthScorer::embedded().unwrap();
    assert_eq!(scorer.score_record(&report.record).verdict, Verdict::Pass);
}

#[test]
fn test_misspelled_dish_rescaled_to_catalog() {
    let db = ReferenceDatabase::load_embedded().unwrap();
    let response = ApiResponse::food(
        "프로틴쉐잌",
        &[
            Ingredient::new("프로틴 파우더", 30.0, Unit::Gram, Nutrition::new(400.0, 75.0, 6.0, 10.0)),
            Ingredient::new("우유", 200.0, Unit::Milliliter, Nutrition::new(60.0, 3.0, 3.0, 5.0)),
        ],
    );
    let report = analyze(&db, &response);

    // 우유 takes the catalog density
    assert_eq!(report.corrections.len(), 1);
    assert_eq!(report.corrections[0].reference.name, "우유");

    // 250 kcal from the model against 180 * 230 / 300 = 138 from the catalog
    match &report.dish {
        DishResolution::SimilarOverridden {
            reference,
            divergence,
            ..
        } => {
            assert_eq!(reference.name, "프로틴쉐이크");
            assert!(*divergence > 0.3);
        }
        other => panic!("expected an override, got {other:?}"),
    }
    assert_eq!(report.record.nutrition.calories, 138);
    assert_eq!(report.record.reference.as_ref().map(|r| r.name.as_str()), Some("프로틴쉐이크"));
}

#[test]
fn test_not_food_response() {
    let db = ReferenceDatabase::load_embedded().unwrap();
    let json = r#"{"isFood": false, "description": "a coffee mug on a desk"}"#;
    let response: ApiResponse = serde_json::from_str(json).unwrap();

    let result = NutritionPipeline::new(&db).process_api_response(&response);
    assert!(!result.is_food());
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["status"], "not_food");
    assert_eq!(value["description"], "a coffee mug on a desk");
}

#[test]
fn test_malformed_entries_dropped_with_warnings() {
    let db = ReferenceDatabase::new();
    let json = r#"{
        "isFood": true,
        "foodName": "간식 접시",
        "ingredients": [
            {"name": "크래커", "amount": 40, "unit": "g",
             "nutritionPer100g": {"calories": 450, "protein": 8, "fat": 18, "carbs": 65}},
            {"name": "치즈", "amount": -20, "unit": "g"},
            "not an object",
            {"name": "포도", "amount": "100", "unit": "g",
             "nutritionPer100g": {"calories": 69, "protein": 0.7, "fat": 0.2, "carbs": 18}}
        ]
    }"#;
    let response: ApiResponse = serde_json::from_str(json).unwrap();
    let report = analyze(&db, &response);

    assert_eq!(report.record.ingredients.len(), 2);
    assert_eq!(report.warnings.len(), 2);
    // 180 + 69
    assert_eq!(report.record.nutrition.calories, 249);
}

#[test]
fn test_session_edit_then_rescale() {
    let db = ReferenceDatabase::new();
    let report = analyze(&db, &pork_belly());

    let mut session = ServingSession::new(report.record);
    session.set_quantity(ServingCount::new(2).unwrap());
    session.edit_nutrient(NutrientField::Calories, 1800.0).unwrap();

    // The edited, doubled view became the new single serving
    assert_eq!(session.quantity(), ServingCount::ONE);
    assert_eq!(session.current().nutrition.calories, 1800);
    assert_eq!(session.current().ingredients[0].amount.display(), "600g");

    let tripled = session.set_quantity(ServingCount::new(3).unwrap());
    assert_eq!(tripled.nutrition.calories, 5400);
    assert_eq!(tripled.ingredients[0].amount.display(), "1800.0g");
    assert!(tripled.reference.is_none());
}

#[test]
fn test_scaling_always_from_original() {
    let db = ReferenceDatabase::load_embedded().unwrap();
    let report = analyze(&db, &pork_belly());

    let five = calculate_nutrition_by_quantity(&report.record, ServingCount::new(5).unwrap()).unwrap();
    let back = calculate_nutrition_by_quantity(&report.record, ServingCount::ONE).unwrap();
    assert_eq!(five.nutrition.calories, 4965);
    assert_eq!(back.nutrition, report.record.nutrition);
}
