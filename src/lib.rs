//! # nutri-solver
//!
//! A library for turning model-estimated meal nutrition into a trustworthy
//! nutrition record.
//!
//! An image or speech model describes a meal as a dish name plus a list of
//! ingredients with amounts and per-100g nutrient densities. Those numbers
//! are noisy: names drift ("프로틴쉐잌"), densities are guessed, and totals can
//! be off by a factor of two.
//!
//! `nutri-solver` checks the model's answer against a local catalog of known
//! dishes and ingredients and produces a record that can be displayed,
//! scaled to a serving count, scored and logged.
//!
//! ## Features
//!
//! - **Exact dish match**: catalog nutrition replaces the model's guesses
//! - **Ingredient corrections**: per-ingredient densities from the catalog
//! - **Similar-dish cross-check**: rescale when the model is far off a close dish
//! - **Jamo-aware fuzzy matching**: Hangul names are compared letter by letter
//! - **Serving scaling**: 1-99 servings without compounding rounding error
//! - **Health score**: a 1-10 score from a swappable rules table, with alternatives
//!
//! ## Example
//!
//! ```rust,no_run
//! use nutri_solver::{AnalysisResult, ApiResponse, NutritionPipeline, ReferenceDatabase};
//!
//! // Load the embedded catalog of known foods
//! let db = ReferenceDatabase::load_embedded().unwrap();
//!
//! // Parse a response from the inference service
//! let json = r#"{"isFood": true, "foodName": "닭가슴살", "ingredients": [
//!     {"name": "닭가슴살", "amount": 150, "unit": "g",
//!      "nutritionPer100g": {"calories": 160, "protein": 30, "fat": 4, "carbs": 0}}
//! ]}"#;
//! let response: ApiResponse = serde_json::from_str(json).unwrap();
//!
//! let pipeline = NutritionPipeline::new(&db);
//! if let AnalysisResult::Food(report) = pipeline.process_api_response(&response) {
//!     println!("{}: {} kcal", report.record.food_name, report.record.nutrition.calories);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`analysis`]: Validation, reconciliation, aggregation and scaling
//! - [`catalog`]: Reference food catalog storage
//! - [`core`]: Core data types for nutrition, ingredients and records
//! - [`matching`]: Name similarity and catalog lookup
//! - [`scoring`]: Health score and alternatives
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: JSON web service

pub mod analysis;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod scoring;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use analysis::pipeline::{AnalysisResult, FoodReport, NutritionPipeline};
pub use analysis::scale::{calculate_nutrition_by_quantity, ServingCount, ServingSession};
pub use catalog::store::ReferenceDatabase;
pub use core::analysis::{ApiResponse, FoodAnalysis};
pub use core::ingredient::Ingredient;
pub use core::record::NutritionData;
pub use core::reference::ReferenceFood;
pub use core::types::*;
pub use matching::engine::{FoodMatch, NameMatcher};
pub use scoring::{HealthScore, HealthScorer, ScoringRules, Verdict};
