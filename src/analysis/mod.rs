//! From raw inference output to a scalable nutrition record.
//!
//! - [`aggregate`]: per-ingredient sums and display rounding
//! - [`reconcile`]: catalog-driven correction of model densities
//! - [`pipeline`]: validation, reconciliation and aggregation in one call
//! - [`scale`]: serving-count scaling and the edit session
//!
//! ## Example
//!
//! ```rust,no_run
//! use nutri_solver::{AnalysisResult, ApiResponse, NutritionPipeline, ReferenceDatabase};
//! use nutri_solver::analysis::scale::{calculate_nutrition_by_quantity, ServingCount};
//!
//! let db = ReferenceDatabase::load_embedded().unwrap();
//! let pipeline = NutritionPipeline::new(&db);
//!
//! let response: ApiResponse = serde_json::from_str(r#"{"isFood": false, "description": "a cat"}"#).unwrap();
//! match pipeline.process_api_response(&response) {
//!     AnalysisResult::Food(report) => {
//!         let doubled = calculate_nutrition_by_quantity(&report.record, ServingCount::new(2).unwrap()).unwrap();
//!         println!("{} kcal", doubled.nutrition.calories);
//!     }
//!     AnalysisResult::NotFood { message, .. } => println!("{message}"),
//! }
//! ```

pub mod aggregate;
pub mod pipeline;
pub mod reconcile;
pub mod scale;
