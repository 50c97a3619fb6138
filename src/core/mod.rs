//! Core data types for nutrition reconciliation.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Nutrition`], [`RoundedNutrition`]: calories, protein, fat and carbs
//! - [`Amount`], [`Unit`]: structured quantities (grams or millilitres)
//! - [`Ingredient`]: a validated ingredient with its per-100 density
//! - [`ReferenceFood`]: a catalog entry with whole-serving nutrition
//! - [`ApiResponse`], [`FoodAnalysis`]: raw and validated inference output
//! - [`NutritionData`], [`FoodLogEntry`]: resolved record and its persisted form
//!
//! ## Units
//!
//! Densities are expressed per 100 units of the ingredient's own unit. A
//! millilitre is treated exactly like a gram; no mass/volume conversion
//! happens anywhere in the crate.
//!
//! [`Nutrition`]: types::Nutrition
//! [`RoundedNutrition`]: types::RoundedNutrition
//! [`Amount`]: types::Amount
//! [`Unit`]: types::Unit
//! [`Ingredient`]: ingredient::Ingredient
//! [`ReferenceFood`]: reference::ReferenceFood
//! [`ApiResponse`]: analysis::ApiResponse
//! [`FoodAnalysis`]: analysis::FoodAnalysis
//! [`NutritionData`]: record::NutritionData
//! [`FoodLogEntry`]: record::FoodLogEntry

pub mod analysis;
pub mod ingredient;
pub mod record;
pub mod reference;
pub mod types;
