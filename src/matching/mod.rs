//! Food name resolution against the reference catalog.
//!
//! - [`NameMatcher`]: tiered exact/similar lookup over both catalogs
//! - [`similarity`]: edit-distance similarity between two names
//!
//! ## Similarity
//!
//! `similarity = 1 - levenshtein(a, b) / max(len(a), len(b))`, computed over
//! Hangul jamo for precomposed syllables and raw code points otherwise.
//! Names are compared as given: no case folding, no trimming.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nutri_solver::{NameMatcher, ReferenceDatabase};
//!
//! let db = ReferenceDatabase::load_embedded().unwrap();
//! let matcher = NameMatcher::new(&db);
//!
//! if let Some(m) = matcher.resolve("프로틴쉐잌") {
//!     println!("{} ({}, {:?}, {:.2})", m.food.name, m.catalog, m.tier, m.similarity);
//! }
//! ```
//!
//! [`similarity`]: similarity::similarity

pub mod engine;
pub mod similarity;

pub use engine::{FoodMatch, NameMatcher};
