//! Heuristic 1–10 health score for the "should I eat this?" decision.
//!
//! A score starts at the table's base and accumulates independent deltas:
//!
//! - **Calorie band**: absolute calories, or calories per gram of protein
//! - **Macro bands**: share of calories from protein, fat and carbs
//! - **Keyword tiers**: case-insensitive substring matches on the food name
//!
//! The result is clamped to `1..=10`. Scores above 7 pass; anything else
//! goes through the reconsider flow with catalog alternatives.
//!
//! The table is data, not code: the default is embedded from
//! `rules/health_rules.json` and any JSON file with the same shape can
//! replace it.

pub mod health;
pub mod rules;

pub use health::{HealthScore, HealthScorer, Verdict};
pub use rules::ScoringRules;
