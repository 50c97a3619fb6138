use serde::Serialize;

use crate::catalog::store::ReferenceDatabase;
use crate::core::reference::ReferenceFood;
use crate::core::types::{CatalogKind, MatchTier};
use crate::matching::similarity::{similarity, DEFAULT_SIMILARITY_THRESHOLD};

/// A catalog entry a name resolved to
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FoodMatch<'a> {
    /// The matched reference
    pub food: &'a ReferenceFood,

    /// Catalog the reference came from
    pub catalog: CatalogKind,

    /// Exact or similar
    pub tier: MatchTier,

    /// Name similarity in `[0, 1]` (1.0 for exact matches)
    pub similarity: f64,
}

/// Resolves free-form food names against a [`ReferenceDatabase`].
///
/// Lookup order for a name:
///
/// 1. exact completed food
/// 2. exact ingredient
/// 3. similar completed food
/// 4. similar ingredient
///
/// The first hit wins; within a tier, catalog order decides.
pub struct NameMatcher<'a> {
    db: &'a ReferenceDatabase,
    threshold: f64,
}

impl<'a> NameMatcher<'a> {
    /// Create a matcher with the default similarity threshold
    pub fn new(db: &'a ReferenceDatabase) -> Self {
        Self::with_threshold(db, DEFAULT_SIMILARITY_THRESHOLD)
    }

    /// Create a matcher with a custom similarity threshold
    pub fn with_threshold(db: &'a ReferenceDatabase, threshold: f64) -> Self {
        Self { db, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Find `name` in a single list: an exact name first, otherwise the
    /// first entry at least `threshold` similar.
    pub fn find_match<'f>(&self, name: &str, foods: &'f [ReferenceFood]) -> Option<&'f ReferenceFood> {
        foods
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.first_similar(name, foods).map(|(food, _)| food))
    }

    /// Resolve a name through the full four-step lookup
    pub fn resolve(&self, name: &str) -> Option<FoodMatch<'a>> {
        for kind in [CatalogKind::CompletedFood, CatalogKind::Ingredient] {
            if let Some(food) = self.db.find_exact(kind, name) {
                return Some(FoodMatch {
                    food,
                    catalog: kind,
                    tier: MatchTier::Exact,
                    similarity: 1.0,
                });
            }
        }

        for kind in [CatalogKind::CompletedFood, CatalogKind::Ingredient] {
            if let Some(found) = self.find_similar(kind, name) {
                return Some(found);
            }
        }

        None
    }

    /// First entry of one catalog that is similar to `name`
    pub fn find_similar(&self, kind: CatalogKind, name: &str) -> Option<FoodMatch<'a>> {
        self.first_similar(name, self.db.foods(kind))
            .map(|(food, similarity)| FoodMatch {
                food,
                catalog: kind,
                tier: MatchTier::Similar,
                similarity,
            })
    }

    /// Exact completed-food lookup
    pub fn find_exact_completed(&self, name: &str) -> Option<&'a ReferenceFood> {
        self.db.find_completed_food(name)
    }

    /// Similar completed-food lookup
    pub fn find_similar_completed(&self, name: &str) -> Option<FoodMatch<'a>> {
        self.find_similar(CatalogKind::CompletedFood, name)
    }

    fn first_similar<'f>(&self, name: &str, foods: &'f [ReferenceFood]) -> Option<(&'f ReferenceFood, f64)> {
        foods.iter().find_map(|food| {
            let score = similarity(name, &food.name);
            (score >= self.threshold).then_some((food, score))
        })
    }
}
