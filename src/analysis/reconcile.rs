use serde::Serialize;
use tracing::debug;

use crate::analysis::aggregate::calculate_total_nutrition;
use crate::catalog::store::ReferenceDatabase;
use crate::core::analysis::FoodAnalysis;
use crate::core::ingredient::Ingredient;
use crate::core::record::ReferenceLink;
use crate::core::reference::ReferenceFood;
use crate::core::types::{CatalogKind, MatchTier, NutrientField, Nutrition};
use crate::matching::engine::{FoodMatch, NameMatcher};
use crate::matching::similarity::DEFAULT_SIMILARITY_THRESHOLD;

/// Default relative calorie difference above which a similar dish overrides
/// the model
pub const DEFAULT_DIVERGENCE_THRESHOLD: f64 = 0.3;

/// Thresholds for reconciliation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileConfig {
    /// Minimum name similarity for a fuzzy catalog match
    pub similarity_threshold: f64,
    /// Maximum tolerated `|model - catalog| / catalog` for a similar dish
    pub divergence_threshold: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            divergence_threshold: DEFAULT_DIVERGENCE_THRESHOLD,
        }
    }
}

/// How the dish as a whole was resolved against completed foods
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DishResolution {
    /// Name equals a completed food; its nutrition is authoritative
    Exact { reference: ReferenceLink },
    /// A similar dish agreed with the model closely enough
    SimilarKept {
        reference: ReferenceLink,
        similarity: f64,
        divergence: f64,
    },
    /// A similar dish disagreed and the densities were rescaled to it
    SimilarOverridden {
        reference: ReferenceLink,
        similarity: f64,
        divergence: f64,
    },
    /// A similar dish exists but a zero total, amount or weight made the
    /// comparison meaningless
    SimilarSkipped { reference: ReferenceLink, similarity: f64 },
    /// No completed food resembles the dish
    None,
}

impl DishResolution {
    /// The completed food the totals are anchored to, if any
    pub fn reference(&self) -> Option<&ReferenceLink> {
        match self {
            Self::Exact { reference }
            | Self::SimilarKept { reference, .. }
            | Self::SimilarOverridden { reference, .. }
            | Self::SimilarSkipped { reference, .. } => Some(reference),
            Self::None => None,
        }
    }
}

/// One ingredient whose density was replaced from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientCorrection {
    pub index: usize,
    pub name: String,
    pub reference: ReferenceLink,
    pub catalog: CatalogKind,
    pub tier: MatchTier,
    pub similarity: f64,
}

/// Output of [`ReconciliationEngine::validate_and_correct`]
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Corrected copy of the input analysis
    pub analysis: FoodAnalysis,
    pub dish: DishResolution,
    pub corrections: Vec<IngredientCorrection>,
}

/// Decides, per ingredient and per dish, whether to trust the model's
/// densities or replace them with catalog values.
pub struct ReconciliationEngine<'a> {
    matcher: NameMatcher<'a>,
    config: ReconcileConfig,
}

impl<'a> ReconciliationEngine<'a> {
    /// Create an engine with default thresholds
    pub fn new(db: &'a ReferenceDatabase) -> Self {
        Self::with_config(db, ReconcileConfig::default())
    }

    /// Create an engine with custom thresholds
    pub fn with_config(db: &'a ReferenceDatabase, config: ReconcileConfig) -> Self {
        Self {
            matcher: NameMatcher::with_threshold(db, config.similarity_threshold),
            config,
        }
    }

    pub fn matcher(&self) -> &NameMatcher<'a> {
        &self.matcher
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Produce a corrected copy of `analysis`. The input is never modified.
    ///
    /// 1. If the dish name equals a completed food, every ingredient takes
    ///    that food's per-100 density and nothing else runs.
    /// 2. Otherwise each ingredient is looked up on its own name and, on a
    ///    hit, takes the matched reference's per-100 density.
    /// 3. If a similar completed food exists, the corrected calorie total is
    ///    compared with the reference scaled to the summed amount. Past the
    ///    divergence threshold every density is rescaled so the list sums to
    ///    the reference.
    pub fn validate_and_correct(&self, analysis: &FoodAnalysis) -> Reconciliation {
        let mut corrected = analysis.clone();

        if let Some(dish) = self.matcher.find_exact_completed(&analysis.food_name) {
            if let Some(density) = dish.per_100_units() {
                for ingredient in &mut corrected.ingredients {
                    ingredient.nutrition_per_100g = density;
                }
            }
            debug!(dish = %dish.name, id = %dish.id, "exact dish match, using catalog nutrition");
            return Reconciliation {
                analysis: corrected,
                dish: DishResolution::Exact {
                    reference: ReferenceLink::from(dish),
                },
                corrections: Vec::new(),
            };
        }

        let mut corrections = Vec::new();
        for (index, ingredient) in corrected.ingredients.iter_mut().enumerate() {
            if let Some((replacement, found)) = self.lookup_ingredient(ingredient) {
                corrections.push(IngredientCorrection {
                    index,
                    name: ingredient.name.clone(),
                    reference: ReferenceLink::from(found.food),
                    catalog: found.catalog,
                    tier: found.tier,
                    similarity: found.similarity,
                });
                *ingredient = replacement;
            }
        }

        let dish = match self.matcher.find_similar_completed(&analysis.food_name) {
            Some(similar) => self.cross_check(&mut corrected.ingredients, &similar),
            None => DishResolution::None,
        };

        Reconciliation {
            analysis: corrected,
            dish,
            corrections,
        }
    }

    /// Correct a single ingredient from the catalog; a miss returns an
    /// unchanged copy
    pub fn correct_ingredient(&self, ingredient: &Ingredient) -> Ingredient {
        self.lookup_ingredient(ingredient)
            .map_or_else(|| ingredient.clone(), |(replacement, _)| replacement)
    }

    fn lookup_ingredient(&self, ingredient: &Ingredient) -> Option<(Ingredient, FoodMatch<'a>)> {
        let found = self.matcher.resolve(&ingredient.name)?;
        let Some(density) = found.food.per_100_units() else {
            debug!(name = %ingredient.name, reference = %found.food.name, "matched reference has no density, keeping model values");
            return None;
        };
        debug!(
            name = %ingredient.name,
            reference = %found.food.name,
            catalog = %found.catalog,
            similarity = found.similarity,
            "overriding ingredient density from catalog"
        );
        Some((ingredient.with_density(density), found))
    }

    fn cross_check(&self, ingredients: &mut [Ingredient], similar: &FoodMatch<'_>) -> DishResolution {
        let dish = similar.food;
        let reference = ReferenceLink::from(dish);
        let total_amount: f64 = ingredients.iter().map(|i| i.amount).sum();

        let Some(catalog_total) = catalog_total_for(dish, total_amount) else {
            return DishResolution::SimilarSkipped {
                reference,
                similarity: similar.similarity,
            };
        };
        if catalog_total.calories <= 0.0 {
            return DishResolution::SimilarSkipped {
                reference,
                similarity: similar.similarity,
            };
        }

        let model_total = calculate_total_nutrition(ingredients);
        let divergence = (model_total.calories - catalog_total.calories).abs() / catalog_total.calories;

        if divergence <= self.config.divergence_threshold {
            return DishResolution::SimilarKept {
                reference,
                similarity: similar.similarity,
                divergence,
            };
        }

        debug!(
            dish = %dish.name,
            model_calories = model_total.calories,
            catalog_calories = catalog_total.calories,
            divergence,
            "model diverges from similar dish, rescaling to catalog"
        );

        // `catalog_total_for` only succeeds when a density exists
        let density = dish.per_100_units().unwrap_or_default();
        for field in NutrientField::ALL {
            let model = model_total.get(field);
            let target = catalog_total.get(field);
            if model > 0.0 {
                let factor = target / model;
                for ingredient in ingredients.iter_mut() {
                    let value = ingredient.nutrition_per_100g.get(field) * factor;
                    ingredient.nutrition_per_100g.set(field, value);
                }
            } else {
                for ingredient in ingredients.iter_mut() {
                    ingredient.nutrition_per_100g.set(field, density.get(field));
                }
            }
        }

        DishResolution::SimilarOverridden {
            reference,
            similarity: similar.similarity,
            divergence,
        }
    }
}

/// Reference nutrition scaled to `amount`, or `None` when the amount or the
/// reference weight is zero
fn catalog_total_for(dish: &ReferenceFood, amount: f64) -> Option<Nutrition> {
    if amount <= 0.0 {
        return None;
    }
    dish.nutrition_for_amount(amount)
}
