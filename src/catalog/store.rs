use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::core::reference::{FoodId, ReferenceFood};
use crate::core::types::{CatalogKind, NutrientField};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    pub version: String,
    pub created_at: String,
    #[serde(default)]
    pub completed_foods: Vec<ReferenceFood>,
    #[serde(default)]
    pub ingredients: Vec<ReferenceFood>,
}

/// The reference food database: completed foods and ingredients with
/// exact-name indexes.
///
/// Loaded once and read-only afterwards; share it by reference.
#[derive(Debug, Default)]
pub struct ReferenceDatabase {
    /// Whole dishes and packaged products
    pub completed_foods: Vec<ReferenceFood>,

    /// Raw components
    pub ingredients: Vec<ReferenceFood>,

    /// Index: exact name -> first completed food with that name
    completed_by_name: HashMap<String, usize>,

    /// Index: exact name -> first ingredient with that name
    ingredient_by_name: HashMap<String, usize>,

    /// Index: ID -> (catalog, position)
    id_to_index: HashMap<FoodId, (CatalogKind, usize)>,
}

impl ReferenceDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a database from two in-memory catalogs
    pub fn from_parts(completed_foods: Vec<ReferenceFood>, ingredients: Vec<ReferenceFood>) -> Self {
        let mut db = Self::new();
        for food in completed_foods {
            db.add_food(CatalogKind::CompletedFood, food);
        }
        for food in ingredients {
            db.add_food(CatalogKind::Ingredient, food);
        }
        db
    }

    /// Load the embedded default catalog
    pub fn load_embedded() -> Result<Self, CatalogError> {
        // Validated at compile time by build.rs
        const EMBEDDED_CATALOG: &str = include_str!("../../catalogs/reference_foods.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load catalog from a JSON file, gzip-compressed when the name ends in `.gz`
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let is_gzip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

        let content = if is_gzip {
            let file = std::fs::File::open(path)?;
            let mut decoder = GzDecoder::new(file);
            let mut content = String::new();
            decoder.read_to_string(&mut content)?;
            content
        } else {
            std::fs::read_to_string(path)?
        };
        Self::from_json(&content)
    }

    /// Parse catalog from JSON string
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            warn!(
                expected = CATALOG_VERSION,
                found = %data.version,
                "catalog version mismatch"
            );
        }

        Ok(Self::from_parts(data.completed_foods, data.ingredients))
    }

    /// Add a food to one of the two catalogs.
    ///
    /// Entries with an unusable serving size are kept (their absolute
    /// nutrition is still valid for an exact dish match) but never provide
    /// a density.
    pub fn add_food(&mut self, kind: CatalogKind, food: ReferenceFood) {
        if food.per_100_units().is_none() {
            warn!(id = %food.id, name = %food.name, unit_weight = food.unit_weight, "reference food has no usable unit weight");
        }
        if NutrientField::ALL
            .iter()
            .any(|f| !(food.nutrition.get(*f) >= 0.0))
        {
            warn!(id = %food.id, name = %food.name, "reference food has negative or missing nutrition values");
        }

        let (foods, by_name) = match kind {
            CatalogKind::CompletedFood => (&mut self.completed_foods, &mut self.completed_by_name),
            CatalogKind::Ingredient => (&mut self.ingredients, &mut self.ingredient_by_name),
        };
        let index = foods.len();

        // First entry with a name wins, like a linear scan would
        by_name.entry(food.name.clone()).or_insert(index);
        self.id_to_index.insert(food.id.clone(), (kind, index));
        foods.push(food);
    }

    /// Get a food by ID from either catalog
    pub fn get(&self, id: &FoodId) -> Option<(CatalogKind, &ReferenceFood)> {
        self.id_to_index
            .get(id)
            .map(|&(kind, idx)| (kind, &self.foods(kind)[idx]))
    }

    /// All foods in one catalog, in catalog order
    pub fn foods(&self, kind: CatalogKind) -> &[ReferenceFood] {
        match kind {
            CatalogKind::CompletedFood => &self.completed_foods,
            CatalogKind::Ingredient => &self.ingredients,
        }
    }

    /// Exact-name lookup in one catalog
    pub fn find_exact(&self, kind: CatalogKind, name: &str) -> Option<&ReferenceFood> {
        let index = match kind {
            CatalogKind::CompletedFood => &self.completed_by_name,
            CatalogKind::Ingredient => &self.ingredient_by_name,
        };
        index.get(name).map(|&idx| &self.foods(kind)[idx])
    }

    /// Exact-name lookup among completed foods
    pub fn find_completed_food(&self, name: &str) -> Option<&ReferenceFood> {
        self.find_exact(CatalogKind::CompletedFood, name)
    }

    /// Export catalog to JSON
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            completed_foods: self.completed_foods.clone(),
            ingredients: self.ingredients.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of foods across both catalogs
    pub fn len(&self) -> usize {
        self.completed_foods.len() + self.ingredients.len()
    }

    /// Check if both catalogs are empty
    pub fn is_empty(&self) -> bool {
        self.completed_foods.is_empty() && self.ingredients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Nutrition;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_load_embedded_catalog() {
        let db = ReferenceDatabase::load_embedded().unwrap();
        assert!(!db.is_empty());
        assert!(!db.completed_foods.is_empty());
        assert!(!db.ingredients.is_empty());
    }

    #[test]
    fn test_embedded_catalog_has_chicken_breast() {
        let db = ReferenceDatabase::load_embedded().unwrap();
        let food = db.find_completed_food("닭가슴살").unwrap();
        assert!((food.unit_weight - 100.0).abs() < f64::EPSILON);
        assert!((food.nutrition.calories - 165.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_get_by_id() {
        let db = ReferenceDatabase::from_parts(
            vec![ReferenceFood::new("cf1", "비빔밥", 500.0, Nutrition::new(600.0, 20.0, 15.0, 95.0))],
            vec![ReferenceFood::new("in1", "쌀밥", 210.0, Nutrition::new(300.0, 5.0, 0.6, 66.0))],
        );
        let (kind, food) = db.get(&FoodId::new("in1")).unwrap();
        assert_eq!(kind, CatalogKind::Ingredient);
        assert_eq!(food.name, "쌀밥");
        assert!(db.get(&FoodId::new("missing")).is_none());
    }

    #[test]
    fn test_find_exact_first_duplicate_wins() {
        let db = ReferenceDatabase::from_parts(
            vec![
                ReferenceFood::new("a", "김밥", 250.0, Nutrition::new(400.0, 10.0, 8.0, 70.0)),
                ReferenceFood::new("b", "김밥", 300.0, Nutrition::new(500.0, 12.0, 10.0, 85.0)),
            ],
            Vec::new(),
        );
        let food = db.find_completed_food("김밥").unwrap();
        assert_eq!(food.id, FoodId::new("a"));
        assert!(db.find_exact(CatalogKind::Ingredient, "김밥").is_none());
    }

    #[test]
    fn test_find_exact_is_not_fuzzy() {
        let db = ReferenceDatabase::from_parts(
            vec![ReferenceFood::new("a", "김밥", 250.0, Nutrition::zero())],
            Vec::new(),
        );
        assert!(db.find_completed_food("김밥 ").is_none());
        assert!(db.find_completed_food("참치김밥").is_none());
    }

    #[test]
    fn test_to_json_round_trip() {
        let db = ReferenceDatabase::load_embedded().unwrap();
        let json = db.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"completedFoods\""));
        assert!(json.contains("\"unitWeight\""));

        let reloaded = ReferenceDatabase::from_json(&json).unwrap();
        assert_eq!(reloaded.len(), db.len());
    }

    #[test]
    fn test_load_gzip_file() {
        let json = r#"{
            "version": "1.0.0",
            "createdAt": "2024-01-01T00:00:00Z",
            "completedFoods": [
                {"id": "cf1", "name": "라면", "unitWeight": 120, "nutrition": {"calories": 500, "protein": 10, "fat": 16, "carbs": 79}}
            ]
        }"#;
        let mut file = tempfile::NamedTempFile::with_suffix(".json.gz").unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes()).unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let db = ReferenceDatabase::load_from_file(file.path()).unwrap();
        assert_eq!(db.completed_foods.len(), 1);
        assert!(db.ingredients.is_empty());
    }

    #[test]
    fn test_load_invalid_json() {
        let result = ReferenceDatabase::from_json("{ not json");
        assert!(matches!(result, Err(CatalogError::ParseError(_))));
    }
}
