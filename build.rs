use std::collections::HashSet;
use std::path::Path;

const CATALOG_PATH: &str = "catalogs/reference_foods.json";
const RULES_PATH: &str = "rules/health_rules.json";

fn main() {
    let catalog = read_json(Path::new(CATALOG_PATH), "CATALOG");
    validate_catalog_structure(&catalog);

    let rules = read_json(Path::new(RULES_PATH), "RULES");
    validate_rules_structure(&rules);

    set_build_dependencies();
}

fn read_json(path: &Path, label: &str) -> serde_json::Value {
    // Ensure the embedded file exists at build time
    assert!(
        path.exists(),
        "\n\n{label} BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the file before building.\n",
        path.display()
    );

    let contents = std::fs::read_to_string(path).unwrap_or_else(|e| {
        panic!(
            "\n\n{label} BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            path.display()
        );
    });

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\n{label} BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            path.display()
        );
    })
}

fn validate_catalog_structure(catalog: &serde_json::Value) {
    assert!(
        catalog.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n"
    );

    let mut seen_ids = HashSet::new();
    let mut counts = Vec::new();

    for list in ["completedFoods", "ingredients"] {
        let foods = catalog
            .get(list)
            .and_then(serde_json::Value::as_array)
            .unwrap_or_else(|| {
                panic!(
                    "\n\nCATALOG BUILD ERROR: Missing '{list}' array\n\
                     The catalog must have top-level 'completedFoods' and 'ingredients' arrays.\n"
                );
            });

        for (i, food) in foods.iter().enumerate() {
            validate_food(food, list, i, &mut seen_ids);
        }
        counts.push(foods.len());
    }

    println!(
        "cargo:warning=Validated catalog: {} completed foods, {} ingredients",
        counts[0], counts[1]
    );
}

fn validate_food(food: &serde_json::Value, list: &str, index: usize, seen_ids: &mut HashSet<String>) {
    let id = food
        .get("id")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_else(|| {
            panic!("\n\nCATALOG BUILD ERROR: {list}[{index}] missing string 'id' field\n");
        });

    assert!(
        seen_ids.insert(id.to_string()),
        "\n\nCATALOG BUILD ERROR: Duplicate id '{id}' ({list}[{index}])\n"
    );

    assert!(
        food.get("name")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|n| !n.trim().is_empty()),
        "\n\nCATALOG BUILD ERROR: Food '{id}' ({list}[{index}]) missing non-empty 'name' field\n"
    );

    let unit_weight = food.get("unitWeight").and_then(serde_json::Value::as_f64);
    assert!(
        unit_weight.is_some_and(|w| w > 0.0),
        "\n\nCATALOG BUILD ERROR: Food '{id}' has no positive 'unitWeight'\n\
         Embedded entries must carry a serving size to derive densities from.\n"
    );

    let nutrition = food.get("nutrition").unwrap_or_else(|| {
        panic!("\n\nCATALOG BUILD ERROR: Food '{id}' missing 'nutrition' field\n");
    });
    for field in ["calories", "protein", "fat", "carbs"] {
        let value = nutrition.get(field).and_then(serde_json::Value::as_f64);
        assert!(
            value.is_some_and(|v| v >= 0.0),
            "\n\nCATALOG BUILD ERROR: Food '{id}' nutrition.{field} must be a non-negative number\n"
        );
    }
}

fn validate_rules_structure(rules: &serde_json::Value) {
    let base = rules
        .get("baseScore")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or_else(|| {
            panic!("\n\nRULES BUILD ERROR: Missing integer 'baseScore' field\n");
        });
    assert!(
        (1..=10).contains(&base),
        "\n\nRULES BUILD ERROR: 'baseScore' must be between 1 and 10, got {base}\n"
    );

    let tiers = rules
        .get("keywordTiers")
        .and_then(serde_json::Value::as_array)
        .map_or(0, |tiers| {
            for (i, tier) in tiers.iter().enumerate() {
                let has_keywords = tier
                    .get("keywords")
                    .and_then(serde_json::Value::as_array)
                    .is_some_and(|k| !k.is_empty());
                assert!(
                    tier.get("name").and_then(serde_json::Value::as_str).is_some() && has_keywords,
                    "\n\nRULES BUILD ERROR: keywordTiers[{i}] needs a 'name' and a non-empty 'keywords' array\n"
                );
            }
            tiers.len()
        });

    println!("cargo:warning=Validated scoring rules: base {base}, {tiers} keyword tiers");
}

fn set_build_dependencies() {
    // Rerun if the embedded data changes
    println!("cargo:rerun-if-changed={CATALOG_PATH}");
    println!("cargo:rerun-if-changed={RULES_PATH}");

    println!("cargo:rerun-if-changed=build.rs");
}
