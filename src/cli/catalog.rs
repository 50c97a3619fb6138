use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::catalog::store::ReferenceDatabase;
use crate::cli::{load_catalog, OutputFormat};
use crate::core::reference::{FoodId, ReferenceFood};
use crate::core::types::CatalogKind;

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List the foods in the catalog
    List {
        /// Path to custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Only list one catalog
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Show details of a specific food
    Show {
        /// Food ID (e.g., "cf_chicken_breast")
        #[arg(required = true)]
        id: String,

        /// Path to custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Export the catalog to a file (gzip-compressed when the name ends in .gz)
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        /// Path to custom catalog file to export (defaults to embedded)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum KindArg {
    Completed,
    Ingredient,
}

impl From<KindArg> for CatalogKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Completed => CatalogKind::CompletedFood,
            KindArg::Ingredient => CatalogKind::Ingredient,
        }
    }
}

/// Execute catalog subcommand
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the food is not found,
/// or the export cannot be written.
pub fn run(args: CatalogArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CatalogCommands::List { catalog, kind } => {
            run_list(catalog.as_deref(), kind.map(CatalogKind::from), format, verbose)
        }
        CatalogCommands::Show { id, catalog } => run_show(&id, catalog.as_deref(), format),
        CatalogCommands::Export { output, catalog } => run_export(&output, catalog.as_deref()),
    }
}

fn run_list(
    catalog_path: Option<&Path>,
    kind_filter: Option<CatalogKind>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let db = load_catalog(catalog_path)?;

    if verbose {
        eprintln!("Loaded catalog with {} foods", db.len());
    }

    let kinds = [CatalogKind::CompletedFood, CatalogKind::Ingredient];
    let listed: Vec<(CatalogKind, &ReferenceFood)> = kinds
        .into_iter()
        .filter(|k| kind_filter.map_or(true, |f| f == *k))
        .flat_map(|k| db.foods(k).iter().map(move |f| (k, f)))
        .collect();

    match format {
        OutputFormat::Text => {
            let id_width = listed.iter().map(|(_, f)| f.id.0.len()).max().unwrap_or(2).max(2);
            let name_width = listed
                .iter()
                .map(|(_, f)| f.name.chars().count())
                .max()
                .unwrap_or(4)
                .max(4);

            println!("Reference Foods ({} entries)\n", listed.len());
            println!(
                "{:<id_w$} {:<name_w$} {:<14} {:>8} {:>8} {:>8} {:>8} {:>8}",
                "ID",
                "Name",
                "Kind",
                "Unit",
                "kcal",
                "Protein",
                "Fat",
                "Carbs",
                id_w = id_width,
                name_w = name_width,
            );
            println!("{}", "-".repeat(id_width + name_width + 14 + 5 * 9 + 2));

            for (kind, food) in &listed {
                println!(
                    "{:<id_w$} {:<name_w$} {:<14} {:>7}g {:>8.1} {:>8.1} {:>8.1} {:>8.1}",
                    food.id.0,
                    food.name,
                    kind.to_string(),
                    food.unit_weight,
                    food.nutrition.calories,
                    food.nutrition.protein,
                    food.nutrition.fat,
                    food.nutrition.carbs,
                    id_w = id_width,
                    name_w = name_width,
                );
                if verbose {
                    if let Some(desc) = &food.description {
                        println!("  └─ {desc}");
                    }
                }
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = listed
                .iter()
                .map(|(kind, food)| {
                    serde_json::json!({
                        "id": food.id.0,
                        "name": food.name,
                        "kind": kind,
                        "unitWeight": food.unit_weight,
                        "nutrition": food.nutrition,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("id\tname\tkind\tunit_weight\tcalories\tprotein\tfat\tcarbs");
            for (kind, food) in &listed {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    food.id.0,
                    food.name,
                    kind,
                    food.unit_weight,
                    food.nutrition.calories,
                    food.nutrition.protein,
                    food.nutrition.fat,
                    food.nutrition.carbs,
                );
            }
        }
    }

    Ok(())
}

fn run_show(id: &str, catalog_path: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let db = load_catalog(catalog_path)?;

    let (kind, food) = db
        .get(&FoodId::new(id))
        .ok_or_else(|| anyhow::anyhow!("Food '{}' not found", id))?;

    match format {
        OutputFormat::Text => {
            println!("Food: {}\n", food.name);
            println!("ID:          {}", food.id);
            println!("Kind:        {kind}");
            println!("Unit weight: {}g", food.unit_weight);

            if let Some(desc) = &food.description {
                println!("\nDescription: {desc}");
            }

            println!("\nPer {}g:", food.unit_weight);
            println!("  Calories: {:.1} kcal", food.nutrition.calories);
            println!("  Protein:  {:.1} g", food.nutrition.protein);
            println!("  Fat:      {:.1} g", food.nutrition.fat);
            println!("  Carbs:    {:.1} g", food.nutrition.carbs);

            match food.per_100_units() {
                Some(density) => {
                    println!("\nPer 100g:");
                    println!("  Calories: {:.1} kcal", density.calories);
                    println!("  Protein:  {:.1} g", density.protein);
                    println!("  Fat:      {:.1} g", density.fat);
                    println!("  Carbs:    {:.1} g", density.carbs);
                }
                None => println!("\nNo per-100g density (unit weight is not positive)"),
            }
        }
        OutputFormat::Json => {
            let mut json = serde_json::to_value(food)?;
            json["kind"] = serde_json::to_value(kind)?;
            json["per100g"] = serde_json::to_value(food.per_100_units())?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            println!("id\tname\tkind\tunit_weight\tcalories\tprotein\tfat\tcarbs");
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                food.id.0,
                food.name,
                kind,
                food.unit_weight,
                food.nutrition.calories,
                food.nutrition.protein,
                food.nutrition.fat,
                food.nutrition.carbs,
            );
        }
    }

    Ok(())
}

fn run_export(output: &Path, catalog_path: Option<&Path>) -> anyhow::Result<()> {
    let db = load_catalog(catalog_path)?;
    write_catalog(&db, output)?;

    println!("Exported {} foods to {}", db.len(), output.display());

    Ok(())
}

/// Write the catalog next to `output` and rename it into place, so a failed
/// export never leaves a truncated file behind
fn write_catalog(db: &ReferenceDatabase, output: &Path) -> anyhow::Result<()> {
    let json = db.to_json()?;

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;

    let gzip = output.extension().is_some_and(|ext| ext == "gz");
    if gzip {
        let mut encoder = GzEncoder::new(temp.as_file_mut(), Compression::default());
        encoder.write_all(json.as_bytes())?;
        encoder.finish()?;
    } else {
        temp.write_all(json.as_bytes())?;
    }

    temp.persist(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_write_catalog_plain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let db = ReferenceDatabase::load_embedded().unwrap();

        write_catalog(&db, &path).unwrap();

        let loaded = ReferenceDatabase::load_from_file(&path).unwrap();
        assert_eq!(loaded.len(), db.len());
    }

    #[test]
    fn test_write_catalog_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json.gz");
        let db = ReferenceDatabase::load_embedded().unwrap();

        write_catalog(&db, &path).unwrap();

        let mut raw = String::new();
        GzDecoder::new(std::fs::File::open(&path).unwrap())
            .read_to_string(&mut raw)
            .unwrap();
        assert!(raw.contains("completedFoods"));

        let loaded = ReferenceDatabase::load_from_file(&path).unwrap();
        assert_eq!(loaded.len(), db.len());
    }

    #[test]
    fn test_write_catalog_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_catalog(&ReferenceDatabase::load_embedded().unwrap(), &path).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
