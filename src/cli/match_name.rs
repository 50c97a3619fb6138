use std::path::PathBuf;

use clap::Args;

use crate::cli::{load_catalog, parse_fraction, OutputFormat};
use crate::matching::engine::NameMatcher;
use crate::matching::similarity::{similarity, DEFAULT_SIMILARITY_THRESHOLD};

#[derive(Args)]
pub struct MatchArgs {
    /// Food or ingredient name as the model emitted it
    #[arg(required = true)]
    pub name: String,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Minimum name similarity for fuzzy matches (0-1)
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD, value_parser = parse_fraction)]
    pub similarity_threshold: f64,
}

/// Execute the match command
///
/// A miss is reported, not treated as an error.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: MatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let db = load_catalog(args.catalog.as_deref())?;
    let matcher = NameMatcher::with_threshold(&db, args.similarity_threshold);
    let name = args.name.trim();

    let found = matcher.resolve(name);

    match format {
        OutputFormat::Text => match &found {
            Some(m) => {
                println!("{name} -> {} ({})", m.food.name, m.food.id);
                println!("  Catalog:    {}", m.catalog);
                println!("  Tier:       {:?}", m.tier);
                println!("  Similarity: {:.3}", m.similarity);
                println!(
                    "  Serving:    {}g, {:.0} kcal",
                    m.food.unit_weight, m.food.nutrition.calories
                );
            }
            None => {
                println!("{name}: no match (threshold {:.2})", matcher.threshold());
                if verbose {
                    if let Some((closest, score)) = closest_name(&db, name) {
                        println!("  Closest: {closest} ({score:.3})");
                    }
                }
            }
        },
        OutputFormat::Json => {
            let output = serde_json::json!({
                "query": name,
                "threshold": matcher.threshold(),
                "match": found,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("query\tid\tname\tcatalog\ttier\tsimilarity");
            match &found {
                Some(m) => println!(
                    "{}\t{}\t{}\t{}\t{:?}\t{:.3}",
                    name, m.food.id, m.food.name, m.catalog, m.tier, m.similarity
                ),
                None => println!("{name}\t\t\t\t\t"),
            }
        }
    }

    Ok(())
}

/// Best-scoring name across both catalogs, ignoring the threshold
fn closest_name<'a>(db: &'a crate::catalog::store::ReferenceDatabase, name: &str) -> Option<(&'a str, f64)> {
    db.completed_foods
        .iter()
        .chain(db.ingredients.iter())
        .map(|f| (f.name.as_str(), similarity(name, &f.name)))
        .fold(None, |best, (n, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((n, s)),
        })
}
