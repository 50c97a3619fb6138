//! Score command - health score for a record or for values given inline.

use std::path::PathBuf;

use clap::Args;

use crate::cli::analyze::print_health_text;
use crate::cli::{load_catalog, load_rules, parse_non_negative, parse_record, read_input, OutputFormat};
use crate::core::types::Nutrition;
use crate::scoring::health::HealthScorer;
use crate::scoring::Verdict;

/// Arguments for the score command
#[derive(Args)]
pub struct ScoreArgs {
    /// Nutrition record JSON to score. Use '-' for stdin
    #[arg(conflicts_with = "name", required_unless_present = "name")]
    pub record: Option<PathBuf>,

    /// Food name (instead of a record file)
    #[arg(long, requires = "calories")]
    pub name: Option<String>,

    /// Calories (kcal)
    #[arg(long, value_parser = parse_non_negative)]
    pub calories: Option<f64>,

    /// Protein (g)
    #[arg(long, default_value = "0", value_parser = parse_non_negative)]
    pub protein: f64,

    /// Fat (g)
    #[arg(long, default_value = "0", value_parser = parse_non_negative)]
    pub fat: f64,

    /// Carbohydrates (g)
    #[arg(long, default_value = "0", value_parser = parse_non_negative)]
    pub carbs: f64,

    /// Path to custom scoring rules file
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Path to custom catalog file for alternatives
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Number of alternatives to suggest when the score does not pass
    #[arg(long, default_value = "3")]
    pub alternatives: usize,
}

/// Execute the score command
///
/// # Errors
///
/// Returns an error if the record, rules or catalog cannot be loaded.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ScoreArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (food_name, nutrition) = match (&args.record, &args.name) {
        (Some(path), _) => {
            let record = parse_record(&read_input(path)?)?;
            (record.food_name.clone(), record.nutrition.as_nutrition())
        }
        (None, Some(name)) => (
            name.clone(),
            Nutrition::new(args.calories.unwrap_or(0.0), args.protein, args.fat, args.carbs),
        ),
        (None, None) => anyhow::bail!("either a record file or --name is required"),
    };

    let scorer = HealthScorer::new(load_rules(args.rules.as_deref())?);
    if verbose {
        eprintln!(
            "Scoring rules: base {}, {} calorie bands, {} keyword tiers",
            scorer.rules().base_score,
            scorer.rules().calorie_bands.len(),
            scorer.rules().keyword_tiers.len()
        );
    }

    let health = scorer.score(&food_name, &nutrition);

    let db = if health.verdict == Verdict::Reconsider && args.alternatives > 0 {
        Some(load_catalog(args.catalog.as_deref())?)
    } else {
        None
    };
    let alternatives = db
        .as_ref()
        .map(|db| scorer.suggest_alternatives(db, args.alternatives))
        .unwrap_or_default();

    match format {
        OutputFormat::Text => {
            println!("Food: {food_name}");
            println!(
                "Nutrition: {:.0} kcal, protein {:.1} g, fat {:.1} g, carbs {:.1} g",
                nutrition.calories, nutrition.protein, nutrition.fat, nutrition.carbs
            );
            print_health_text(&health, &alternatives);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "foodName": food_name,
                "nutrition": nutrition,
                "health": health,
                "alternatives": alternatives,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("food_name\tscore\tverdict\traw\tadjustments");
            let adjustments: Vec<String> = health
                .adjustments
                .iter()
                .map(|a| format!("{:+} {}", a.delta, a.reason))
                .collect();
            println!(
                "{}\t{}\t{}\t{}\t{}",
                food_name,
                health.score,
                health.verdict,
                health.raw,
                adjustments.join("; ")
            );
        }
    }

    Ok(())
}
