use std::path::PathBuf;

use clap::Args;

use crate::analysis::pipeline::{AnalysisResult, FoodReport, NutritionPipeline};
use crate::analysis::reconcile::{DishResolution, ReconcileConfig, DEFAULT_DIVERGENCE_THRESHOLD};
use crate::analysis::scale::{calculate_nutrition_by_quantity, ServingCount};
use crate::cli::{load_catalog, load_rules, parse_fraction, read_input, OutputFormat};
use crate::core::analysis::ApiResponse;
use crate::core::record::NutritionData;
use crate::matching::similarity::DEFAULT_SIMILARITY_THRESHOLD;
use crate::scoring::health::{Alternative, HealthScore, HealthScorer};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Inference response JSON ({isFood, foodName, description, ingredients})
    /// Use '-' for stdin
    #[arg(required = true)]
    pub input: PathBuf,

    /// Number of servings
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(i64).range(1..=99))]
    pub quantity: i64,

    /// Also compute the health score
    #[arg(long)]
    pub score: bool,

    /// Number of alternatives to suggest when the score does not pass
    #[arg(long, default_value = "3")]
    pub alternatives: usize,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Path to custom scoring rules file
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Minimum name similarity for fuzzy catalog matches (0-1)
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD, value_parser = parse_fraction)]
    pub similarity_threshold: f64,

    /// Relative calorie difference that lets a similar dish override the model (0-1)
    #[arg(long, default_value_t = DEFAULT_DIVERGENCE_THRESHOLD, value_parser = parse_fraction)]
    pub divergence_threshold: f64,

    /// Emit a food log entry for this user
    #[arg(long)]
    pub user_id: Option<String>,

    /// Image URL to attach to the log entry
    #[arg(long, requires = "user_id")]
    pub image_url: Option<String>,
}

/// Execute the analyze command
///
/// # Errors
///
/// Returns an error if the input, catalog or rules cannot be read or parsed.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: AnalyzeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let db = load_catalog(args.catalog.as_deref())?;
    if verbose {
        eprintln!(
            "Loaded catalog with {} completed foods and {} ingredients",
            db.completed_foods.len(),
            db.ingredients.len()
        );
    }

    let content = read_input(&args.input)?;
    let response: ApiResponse = serde_json::from_str(&content)?;

    let config = ReconcileConfig {
        similarity_threshold: args.similarity_threshold,
        divergence_threshold: args.divergence_threshold,
    };
    let pipeline = NutritionPipeline::with_config(&db, config);

    let report = match pipeline.process_api_response(&response) {
        AnalysisResult::Food(report) => report,
        not_food @ AnalysisResult::NotFood { .. } => {
            print_not_food(&not_food, format)?;
            return Ok(());
        }
    };

    let quantity = ServingCount::new(args.quantity)?;
    let record = calculate_nutrition_by_quantity(&report.record, quantity)?;

    let scorer = if args.score {
        Some(HealthScorer::new(load_rules(args.rules.as_deref())?))
    } else {
        None
    };
    let health = scorer.as_ref().map(|s| s.score_record(&record));
    let alternatives = match (&scorer, &health) {
        (Some(scorer), Some(h)) if h.verdict == crate::scoring::Verdict::Reconsider => {
            scorer.suggest_alternatives(&db, args.alternatives)
        }
        _ => Vec::new(),
    };

    let log_entry = args
        .user_id
        .as_ref()
        .map(|user| record.to_log_entry(user.clone(), chrono::Utc::now(), args.image_url.clone()));

    match format {
        OutputFormat::Text => {
            print_record_text(&record, quantity);
            print_report_text(&report, verbose);
            if let Some(h) = &health {
                print_health_text(h, &alternatives);
            }
            if let Some(entry) = &log_entry {
                println!("\nLogged for {} at {}", entry.user_id, entry.logged_at.to_rfc3339());
            }
        }
        OutputFormat::Json => {
            let mut output = serde_json::json!({
                "status": "food",
                "quantity": quantity,
                "record": record,
                "dish": report.dish,
                "corrections": report.corrections,
                "warnings": report.warnings,
            });
            if let Some(h) = &health {
                output["health"] = serde_json::to_value(h)?;
                output["alternatives"] = serde_json::to_value(&alternatives)?;
            }
            if let Some(entry) = &log_entry {
                output["logEntry"] = serde_json::to_value(entry)?;
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("food_name\tquantity\tcalories\tprotein\tfat\tcarbs\treference\thealth_score");
            println!(
                "{}\t{}\t{}\t{:.1}\t{:.1}\t{:.1}\t{}\t{}",
                record.food_name,
                quantity,
                record.nutrition.calories,
                record.nutrition.protein,
                record.nutrition.fat,
                record.nutrition.carbs,
                record.reference.as_ref().map_or("", |r| r.id.0.as_str()),
                health.as_ref().map_or(String::new(), |h| h.score.to_string()),
            );
        }
    }

    Ok(())
}

fn print_not_food(result: &AnalysisResult, format: OutputFormat) -> anyhow::Result<()> {
    let AnalysisResult::NotFood {
        message,
        description,
    } = result
    else {
        return Ok(());
    };

    match format {
        OutputFormat::Text => {
            println!("Not food: {message}");
            if let Some(desc) = description {
                println!("Description: {desc}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Tsv => {
            println!("status\tmessage\tdescription");
            println!("not_food\t{message}\t{}", description.as_deref().unwrap_or(""));
        }
    }
    Ok(())
}

/// Text rendering of a record, shared with `scale`
pub(crate) fn print_record_text(record: &NutritionData, quantity: ServingCount) {
    println!("Food: {}", record.food_name);
    println!("Servings: {quantity}");

    if !record.ingredients.is_empty() {
        let name_width = record
            .ingredients
            .iter()
            .map(|i| i.name.chars().count())
            .max()
            .unwrap_or(4)
            .max(4);
        println!("\nIngredients:");
        for line in &record.ingredients {
            println!("  {:<name_w$}  {}", line.name, line.amount.display(), name_w = name_width);
        }
    }

    println!("\nNutrition:");
    println!("  Calories: {} kcal", record.nutrition.calories);
    println!("  Protein:  {:.1} g", record.nutrition.protein);
    println!("  Fat:      {:.1} g", record.nutrition.fat);
    println!("  Carbs:    {:.1} g", record.nutrition.carbs);

    if let Some(reference) = &record.reference {
        println!("\nCatalog entry: {} ({})", reference.name, reference.id);
    }
}

fn print_report_text(report: &FoodReport, verbose: bool) {
    match &report.dish {
        DishResolution::Exact { reference } => {
            println!("Dish: exact catalog match '{}'", reference.name);
        }
        DishResolution::SimilarKept {
            reference,
            similarity,
            divergence,
        } => {
            println!(
                "Dish: similar to '{}' ({:.0}% similar), model within {:.0}%; kept model values",
                reference.name,
                similarity * 100.0,
                divergence * 100.0
            );
        }
        DishResolution::SimilarOverridden {
            reference,
            similarity,
            divergence,
        } => {
            println!(
                "Dish: similar to '{}' ({:.0}% similar), model off by {:.0}%; rescaled to catalog",
                reference.name,
                similarity * 100.0,
                divergence * 100.0
            );
        }
        DishResolution::SimilarSkipped {
            reference,
            similarity,
        } => {
            println!(
                "Dish: similar to '{}' ({:.0}% similar), nothing to compare",
                reference.name,
                similarity * 100.0
            );
        }
        DishResolution::None => {
            if verbose {
                println!("Dish: no catalog match");
            }
        }
    }

    if !report.corrections.is_empty() {
        println!("\nCorrected from catalog:");
        for c in &report.corrections {
            println!(
                "  {} -> {} ({}, {:?}, {:.0}%)",
                c.name,
                c.reference.name,
                c.catalog,
                c.tier,
                c.similarity * 100.0
            );
        }
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &report.warnings {
            println!("  {w}");
        }
    }
}

/// Text rendering of a health score, shared with `score`
pub(crate) fn print_health_text(health: &HealthScore, alternatives: &[Alternative<'_>]) {
    println!("\nHealth score: {}/10 ({})", health.score, health.verdict);
    println!("  base {:>+3}", health.base);
    for adj in &health.adjustments {
        println!("  {:>+3}  {}", adj.delta, adj.reason);
    }

    if !alternatives.is_empty() {
        println!("\nHealthier alternatives:");
        for alt in alternatives {
            println!(
                "  {} ({}/10, {:.0} kcal per {}g)",
                alt.food.name, alt.score.score, alt.food.nutrition.calories, alt.food.unit_weight
            );
        }
    }
}
