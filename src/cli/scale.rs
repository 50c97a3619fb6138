//! Scale command - rescale a saved record.
//!
//! A record that was already scaled composes: a 2-serving record scaled by
//! 3 shows 6 servings. Edits given with `--rename` and `--set` fold the
//! record into a single serving first, then it is scaled to `--quantity`.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::analysis::scale::{calculate_nutrition_by_quantity, record_servings, ServingCount, ServingSession};
use crate::cli::analyze::print_record_text;
use crate::cli::{parse_non_negative, parse_record, read_input, OutputFormat};
use crate::core::types::NutrientField;

#[derive(Args)]
pub struct ScaleArgs {
    /// Nutrition record JSON (a bare record, or the output of
    /// `analyze --format json`). Use '-' for stdin
    #[arg(required = true)]
    pub record: PathBuf,

    /// Number of servings
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(i64).range(1..=99))]
    pub quantity: i64,

    /// Replace the food name before scaling
    #[arg(long)]
    pub rename: Option<String>,

    /// Overwrite a nutrient before scaling, as FIELD=VALUE (e.g. calories=450)
    #[arg(long = "set", value_parser = parse_nutrient_edit)]
    pub edits: Vec<(NutrientField, f64)>,
}

/// Execute the scale command
///
/// # Errors
///
/// Returns an error if the record cannot be read, an edit is rejected, or
/// the composed serving count leaves `1..=99`.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ScaleArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let content = read_input(&args.record)?;
    let record = parse_record(&content)?;
    let quantity = ServingCount::new(args.quantity)?;

    let (scaled, servings) = if args.rename.is_none() && args.edits.is_empty() {
        let base = record_servings(&record)?;
        if verbose && base > ServingCount::ONE {
            eprintln!("Record is already at {base} servings; scaling composes to {base} x {quantity}");
        }
        let scaled = calculate_nutrition_by_quantity(&record, quantity)?;
        let servings = ServingCount::new(i64::from(base.get()) * i64::from(quantity.get()))?;
        (scaled, servings)
    } else {
        let mut session = ServingSession::new(record);
        if let Some(name) = &args.rename {
            session.rename(name)?;
        }
        for (field, value) in &args.edits {
            session.edit_nutrient(*field, *value)?;
        }
        if verbose {
            eprintln!("Applied edits; the record is no longer linked to the catalog");
        }
        (session.set_quantity(quantity).clone(), quantity)
    };

    match format {
        OutputFormat::Text => print_record_text(&scaled, servings),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "quantity": servings,
                "record": scaled,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("ingredient\tamount");
            for line in &scaled.ingredients {
                println!("{}\t{}", line.name, line.amount.display());
            }
            println!(
                "total\tcalories={} protein={:.1} fat={:.1} carbs={:.1}",
                scaled.nutrition.calories, scaled.nutrition.protein, scaled.nutrition.fat, scaled.nutrition.carbs
            );
        }
    }

    Ok(())
}

fn parse_nutrient_edit(s: &str) -> Result<(NutrientField, f64), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("'{s}' is not FIELD=VALUE"))?;
    let field = NutrientField::from_str(field.trim(), true)?;
    let value = parse_non_negative(value.trim())?;
    Ok((field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nutrient_edit() {
        let (field, value) = parse_nutrient_edit("calories=450").unwrap();
        assert_eq!(field, NutrientField::Calories);
        assert!((value - 450.0).abs() < f64::EPSILON);

        assert_eq!(parse_nutrient_edit("Protein = 12.5").unwrap().0, NutrientField::Protein);
        assert!(parse_nutrient_edit("calories").is_err());
        assert!(parse_nutrient_edit("sugar=1").is_err());
        assert!(parse_nutrient_edit("fat=-1").is_err());
    }

    #[test]
    fn test_parse_record_wrapped_or_bare() {
        let bare = r#"{"foodName": "김밥", "ingredients": [], "nutrition": {"calories": 480, "protein": 12.0, "fat": 9.5, "carbs": 85.0}}"#;
        let wrapped = format!(r#"{{"status": "food", "quantity": 1, "record": {bare}}}"#);

        let a = parse_record(bare).unwrap();
        let b = parse_record(&wrapped).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.nutrition.calories, 480);
    }
}
