//! Command-line interface for nutri-solver.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **analyze**: Turn an inference response into a nutrition record
//! - **scale**: Rescale a record to a serving count
//! - **score**: Health score with breakdown and alternatives
//! - **match**: Show how a food name resolves against the catalog
//! - **catalog**: List, show, or export the reference catalog
//! - **serve**: Start the JSON web service
//!
//! ## Usage
//!
//! ```text
//! # Analyze a saved inference response
//! nutri-solver analyze response.json
//!
//! # Pipe from another tool, two servings, with a health score
//! cat response.json | nutri-solver analyze - --quantity 2 --score
//!
//! # JSON output for scripting
//! nutri-solver analyze response.json --format json
//!
//! # Which catalog entry does a name hit?
//! nutri-solver match 프로틴쉐잌
//!
//! # Start the web service
//! nutri-solver serve --port 8080
//! ```

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::catalog::store::ReferenceDatabase;
use crate::core::record::NutritionData;
use crate::scoring::rules::ScoringRules;

pub mod analyze;
pub mod catalog;
pub mod match_name;
pub mod scale;
pub mod score;

#[derive(Parser)]
#[command(name = "nutri-solver")]
#[command(version)]
#[command(about = "Reconcile model-estimated meal nutrition against a reference food catalog")]
#[command(
    long_about = "nutri-solver turns a noisy food description from an image or speech model into a trustworthy nutrition record.\n\nIt checks the model's ingredients against a local catalog of dishes and ingredients and provides:\n- Catalog nutrition when the dish is known exactly\n- Per-ingredient corrections from the catalog\n- A cross-check against similar dishes\n- Serving-count scaling and a 1-10 health score"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze an inference response into a nutrition record
    Analyze(analyze::AnalyzeArgs),

    /// Scale a nutrition record to a serving count
    Scale(scale::ScaleArgs),

    /// Compute the health score of a food
    Score(score::ScoreArgs),

    /// Resolve a food name against the catalog
    Match(match_name::MatchArgs),

    /// Inspect the reference catalog
    Catalog(catalog::CatalogArgs),

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Path to custom scoring rules file
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Read a file, or stdin when the path is `-`
pub(crate) fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Custom catalog if given, embedded catalog otherwise
pub(crate) fn load_catalog(path: Option<&Path>) -> anyhow::Result<ReferenceDatabase> {
    let db = match path {
        Some(path) => ReferenceDatabase::load_from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => ReferenceDatabase::load_embedded()?,
    };
    Ok(db)
}

/// Custom scoring rules if given, embedded rules otherwise
pub(crate) fn load_rules(path: Option<&Path>) -> anyhow::Result<ScoringRules> {
    let rules = match path {
        Some(path) => ScoringRules::load_from_file(path)
            .with_context(|| format!("Failed to load scoring rules {}", path.display()))?,
        None => ScoringRules::load_embedded()?,
    };
    Ok(rules)
}

/// Parse a record given bare or wrapped under `record` (as `analyze
/// --format json` prints it)
pub(crate) fn parse_record(content: &str) -> anyhow::Result<NutritionData> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let record = match value.get("record") {
        Some(inner) => serde_json::from_value(inner.clone())?,
        None => serde_json::from_value(value)?,
    };
    Ok(record)
}

/// clap value parser for thresholds in `[0, 1]`
pub(crate) fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not between 0 and 1"))
    }
}

/// clap value parser for non-negative nutrient amounts
pub(crate) fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be a non-negative number"))
    }
}
