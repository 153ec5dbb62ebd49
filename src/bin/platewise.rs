//! platewise: command-line front end.
//!
//! Runs the analysis pipeline in-process against the configured providers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use platewise::config::{Config, Secrets};
use platewise::{ExtractedFoodItem, ImageInput, MealAnalysis, ResolvedNutrientProfile};

/// Platewise CLI
#[derive(Parser)]
#[command(name = "platewise")]
#[command(version = platewise::PKG_VERSION)]
#[command(about = "Estimate calories and macros from food photos")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of a table.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a food photo
    Analyze {
        /// Image file (JPEG, PNG, WebP, GIF, BMP)
        image: PathBuf,
    },

    /// Resolve one food item without a photo
    Lookup {
        /// Food name, e.g. "white rice"
        food: String,
        /// Quantity with unit, e.g. "1 cup"
        #[arg(short, long, default_value = "")]
        quantity: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Command::Version = args.command {
        println!("platewise {}", platewise::version_string());
        return Ok(());
    }

    let config = Config::load_or_default(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let analyzer = config.analyzer_builder(&secrets)?.build()?;

    match args.command {
        Command::Analyze { image } => {
            let bytes = tokio::fs::read(&image).await?;
            let image = ImageInput::from_bytes(&bytes)?;
            let meal = analyzer.analyze_meal(&image).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&meal)?);
            } else {
                print_meal(&meal);
            }
        }
        Command::Lookup { food, quantity } => {
            let profile = analyzer
                .resolve_item(&ExtractedFoodItem::new(food, quantity))
                .await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print_header();
                print_profile(&profile);
            }
        }
        Command::Version => {}
    }

    Ok(())
}

fn print_header() {
    println!(
        "{:<40} {:<14} {:>6} {:>8} {:>8} {:>8}  source",
        "food", "quantity", "kcal", "protein", "carbs", "fat"
    );
}

fn print_profile(p: &ResolvedNutrientProfile) {
    let source = match &p.error {
        Some(error) => format!("{} ({error})", p.source),
        None => p.source.to_string(),
    };
    println!(
        "{:<40} {:<14} {:>6} {:>8.1} {:>8.1} {:>8.1}  {source}",
        p.food_name, p.quantity, p.calories, p.protein, p.carbs, p.fat
    );
}

fn print_meal(meal: &MealAnalysis) {
    print_header();
    for food in &meal.foods {
        print_profile(food);
    }
    println!(
        "{:<40} {:<14} {:>6} {:>8.1} {:>8.1} {:>8.1}",
        "total", "", meal.totals.calories, meal.totals.protein, meal.totals.carbs, meal.totals.fat
    );
}
