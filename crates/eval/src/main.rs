//! Evaluation CLI for checking card recommendation quality.
//!
//! Usage:
//!     eval recommend "我想要在7-11消費有回饋的信用卡"
//!     eval top "網購回饋" --count 3
//!     eval classify "想要比較台新和國泰的信用卡"
//!     eval bench --cases data/bench.json

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cardmatch_catalog::JsonCatalog;
use cardmatch_classify::ExperienceClassifier;
use cardmatch_explain::Composer;
use cardmatch_model::{
    CardCatalog, ExperienceLevel, Recommendation, RecommendationDetail, UserContext,
};
use cardmatch_rank::{Matcher, ScoringConfig};
use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "eval")]
#[command(about = "Evaluate credit card recommendation quality")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Card catalog JSON file
    #[arg(long, default_value = "data/cards.json")]
    catalog: PathBuf,

    /// Scoring config JSON file (partial overrides allowed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audience tags known for the user (comma-separated)
    #[arg(long)]
    audience: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend one card for a message
    Recommend {
        /// User message
        message: String,
    },

    /// List the best few cards for a message
    Top {
        /// User message
        message: String,

        /// Maximum results
        #[arg(short, long, default_value = "3")]
        count: usize,
    },

    /// Classify the user's experience level
    Classify {
        /// User message
        message: String,
    },

    /// Run expected-outcome cases against the catalog
    Bench {
        /// Path to cases JSON file
        #[arg(long)]
        cases: PathBuf,
    },
}

/// One bench expectation.
#[derive(Debug, Deserialize)]
struct BenchCase {
    message: String,
    #[serde(default)]
    expected_card: Option<String>,
    #[serde(default)]
    expected_level: Option<ExperienceLevel>,
}

struct Engine {
    catalog: JsonCatalog,
    matcher: Matcher,
    classifier: ExperienceClassifier,
    composer: Composer,
    context: UserContext,
}

impl Engine {
    fn recommend(&self, message: &str) -> Result<Recommendation> {
        let best = self
            .matcher
            .find_best_match(message, &self.catalog, &self.context)?;
        let level = self.classifier.classify(message);
        let promotions = self.catalog.active_promotions(&best.card.name);

        Ok(self
            .composer
            .compose_with_context(&best.card, message, &self.context, level, promotions))
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cardmatch=debug".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ScoringConfig::default(),
    };
    let catalog = JsonCatalog::from_path(&cli.catalog)
        .with_context(|| format!("loading catalog {}", cli.catalog.display()))?;

    let context = UserContext {
        audiences: cli
            .audience
            .as_deref()
            .map(|s| s.split(',').map(|a| a.trim().to_string()).filter(|a| !a.is_empty()).collect())
            .unwrap_or_default(),
    };

    let engine = Engine {
        catalog,
        composer: Composer::new(config.signals.clone()),
        matcher: Matcher::new(config),
        classifier: ExperienceClassifier::default(),
        context,
    };

    match cli.command {
        Commands::Recommend { message } => run_recommend(&engine, &message, &cli.format)?,
        Commands::Top { message, count } => run_top(&engine, &message, count, &cli.format)?,
        Commands::Classify { message } => run_classify(&engine, &message, &cli.format)?,
        Commands::Bench { cases } => run_bench(&engine, &cases)?,
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<ScoringConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}

fn run_recommend(engine: &Engine, message: &str, format: &str) -> Result<()> {
    let rec = engine.recommend(message)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&rec)?);
        return Ok(());
    }

    println!("Message: {}", message);
    println!("Level: {}", rec.level);
    println!("---");
    println!("{} ({})", rec.card.name, rec.card.bank);
    println!("   Annual fee: {}", rec.card.annual_fee);
    for line in &rec.explanations {
        println!("   • {}", line);
    }

    match &rec.detail {
        RecommendationDetail::Simple { education } => println!("   {}", education),
        RecommendationDetail::Detailed { rate_table, requirements } => {
            for entry in rate_table {
                println!("   {}: {}%", entry.label, entry.rate);
            }
            if let Some(req) = requirements {
                println!("   Min age: {}", req.min_age);
                if req.min_income > 0 {
                    println!("   Min income: {}", req.min_income);
                }
            }
        }
    }

    for promo in &rec.promotions {
        println!("   Promotion: {}", promo.description);
        if let Some(terms) = &promo.terms {
            println!("      {}", terms);
        }
    }

    Ok(())
}

fn run_top(engine: &Engine, message: &str, count: usize, format: &str) -> Result<()> {
    let hits = engine
        .matcher
        .top_matches(message, count, &engine.catalog, &engine.context)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    println!("Matching: {}", message);
    println!("---");
    for (i, hit) in hits.iter().enumerate() {
        println!("\n{}. {} (Id: {})", i + 1, hit.card.name, hit.card.id);
        println!("   Score: {:.2}", hit.score);
        let fired: Vec<_> = hit
            .breakdown
            .iter()
            .filter(|(_, v)| *v > 0.0)
            .map(|(d, v)| format!("{}={:.2}", d, v))
            .collect();
        println!("   Signals: {}", fired.join(", "));
    }
    println!("\n---");
    println!("Total: {} results", hits.len());

    Ok(())
}

fn run_classify(engine: &Engine, message: &str, format: &str) -> Result<()> {
    let scores = engine.classifier.scores(message);

    if format == "json" {
        println!(
            "{}",
            serde_json::json!({ "level": scores.level(), "scores": scores })
        );
    } else {
        println!(
            "{} (novice {:.1}, advanced {:.1})",
            scores.level(),
            scores.novice,
            scores.advanced
        );
    }

    Ok(())
}

fn run_bench(engine: &Engine, cases_path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(cases_path)
        .with_context(|| format!("reading cases {}", cases_path.display()))?;
    let cases: Vec<BenchCase> = serde_json::from_str(&json)?;

    let mut failures = 0;
    for case in &cases {
        let rec = engine.recommend(&case.message)?;
        let mut problems = Vec::new();

        if let Some(expected) = &case.expected_card {
            match engine.catalog.card(expected) {
                None => problems.push(format!("expected card {} not in catalog", expected)),
                Some(card) if card.id != rec.card.id => problems.push(format!(
                    "card {} ({}) != {} ({})",
                    rec.card.id, rec.card.name, card.id, card.name
                )),
                Some(_) => {}
            }
        }
        if let Some(expected) = case.expected_level {
            if rec.level != expected {
                problems.push(format!("level {} != {}", rec.level, expected));
            }
        }

        if problems.is_empty() {
            println!("PASS  {}", case.message);
        } else {
            failures += 1;
            println!("FAIL  {}  ({})", case.message, problems.join("; "));
        }
    }

    println!("---");
    println!("{} passed, {} failed", cases.len() - failures, failures);

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
