use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use review_gap_analyzer::config::Settings;
use review_gap_analyzer::db::{self, PgStore};
use review_gap_analyzer::enrich::{Enricher, OpenAiEnricher};
use review_gap_analyzer::{report, Pipeline};

#[derive(Parser)]
#[command(name = "review-gap-analyzer")]
#[command(about = "Find market gaps in app store reviews", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunOptions {
    /// Ignore cached analyses and recompute
    #[arg(long)]
    refresh: bool,
    /// Skip AI enrichment even when OPENAI_API_KEY is set
    #[arg(long)]
    no_ai: bool,
    /// Seed for the review sample sent to the AI service
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo apps and reviews
    Seed,
    /// Import reviews from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Analyze a single app's reviews
    Analyze {
        #[arg(long)]
        app: String,
        #[command(flatten)]
        run: RunOptions,
    },
    /// Rank market gaps across apps (all apps when none given)
    Gaps {
        #[arg(long = "app")]
        apps: Vec<String>,
        #[command(flatten)]
        run: RunOptions,
        /// Write the report as JSON instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compare sentiment and themes across apps
    Compare {
        #[arg(long = "app")]
        apps: Vec<String>,
        #[command(flatten)]
        run: RunOptions,
    },
    /// Generate a markdown report
    Report {
        #[arg(long = "app")]
        apps: Vec<String>,
        #[command(flatten)]
        run: RunOptions,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn rng_for(run: &RunOptions) -> StdRng {
    match run.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn build_pipeline<'a>(
    store: &'a PgStore,
    openai: Option<&'a OpenAiEnricher>,
    settings: &Settings,
    run: &RunOptions,
) -> Pipeline<'a> {
    let enricher = match openai {
        Some(client) if !run.no_ai => Some(client as &dyn Enricher),
        _ => None,
    };
    Pipeline::new(store, store).with_enricher(
        enricher,
        settings.ai_timeout,
        settings.ai_sample_size,
    )
}

async fn resolve_apps(pool: &sqlx::PgPool, apps: Vec<String>) -> anyhow::Result<Vec<String>> {
    if !apps.is_empty() {
        return Ok(apps);
    }
    let apps = db::list_app_ids(pool).await?;
    debug!(apps = apps.len(), "analyzing every app with reviews");
    Ok(apps)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to Postgres")?;

    let store = PgStore::new(pool.clone());
    let openai = settings
        .openai
        .clone()
        .map(OpenAiEnricher::new)
        .transpose()
        .context("failed to build the AI client")?;
    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(&pool).await?;
            println!("Seeded {inserted} reviews.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} reviews from {}.", csv.display());
        }
        Commands::Analyze { app, run } => {
            let analysis = build_pipeline(&store, openai.as_ref(), &settings, &run)
                .analyze_app(&app, run.refresh, &mut rng_for(&run), Utc::now())
                .await?;
            let result = &analysis.result;
            let stats = &result.sentiment_analysis;

            println!(
                "{}: {} reviews, avg {:.2} ({} positive / {} neutral / {} negative)",
                analysis.app_id,
                result.review_count,
                stats.average_score,
                stats.positive,
                stats.neutral,
                stats.negative
            );
            println!("Gaps:");
            for gap in &result.market_gaps {
                println!(
                    "- {} (score {}/10, {} mentions): {}",
                    gap.feature, gap.opportunity_score, gap.count, gap.pain_point
                );
            }
            if result.ai_insights.is_some() {
                println!("AI insights attached.");
            }
        }
        Commands::Gaps { apps, run, out } => {
            let apps = resolve_apps(&pool, apps).await?;
            let gaps = build_pipeline(&store, openai.as_ref(), &settings, &run)
                .market_report(&apps, run.refresh, &mut rng_for(&run), Utc::now())
                .await?;
            let json = serde_json::to_string_pretty(&gaps)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Market gaps written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Compare { apps, run } => {
            let apps = resolve_apps(&pool, apps).await?;
            let analyses = build_pipeline(&store, openai.as_ref(), &settings, &run)
                .analyze_apps(&apps, run.refresh, &mut rng_for(&run), Utc::now())
                .await?;
            let comparison = report::compare_apps(&analyses);
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        Commands::Report { apps, run, out } => {
            let apps = resolve_apps(&pool, apps).await?;
            let now = Utc::now();
            let analyses = build_pipeline(&store, openai.as_ref(), &settings, &run)
                .analyze_apps(&apps, run.refresh, &mut rng_for(&run), now)
                .await?;
            let gaps = review_gap_analyzer::identify_market_gaps(&analyses, now);
            std::fs::write(&out, report::build_report(&analyses, &gaps))?;
            info!(apps = analyses.len(), gaps = gaps.market_gaps.len(), "report built");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
