use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod db;
mod models;
mod prefs;
mod report;
mod risk;
mod screen;

use models::{FilterCriteria, FundingBucket, RiskLevel, SortDirection, SortField, SortSpec};
use prefs::PrefStore;

#[derive(Parser)]
#[command(name = "opportunity-screener")]
#[command(about = "Opportunity screening toolkit for the FundFound marketplace", long_about = None)]
struct Cli {
    /// Path to the local preference file (watchlist and saved presets)
    #[arg(long, global = true, default_value = "prefs.json")]
    prefs: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Substring match across title, description, and category
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// draft, published, funded, or closed
    #[arg(long)]
    status: Option<String>,
    /// Named funding range: 0-100000, 100000-1000000, 1000000-10000000, or 10000000+
    #[arg(long)]
    funding_range: Option<String>,
    /// Substring match against the stated timeline
    #[arg(long)]
    timeline: Option<String>,
    /// low, medium, or high
    #[arg(long)]
    risk_level: Option<String>,
}

impl FilterArgs {
    fn into_criteria(self) -> anyhow::Result<FilterCriteria> {
        let funding_range = self
            .funding_range
            .as_deref()
            .map(|value| value.parse::<FundingBucket>())
            .transpose()
            .map_err(anyhow::Error::msg)?;
        let risk_level = self
            .risk_level
            .as_deref()
            .map(|value| value.parse::<RiskLevel>())
            .transpose()
            .map_err(anyhow::Error::msg)?;

        Ok(FilterCriteria {
            query: self.query,
            category: self.category,
            status: self.status,
            funding_range,
            timeline: self.timeline,
            risk_level,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the FundFound sample opportunities
    Seed,
    /// Import opportunities from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Filter, risk-classify, and sort the opportunity list
    #[command(group(
        ArgGroup::new("preset_io")
            .args(["preset", "save_preset"])
            .multiple(false)
    ))]
    Screen {
        #[command(flatten)]
        filter: FilterArgs,
        /// created-at, funding-needed, views, or interest
        #[arg(long, default_value = "created-at")]
        sort_by: String,
        /// Sort descending instead of ascending
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Start from a saved preset; explicit flags override its fields
        #[arg(long)]
        preset: Option<String>,
        /// Save the effective criteria under this name
        #[arg(long)]
        save_preset: Option<String>,
    },
    /// Manage the locally saved watchlist
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
    /// List saved filter presets
    Presets,
    /// Record one more view against an opportunity
    RecordView {
        #[arg(long)]
        id: Uuid,
    },
    /// Register an investor's interest in an opportunity
    RegisterInterest {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        investor: Uuid,
    },
    /// Export the screened opportunities to a CSV file
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "opportunities.csv")]
        out: PathBuf,
    },
    /// Generate a markdown report over the screened opportunities
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum WatchlistAction {
    /// Add an opportunity id (idempotent)
    Add { id: Uuid },
    /// Remove an opportunity id (idempotent)
    Remove { id: Uuid },
    /// Toggle membership, printing the new state
    Toggle { id: Uuid },
    /// Fetch and print the watched opportunities
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Sample opportunities inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let summary = db::import_csv(&pool, &csv).await?;
            println!(
                "Inserted {} opportunities from {} ({} skipped).",
                summary.inserted,
                csv.display(),
                summary.skipped
            );
        }
        Commands::Screen {
            filter,
            sort_by,
            desc,
            limit,
            preset,
            save_preset,
        } => {
            let mut store = PrefStore::load(&cli.prefs);
            let explicit = filter.into_criteria()?;
            let criteria = match preset {
                Some(name) => {
                    let base = store
                        .preset(&name)
                        .with_context(|| format!("no preset named '{name}'"))?;
                    FilterCriteria::overlay(base, explicit)
                }
                None => explicit,
            };

            if let Some(name) = save_preset {
                store.save_preset(&name, &criteria)?;
                println!("Preset '{name}' saved.");
            }

            let field: SortField = sort_by.parse().map_err(anyhow::Error::msg)?;
            let spec = SortSpec {
                field,
                direction: if desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                },
            };

            let pool = connect().await?;
            let all = db::fetch_opportunities(
                &pool,
                criteria.category.as_deref(),
                criteria.status.as_deref(),
            )
            .await?;
            let screened = screen::screen_opportunities(&all, &criteria, &spec);

            if screened.is_empty() {
                println!("No opportunities matched this screen.");
                return Ok(());
            }

            println!("Opportunities matching {}:", criteria.describe());
            let watchlist = store.watchlist();
            for opportunity in screened.iter().take(limit) {
                let marker = if watchlist.contains(&opportunity.id) {
                    "*"
                } else {
                    "-"
                };
                println!(
                    "{} {} [{}] {} over {} | risk {} | {} views, {} interested",
                    marker,
                    opportunity.title,
                    opportunity.category,
                    report::format_inr(opportunity.funding_needed),
                    opportunity.timeline,
                    risk::classify_risk(opportunity),
                    opportunity.views.unwrap_or(0),
                    opportunity.interest_count
                );
            }
        }
        Commands::Watchlist { action } => {
            let mut store = PrefStore::load(&cli.prefs);
            match action {
                WatchlistAction::Add { id } => {
                    if store.add_to_watchlist(id)? {
                        println!("Opportunity {id} added to the watchlist.");
                    } else {
                        println!("Opportunity {id} is already on the watchlist.");
                    }
                }
                WatchlistAction::Remove { id } => {
                    if store.remove_from_watchlist(id)? {
                        println!("Opportunity {id} removed from the watchlist.");
                    } else {
                        println!("Opportunity {id} is not on the watchlist.");
                    }
                }
                WatchlistAction::Toggle { id } => {
                    if store.toggle_watchlist(id)? {
                        println!("Now watching {id}.");
                    } else {
                        println!("Stopped watching {id}.");
                    }
                }
                WatchlistAction::Show => {
                    let ids = store.watchlist();
                    if ids.is_empty() {
                        println!("Watchlist is empty.");
                        return Ok(());
                    }

                    let pool = connect().await?;
                    let found = db::fetch_by_ids(&pool, &ids).await?;
                    for opportunity in found.iter() {
                        println!(
                            "- {} [{}] {} over {} | risk {}",
                            opportunity.title,
                            opportunity.category,
                            report::format_inr(opportunity.funding_needed),
                            opportunity.timeline,
                            risk::classify_risk(opportunity)
                        );
                    }
                    let missing = ids.len() - found.len();
                    if missing > 0 {
                        println!("{missing} watched ids no longer resolve.");
                    }
                }
            }
        }
        Commands::Presets => {
            let store = PrefStore::load(&cli.prefs);
            let names = store.preset_names();
            if names.is_empty() {
                println!("No saved presets.");
                return Ok(());
            }
            for name in names {
                let label = store
                    .preset(&name)
                    .map(|criteria| criteria.describe())
                    .unwrap_or_else(|| "unreadable preset".to_string());
                println!("- {name}: {label}");
            }
        }
        Commands::RecordView { id } => {
            let pool = connect().await?;
            let views = db::record_view(&pool, id).await?;
            println!("Opportunity {id} now has {views} views.");
        }
        Commands::RegisterInterest { id, investor } => {
            let pool = connect().await?;
            if db::register_interest(&pool, id, investor).await? {
                println!("Interest registered for {id}.");
            } else {
                println!("Investor {investor} already registered interest in {id}.");
            }
        }
        Commands::Export { filter, out } => {
            let criteria = filter.into_criteria()?;
            let pool = connect().await?;
            let all = db::fetch_opportunities(
                &pool,
                criteria.category.as_deref(),
                criteria.status.as_deref(),
            )
            .await?;
            let screened = screen::filter_opportunities(&all, &criteria);
            let exported = report::export_csv(&out, &screened)?;
            println!("Exported {} opportunities to {}.", exported, out.display());
        }
        Commands::Report { filter, out } => {
            let criteria = filter.into_criteria()?;
            let pool = connect().await?;
            let all = db::fetch_opportunities(
                &pool,
                criteria.category.as_deref(),
                criteria.status.as_deref(),
            )
            .await?;
            let screened = screen::filter_opportunities(&all, &criteria);
            let rendered = report::build_report(&criteria.describe(), &screened);
            std::fs::write(&out, rendered)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}
