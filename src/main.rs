use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod config;
mod db;
mod error;
mod location;
mod models;
mod progress;
mod report;
mod store;
mod validate;
mod waitlist;

use config::Config;
use db::PgStore;
use error::WaitlistError;
use location::{LocationLookup, LocationPicker};
use progress::{format_count, Goal};
use store::RecordStore;
use validate::SignupForm;
use waitlist::Dashboard;

#[derive(Parser)]
#[command(name = "waitlist")]
#[command(about = "City-by-city waitlist signups and launch progress", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to ./waitlist.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample signups
    Seed,
    /// Import signups from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Export every signup to a CSV file
    Export {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Join the waitlist
    Signup(SignupArgs),
    /// Show total signups and the leaderboard
    Stats,
    /// List cities that already have signups
    Cities,
    /// Show a city's progress toward its launch goal
    Progress {
        #[arg(long)]
        city: String,
        #[arg(long)]
        goal: Option<u64>,
    },
    /// Show the top cities by signups
    Leaderboard {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Refresh total signups and the leaderboard on a timer
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// List countries from the location service
    Countries,
    /// List a country's cities from the location service
    LookupCities {
        /// ISO2 country code; defaults to the configured country
        #[arg(long)]
        country: Option<String>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "waitlist_report.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct SignupArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    /// WhatsApp number, digits only or with punctuation
    #[arg(long, default_value = "")]
    whatsapp: String,
    #[arg(long, default_value = "+92")]
    phone_country_code: String,
    /// ISO2 country code; defaults to the configured country
    #[arg(long)]
    country: Option<String>,
    /// Country name; looked up from the location service when omitted
    #[arg(long)]
    country_name: Option<String>,
    #[arg(long)]
    city: String,
    #[arg(long)]
    area: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::resolve(cli.config.as_deref())?;
    debug!("configuration: {config:?}");

    let command = match cli.command {
        Commands::Countries => return list_countries(&config).await,
        Commands::LookupCities { country } => return lookup_cities(&config, country).await,
        command => command,
    };

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the waitlist Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool.clone());
    let dashboard = Dashboard::from_config(&store, &config);

    match command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let summary = db::import_csv(&store, &csv).await?;
            println!(
                "Inserted {} signups from {} ({} duplicates, {} invalid rows).",
                summary.inserted,
                csv.display(),
                summary.duplicates,
                summary.invalid
            );
        }
        Commands::Export { csv } => {
            let written = db::export_csv(&store, &csv).await?;
            println!("Exported {written} signups to {}.", csv.display());
        }
        Commands::Signup(args) => {
            let form = build_form(args, &config).await?;
            match waitlist::submit(&store, &form).await {
                Ok(outcome) => {
                    println!("You're on the list!");
                    println!(
                        "{} people in {} are waiting with you.",
                        format_count(outcome.city_count),
                        outcome.city
                    );
                    print_snapshot(&dashboard).await;
                }
                Err(err) => {
                    if let WaitlistError::Transient(source) = &err {
                        error!("Error submitting waitlist: {source:#}");
                    }
                    return Err(err.into());
                }
            }
        }
        Commands::Stats => {
            print_snapshot(&dashboard).await;
        }
        Commands::Cities => match dashboard.city_options().await {
            Some(cities) if cities.is_empty() => println!("No cities yet."),
            Some(cities) => {
                for group in cities {
                    println!("{}, {} ({})", group.city, group.country, format_count(group.count));
                }
            }
            None => println!("City progress is disabled."),
        },
        Commands::Progress { city, goal } => {
            let dashboard = match goal {
                Some(value) => {
                    let goal = Goal::new(value).context("--goal must be greater than zero")?;
                    Dashboard::new(
                        &store,
                        goal,
                        config.waitlist.leaderboard_size,
                        config.features,
                    )
                }
                None => Dashboard::from_config(&store, &config),
            };
            match dashboard.city_progress(&city).await {
                Some(progress) => print!("{}", report::render_progress(&city, &progress)),
                None => println!("City progress is disabled."),
            }
        }
        Commands::Leaderboard { limit } => {
            let size = limit.unwrap_or(config.waitlist.leaderboard_size);
            let dashboard = Dashboard::new(&store, config.waitlist.goal(), size, config.features);
            match dashboard.leaderboard().await {
                Some(groups) => println!("{}", report::render_leaderboard(&groups).trim_end()),
                None => println!("The leaderboard is disabled."),
            }
        }
        Commands::Watch { interval_secs } => {
            let secs = interval_secs
                .unwrap_or(config.waitlist.refresh_interval_secs)
                .max(1);
            info!("refreshing every {secs}s, press Ctrl-C to stop");

            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => print_snapshot(&dashboard).await,
                    _ = tokio::signal::ctrl_c() => {
                        info!("stopping refresh");
                        break;
                    }
                }
            }
        }
        Commands::Report { out } => {
            let total = dashboard.total().await;
            let cities = dashboard.city_options().await;
            let leaderboard = dashboard.leaderboard().await;
            let records = store.select_all().await?;
            let report = report::build_report(
                chrono::Utc::now(),
                total,
                config.waitlist.goal(),
                cities.as_deref(),
                leaderboard.as_deref(),
                &records,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Countries | Commands::LookupCities { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn list_countries(config: &Config) -> anyhow::Result<()> {
    let lookup = LocationLookup::new(&config.location)?;
    let mut picker = LocationPicker::default();
    picker
        .load(&lookup, &config.location.default_country)
        .await?;

    for country in picker.countries() {
        let marker = if picker.selected() == Some(country) { "*" } else { " " };
        println!("{marker} {} {}", country.iso2, country.label());
    }
    Ok(())
}

async fn lookup_cities(config: &Config, country: Option<String>) -> anyhow::Result<()> {
    let lookup = LocationLookup::new(&config.location)?;
    let code = country.unwrap_or_else(|| config.location.default_country.clone());
    let cities = LocationPicker::default().select(&lookup, &code).await?;

    if cities.is_empty() {
        println!("No cities found for {code}.");
    }
    for city in cities {
        println!("{}", city.name);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Fills in the country from config and the location service when the
/// command line leaves it out.
async fn build_form(args: SignupArgs, config: &Config) -> anyhow::Result<SignupForm> {
    let country_code = args
        .country
        .unwrap_or_else(|| config.location.default_country.clone());

    let country_name = match args.country_name {
        Some(name) => name,
        None => {
            let lookup = LocationLookup::new(&config.location)?;
            LocationPicker::default()
                .country_name(&lookup, &country_code)
                .await?
        }
    };

    Ok(SignupForm {
        name: args.name,
        email: args.email,
        contact_number: args.whatsapp,
        phone_country_code: args.phone_country_code,
        country_code,
        country_name,
        city: args.city,
        area: args.area,
    })
}

async fn print_snapshot<S: RecordStore>(dashboard: &Dashboard<'_, S>) {
    let snapshot = dashboard.snapshot().await;
    println!("Total signups: {}", format_count(snapshot.total));
    if let Some(leaderboard) = snapshot.leaderboard {
        println!("{}", report::render_leaderboard(&leaderboard).trim_end());
    }
}
