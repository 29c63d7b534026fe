//! Darshan CLI - operational commands
//!
//! Usage:
//!   darshan seed --admin-password <password>
//!   darshan hash-password <plaintext>
//!   darshan fare --km <distance>

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use darshan_api::auth::password::{validate_password_policy, CredentialHasher};
use darshan_core::seed::{seed, ADMIN_EMAIL};
use darshan_core::{AppConfig, FareTariff, PgStore};

#[derive(Parser)]
#[command(name = "darshan")]
#[command(about = "Dilli Darshan operational tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the admin account and the initial hidden gems in PostgreSQL
    Seed {
        /// PostgreSQL connection string
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,

        /// Password for the admin account (used only when it is created)
        #[arg(long, env = "SEED_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: String,
    },
    /// Print an Argon2id hash for a plaintext password
    HashPassword {
        /// Password to hash
        plaintext: String,
    },
    /// Estimate a cab fare for a driving distance
    Fare {
        /// Distance in kilometres
        #[arg(long)]
        km: f64,

        /// Print the estimate as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "darshan_core=info,sqlx=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Seed {
            database_url,
            admin_password,
        } => {
            if let Err(msg) = validate_password_policy(&admin_password) {
                bail!("Admin password rejected: {msg}");
            }

            let store = PgStore::new(&database_url, 2)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store.migrate().await.context("Failed to bootstrap schema")?;

            let hash = CredentialHasher::default().hash(&admin_password)?;
            let report = seed(&store, hash).await?;

            if report.admin_created {
                println!("Created admin user: {ADMIN_EMAIL}");
            } else {
                println!("Admin user already exists: {ADMIN_EMAIL}");
            }
            for name in &report.created {
                println!("Created hidden gem: {name}");
            }
            for name in &report.skipped {
                println!("Hidden gem already exists: {name}");
            }
            println!("Database seeding completed");
        }
        Commands::HashPassword { plaintext } => {
            println!("{}", CredentialHasher::default().hash(&plaintext)?);
        }
        Commands::Fare { km, json } => {
            let config = AppConfig::from_env()?;
            let estimate = FareTariff::from(&config.fare).estimate(km)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&estimate)?);
            } else {
                println!(
                    "{:.1} km -> {} {}",
                    estimate.distance_km, estimate.fare, estimate.currency
                );
            }
        }
    }

    Ok(())
}
