//! AIM - asset inventory sync operations tool

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use aim_core::gcp::{auth, AssetInventoryClient};
use aim_core::logging::{init_logging, LogConfig, LogLevel};
use aim_core::notion::{clear_database, DatabaseSchema, NotionClient};
use aim_core::pacing::RateGate;
use aim_core::transform;
use aim_core::{SyncConfig, SyncPipeline};

#[derive(Parser, Debug)]
#[command(name = "aim")]
#[command(author, version, about = "Asset inventory to Notion sync tool")]
struct Cli {
    /// Operation to run
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the full sync pipeline
    Sync,

    /// Export asset inventories to the staging bucket and print their
    /// locators; staged files are left in place for inspection
    Export,

    /// Clean and merge local CSV exports without touching any remote service
    Transform {
        /// Input CSV files
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        /// Output path for the merged CSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Archive every record in the destination database
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Fetch and print the destination database schema
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    init_logging(&log_config)?;

    match cli.command {
        Command::Sync => {
            let config = SyncConfig::load()?;
            let pipeline = SyncPipeline::new(config);
            pipeline.run().await?;
            println!("Sync completed successfully");
        }

        Command::Export => {
            let config = SyncConfig::load()?;
            let http = reqwest::Client::new();
            let token = auth::resolve_access_token(&config.gcp, &http).await?;
            let client = AssetInventoryClient::new(http, config.gcp.clone(), token);

            let mut staged = Vec::new();
            client
                .export_projects(
                    &config.projects,
                    &config.asset_types,
                    &config.staging_bucket,
                    &mut staged,
                )
                .await?;

            for export in &staged {
                println!("{}", export.uri);
            }
            info!("Staged {} exports; files are left in place", staged.len());
        }

        Command::Transform { input, output } => {
            let merged = transform::clean_and_merge(&input, &output)?;
            println!(
                "Merged {} rows and {} columns into {}",
                merged.rows.len(),
                merged.columns.len(),
                output.display()
            );
        }

        Command::Reset { yes } => {
            if !yes && !confirm_reset()? {
                println!("Reset cancelled.");
                return Ok(());
            }

            let config = SyncConfig::load()?;
            let client = NotionClient::new(reqwest::Client::new(), config.notion.clone());
            let gate = RateGate::new(config.limits.archive_rps);

            let archived = clear_database(&client, &gate).await?;
            println!("Archived {} records", archived);
        }

        Command::Schema => {
            let config = SyncConfig::load()?;
            let client = NotionClient::new(reqwest::Client::new(), config.notion.clone());

            let database = client.database().await?;
            let schema = DatabaseSchema::resolve(&database.properties);

            for field in schema.fields() {
                let support = if field.kind.is_supported() {
                    "supported"
                } else {
                    "unsupported"
                };
                println!("{}\t{}\t{}", field.name, field.kind.as_str(), support);
            }
        }
    }

    Ok(())
}

/// Ask before clearing the destination database
fn confirm_reset() -> Result<bool> {
    println!("This will archive every record in the destination database.");
    print!("Continue? [y/N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
