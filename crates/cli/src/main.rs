//! `shelfwise`: run point-of-sale assistant tasks from the command line.

mod input;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, Result},
    clap::{Parser, Subcommand},
    secrecy::Secret,
    serde::Serialize,
    shelfwise_agents::PosAssistant,
    shelfwise_common::{Customer, Product, Transaction},
    shelfwise_config::ShelfwiseConfig,
    shelfwise_providers::ScriptedService,
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, prelude::*},
};

#[derive(Parser)]
#[command(name = "shelfwise", version, about = "Point-of-sale assistant", long_about = None)]
struct Cli {
    /// Path to shelfwise.toml (defaults to the platform config directory)
    #[arg(long, global = true, env = "SHELFWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Answer every model call with this text instead of contacting the
    /// service
    #[arg(long, global = true, value_name = "REPLY")]
    dry_run: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's market news for the shop's region
    MarketNews,

    /// Seasonal price change suggestions
    PriceSuggestion,

    /// Ask a free-form question about the shop
    Ask {
        /// File holding a text summary of the shop
        #[arg(long)]
        summary: PathBuf,

        #[arg(long)]
        question: String,
    },

    /// Recognize products on a photo of the counter
    BillImage {
        #[arg(long)]
        image: PathBuf,

        /// JSON array of products
        #[arg(long)]
        inventory: PathBuf,
    },

    /// Interpret a spoken cashier command
    Voice {
        #[arg(long)]
        transcript: String,

        /// JSON array of products
        #[arg(long)]
        inventory: PathBuf,
    },

    /// Stock, staff and sales insights from recent transactions
    Insights {
        /// JSON array of transactions
        #[arg(long)]
        sales: PathBuf,

        /// JSON array of products
        #[arg(long)]
        inventory: PathBuf,
    },

    /// Describe a customer's face for later recognition
    DescribeFace {
        #[arg(long)]
        image: PathBuf,
    },

    /// Match a customer photo against stored descriptions
    IdentifyFace {
        #[arg(long)]
        image: PathBuf,

        /// JSON array of customers
        #[arg(long)]
        customers: PathBuf,
    },

    /// Suggest one product to offer with the current cart
    Upsell {
        /// Cart item name (repeatable)
        #[arg(long = "item", required = true)]
        items: Vec<String>,
    },

    /// Print the effective configuration (API key redacted)
    ShowConfig,
}

fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shelfwise=info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn redacted(config: &ShelfwiseConfig) -> ShelfwiseConfig {
    let mut shown = config.clone();
    if shown.provider.api_key().is_some() {
        shown.provider.api_key = Some(Secret::new("[REDACTED]".into()));
    }
    shown
}

fn build_assistant(config: ShelfwiseConfig, dry_run: Option<String>) -> Result<PosAssistant> {
    if let Some(reply) = dry_run {
        info!("dry run: model calls answered locally");
        return Ok(PosAssistant::with_service(
            Arc::new(ScriptedService::repeating(reply)),
            config,
        ));
    }
    PosAssistant::from_config(config).context("building model gateway")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Best-effort: a missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.log_json);

    let config = shelfwise_config::load(cli.config.as_deref()).context("loading configuration")?;
    debug!(model = %config.provider.model, "configuration loaded");

    if matches!(cli.command, Commands::ShowConfig) {
        return print_json(&redacted(&config));
    }

    let assistant = build_assistant(config, cli.dry_run)?;

    match cli.command {
        Commands::MarketNews => print_json(&assistant.fetch_market_news().await),
        Commands::PriceSuggestion => {
            print_json(&assistant.fetch_price_variation_suggestion().await)
        },
        Commands::Ask { summary, question } => {
            let summary = input::read_text(&summary)?;
            print_json(&assistant.ask_shop_ai(&summary, &question).await)
        },
        Commands::BillImage { image, inventory } => {
            let image = input::read_image(&image)?;
            let inventory: Vec<Product> = input::read_records(&inventory)?;
            print_json(
                &assistant
                    .analyze_image_for_billing(&image, &inventory)
                    .await,
            )
        },
        Commands::Voice {
            transcript,
            inventory,
        } => {
            let inventory: Vec<Product> = input::read_records(&inventory)?;
            print_json(
                &assistant
                    .process_voice_command(&transcript, &inventory)
                    .await,
            )
        },
        Commands::Insights { sales, inventory } => {
            let sales: Vec<Transaction> = input::read_records(&sales)?;
            let inventory: Vec<Product> = input::read_records(&inventory)?;
            print_json(&assistant.generate_smart_insights(&sales, &inventory).await)
        },
        Commands::DescribeFace { image } => {
            let image = input::read_image(&image)?;
            print_json(&assistant.analyze_customer_face(&image).await)
        },
        Commands::IdentifyFace { image, customers } => {
            let image = input::read_image(&image)?;
            let customers: Vec<Customer> = input::read_records(&customers)?;
            print_json(
                &assistant
                    .identify_customer_from_image(&image, &customers)
                    .await,
            )
        },
        Commands::Upsell { items } => {
            print_json(&assistant.get_smart_upsell_suggestion(&items).await)
        },
        Commands::ShowConfig => Ok(()),
    }
}
