//! Command-line interface for bank-pipeline
//!
//! # Usage Examples
//!
//! ## Topics
//! ```bash
//! bank-pipeline create-topics --partitions 3 --replication 1
//! ```
//!
//! ## Routing
//! ```bash
//! # Route a JSON-lines feed against a residence directory
//! bank-pipeline route \
//!   --transactions transactions.jsonl \
//!   --residences residences.csv
//!
//! # Read the feed from stdin with a custom threshold
//! cat transactions.jsonl | bank-pipeline --high-value-threshold 2500 route \
//!   --transactions - --residences residences.csv
//! ```
//!
//! ## Services
//! ```bash
//! bank-pipeline consume account-manager
//! bank-pipeline --brokers kafka-1:9092,kafka-2:9092 consume reporting-service
//! bank-pipeline consume user-notification-service --group-id notify-canary --max-polls 10
//! ```
//!
//! Logging defaults to `info` and is controlled with `RUST_LOG`, e.g.
//! `RUST_LOG=bank_pipeline=debug`.

use anyhow::Context;
use bank_pipeline::config::duration::parse_duration;
use bank_pipeline::services::{Service, ServiceRecordHandler, StdoutSink};
use bank_pipeline::{AppConfig, Classifier, JsonlFeed, ResidenceDirectory, Router};
use bank_pipeline_kafka_producer::KafkaPublisher;
use bank_pipeline_kafka_source::{ConsumptionLoop, KafkaConsumer, LoopOptions};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "bank-pipeline")]
#[command(about = "Classify bank transactions and run the services that consume them")]
#[command(long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(long, global = true, env = "BANK_PIPELINE_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Kafka brokers, overriding the configuration file
    #[arg(long, global = true, value_delimiter = ',', env = "KAFKA_BROKERS")]
    brokers: Vec<String>,

    /// Amounts strictly above this are high-value, overriding the configuration file
    #[arg(long, global = true)]
    high_value_threshold: Option<Decimal>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify transactions and publish each one to its label topics
    Route {
        /// JSON-lines transaction feed, or `-` for stdin
        #[arg(long, value_name = "PATH")]
        transactions: String,

        /// CSV file with `user,residence` columns
        #[arg(long, value_name = "PATH")]
        residences: PathBuf,
    },

    /// Run one downstream service
    Consume {
        #[arg(value_enum)]
        service: Service,

        /// Consumer group, overriding the configured one for this service
        #[arg(long)]
        group_id: Option<String>,

        /// Wait budget per poll (e.g. "500ms", "2s")
        #[arg(long, value_parser = parse_duration)]
        poll_timeout: Option<Duration>,

        /// Stop after this many polls instead of running until terminated
        #[arg(long)]
        max_polls: Option<u64>,
    },

    /// Create the label topics if they do not exist
    CreateTopics {
        #[arg(long, default_value = "3")]
        partitions: i32,

        #[arg(long, default_value = "1")]
        replication: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if !cli.brokers.is_empty() {
        config.kafka.brokers = cli.brokers;
    }
    if let Some(threshold) = cli.high_value_threshold {
        config.classification.high_value_threshold = threshold;
    }

    match cli.command {
        Commands::Route {
            transactions,
            residences,
        } => run_route(&config, &transactions, residences).await,
        Commands::Consume {
            service,
            group_id,
            poll_timeout,
            max_polls,
        } => {
            let options = LoopOptions {
                poll_timeout: poll_timeout.unwrap_or(config.consumer.poll_timeout),
                max_polls,
            };
            run_consume(&config, service, group_id, options).await
        }
        Commands::CreateTopics {
            partitions,
            replication,
        } => {
            bank_pipeline_kafka_producer::create_topics_if_not_exists(
                &config.brokers(),
                &config.topics.all(),
                partitions,
                replication,
            )
            .await
        }
    }
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

async fn run_route(
    config: &AppConfig,
    transactions: &str,
    residences: PathBuf,
) -> anyhow::Result<()> {
    let directory = ResidenceDirectory::from_csv_path(&residences)?;
    info!(
        users = directory.len(),
        path = %residences.display(),
        "Loaded residence directory"
    );

    let publisher = KafkaPublisher::new(&config.producer_config())?;
    let router = Router::new(
        publisher,
        Classifier::new(config.classification.high_value_threshold),
        config.topics.clone(),
    );

    let summary = if transactions == "-" {
        router.run(&mut JsonlFeed::stdin(), &directory).await?
    } else {
        let mut feed = JsonlFeed::from_path(transactions)?;
        router.run(&mut feed, &directory).await?
    };

    println!(
        "Routed {} transactions ({} published records)",
        summary.transactions,
        summary.published.values().sum::<u64>()
    );
    Ok(())
}

async fn run_consume(
    config: &AppConfig,
    service: Service,
    group_id: Option<String>,
    options: LoopOptions,
) -> anyhow::Result<()> {
    let group_id =
        group_id.unwrap_or_else(|| config.groups.for_service(service).to_string());

    let consumer = KafkaConsumer::new(config.consumer_config(&group_id))
        .with_context(|| format!("Failed to create consumer for {service}"))?;
    let handler = ServiceRecordHandler::new(
        service,
        service.handler(config.classification.high_value_threshold),
        StdoutSink,
    );

    let mut engine = ConsumptionLoop::new(
        group_id,
        consumer,
        config.topics.clone(),
        handler,
        options,
    );
    engine.subscribe(service.subscribed_labels())?;

    info!(%service, group_id = engine.group_id(), "Service started");
    let stats = engine.run().await?;
    info!(
        %service,
        polls = stats.polls,
        records = stats.records,
        skipped = stats.skipped,
        commits = stats.commits,
        "Service stopped"
    );
    Ok(())
}
