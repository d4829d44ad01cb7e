//! Command-line interface for action-publisher
//!
//! # Usage Examples
//!
//! ```bash
//! # Publish every action of a CSV file once, unordered
//! action-publisher publish --brokers localhost:9092 --source actions.csv
//!
//! # Keep each user's actions in order and stop after 1M messages
//! action-publisher publish --source actions.csv --ordered --repeat \
//!   --message-limit 1000000 --drain-timeout 10m
//!
//! # Create the topic up front
//! action-publisher create-topic --topic pubsub-e2e-example --partitions 4
//! ```
//!
//! The first Ctrl+C stops reading the source and drains what was already
//! dispatched; a second one gives up on the drain and closes the producer.
//!
//! Exit status is 1 when the run could not be set up and 2 when it ended
//! with publishes still in flight.

use action_publisher::{
    csv::CsvActionSource,
    format_summary,
    kafka::{ensure_topic, KafkaPublishClient},
    CreateTopicArgs, PublishArgs,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use publisher_core::{run_session, LogProgress, ShutdownSignals};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "action-publisher")]
#[command(about = "Publish user actions to Kafka and wait for every delivery")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the actions of a CSV file
    Publish(PublishArgs),

    /// Create the Kafka topic if it does not exist
    CreateTopic(CreateTopicArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Publish(args) => run_publish(args).await,
        Commands::CreateTopic(args) => run_create_topic(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run_publish(args: PublishArgs) -> anyhow::Result<ExitCode> {
    let source = CsvActionSource::open(&args.source, args.source_config()?)
        .with_context(|| format!("Failed to open action source {}", args.source.display()))?;
    let client = KafkaPublishClient::new(args.producer_config())
        .context("Failed to create Kafka publish client")?;

    let signals = ShutdownSignals::new();
    setup_shutdown_handler(signals.clone());

    info!(
        topic = %args.kafka.topic,
        ordered = args.ordered,
        "Starting publisher"
    );
    let report = run_session(
        Arc::new(client),
        source,
        args.publisher_config(),
        LogProgress,
        signals,
    )
    .await
    .context("Publishing run failed")?;

    info!(
        dispatched = report.stats.dispatched,
        succeeded = report.succeeded,
        failed = report.failed,
        drain = %report.drain,
        "Publishing finished"
    );
    println!("{}", format_summary(&report));

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("Exiting with publishes still in flight");
        Ok(ExitCode::from(2))
    }
}

async fn run_create_topic(args: CreateTopicArgs) -> anyhow::Result<ExitCode> {
    ensure_topic(&args.kafka.brokers, &args.kafka.topic, args.partitions)
        .await
        .with_context(|| format!("Failed to ensure topic {}", args.kafka.topic))?;
    Ok(ExitCode::SUCCESS)
}

/// First Ctrl+C stops producing, the second abandons the drain.
fn setup_shutdown_handler(signals: ShutdownSignals) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            return;
        }
        info!("Received interrupt signal (Ctrl+C), finishing outstanding publishes");
        signals.stop_producing.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received second interrupt signal, abandoning outstanding publishes");
            signals.abandon_drain.cancel();
        }
    });
}
