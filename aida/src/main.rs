use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aida::api::{create_router, AppState};
use aida::config::Config;
use aida::models::AnalysisResult;
use aida::processing::DocumentPipeline;

#[derive(Parser)]
#[command(name = "aida")]
#[command(about = "Extract structured information from medical documents")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze documents and print the results as JSON
    Analyze {
        /// PDF, DOCX/DOC, JPG/JPEG or PNG files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        pretty: bool,

        /// Print a single field instead of the full record
        #[arg(long, value_enum)]
        only: Option<OnlyField>,
    },
    /// Serve the HTTP API
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnlyField {
    Summary,
    Patient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    // Logs go to stderr so `analyze` output stays pipeable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aida=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();

    match args.command {
        Command::Analyze {
            files,
            pretty,
            only,
        } => analyze(&config, &files, pretty, only).await,
        Command::Serve => serve(config).await,
    }
}

async fn analyze(
    config: &Config,
    files: &[PathBuf],
    pretty: bool,
    only: Option<OnlyField>,
) -> anyhow::Result<()> {
    let pipeline = DocumentPipeline::from_config(config);
    let results = pipeline.analyze_many(files).await;

    let output = match only {
        None if results.len() == 1 => serde_json::to_value(&results[0])?,
        None => serde_json::to_value(&results)?,
        Some(field) => {
            let picked = results
                .iter()
                .map(|result| pick_field(result, field))
                .collect::<Vec<_>>();
            if picked.len() == 1 {
                picked[0].clone()
            } else {
                serde_json::Value::Array(picked)
            }
        }
    };

    let rendered = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");

    if results.iter().any(AnalysisResult::is_error) {
        anyhow::bail!(
            "{} of {} documents could not be processed",
            results.iter().filter(|r| r.is_error()).count(),
            results.len()
        );
    }

    Ok(())
}

fn pick_field(result: &AnalysisResult, field: OnlyField) -> serde_json::Value {
    match (result, field) {
        (AnalysisResult::Processed(document), OnlyField::Summary) => json!(document.summary),
        (AnalysisResult::Processed(document), OnlyField::Patient) => json!(document.patient_info),
        (AnalysisResult::Failed(failed), OnlyField::Summary) => {
            json!(format!("Error: {}", failed.message))
        }
        (AnalysisResult::Failed(failed), OnlyField::Patient) => json!({ "error": failed.message }),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config);
    let app = create_router(state);

    tracing::info!("Aida starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  Analyze:      POST http://{}/api/v1/documents:analyze", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
