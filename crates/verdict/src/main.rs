use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use verdict_agents::claude_cli::check_cli_available;
use verdict_export::text::confidence_percent;
use verdict_export::{render_text, write_report, ResultExporter, TabularSink};
use verdict_models::{AnalysisRecord, ExportFormat};

#[derive(Parser, Debug)]
#[command(name = "verdict", about = "Fundamentals and news sentiment stock ratings")]
struct Cli {
    /// Ticker symbols to analyse; more than one runs a batch
    #[arg(required = true)]
    subjects: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config/verdict.toml")]
    config: PathBuf,

    /// Write results to the output directory
    #[arg(long)]
    export: bool,

    /// Export format: text, structured or tabular (defaults to config)
    #[arg(short, long)]
    format: Option<ExportFormat>,

    /// Output directory for exports and reports (defaults to config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write an aggregate report, optionally to the given path
    #[arg(long, num_args = 0..=1)]
    report: Option<Option<PathBuf>>,

    /// Print one line per subject instead of the full analysis
    #[arg(long)]
    summary_only: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = verdict::load_config(&cli.config)?;

    if !check_cli_available().await {
        warn!("claude CLI not found on PATH, model calls will fail");
    }

    let format = cli.format.unwrap_or(config.export.format);
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.export.output_dir));
    let exporter = ResultExporter::new(&output_dir);

    let records = if cli.subjects.len() == 1 {
        let orchestrator =
            verdict::build_orchestrator(&config).context("Failed to build orchestrator")?;
        let record = verdict::analyze(&orchestrator, &cli.subjects[0]).await;

        if cli.summary_only {
            println!("{}", summary_line(&record));
        } else {
            print!("{}", render_text(&record));
        }
        if cli.export {
            let path = exporter
                .export(&record, format)
                .context("Failed to export analysis")?;
            println!("Exported to {}", path.display());
        }
        vec![record]
    } else {
        let batch =
            verdict::build_batch_executor(&config).context("Failed to build batch executor")?;

        // Tabular batch output is appended row by row as subjects finish
        let sink = if cli.export && format == ExportFormat::Tabular {
            let sink = TabularSink::for_batch(&output_dir, Utc::now(), Uuid::new_v4())
                .context("Failed to create batch export file")?;
            Some(Arc::new(sink))
        } else {
            None
        };

        let callback_sink = sink.clone();
        let records = batch
            .run_batch_with(&cli.subjects, move |record| {
                if let Some(sink) = &callback_sink {
                    if let Err(e) = sink.append(record) {
                        warn!(subject = %record.subject, error = %e, "Failed to append export row");
                    }
                }
            })
            .await;

        for record in &records {
            if cli.summary_only {
                println!("{}", summary_line(record));
            } else {
                print!("{}", render_text(record));
                println!();
            }
        }
        let progress = batch.progress();
        println!(
            "Analysed {} subjects: {} succeeded, {} failed",
            progress.total,
            progress.succeeded,
            progress.failed()
        );

        if let Some(sink) = &sink {
            println!("Exported to {}", sink.path().display());
        } else if cli.export {
            let paths = exporter
                .export_batch(&records, format)
                .context("Failed to export batch")?;
            info!(files = paths.len(), "Batch exported");
            println!("Exported {} files to {}", paths.len(), output_dir.display());
        }
        records
    };

    if let Some(path) = &cli.report {
        let path = path.clone().unwrap_or_else(|| {
            output_dir.join(format!(
                "batch_report_{}.txt",
                Utc::now().format("%Y%m%d_%H%M%S")
            ))
        });
        write_report(&records, &path).context("Failed to write report")?;
        println!("Report written to {}", path.display());
    }

    // Only a failed single-subject run is a failed invocation
    if records.len() == 1 && !records[0].success {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn summary_line(record: &AnalysisRecord) -> String {
    if record.success {
        format!(
            "[OK] {}: {} ({}) {:.1}s",
            record.subject,
            record.verdict.rating,
            confidence_percent(record.verdict.confidence),
            record.elapsed_seconds()
        )
    } else {
        format!(
            "[FAILED] {}: {}",
            record.subject,
            record.error_message.as_deref().unwrap_or("unknown error")
        )
    }
}
