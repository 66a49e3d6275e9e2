// Causelog CLI - correlate error cascades from multi-service log streams

mod simulate;

use causelog_analysis::{AnalysisConfig, AnalysisEngine, HttpCollaborator};
use causelog_core::{AnalysisProvenance, AnalysisReport, CorrelationResult, Severity};
use causelog_correlate::{Correlator, CorrelatorConfig};
use causelog_ingest::{pipeline::pump_lines, ErrorObserved, IngestPipeline};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use tokio::fs::File;

#[derive(Parser)]
#[command(name = "causelog")]
#[command(version = "0.1.0")]
#[command(about = "Log correlation and deterministic root-cause analysis", long_about = None)]
struct Cli {
    /// Selection window half-width around a trigger, in milliseconds
    #[arg(short, long, default_value = "5000")]
    window_ms: i64,

    /// AI analysis endpoint; omitted = rule-table fallback only
    #[arg(long, env = "CAUSELOG_ANALYZE_URL")]
    analyze_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest log files (one source stream per file) and analyze the
    /// first observed error
    Ingest {
        /// Log files to ingest
        files: Vec<String>,
    },

    /// Generate a synthetic failure cascade and analyze it
    Simulate {
        /// RNG seed for a reproducible stream
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Routine lines to emit before the cascade
        #[arg(short, long, default_value = "40")]
        baseline: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let engine = match &cli.analyze_url {
        Some(url) => AnalysisEngine::new(
            AnalysisConfig::default(),
            Some(Box::new(HttpCollaborator::new(url.clone()))),
        ),
        None => AnalysisEngine::rule_only(),
    };

    match cli.command {
        Commands::Ingest { files } => {
            if files.is_empty() {
                eprintln!("{}", "no input files given".red());
                std::process::exit(1);
            }
            run_ingest(files, cli.window_ms, &engine).await?;
        }
        Commands::Simulate { seed, baseline } => {
            run_simulate(seed, baseline, cli.window_ms, &engine).await?;
        }
    }

    Ok(())
}

async fn run_ingest(
    files: Vec<String>,
    window_ms: i64,
    engine: &AnalysisEngine,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut handle = IngestPipeline::default().spawn();
    let mut events = handle
        .take_error_events()
        .ok_or("error event channel already taken")?;
    let tx = handle.sender();

    let mut readers = Vec::new();
    for path in &files {
        let file = File::open(path).await?;
        let identity = Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("file")
            .to_string();
        readers.push(tokio::spawn(pump_lines(file, identity, tx.clone())));
    }
    drop(tx);
    for reader in readers {
        reader.await?;
    }

    let buffer = handle.buffer();
    handle.shutdown().await;

    let mut trigger: Option<ErrorObserved> = None;
    let mut remaining = 0usize;
    while let Ok(event) = events.try_recv() {
        if trigger.is_none() {
            trigger = Some(event);
        } else {
            remaining += 1;
        }
    }

    match trigger {
        Some(observed) => {
            let correlator = Correlator::new(CorrelatorConfig {
                window_ms,
                ..Default::default()
            });
            let correlation = correlator.correlate(&observed.record, &buffer.snapshot(), window_ms);
            let report = engine.analyze(&correlation).await;
            print_report(&correlation, &report);
            if remaining > 0 {
                println!("\n{} further error records observed", remaining);
            }
        }
        None => println!("{}", "no errors observed in the ingested streams".green()),
    }

    Ok(())
}

async fn run_simulate(
    seed: u64,
    baseline: usize,
    window_ms: i64,
    engine: &AnalysisEngine,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut handle = IngestPipeline::default().spawn();
    let mut events = handle
        .take_error_events()
        .ok_or("error event channel already taken")?;
    let tx = handle.sender();

    println!("simulating cascade (seed={}, baseline={})\n", seed, baseline);
    for line in simulate::generate_cascade(seed, baseline) {
        tx.send(line).await?;
    }
    drop(tx);

    let buffer = handle.buffer();
    handle.shutdown().await;

    let observed = events.recv().await.ok_or("cascade produced no errors")?;
    let correlator = Correlator::new(CorrelatorConfig {
        window_ms,
        ..Default::default()
    });
    let correlation = correlator.correlate(&observed.record, &buffer.snapshot(), window_ms);
    let report = engine.analyze(&correlation).await;
    print_report(&correlation, &report);

    Ok(())
}

fn print_report(correlation: &CorrelationResult, report: &AnalysisReport) {
    let c = &report.classification;

    println!("{}", "=== CORRELATION ===".bold());
    println!("trigger     : #{} at {}", correlation.trigger_id, correlation.trigger_timestamp);
    println!("origin      : {}", correlation.origin_service.yellow().bold());
    println!("affected    : {}", correlation.affected_services.join(", "));
    println!(
        "evidence    : {} errors, {} distinct messages",
        correlation.error_details.error_count,
        correlation.error_details.error_messages.len()
    );
    if !correlation.error_details.affected_endpoints.is_empty() {
        println!("endpoints   : {}", correlation.error_details.affected_endpoints.join(", "));
    }

    println!("\n{}", "--- chain ---".bold());
    for entry in &correlation.log_chain {
        let marker = if entry.is_error { "✗".red() } else { "·".normal() };
        let hop = match &entry.propagated_from {
            Some(s) => format!("  ⇐ {}", s.as_str().cyan()),
            None => String::new(),
        };
        println!(
            "{} {} [{}] {}{}",
            marker,
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.service,
            entry.message,
            hop
        );
    }

    let severity = match c.severity {
        Severity::Critical => "CRITICAL".red().bold(),
        Severity::High => "HIGH".red(),
        Severity::Medium => "MEDIUM".yellow(),
        Severity::Low => "LOW".green(),
    };
    let provenance = match report.provenance {
        AnalysisProvenance::Model => "model",
        AnalysisProvenance::RuleFallback => "rule fallback",
    };

    println!("\n{}", "=== CLASSIFICATION ===".bold());
    println!("root cause  : {}", c.root_cause.bold());
    println!("type        : {}", c.error_type.as_str());
    println!("severity    : {}", severity);
    println!("details     : {}", c.technical_details);
    println!("impact      : users={} data={} availability={}",
        c.estimated_impact.users_affected,
        c.estimated_impact.data_at_risk,
        c.estimated_impact.service_availability
    );
    println!("\n{}", "immediate actions:".bold());
    for action in &c.immediate_actions {
        println!("  - {}", action);
    }
    println!("{}", "long-term fixes:".bold());
    for fix in &c.long_term_fixes {
        println!("  - {}", fix);
    }
    println!(
        "\nprovenance  : {} (confidence {:.0}%)",
        provenance,
        report.confidence * 100.0
    );
}
