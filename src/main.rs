//! TechWatch - live technology-intelligence briefings from the terminal
//!
//! A CLI client for an analysis backend: submits a technology topic,
//! queries the independent analytics sources concurrently, and renders
//! whatever succeeded as a Markdown or JSON briefing.
//!
//! Exit codes:
//!   0 - Success (at least one requested source produced data)
//!   1 - Runtime error (bad arguments, config, report write failure)
//!   2 - Every requested source failed or returned nothing

mod analytics;
mod cli;
mod client;
mod config;
mod models;
mod report;
mod workflow;

use analytics::{AnalyticsBundle, BriefingSession};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use client::ApiClient;
use config::Config;
use report::{BriefingReport, ReportMetadata};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use workflow::{PollConfig, TopicWorkflow, WorkflowState};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("TechWatch v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the briefing
    match run_briefing(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Briefing failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .techwatch.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".techwatch.toml");

    if path.exists() {
        eprintln!("⚠️  .techwatch.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .techwatch.toml")?;

    println!("✅ Created .techwatch.toml with default settings.");
    println!("   Edit it to customize the backend URL, polling, and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete briefing workflow. Returns exit code (0 or 2).
async fn run_briefing(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let topic = args.topic().to_string();
    let client = ApiClient::new(
        &config.backend.url,
        config.backend.timeout_seconds,
        config.backend.retries,
    )?;

    // Handle --dry-run: print the request plan and exit
    if args.dry_run {
        return handle_dry_run(&client, &topic, &args);
    }

    println!("🛰️  Generating intelligence briefing for \"{}\"", topic);
    println!("   Backend: {}", client.base_url());

    // One session per run: topic, generation, bundle, and documents are
    // replaced together, and stale responses can never write back.
    let session = BriefingSession::new();
    let Some(generation) = session.begin(&topic) else {
        eprintln!("Error: topic must not be empty");
        return Ok(1);
    };

    let mut workflow = TopicWorkflow::new();
    let poll = PollConfig {
        interval: Duration::from_secs(config.polling.interval_seconds),
        max_attempts: config.polling.max_attempts,
        show_progress: !args.quiet,
    };

    // The three capabilities are independent; run whichever were requested
    // concurrently against the same backend.
    let analytics_task = async {
        if args.skip_analytics {
            AnalyticsBundle::default()
        } else {
            println!("📡 Querying analytics sources...");
            analytics::fetch_all(&client, &session, generation, &topic).await
        }
    };

    let briefing_task = async {
        if !args.live_briefing {
            return None;
        }
        println!("🧠 Requesting live briefing... This may take up to 30 seconds.");
        match client.fetch_briefing(&topic).await {
            Ok(briefing) => Some(briefing),
            Err(e) => {
                warn!("Live briefing unavailable: {}", e);
                None
            }
        }
    };

    let workflow_task = async {
        if args.submit {
            println!("📤 Submitting background analysis job...");
            workflow::run_submission(&client, &mut workflow, &session, generation, &topic, &poll)
                .await;
        }
    };

    let (bundle, briefing, ()) = tokio::join!(analytics_task, briefing_task, workflow_task);

    if let WorkflowState::Error(message) = workflow.state() {
        eprintln!("⚠️  Analysis workflow failed: {}", message);
    } else if args.submit {
        println!("   {}", workflow.status_line());
    }

    // Build the report
    println!("\n📝 Generating report...");

    let (documents, documents_analyzed) = report::select_documents(
        session.documents(),
        config.report.include_documents,
        config.report.max_documents,
    );

    let duration = start_time.elapsed().as_secs_f64();
    let metadata = ReportMetadata {
        topic: topic.clone(),
        backend_url: client.base_url().to_string(),
        generated_at: Utc::now(),
        duration_seconds: duration,
        sources_succeeded: bundle.sources_succeeded(),
        sources_failed: bundle.sources_failed(),
        documents_analyzed,
    };

    let briefing_failed = briefing.as_ref().map(|b| b.is_error()).unwrap_or(args.live_briefing);
    let report = BriefingReport {
        metadata,
        briefing,
        bundle,
        documents,
    };

    let output = match args.format {
        OutputFormat::Json => report::generator::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generator::generate_markdown_report(&report),
    };

    if args.stdout {
        println!("\n{}", output);
    } else {
        report::generator::write_report(&output, &args.output)
            .with_context(|| format!("Failed to write briefing to {}", args.output.display()))?;
    }

    // Print summary
    println!("\n📊 Briefing Summary:");
    if !args.skip_analytics {
        println!(
            "   Analytics sources: {}/4 available",
            report.bundle.sources_succeeded()
        );
    }
    if args.live_briefing {
        let status = match report.briefing.as_ref() {
            Some(b) if !b.is_error() => "received",
            _ => "unavailable",
        };
        println!("   Live briefing: {}", status);
    }
    if args.submit {
        println!("   Documents analyzed: {}", report.metadata.documents_analyzed);
    }
    println!("   Duration: {:.1}s", duration);
    if args.stdout {
        println!("\n✅ Briefing complete!");
    } else {
        println!(
            "\n✅ Briefing complete! Report saved to: {}",
            args.output.display()
        );
    }

    // Exit code 2 when everything that was asked for came back empty.
    let analytics_failed = !args.skip_analytics && report.bundle.is_empty();
    let workflow_failed =
        args.submit && matches!(workflow.state(), WorkflowState::Error(_));
    let analytics_empty_or_skipped = args.skip_analytics || report.bundle.is_empty();
    let briefing_empty_or_skipped = !args.live_briefing || briefing_failed;
    let workflow_empty_or_skipped =
        !args.submit || workflow_failed || report.documents.is_empty();

    let nothing_succeeded =
        analytics_empty_or_skipped && briefing_empty_or_skipped && workflow_empty_or_skipped;
    let something_requested_failed = analytics_failed || briefing_failed || workflow_failed;

    if nothing_succeeded && something_requested_failed {
        eprintln!("\n⛔ No requested source produced data (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: print the requests that would be issued, exit.
fn handle_dry_run(client: &ApiClient, topic: &str, args: &Args) -> Result<i32> {
    println!("\n🔍 Dry run: requests that would be issued (no network calls)...\n");

    if !args.skip_analytics {
        for path in [
            "/api/analytics/synthesis",
            "/api/analytics/convergence",
            "/api/analytics/scurve",
            "/api/analytics/trl_progression",
        ] {
            println!("   GET  {}", client.endpoint_url(path, topic));
        }
    }
    if args.live_briefing {
        println!("   GET  {}", client.endpoint_url("/api/analyze", topic));
    }
    if args.submit {
        println!("   POST {}", client.endpoint_url("/api/analyze", topic));
        println!(
            "   GET  {}  (polled)",
            client.endpoint_url("/api/documents", topic)
        );
    }

    println!("\n✅ Dry run complete. No requests were made.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .techwatch.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
