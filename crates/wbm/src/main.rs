use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wbm_core::{
    batch::load_batch,
    config::Config,
    dispatch::{Completion, DispatchEngine},
    domain::{delay_from_secs, BatchReport, OutcomeStatus},
    dry_run::DryRunClient,
    ports::PlatformClient,
    store::{file_store, ReportFormat},
};
use wbm_whapi::{WhapiClient, WhapiSettings};

/// Send a batch of WhatsApp group messages with pacing and write a report.
#[derive(Debug, Parser)]
#[command(name = "wbm", version)]
struct Cli {
    /// JSON batch file: an array of {"group", "message", "media_file"?, "delay"?}
    /// entries, or {"subgroups": {...}, "messages": [...]}.
    batch_file: PathBuf,

    /// Seconds to wait between messages that set no delay of their own.
    /// Overrides DEFAULT_DELAY_SECS.
    #[arg(long)]
    default_delay: Option<f64>,

    /// Directory for the result report. Overrides RESULTS_DIR.
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Report format: json or csv.
    #[arg(long, value_parser = parse_format)]
    format: Option<ReportFormat>,

    /// Log messages instead of sending them.
    #[arg(long)]
    dry_run: bool,

    /// Do not write a report file.
    #[arg(long)]
    no_persist: bool,
}

fn parse_format(s: &str) -> std::result::Result<ReportFormat, String> {
    ReportFormat::parse(s).ok_or_else(|| format!("unknown report format '{s}' (json|csv)"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    wbm_core::logging::init("wbm")?;

    let cli = Cli::parse();
    let mut cfg = Config::load()?;
    if let Some(secs) = cli.default_delay {
        cfg.default_delay = delay_from_secs(secs);
    }
    if let Some(dir) = cli.results_dir.clone() {
        cfg.results_dir = dir;
    }
    if let Some(format) = cli.format {
        cfg.report_format = format;
    }

    let requests = load_batch(&cli.batch_file)
        .await
        .with_context(|| format!("loading batch {}", cli.batch_file.display()))?;
    info!(
        messages = requests.len(),
        default_delay_s = cfg.default_delay.as_secs_f64(),
        "batch loaded"
    );

    let client: Arc<dyn PlatformClient> = if cli.dry_run {
        Arc::new(DryRunClient)
    } else {
        let whapi = WhapiClient::new(WhapiSettings::from_config(&cfg)?)?;
        if cfg.health_check && !whapi.health().await {
            warn!("whapi gateway did not report healthy; sending anyway");
        }
        Arc::new(whapi)
    };

    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    let mut engine = DispatchEngine::new(client).with_cancellation(cancel);
    if !cli.no_persist {
        engine = engine.with_store(file_store(
            cfg.report_format,
            cfg.results_dir.clone(),
            &cfg.results_prefix,
        ));
    }

    let run = engine.run(requests, cfg.default_delay).await;
    print_report(&run.report);
    if let Completion::Cancelled { skipped } = run.completion {
        println!("Cancelled: {skipped} message(s) not attempted");
    }

    let mut code = if run.report.all_sent() && !run.is_cancelled() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    };

    if !cli.no_persist {
        match engine.persist(&run.report).await {
            Ok(location) => println!("Results saved to: {location}"),
            Err(e) => {
                eprintln!("Failed to save results: {e}");
                code = ExitCode::from(2);
            }
        }
    }

    Ok(code)
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after the current message");
            cancel.cancel();
        }
    });
}

fn print_report(report: &BatchReport) {
    println!("Campaign summary: {}", report.summary());
    for (idx, o) in report.outcomes.iter().enumerate() {
        match o.status {
            OutcomeStatus::Sent => println!("  {:>3}. [sent]   {}", idx + 1, o.group),
            OutcomeStatus::Failed => println!(
                "  {:>3}. [failed] {}: {}",
                idx + 1,
                o.group,
                o.reason.as_deref().unwrap_or("-")
            ),
        }
    }
}
