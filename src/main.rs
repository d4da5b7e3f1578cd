//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `atlas_probes` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use atlas_probes::app::{
    format_measurement, format_probe, print_error_statistics, print_result_summary,
    probe_id_list, Cli, Command,
};
use atlas_probes::initialization::{
    init_atlas_client, init_logger_with, init_pipeline_context, init_probe_selector,
};
use atlas_probes::{run_results_pipeline, Config, SelectionRequest};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // This allows setting GOOGLE_GEOCODING_API_KEY in .env without exporting it manually
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    let config = cli.to_config();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("atlas_probes error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Probes(args) => {
            let selector = init_probe_selector(config)
                .await
                .context("Failed to initialize probe selector")?;
            let request = SelectionRequest {
                metro: args.metro,
                radius_km: args.radius,
                count: args.count,
                want_v4: args.v4,
                want_v6: args.v6,
            };
            let probes = selector
                .select(&request)
                .await
                .with_context(|| format!("Probe selection for metro {} failed", request.metro))?;

            println!(
                "For metro: {} found {} probe{}.",
                request.metro,
                probes.len(),
                if probes.len() == 1 { "" } else { "s" }
            );
            for probe in &probes {
                println!("{}", format_probe(probe));
            }
            println!("{}", probe_id_list(&probes));
        }
        Command::Results(args) => {
            let ctx = init_pipeline_context(config)
                .await
                .context("Failed to initialize results pipeline")?;
            let report = run_results_pipeline(&ctx, args.measurement_id)
                .await
                .with_context(|| {
                    format!("Results of measurement {} failed", args.measurement_id)
                })?;

            let resolved = report.measurement.resolved_ips.clone().unwrap_or_default();
            println!(
                "IP addresses polled in this measurement ({}):\n\t{}",
                args.measurement_id,
                resolved.join("\n\t")
            );
            if let Some(result_url) = &report.measurement.result {
                println!("Results are at:\n{}", result_url);
            }
            print_result_summary(&report.summary, report.elapsed_seconds);
            print_error_statistics(&report.stats);
            println!(
                "Aggregated {} record{} from {} probes in {} countries in {:.1}s",
                report.summary.total_records,
                if report.summary.total_records == 1 { "" } else { "s" },
                report.summary.distinct_probes,
                report.summary.distinct_countries,
                report.elapsed_seconds
            );
        }
        Command::Probe { id } => {
            let atlas = init_atlas_client(config)
                .await
                .context("Failed to initialize API client")?;
            let probe = atlas
                .fetch_probe(id)
                .await
                .with_context(|| format!("Failed to look up probe {}", id))?;
            println!("{}", format_probe(&probe));
            println!(
                "{}",
                serde_json::to_string_pretty(&probe).context("Failed to render probe")?
            );
        }
        Command::Search { tags } => {
            let atlas = init_atlas_client(config)
                .await
                .context("Failed to initialize API client")?;
            let measurements = atlas
                .search_measurement_statuses(&tags)
                .await
                .with_context(|| format!("Measurement search for tags {} failed", tags))?;
            for measurement in &measurements {
                println!("{}", format_measurement(measurement));
            }
        }
    }
    Ok(())
}
