//! declass-pipeline - staged concurrent PDF ingestion pipeline for
//! declassified documents.
//!
//! Binary entry point: load configuration, verify external binaries,
//! collect ingestion sources, and drive the pipeline to completion.

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use declass_pipeline::cli::Cli;
use declass_pipeline::config::Settings;
use declass_pipeline::error::PipelineError;
use declass_pipeline::gates::Gates;
use declass_pipeline::ids::IdentifierMint;
use declass_pipeline::ingest::{directory, file, manifest, SeedRecord};
use declass_pipeline::lockers::Lockers;
use declass_pipeline::pipeline::{build_channels, workers, PipelineContext};
use declass_pipeline::registry::Registries;
use declass_pipeline::{lifecycle, logging, tools};

fn parse_metadata_json(raw: &Option<String>) -> HashMap<String, String> {
    match raw {
        Some(text) => serde_json::from_str(text).unwrap_or_default(),
        None => HashMap::new(),
    }
}

/// Gather every configured ingestion source into its seed records.
/// Grounded on `original_source/config.go`'s mutually-independent flag set:
/// any number of sources may be configured for a single run.
async fn collect_seeds(settings: &Settings) -> Result<Vec<SeedRecord>, PipelineError> {
    let mut seeds = Vec::new();
    let metadata = parse_metadata_json(&settings.metadata_json);

    if let Some(url) = &settings.download_pdf_url {
        seeds.push(SeedRecord {
            pdf_path: std::path::PathBuf::new(),
            url: Some(url.clone()),
            title: settings.pdf_title.clone(),
            metadata: metadata.clone(),
        });
    }

    if let Some(path) = &settings.import_pdf_path {
        let mut seed = file::seed_from_path(path, settings.pdf_title.clone());
        seed.metadata.extend(metadata.clone());
        seeds.push(seed);
    }

    if let Some(dir) = &settings.import_directory {
        seeds.extend(directory::walk_pdfs(dir).await?);
    }

    if let Some(path) = &settings.import_csv {
        seeds.extend(manifest::read_csv(path, &settings.csv_columns)?);
    }

    if let Some(path) = &settings.import_xlsx {
        seeds.extend(manifest::read_xlsx(path, &settings.xlsx_columns)?);
    }

    Ok(seeds)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;
    let _guards = logging::init(&settings.log_directory, cli.verbose)?;

    if !settings.has_ingestion_source() {
        return Err(declass_pipeline::error::ConfigError::NoIngestionSource.into());
    }

    let required_binaries = if settings.no_clam {
        tools::REQUIRED_BINARIES_NO_CLAM
    } else {
        tools::REQUIRED_BINARIES
    };
    let binaries = Arc::new(tools::verify_binaries(required_binaries)?);

    let seeds = collect_seeds(&settings).await?;
    info!(count = seeds.len(), "collected ingestion sources");

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctx = PipelineContext {
        settings: Arc::new(settings.clone()),
        gates: Gates::new(&settings.gates),
        lockers: Arc::new(Lockers::new()),
        registries: Arc::new(Registries::new()),
        binaries,
        mint: IdentifierMint::new(),
        http_client: reqwest::Client::new(),
        cancel: cancel_rx,
    };

    let channels = build_channels(settings.limit.max(1));
    let handles = workers::spawn_all(ctx.clone(), channels);

    let outcome = lifecycle::run(ctx, handles, settings.database_directory.clone(), seeds, cancel_tx).await;

    info!(
        admitted = outcome.documents_admitted,
        completed = outcome.documents_completed,
        canceled = outcome.canceled,
        "pipeline run finished"
    );

    if outcome.canceled {
        anyhow::bail!("run canceled before every admitted document completed");
    }

    logging::mark_clean_exit(&settings.log_directory);
    Ok(())
}
