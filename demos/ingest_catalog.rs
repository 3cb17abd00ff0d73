use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalog_ingest::{
    CatalogPipeline, FileRecordStore, IngestConfig, MemoryRecordStore, ParentResolution,
    PhaseStatus, RecordStore,
};

#[derive(Debug, Parser)]
#[command(
    name = "ingest_catalog",
    disable_help_subcommand = true,
    about = "Ingest a catalog document into a record store",
    long_about = "Run one ingestion pass over a catalog JSON document and print per-phase row counts.",
    after_help = "Without --store the catalog is held in memory and discarded on exit."
)]
struct IngestCatalogCli {
    #[arg(value_name = "CATALOG", help = "Path to the catalog JSON document")]
    catalog: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        help = "Persist into a file-backed store at PATH (file or directory)"
    )]
    store: Option<PathBuf>,
    #[arg(long, value_name = "URL", help = "Override the canonical document URL root")]
    base_url: Option<String>,
    #[arg(
        long,
        help = "Resolve topic parents after every topic row has been read"
    )]
    deferred_parents: bool,
    #[arg(long, help = "Skip column map validation")]
    skip_column_check: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = IngestCatalogCli::parse();

    let mut config = IngestConfig::default().with_validate_columns(!cli.skip_column_check);
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    if cli.deferred_parents {
        config = config.with_parent_resolution(ParentResolution::AfterAllTopics);
    }

    let store: Arc<dyn RecordStore> = match &cli.store {
        Some(path) => Arc::new(FileRecordStore::open(path.clone())?),
        None => Arc::new(MemoryRecordStore::new()),
    };
    let pipeline = CatalogPipeline::new(Arc::clone(&store), config)?;

    let raw = fs::read_to_string(&cli.catalog)?;
    let report = pipeline.run_json(&raw)?;

    for phase in &report.phases {
        let status = match &phase.status {
            PhaseStatus::Committed => "committed".to_string(),
            PhaseStatus::Aborted(reason) => format!("aborted ({reason})"),
        };
        println!(
            "{:<15} {status}: inserted={} updated={} unchanged={} filtered={} skipped={}",
            phase.kind.as_str(),
            phase.inserted,
            phase.updated,
            phase.unchanged,
            phase.filtered(),
            phase.skipped.len() - phase.filtered(),
        );
    }
    for mismatch in &report.column_mismatches {
        println!("column check: {mismatch}");
    }

    let catalog = store.snapshot()?;
    for (kind, count) in catalog.counts() {
        println!("{:<15} {count} stored", kind.as_str());
    }
    Ok(())
}
