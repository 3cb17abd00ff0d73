use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::constants::pipeline::WORKER_THREAD_NAME;
use crate::errors::IngestError;
use crate::import::{
    import_documents, import_frameworks, import_resource_types, import_topics,
    validate_column_map,
};
use crate::report::{ColumnMismatch, PassReport};
use crate::schema::extract;
use crate::store::RecordStore;
use crate::types::ColumnName;

/// Runs ingestion passes against a shared record store.
///
/// A pass extracts the catalog schema, then imports resource types,
/// frameworks, topics, and documents in that order. Each phase commits before
/// the next begins, so later phases resolve references against everything
/// committed so far.
#[derive(Clone)]
pub struct CatalogPipeline {
    store: Arc<dyn RecordStore>,
    config: IngestConfig,
}

impl fmt::Debug for CatalogPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CatalogPipeline {
    /// Create a pipeline writing into `store`.
    ///
    /// Fails with `IngestError::Configuration` when `config` cannot produce
    /// canonical document URLs.
    pub fn new(store: Arc<dyn RecordStore>, config: IngestConfig) -> Result<Self, IngestError> {
        Ok(Self {
            store,
            config: config.validated()?,
        })
    }

    /// Store every pass writes into.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Validated configuration.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run one pass over `raw` on the calling thread.
    ///
    /// A document without the expected sections fails the pass before any
    /// phase runs. A missing sample code resource type only aborts the
    /// document phase; the pass itself still returns `Ok`.
    pub fn run(&self, raw: &Value) -> Result<PassReport, IngestError> {
        let schema = extract(raw).inspect_err(|err| {
            warn!(error = %err, "[catalog:pipeline] unexpected data; pass abandoned");
        })?;

        let column_mismatches = if self.config.validate_columns {
            check_columns(&schema.columns)
        } else {
            Vec::new()
        };

        let store = self.store.as_ref();
        let phases = vec![
            import_resource_types(store, &schema.resource_types)?,
            import_frameworks(store, &schema.frameworks)?,
            import_topics(store, &schema.topics, self.config.parent_resolution)?,
            import_documents(store, &schema.documents, &self.config)?,
        ];
        let report = PassReport {
            phases,
            column_mismatches,
        };
        info!(
            "[catalog:pipeline] pass finished (phases={}, skipped={})",
            report.phases.len(),
            report.total_skipped()
        );
        Ok(report)
    }

    /// Parse `raw` as JSON and run one pass over it.
    pub fn run_json(&self, raw: &str) -> Result<PassReport, IngestError> {
        let value: Value = serde_json::from_str(raw)?;
        self.run(&value)
    }

    /// Run one pass over `raw` on a background thread.
    ///
    /// `on_complete` runs on the thread that calls `PassHandle::join`, and only
    /// when the pass returns `Ok`.
    pub fn spawn<F>(&self, raw: Value, on_complete: F) -> Result<PassHandle, IngestError>
    where
        F: FnOnce() + 'static,
    {
        let pipeline = self.clone();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || pipeline.run(&raw))?;
        Ok(PassHandle {
            handle,
            on_complete: Some(Box::new(on_complete)),
        })
    }
}

fn check_columns(columns: &IndexMap<ColumnName, usize>) -> Vec<ColumnMismatch> {
    let mismatches = validate_column_map(columns);
    for mismatch in &mismatches {
        warn!("[catalog:columns] {mismatch}");
    }
    mismatches
}

/// A pass running on a background thread.
pub struct PassHandle {
    handle: JoinHandle<Result<PassReport, IngestError>>,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for PassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassHandle")
            .field("finished", &self.handle.is_finished())
            .finish_non_exhaustive()
    }
}

impl PassHandle {
    /// Returns `true` once the worker thread has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the pass, then run the completion callback if it succeeded.
    pub fn join(self) -> Result<PassReport, IngestError> {
        let report = self
            .handle
            .join()
            .map_err(|_| IngestError::WorkerPanicked)??;
        if let Some(on_complete) = self.on_complete {
            on_complete();
        }
        Ok(report)
    }
}
