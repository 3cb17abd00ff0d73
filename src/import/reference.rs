use tracing::info;

use super::{required_i16, required_numeric_text, required_text, upsert_rows};
use crate::constants::fallback;
use crate::constants::fields::{ID, KEY, NAME, SORT_ORDER};
use crate::data::{EntityKind, Framework, ResourceType};
use crate::errors::IngestError;
use crate::report::{PhaseReport, SkipReason};
use crate::schema::KeyedRow;
use crate::store::{RecordStore, Transaction};
use crate::utils::decode_ampersand;

/// Import resource type rows as one committed phase.
pub fn import_resource_types(
    store: &dyn RecordStore,
    rows: &[KeyedRow],
) -> Result<PhaseReport, IngestError> {
    let mut txn = Transaction::<ResourceType>::begin(store)?;
    let mut report = PhaseReport::new(EntityKind::ResourceType);
    upsert_rows(&mut txn, rows, &mut report, |_, row| decode_resource_type(row));
    txn.commit()?;
    log_phase(&report);
    Ok(report)
}

/// Import framework rows as one committed phase.
pub fn import_frameworks(
    store: &dyn RecordStore,
    rows: &[KeyedRow],
) -> Result<PhaseReport, IngestError> {
    let mut txn = Transaction::<Framework>::begin(store)?;
    let mut report = PhaseReport::new(EntityKind::Framework);
    upsert_rows(&mut txn, rows, &mut report, |_, row| decode_framework(row));
    txn.commit()?;
    log_phase(&report);
    Ok(report)
}

/// Decode one resource type row.
///
/// `name`, `id`, `key`, and `sortOrder` must all be present; `key` and
/// `sortOrder` fall back to defaults when they do not parse.
pub fn decode_resource_type(row: &KeyedRow) -> Result<ResourceType, SkipReason> {
    let name = required_text(row, NAME)?;
    let id = required_text(row, ID)?;
    let key = required_numeric_text(row, KEY)?;
    let sort_order = required_numeric_text(row, SORT_ORDER)?;
    Ok(ResourceType {
        id: id.to_string(),
        key: key.unwrap_or(fallback::LOOKUP_KEY),
        name: decode_ampersand(name),
        sort_order: sort_order.unwrap_or(fallback::SORT_ORDER),
    })
}

/// Decode one framework row.
pub fn decode_framework(row: &KeyedRow) -> Result<Framework, SkipReason> {
    let name = required_text(row, NAME)?;
    let id = required_i16(row, ID)?;
    let key = required_numeric_text(row, KEY)?;
    Ok(Framework {
        id,
        key: key.unwrap_or(fallback::LOOKUP_KEY),
        name: decode_ampersand(name),
    })
}

fn log_phase(report: &PhaseReport) {
    info!(
        "[catalog:{}] committed (inserted={}, updated={}, unchanged={}, skipped={})",
        report.kind,
        report.inserted,
        report.updated,
        report.unchanged,
        report.skipped.len()
    );
}
