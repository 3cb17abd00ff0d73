use serde_json::Value;
use tracing::{info, warn};

use super::columns::DocumentField;
use super::upsert_rows;
use crate::config::IngestConfig;
use crate::constants::fallback;
use crate::data::{Document, EntityKind, ResourceType, UpdateSize};
use crate::dates::parse_catalog_date;
use crate::errors::IngestError;
use crate::report::{PhaseReport, SkipReason};
use crate::schema::PositionalRow;
use crate::store::{Catalog, Collection, Entity, RecordStore, Transaction};
use crate::types::LookupKey;
use crate::utils::{canonical_document_url, decode_ampersand};

/// Import document rows as one committed phase.
///
/// Requires a committed resource type named `config.sample_code_label`; without
/// it the phase is aborted and nothing is written. Only rows whose type code
/// equals that resource type's lookup key are imported.
pub fn import_documents(
    store: &dyn RecordStore,
    rows: &[PositionalRow],
    config: &IngestConfig,
) -> Result<PhaseReport, IngestError> {
    let mut txn = Transaction::<Document>::begin(store)?;
    let Some(sample_code) = find_resource_type(txn.committed(), &config.sample_code_label) else {
        warn!(
            "[catalog:documents] resource type '{}' not found; document import skipped",
            config.sample_code_label
        );
        return Ok(PhaseReport::aborted(
            EntityKind::Document,
            format!("resource type '{}' not found", config.sample_code_label),
        ));
    };
    let sample_code_key = sample_code.key;

    let mut report = PhaseReport::new(EntityKind::Document);
    upsert_rows(&mut txn, rows, &mut report, |txn, row| {
        decode_document_row(row, sample_code_key, txn.committed(), &config.base_url)
    });
    txn.commit()?;
    info!(
        "[catalog:documents] committed (inserted={}, updated={}, unchanged={}, filtered={}, skipped={})",
        report.inserted,
        report.updated,
        report.unchanged,
        report.filtered(),
        report.skipped.len() - report.filtered()
    );
    Ok(report)
}

/// First committed resource type whose display name equals `label`.
pub fn find_resource_type<'c>(catalog: &'c Catalog, label: &str) -> Option<&'c ResourceType> {
    catalog
        .resource_types
        .iter()
        .find(|resource_type| resource_type.name == label)
}

/// Decode one positional document row.
///
/// Every field in the decoding table is required. References to resource
/// types, topics, and frameworks are resolved against `catalog` by lookup key
/// and may each be absent.
pub fn decode_document_row(
    row: &PositionalRow,
    sample_code_key: LookupKey,
    catalog: &Catalog,
    base_url: &str,
) -> Result<Document, SkipReason> {
    let name = text(row, DocumentField::Name)?;
    let id = text(row, DocumentField::Id)?;
    let type_code = int(row, DocumentField::ResourceType)?;
    let date = date_field(row, DocumentField::Date)?;
    let size_code = int(row, DocumentField::UpdateSize)?;
    let topic_code = int(row, DocumentField::Topic)?;
    let framework_code = int(row, DocumentField::Framework)?;
    let release = int(row, DocumentField::Release)?;
    let release_version =
        i16::try_from(release).map_err(|_| invalid(DocumentField::Release))?;
    let sub_topic_code = int(row, DocumentField::SubTopic)?;
    let relative_url = text(row, DocumentField::Url)?;
    let sort_order = int(row, DocumentField::SortOrder)?;
    let display_date = date_field(row, DocumentField::DisplayDate)?;
    let platform = text(row, DocumentField::Platform)?;

    if type_code != i64::from(sample_code_key) {
        return Err(SkipReason::Filtered);
    }

    let url =
        canonical_document_url(base_url, relative_url).ok_or(invalid(DocumentField::Url))?;

    Ok(Document {
        id: id.to_string(),
        name: decode_ampersand(name),
        url,
        date,
        display_date,
        sort_order: i16::try_from(sort_order).unwrap_or(fallback::SORT_ORDER),
        update_size: UpdateSize::from_code(size_code),
        release_version,
        platform: platform.to_string(),
        resource_type: resolve(&catalog.resource_types, type_code),
        topic: resolve(&catalog.topics, topic_code),
        sub_topic: resolve(&catalog.topics, sub_topic_code),
        framework: resolve(&catalog.frameworks, framework_code),
    })
}

fn resolve<E: Entity>(collection: &Collection<E>, code: i64) -> Option<E::Id> {
    let key = LookupKey::try_from(code).ok()?;
    collection
        .find_by_lookup_key(key)
        .map(|entity| entity.id().clone())
}

fn value(row: &PositionalRow, field: DocumentField) -> Option<&Value> {
    row.get(field.position())
}

fn missing(field: DocumentField) -> SkipReason {
    SkipReason::MissingField(field.name())
}

fn invalid(field: DocumentField) -> SkipReason {
    SkipReason::InvalidField(field.name())
}

fn text(row: &PositionalRow, field: DocumentField) -> Result<&str, SkipReason> {
    value(row, field)
        .and_then(Value::as_str)
        .ok_or(missing(field))
}

fn int(row: &PositionalRow, field: DocumentField) -> Result<i64, SkipReason> {
    value(row, field)
        .and_then(Value::as_i64)
        .ok_or(missing(field))
}

fn date_field(
    row: &PositionalRow,
    field: DocumentField,
) -> Result<chrono::DateTime<chrono::Utc>, SkipReason> {
    parse_catalog_date(text(row, field)?).ok_or(invalid(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Framework, Topic};
    use crate::store::MemoryRecordStore;
    use serde_json::json;

    const BASE: &str = "https://developer.apple.com/library";

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.resource_types.upsert(ResourceType {
            id: "rt1".to_string(),
            key: 1,
            name: "Sample Code".to_string(),
            sort_order: 0,
        });
        catalog.resource_types.upsert(ResourceType {
            id: "rt2".to_string(),
            key: 2,
            name: "Guides".to_string(),
            sort_order: 1,
        });
        catalog.topics.upsert(Topic {
            id: 1,
            key: 10,
            name: "General".to_string(),
            parent: None,
        });
        catalog.frameworks.upsert(Framework {
            id: 1,
            key: 1,
            name: "Foo".to_string(),
        });
        catalog
    }

    fn row(value: serde_json::Value) -> PositionalRow {
        value.as_array().cloned().unwrap()
    }

    fn sample_row() -> PositionalRow {
        row(json!([
            "Sample &amp; A", "d1", 1, "2016-01-23", 2, 10, 1, 3, 0,
            "../a/b.html", 4, "2016-01-24"
        ]))
    }

    #[test]
    fn decodes_a_well_formed_row() {
        let document = decode_document_row(&sample_row(), 1, &catalog(), BASE).unwrap();
        assert_eq!(document.id, "d1");
        assert_eq!(document.name, "Sample & A");
        assert_eq!(
            document.url.as_str(),
            "https://developer.apple.com/library/prerelease/content/a/b.html"
        );
        assert_eq!(document.update_size, UpdateSize::Medium);
        assert_eq!(document.release_version, 3);
        assert_eq!(document.sort_order, 4);
        assert_eq!(document.resource_type.as_deref(), Some("rt1"));
        assert_eq!(document.topic, Some(1));
        assert_eq!(document.sub_topic, None);
        assert_eq!(document.framework, Some(1));
        assert_eq!(document.date, parse_catalog_date("2016-01-23").unwrap());
        assert_eq!(document.display_date, parse_catalog_date("2016-01-24").unwrap());
    }

    #[test]
    fn platform_reads_the_display_date_position() {
        let document = decode_document_row(&sample_row(), 1, &catalog(), BASE).unwrap();
        assert_eq!(document.platform, "2016-01-24");
    }

    #[test]
    fn other_resource_types_are_filtered() {
        let mut row = sample_row();
        row[2] = json!(2);
        assert_eq!(
            decode_document_row(&row, 1, &catalog(), BASE),
            Err(SkipReason::Filtered)
        );
    }

    #[test]
    fn missing_or_mistyped_fields_drop_the_row() {
        let short = row(json!(["Sample A", "d1", 1, "2016-01-23"]));
        assert_eq!(
            decode_document_row(&short, 1, &catalog(), BASE),
            Err(SkipReason::MissingField("updateSize"))
        );

        let mut mistyped = sample_row();
        mistyped[2] = json!("1");
        assert_eq!(
            decode_document_row(&mistyped, 1, &catalog(), BASE),
            Err(SkipReason::MissingField("type"))
        );

        let mut null_display = sample_row();
        null_display[11] = serde_json::Value::Null;
        assert_eq!(
            decode_document_row(&null_display, 1, &catalog(), BASE),
            Err(SkipReason::MissingField("displayDate"))
        );
    }

    #[test]
    fn unparsable_values_drop_the_row() {
        let mut bad_date = sample_row();
        bad_date[3] = json!("01/23/2016");
        assert_eq!(
            decode_document_row(&bad_date, 1, &catalog(), BASE),
            Err(SkipReason::InvalidField("date"))
        );

        let mut bad_release = sample_row();
        bad_release[7] = json!(100_000);
        assert_eq!(
            decode_document_row(&bad_release, 1, &catalog(), BASE),
            Err(SkipReason::InvalidField("release"))
        );

        assert_eq!(
            decode_document_row(&sample_row(), 1, &catalog(), "no base"),
            Err(SkipReason::InvalidField("url"))
        );
    }

    #[test]
    fn out_of_range_codes_fall_back() {
        let mut row = sample_row();
        row[4] = json!(99);
        row[5] = json!(70_000);
        row[10] = json!(70_000);
        let document = decode_document_row(&row, 1, &catalog(), BASE).unwrap();
        assert_eq!(document.update_size, UpdateSize::Unknown);
        assert_eq!(document.topic, None);
        assert_eq!(document.sort_order, 0);
    }

    #[test]
    fn missing_sample_code_type_aborts_the_phase() {
        let store = MemoryRecordStore::new();
        let report = import_documents(&store, &[sample_row()], &IngestConfig::default()).unwrap();
        assert!(!report.is_committed());
        assert_eq!(report.imported(), 0);
        assert!(store.snapshot().unwrap().documents.is_empty());
    }

    #[test]
    fn import_counts_filtered_rows() {
        let store = MemoryRecordStore::with_catalog(catalog());
        let mut guide = sample_row();
        guide[1] = json!("g1");
        guide[2] = json!(2);
        let report =
            import_documents(&store, &[sample_row(), guide], &IngestConfig::default()).unwrap();

        assert!(report.is_committed());
        assert_eq!(report.inserted, 1);
        assert_eq!(report.filtered(), 1);
        let documents = store.snapshot().unwrap().documents;
        assert!(documents.get(&"d1".to_string()).is_some());
        assert!(documents.get(&"g1".to_string()).is_none());
    }
}
