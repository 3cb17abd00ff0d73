use tracing::{debug, info};

use super::{optional_numeric_text, required_i16, required_numeric_text, required_text, upsert_rows};
use crate::config::ParentResolution;
use crate::constants::fallback;
use crate::constants::fields::{ID, KEY, NAME, PARENT};
use crate::data::{EntityKind, Topic};
use crate::errors::IngestError;
use crate::report::{PhaseReport, SkipReason};
use crate::schema::KeyedRow;
use crate::store::{Collection, RecordStore, Transaction};
use crate::types::{LookupKey, TopicId};
use crate::utils::decode_ampersand;

/// Import topic rows as one committed phase.
///
/// With `ParentResolution::SourceOrder`, a parent key resolves only against
/// topics visible when its row is processed: topics committed by earlier
/// passes and rows earlier in `rows`. A child listed before its parent keeps
/// `parent: None`.
pub fn import_topics(
    store: &dyn RecordStore,
    rows: &[KeyedRow],
    policy: ParentResolution,
) -> Result<PhaseReport, IngestError> {
    let mut txn = Transaction::<Topic>::begin(store)?;
    let mut report = PhaseReport::new(EntityKind::Topic);
    let mut unresolved: Vec<(TopicId, LookupKey)> = Vec::new();

    upsert_rows(&mut txn, rows, &mut report, |txn, row| {
        let (mut topic, parent_key) = decode_topic(row, |key| {
            txn.find_by_lookup_key(key).map(|parent| parent.id)
        })?;
        if let Some(parent) = topic.parent
            && closes_cycle(txn.working(), topic.id, parent)
        {
            debug!(
                topic = topic.id,
                parent, "[catalog:topics] parent link would close a cycle; left unresolved"
            );
            topic.parent = None;
        }
        if let Some(key) = parent_key
            && topic.parent.is_none()
        {
            unresolved.push((topic.id, key));
        }
        Ok(topic)
    });

    if policy == ParentResolution::AfterAllTopics {
        resolve_deferred_parents(&mut txn, &unresolved);
    } else if !unresolved.is_empty() {
        debug!(
            count = unresolved.len(),
            "[catalog:topics] parents listed after their children were left unresolved"
        );
    }

    txn.commit()?;
    info!(
        "[catalog:topics] committed (inserted={}, updated={}, unchanged={}, skipped={})",
        report.inserted,
        report.updated,
        report.unchanged,
        report.skipped.len()
    );
    Ok(report)
}

/// Decode one topic row, resolving its parent key through `resolve_parent`.
///
/// Also returns the raw parent key so callers can tell an unresolved parent
/// from a top-level topic.
pub fn decode_topic(
    row: &KeyedRow,
    resolve_parent: impl FnOnce(LookupKey) -> Option<TopicId>,
) -> Result<(Topic, Option<LookupKey>), SkipReason> {
    let name = required_text(row, NAME)?;
    let id = required_i16(row, ID)?;
    let key = required_numeric_text(row, KEY)?;
    let parent_key = optional_numeric_text(row, PARENT);
    let parent = parent_key.and_then(resolve_parent);
    let topic = Topic {
        id,
        key: key.unwrap_or(fallback::LOOKUP_KEY),
        name: decode_ampersand(name),
        parent,
    };
    Ok((topic, parent_key))
}

fn resolve_deferred_parents(txn: &mut Transaction<'_, Topic>, unresolved: &[(TopicId, LookupKey)]) {
    for &(child_id, parent_key) in unresolved {
        let Some(parent_id) = txn.find_by_lookup_key(parent_key).map(|parent| parent.id) else {
            continue;
        };
        if closes_cycle(txn.working(), child_id, parent_id) {
            debug!(
                topic = child_id,
                parent = parent_id,
                "[catalog:topics] deferred parent link would close a cycle; skipped"
            );
            continue;
        }
        txn.modify(&child_id, |child| child.parent = Some(parent_id));
    }
}

/// Whether linking `child` under `parent` would make `child` its own ancestor.
///
/// An ancestry chain longer than the collection already loops and also counts.
fn closes_cycle(topics: &Collection<Topic>, child: TopicId, parent: TopicId) -> bool {
    let mut current = Some(parent);
    for _ in 0..=topics.len() {
        match current {
            None => return false,
            Some(id) if id == child => return true,
            Some(id) => current = topics.get(&id).and_then(|topic| topic.parent),
        }
    }
    true
}
