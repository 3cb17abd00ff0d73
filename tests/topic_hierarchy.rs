use std::sync::Arc;

use serde_json::{Value, json};

use catalog_ingest::{
    CatalogPipeline, IngestConfig, MemoryRecordStore, ParentResolution, RecordStore, TopicId,
};

fn catalog_with_topics(topics: Value) -> Value {
    json!({
        "topics": [
            { "name": "Resource Types", "contents": [
                { "name": "Sample Code", "id": "rt1", "key": "1", "sortOrder": "0" }
            ]},
            { "name": "Technologies", "contents": [] },
            { "name": "Topics", "contents": topics }
        ],
        "documents": [],
        "columns": {}
    })
}

fn parents_after(policy: ParentResolution, topics: Value) -> Vec<(TopicId, Option<TopicId>)> {
    let store = Arc::new(MemoryRecordStore::new());
    let config = IngestConfig::default()
        .with_validate_columns(false)
        .with_parent_resolution(policy);
    CatalogPipeline::new(store.clone(), config)
        .unwrap()
        .run(&catalog_with_topics(topics))
        .unwrap();
    store
        .snapshot()
        .unwrap()
        .topics
        .iter()
        .map(|topic| (topic.id, topic.parent))
        .collect()
}

#[test]
fn parent_before_child_links_the_child() {
    let parents = parents_after(
        ParentResolution::SourceOrder,
        json!([
            { "name": "Graphics", "id": 1, "key": "5" },
            { "name": "Metal", "id": 2, "key": "6", "parent": "5" }
        ]),
    );
    assert_eq!(parents, vec![(1, None), (2, Some(1))]);
}

#[test]
fn child_before_parent_stays_top_level_in_source_order() {
    let parents = parents_after(
        ParentResolution::SourceOrder,
        json!([
            { "name": "Metal", "id": 2, "key": "6", "parent": "5" },
            { "name": "Graphics", "id": 1, "key": "5" }
        ]),
    );
    assert_eq!(parents, vec![(2, None), (1, None)]);
}

#[test]
fn deferred_resolution_links_forward_references() {
    let parents = parents_after(
        ParentResolution::AfterAllTopics,
        json!([
            { "name": "Metal", "id": 2, "key": "6", "parent": "5" },
            { "name": "Graphics", "id": 1, "key": "5" },
            { "name": "Shaders", "id": 3, "key": "7", "parent": "6" }
        ]),
    );
    assert_eq!(parents, vec![(2, Some(1)), (1, None), (3, Some(2))]);
}

#[test]
fn second_pass_resolves_parents_committed_by_the_first() {
    let store = Arc::new(MemoryRecordStore::new());
    let pipeline = CatalogPipeline::new(
        store.clone(),
        IngestConfig::default().with_validate_columns(false),
    )
    .unwrap();
    let raw = catalog_with_topics(json!([
        { "name": "Metal", "id": 2, "key": "6", "parent": "5" },
        { "name": "Graphics", "id": 1, "key": "5" }
    ]));

    pipeline.run(&raw).unwrap();
    assert_eq!(store.snapshot().unwrap().topics.get(&2).unwrap().parent, None);

    pipeline.run(&raw).unwrap();
    assert_eq!(
        store.snapshot().unwrap().topics.get(&2).unwrap().parent,
        Some(1)
    );
}
