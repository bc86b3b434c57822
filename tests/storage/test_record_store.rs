// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Record store behavior, run against both the CSV document and the
//! directory-backed key/value store.

use labtest_registry::{
    storage::{CsvFileBackend, DirectoryKeyValueStore, KeyValueBackend, RecordStore, StoreError},
    LabTest, Parameter, StorageBackend, TestPayload,
};
use std::sync::Arc;
use tempfile::TempDir;

fn backends(dir: &TempDir) -> Vec<Arc<dyn StorageBackend>> {
    vec![
        Arc::new(CsvFileBackend::new(dir.path().join("tests.csv"))),
        Arc::new(KeyValueBackend::new(
            Arc::new(DirectoryKeyValueStore::new(dir.path().join("kv"))),
            "tests",
        )),
    ]
}

fn lab_test(name: &str) -> LabTest {
    LabTest::new(
        name,
        50.0,
        vec![Parameter::new("Hemoglobin", "g/dL", "13.8-17.2")],
    )
}

fn payload(test: &LabTest) -> TestPayload {
    TestPayload::from(test)
}

async fn seeded(backend: Arc<dyn StorageBackend>, names: &[&str]) -> RecordStore {
    let store = RecordStore::open(backend).await.unwrap();
    for name in names {
        store.add(&payload(&lab_test(name))).await.unwrap();
    }
    store
}

#[tokio::test]
async fn test_round_trip_with_awkward_text() {
    let dir = TempDir::new().unwrap();
    let awkward = LabTest::new(
        "Panel, \"extended\"\nsecond line",
        12.5,
        vec![
            Parameter::new("LDL, calc", "mg/\"dL\"", "<100\n(fasting)"),
            Parameter::new("HDL", "", ""),
        ],
    );

    for backend in backends(&dir) {
        let store = RecordStore::open(backend.clone()).await.unwrap();
        store.add(&payload(&awkward)).await.unwrap();

        // Reopen to force a read from the medium
        let reopened = RecordStore::open(backend).await.unwrap();
        let listing = reopened.list().await.unwrap();
        assert_eq!(listing.tests, vec![awkward.clone()]);
        assert_eq!(listing.skipped, 0);
    }
}

#[tokio::test]
async fn test_list_twice_is_identical() {
    let dir = TempDir::new().unwrap();
    for backend in backends(&dir) {
        let store = seeded(backend, &["A", "B", "C"]).await;
        assert_eq!(store.list().await.unwrap(), store.list().await.unwrap());
    }
}

#[tokio::test]
async fn test_add_appends_to_prior_list() {
    let dir = TempDir::new().unwrap();
    for backend in backends(&dir) {
        let store = seeded(backend, &["A", "B"]).await;
        let before = store.list().await.unwrap().tests;

        let added = store.add(&payload(&lab_test("C"))).await.unwrap();

        let mut expected = before;
        expected.push(added);
        assert_eq!(store.list().await.unwrap().tests, expected);
    }
}

#[tokio::test]
async fn test_delete_out_of_bounds_leaves_store_unchanged() {
    let dir = TempDir::new().unwrap();
    for backend in backends(&dir) {
        let store = seeded(backend, &["A", "B"]).await;
        let before = store.list().await.unwrap().tests;

        for position in [-1, 2] {
            match store.delete(position).await {
                Err(StoreError::NotFound { position: p, len }) => {
                    assert_eq!(p, position);
                    assert_eq!(len, 2);
                }
                other => panic!("expected NotFound, got {:?}", other),
            }
        }
        assert_eq!(store.list().await.unwrap().tests, before);
    }
}

#[tokio::test]
async fn test_delete_removes_exactly_one_preserving_order() {
    let dir = TempDir::new().unwrap();
    for backend in backends(&dir) {
        let store = seeded(backend, &["A", "B", "C", "D"]).await;

        let removed = store.delete(1).await.unwrap();
        assert_eq!(removed.name, "B");

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .tests
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["A", "C", "D"]);
    }
}

#[tokio::test]
async fn test_update_differs_only_at_position() {
    let dir = TempDir::new().unwrap();
    for backend in backends(&dir) {
        let store = seeded(backend, &["A", "B", "C"]).await;
        let before = store.list().await.unwrap().tests;

        let replacement = LabTest::new("Lipid", 80.0, vec![Parameter::new("LDL", "mg/dL", "<100")]);
        store.update(2, &payload(&replacement)).await.unwrap();

        let after = store.list().await.unwrap().tests;
        assert_eq!(after.len(), before.len());
        assert_eq!(after[..2], before[..2]);
        assert_eq!(after[2], replacement);
    }
}

#[tokio::test]
async fn test_update_rejects_invalid_payload_without_writing() {
    let dir = TempDir::new().unwrap();
    for backend in backends(&dir) {
        let store = seeded(backend, &["A"]).await;
        let before = store.list().await.unwrap().tests;

        let mut bad = payload(&lab_test("A"));
        bad.price = Some(serde_json::json!(-5));
        match store.update(0, &bad).await {
            Err(StoreError::InvalidInput { field, .. }) => assert_eq!(field, "price"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
        assert_eq!(store.list().await.unwrap().tests, before);
    }
}

#[tokio::test]
async fn test_kv_import_of_csv_contents() {
    let dir = TempDir::new().unwrap();
    let mut media = backends(&dir).into_iter();
    let csv = seeded(media.next().unwrap(), &["A", "B"]).await;
    let kv = RecordStore::open(media.next().unwrap()).await.unwrap();

    for test in csv.list().await.unwrap().tests {
        kv.add(&payload(&test)).await.unwrap();
    }
    assert_eq!(kv.list().await.unwrap(), csv.list().await.unwrap());
    assert_eq!(kv.export().await.unwrap(), csv.export().await.unwrap());
}
