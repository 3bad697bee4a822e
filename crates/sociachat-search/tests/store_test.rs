//! Integration tests for collections persisted on disk.

use serde_json::json;
use sociachat_core::model::{DistanceSpace, Metadata};
use sociachat_search::{retrieve, Client, RetrieveOptions, StoreError};
use tempfile::TempDir;

fn topic(n: usize) -> Vec<Metadata> {
    let mut m = Metadata::new();
    m.insert("keyword".to_string(), json!("politik"));
    vec![m; n]
}

/// Documents written by one client are visible to the next one.
#[test]
fn test_collection_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");

    {
        let client = Client::open(&path).unwrap();
        let collection = client
            .get_or_create_collection("politik2", DistanceSpace::L2)
            .unwrap();
        collection
            .add(
                &["sidang kabinet hari ini".to_string()],
                &topic(1),
                &["0".to_string()],
            )
            .unwrap();
    }

    let client = Client::open(&path).unwrap();
    let collection = client
        .get_or_create_collection("politik2", DistanceSpace::L2)
        .unwrap();
    assert_eq!(collection.count().unwrap(), 1);

    let summary = retrieve(&collection, "sidang kabinet", &RetrieveOptions::default()).unwrap();
    assert_eq!(summary, "- Informasi 1: sidang kabinet hari ini | ");
}

/// Querying a collection that was never created is a store error.
#[test]
fn test_missing_collection_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let client = Client::open(temp_dir.path().join("store.db")).unwrap();

    let err = client.get_collection("politik2").unwrap_err();
    assert!(matches!(err, StoreError::CollectionNotFound { .. }));
}

/// Two collections in one store do not see each other's documents.
#[test]
fn test_collections_are_isolated() {
    let client = Client::open_in_memory().unwrap();
    let politik = client.create_collection("politik", DistanceSpace::L2).unwrap();
    let ekonomi = client.create_collection("ekonomi", DistanceSpace::L2).unwrap();

    politik
        .add(&["rapat dpr".to_string()], &topic(1), &["0".to_string()])
        .unwrap();

    assert_eq!(politik.count().unwrap(), 1);
    assert_eq!(ekonomi.count().unwrap(), 0);
    assert!(ekonomi.query_one("rapat dpr", 10).unwrap().is_empty());
}
