use ldvault_backend::record::{CredentialKind, CredentialRecord, RecordStore};
use ldvault_backend::storage::{self, StorageError};
use ldvault_backend::{InMemoryStorage, Storage, StorageEntry};
use ldvault_client::Token;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: u32,
}

fn token(id: &str) -> Token {
    Token {
        id: id.into(),
        token: format!("api-{id}"),
        ..Token::default()
    }
}

#[tokio::test]
async fn json_round_trip() {
    let storage = InMemoryStorage::new();
    let sample = Sample {
        name: "a".into(),
        count: 3,
    };
    storage::put_json(&storage, "k", &sample).await.unwrap();

    let loaded: Option<Sample> = storage::get_json(&storage, "k").await.unwrap();
    assert_eq!(loaded, Some(sample));
    assert_eq!(storage.len().await, 1);
}

#[tokio::test]
async fn missing_key_reads_as_none() {
    let storage = InMemoryStorage::new();
    let loaded: Option<Sample> = storage::get_json(&storage, "absent").await.unwrap();
    assert!(loaded.is_none());
}

#[tokio::test]
async fn undecodable_entry_reports_key() {
    let storage = InMemoryStorage::new();
    storage
        .put(StorageEntry {
            key: "broken".into(),
            value: b"not json".to_vec(),
        })
        .await
        .unwrap();

    let err = storage::get_json::<Sample>(&storage, "broken")
        .await
        .unwrap_err();
    match err {
        StorageError::Decode { key, .. } => assert_eq!(key, "broken"),
        other => panic!("expected Decode, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_of_missing_key_succeeds() {
    let storage = InMemoryStorage::new();
    storage.delete("nothing").await.unwrap();
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn list_collapses_nested_keys() {
    let storage = InMemoryStorage::new();
    for key in ["relay/policy/a", "relay/policy/b", "relay/token/a", "role/x"] {
        storage::put_json(&storage, key, &1).await.unwrap();
    }

    assert_eq!(
        storage.list("relay/").await.unwrap(),
        vec!["policy/".to_string(), "token/".to_string()]
    );
    assert_eq!(
        storage.list("relay/policy/").await.unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
    assert!(storage.list("project/").await.unwrap().is_empty());
}

// --- RecordStore ---

#[tokio::test]
async fn records_are_keyed_by_kind_and_name() {
    let storage = InMemoryStorage::new();
    let store = RecordStore::new(&storage);

    let role = CredentialRecord::from_token(CredentialKind::Role, "eng", token("t1")).unwrap();
    let refs = CredentialRecord::from_token(CredentialKind::CodeRefs, "eng", token("t2")).unwrap();
    store.save(&role).await.unwrap();
    store.save(&refs).await.unwrap();

    assert!(storage.contains("role/eng").await);
    assert!(storage.contains("coderefs/eng").await);
    assert_eq!(
        store
            .load(CredentialKind::Role, "eng")
            .await
            .unwrap()
            .unwrap()
            .upstream_id,
        "t1"
    );
}

#[tokio::test]
async fn save_overwrites_previous_record() {
    let storage = InMemoryStorage::new();
    let store = RecordStore::new(&storage);

    let first = CredentialRecord::from_token(CredentialKind::CodeRefs, "repo", token("t1")).unwrap();
    store.save(&first).await.unwrap();
    let rotated = first.rotated(token("t1b")).unwrap();
    store.save(&rotated).await.unwrap();

    let loaded = store
        .load(CredentialKind::CodeRefs, "repo")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.token, "api-t1b");
    assert!(loaded.rotated_at.is_some());
    assert_eq!(storage.len().await, 1);
}

#[tokio::test]
async fn list_skips_nested_prefixes() {
    let storage = InMemoryStorage::new();
    let store = RecordStore::new(&storage);
    for name in ["b", "a"] {
        let record = CredentialRecord::from_token(CredentialKind::Role, name, token(name)).unwrap();
        store.save(&record).await.unwrap();
    }
    storage::put_json(&storage, "role/nested/key", &1).await.unwrap();

    assert_eq!(
        store.list(CredentialKind::Role).await.unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
}

#[tokio::test]
async fn remove_if_current_checks_upstream_id() {
    let storage = InMemoryStorage::new();
    let store = RecordStore::new(&storage);
    let record = CredentialRecord::from_token(CredentialKind::Role, "eng", token("t1")).unwrap();
    store.save(&record).await.unwrap();

    assert!(!store.remove_if_current("role/eng", "other", 0).await.unwrap());
    assert!(storage.contains("role/eng").await);

    assert!(store.remove_if_current("role/eng", "t1", 0).await.unwrap());
    assert!(!storage.contains("role/eng").await);

    assert!(!store.remove_if_current("role/eng", "t1", 0).await.unwrap());
}

#[tokio::test]
async fn reset_records_supersede_older_generations() {
    let storage = InMemoryStorage::new();
    let store = RecordStore::new(&storage);
    let record = CredentialRecord::from_token(CredentialKind::Role, "eng", token("t1")).unwrap();
    assert_eq!(record.generation, 0);
    let rotated = record.rotated(token("t1")).unwrap();
    assert_eq!(rotated.generation, 1);
    store.save(&rotated).await.unwrap();

    assert!(store.is_superseded("role/eng", "t1", 0).await.unwrap());
    assert!(!store.is_superseded("role/eng", "t1", 1).await.unwrap());
    assert!(!store.is_superseded("role/eng", "t2", 0).await.unwrap());
    assert!(!store.is_superseded("role/absent", "t1", 0).await.unwrap());

    assert!(!store.remove_if_current("role/eng", "t1", 0).await.unwrap());
    assert!(store.remove_if_current("role/eng", "t1", 1).await.unwrap());
}

#[tokio::test]
async fn records_stored_without_generation_decode_as_first() {
    let storage = InMemoryStorage::new();
    storage::put_json(
        &storage,
        "role/eng",
        &serde_json::json!({
            "name": "eng",
            "kind": "role",
            "upstream_id": "t1",
            "token": "api-t1",
            "created_at": "2024-01-01T00:00:00Z"
        }),
    )
    .await
    .unwrap();

    let loaded = RecordStore::new(&storage)
        .load(CredentialKind::Role, "eng")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.generation, 0);
    assert!(loaded.rotated_at.is_none());
}

#[test]
fn relay_records_use_token_prefix() {
    assert_eq!(CredentialKind::Relay.storage_key("foo"), "relay/token/foo");
    assert_eq!(CredentialKind::Role.storage_key("eng"), "role/eng");
    assert_eq!(CredentialKind::CodeRefs.storage_key("repo"), "coderefs/repo");
}

#[test]
fn empty_token_is_rejected() {
    let result = CredentialRecord::from_token(CredentialKind::Role, "eng", Token::default());
    assert!(result.is_err());
}
