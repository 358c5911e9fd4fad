use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::MirrorConfig;
use crate::MockRemoteStore;
use crate::StoreError;
use crate::SyncMap;
use crate::WriteConcern;

fn map_with(
    mock: MockRemoteStore,
    write_concern: WriteConcern,
) -> SyncMap {
    let config = MirrorConfig {
        map_name: "ns".to_string(),
        write_concern,
        ..MirrorConfig::default()
    };
    SyncMap::new(Arc::new(DashMap::new()), Arc::new(mock), config, None)
}

fn fire_and_forget_mock() -> MockRemoteStore {
    let mut mock = MockRemoteStore::new();
    mock.expect_put().returning(|_, _| Ok(()));
    mock.expect_delete().returning(|_| Ok(()));
    mock.expect_delete_by_prefix().returning(|_| Ok(()));
    mock
}

#[tokio::test]
async fn test_put_is_visible_before_remote_write_completes() {
    let mut mock = MockRemoteStore::new();
    // A slow remote store must not delay local visibility.
    mock.expect_put().returning(|_, _| {
        std::thread::sleep(Duration::from_millis(50));
        Ok(())
    });
    let map = map_with(mock, WriteConcern::LocalOnly);

    let previous = map.put("a", "1").await.expect("put should succeed");

    assert_eq!(previous, None);
    assert_eq!(map.get("a"), Some("1".to_string()));
}

#[tokio::test]
async fn test_put_returns_previous_value() {
    let map = map_with(fire_and_forget_mock(), WriteConcern::LocalOnly);

    map.put("a", "1").await.expect("put should succeed");
    let previous = map.put("a", "2").await.expect("put should succeed");

    assert_eq!(previous, Some("1".to_string()));
    assert_eq!(map.get("a"), Some("2".to_string()));
}

#[tokio::test]
async fn test_local_only_put_never_surfaces_remote_failure() {
    let mut mock = MockRemoteStore::new();
    mock.expect_put()
        .returning(|_, _| Err(StoreError::Unavailable("down".to_string())));
    let map = map_with(mock, WriteConcern::LocalOnly);

    let result = map.put("a", "1").await;

    assert!(result.is_ok());
    assert_eq!(map.get("a"), Some("1".to_string()));
}

#[tokio::test]
async fn test_local_then_confirm_surfaces_remote_failure_without_rollback() {
    let mut mock = MockRemoteStore::new();
    mock.expect_put().returning(|key, value| {
        assert_eq!(key, "ns/a");
        assert_eq!(value, "1");
        Err(StoreError::Unavailable("down".to_string()))
    });
    let map = map_with(mock, WriteConcern::LocalThenConfirm);

    let result = map.put("a", "1").await;

    assert!(result.is_err());
    // Last-writer-wins: the local mutation stays.
    assert_eq!(map.get("a"), Some("1".to_string()));
}

#[tokio::test]
async fn test_remove_returns_previous_and_deletes_locally() {
    let mut mock = MockRemoteStore::new();
    mock.expect_put().returning(|_, _| Ok(()));
    mock.expect_delete().returning(|key| {
        assert_eq!(key, "ns/a");
        Ok(())
    });
    let map = map_with(mock, WriteConcern::LocalThenConfirm);

    map.put("a", "1").await.expect("put should succeed");
    let previous = map.remove("a").await.expect("remove should succeed");

    assert_eq!(previous, Some("1".to_string()));
    assert_eq!(map.get("a"), None);
    assert!(!map.contains_key("a"));
}

#[tokio::test]
async fn test_put_all_applies_whole_batch_locally() {
    let map = map_with(fire_and_forget_mock(), WriteConcern::LocalOnly);

    map.put_all(vec![
        ("a".to_string(), "1".to_string()),
        ("b".to_string(), "2".to_string()),
        ("c".to_string(), "3".to_string()),
    ])
    .await
    .expect("put_all should succeed");

    assert_eq!(map.len(), 3);
    assert_eq!(map.get("b"), Some("2".to_string()));
}

#[tokio::test]
async fn test_clear_empties_mirror_before_remote_confirms() {
    let mut mock = MockRemoteStore::new();
    mock.expect_put().returning(|_, _| Ok(()));
    mock.expect_delete_by_prefix().returning(|_| {
        std::thread::sleep(Duration::from_millis(50));
        Ok(())
    });
    let map = map_with(mock, WriteConcern::LocalOnly);

    map.put("a", "1").await.expect("put should succeed");
    map.clear().await.expect("clear should succeed");

    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
}

#[tokio::test]
async fn test_views_reflect_local_mirror() {
    let map = map_with(fire_and_forget_mock(), WriteConcern::LocalOnly);

    map.put("a", "1").await.expect("put should succeed");
    map.put("b", "2").await.expect("put should succeed");

    let mut keys = map.keys();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

    let mut values = map.values();
    values.sort();
    assert_eq!(values, vec!["1".to_string(), "2".to_string()]);

    let mut entries = map.entries();
    entries.sort();
    assert_eq!(
        entries,
        vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]
    );

    assert!(map.contains_value("2"));
    assert!(!map.contains_value("3"));
}
