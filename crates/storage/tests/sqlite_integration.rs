use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use storage::repository::{ActivityStore, PathUpdate, StorageError};
use storage::sqlite::SqliteRepository;
use storage::{Storage, StorePath};
use tracker_core::model::{DayRecord, TaskKey, UserId};
use tracker_core::{CalendarDate, compute_day_progress};

fn path(raw: &str) -> StorePath {
    StorePath::parse(raw).unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_rebuilds_subtrees_from_leaves() {
    let repo = connect("memdb_subtrees").await;
    let user = UserId::new("u1").unwrap();
    let date = CalendarDate::new(2024, 2, 15).unwrap();

    repo.set(
        &StorePath::day(&user, date),
        json!({
            "morning": true,
            "evening": false,
            "customCategories": { "c1": { "name": "Gym", "tasks": { "t1": { "name": "Squats" } } } },
            "custom_c1_t1": true
        }),
    )
    .await
    .unwrap();

    let snapshot = repo.get(&StorePath::day(&user, date)).await.unwrap();
    let progress = compute_day_progress(&DayRecord::from_snapshot(snapshot.as_ref()));
    assert_eq!(progress.total_tasks, 3);
    assert_eq!(progress.completed_tasks, 2);

    let month = repo.get(&StorePath::month(&user, 2024, 2)).await.unwrap().unwrap();
    assert_eq!(month["day15"]["customCategories"]["c1"]["tasks"]["t1"]["name"], "Squats");
    assert_eq!(repo.get(&StorePath::month(&user, 2024, 3)).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_null_writes_delete_and_scalars_are_replaced() {
    let repo = connect("memdb_deletes").await;
    repo.set(&path("a/b"), json!(5)).await.unwrap();
    repo.set(&path("a/b/c"), json!(true)).await.unwrap();
    assert_eq!(repo.get(&path("a")).await.unwrap(), Some(json!({ "b": { "c": true } })));

    repo.set(&path("a/b/c"), Value::Null).await.unwrap();
    assert_eq!(repo.get(&path("a")).await.unwrap(), None);

    repo.set(&path("x"), json!({ "y": { "z": null }, "keep": 1 })).await.unwrap();
    assert_eq!(repo.get(&path("x")).await.unwrap(), Some(json!({ "keep": 1 })));
    repo.remove(&path("x")).await.unwrap();
    assert_eq!(repo.get(&StorePath::root()).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_keeps_one_row_per_leaf() {
    let repo = connect("memdb_leaf_rows").await;
    repo.set(&path("a"), json!("scalar")).await.unwrap();
    repo.set(&path("a/b"), json!({ "c": 1, "d": [true, false] })).await.unwrap();

    let rows: Vec<(String, String)> = sqlx::query_as("SELECT path, value FROM nodes ORDER BY path")
        .fetch_all(repo.pool())
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            ("a/b/c".to_owned(), "1".to_owned()),
            ("a/b/d/0".to_owned(), "true".to_owned()),
            ("a/b/d/1".to_owned(), "false".to_owned()),
        ]
    );
}

#[tokio::test]
async fn sqlite_update_is_atomic_and_rejects_overlaps() {
    let repo = connect("memdb_update").await;
    let user = UserId::new("u1").unwrap();
    let date = CalendarDate::new(2024, 0, 1).unwrap();
    let key = TaskKey::new("morning").unwrap();

    let updates = PathUpdate::from([
        (StorePath::day_flag(&user, date, &key), json!(true)),
        (StorePath::profile_field(&user, "username"), json!("sam")),
    ]);
    repo.update(updates).await.unwrap();
    assert_eq!(
        repo.get(&StorePath::user(&user)).await.unwrap(),
        Some(json!({ "username": "sam", "tracker": { "2024": { "0": { "day1": { "morning": true } } } } }))
    );

    let overlapping = PathUpdate::from([
        (StorePath::tracker(&user), Value::Null),
        (StorePath::day_flag(&user, date, &key), json!(false)),
    ]);
    assert!(matches!(repo.update(overlapping).await, Err(StorageError::Conflict(_))));
    assert!(repo.get(&StorePath::tracker(&user)).await.unwrap().is_some());
}

#[tokio::test]
async fn sqlite_subscriptions_receive_full_snapshots() {
    let storage = Storage::sqlite("sqlite:file:memdb_subscribe?mode=memory&cache=shared")
        .await
        .expect("storage");
    let store = Arc::clone(&storage.activity);

    let seen: Arc<Mutex<Vec<Option<Value>>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let subscription = store
        .subscribe(&path("users/u1/tracker/2024/1"), Arc::new(move |snapshot| {
            sink.lock().unwrap().push(snapshot);
        }))
        .await
        .unwrap();

    store.set(&path("users/u1/tracker/2024/1/day2/a"), json!(true)).await.unwrap();
    store.set(&path("users/u2/tracker/2024/1/day2/a"), json!(true)).await.unwrap();
    store.remove(&path("users/u1")).await.unwrap();
    drop(subscription);
    store.set(&path("users/u1/tracker/2024/1/day3/a"), json!(true)).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![None, Some(json!({ "day2": { "a": true } })), None]
    );
}

#[tokio::test]
async fn committed_write_succeeds_when_a_listener_snapshot_is_unreadable() {
    let repo = connect("memdb_unreadable_listener").await;
    let month: Arc<Mutex<Vec<Option<Value>>>> = Arc::default();
    let day: Arc<Mutex<Vec<Option<Value>>>> = Arc::default();

    let month_sink = Arc::clone(&month);
    let _month_sub = repo
        .subscribe(&path("users/u1/tracker/2024/0"), Arc::new(move |snapshot| {
            month_sink.lock().unwrap().push(snapshot);
        }))
        .await
        .unwrap();
    let day_sink = Arc::clone(&day);
    let _day_sub = repo
        .subscribe(&path("users/u1/tracker/2024/0/day2"), Arc::new(move |snapshot| {
            day_sink.lock().unwrap().push(snapshot);
        }))
        .await
        .unwrap();

    sqlx::query("INSERT INTO nodes (path, value) VALUES (?1, ?2)")
        .bind("users/u1/tracker/2024/0/day1/x")
        .bind("{not json")
        .execute(repo.pool())
        .await
        .unwrap();

    repo.set(&path("users/u1/tracker/2024/0/day2/a"), json!(true))
        .await
        .unwrap();

    let stored: Option<(String,)> = sqlx::query_as("SELECT value FROM nodes WHERE path = ?1")
        .bind("users/u1/tracker/2024/0/day2/a")
        .fetch_optional(repo.pool())
        .await
        .unwrap();
    assert_eq!(stored, Some(("true".to_owned(),)));

    assert_eq!(*month.lock().unwrap(), vec![None]);
    assert_eq!(*day.lock().unwrap(), vec![None, Some(json!({ "a": true }))]);
}

#[tokio::test]
async fn sqlite_and_memory_return_the_same_shape_for_arrays() {
    let repo = connect("memdb_array_shape").await;
    let memory = storage::InMemoryStore::new();
    let value = json!([{ "day1": { "a": true } }, null, { "day3": { "b": false } }]);

    repo.set(&path("users/u1/tracker/2024"), value.clone()).await.unwrap();
    memory.set(&path("users/u1/tracker/2024"), value).await.unwrap();

    let from_sqlite = repo.get(&path("users/u1/tracker/2024")).await.unwrap();
    assert_eq!(from_sqlite, memory.get(&path("users/u1/tracker/2024")).await.unwrap());
    assert_eq!(
        from_sqlite,
        Some(json!({ "0": { "day1": { "a": true } }, "2": { "day3": { "b": false } } }))
    );
}
