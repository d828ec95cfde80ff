use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, Transaction};

use super::SqliteRepository;
use crate::path::StorePath;
use crate::repository::{ActivityStore, PathUpdate, StorageError, check_disjoint};
use crate::subscription::{SnapshotCallback, Subscription, deliver};
use crate::tree;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Key prefix shared by every descendant of `path`.
fn descendant_prefix(path: &StorePath) -> String {
    if path.is_root() {
        String::new()
    } else {
        format!("{path}/")
    }
}

async fn read_subtree(
    conn_ref: &mut SqliteConnection,
    path: &StorePath,
) -> Result<Option<Value>, StorageError> {
    let rows: Vec<SqliteRow> = sqlx::query(
        r"
        SELECT path, value FROM nodes
        WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2
        ",
    )
    .bind(path.to_string())
    .bind(descendant_prefix(path))
    .fetch_all(&mut *conn_ref)
    .await
    .map_err(conn)?;

    let mut snapshot = Value::Null;
    for row in rows {
        let raw_path: String = row.try_get("path").map_err(ser)?;
        let raw_value: String = row.try_get("value").map_err(ser)?;
        let leaf = StorePath::parse(&raw_path)?;
        let value: Value = serde_json::from_str(&raw_value).map_err(ser)?;
        if let Some(relative) = path.relative(&leaf) {
            tree::set_at(&mut snapshot, relative, value);
        }
    }
    Ok(match snapshot {
        Value::Null => None,
        value => Some(value),
    })
}

async fn write_node(
    tx: &mut Transaction<'_, Sqlite>,
    path: &StorePath,
    value: Value,
) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM nodes WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2")
        .bind(path.to_string())
        .bind(descendant_prefix(path))
        .execute(&mut **tx)
        .await
        .map_err(conn)?;

    // A leaf stored at an ancestor would shadow the new subtree.
    for ancestor in path.ancestors() {
        sqlx::query("DELETE FROM nodes WHERE path = ?1")
            .bind(ancestor.to_string())
            .execute(&mut **tx)
            .await
            .map_err(conn)?;
    }

    for (leaf, scalar) in tree::flatten(path, &tree::normalize(value)) {
        let encoded = serde_json::to_string(&scalar).map_err(ser)?;
        sqlx::query(
            r"
            INSERT INTO nodes (path, value) VALUES (?1, ?2)
            ON CONFLICT(path) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(leaf.to_string())
        .bind(encoded)
        .execute(&mut **tx)
        .await
        .map_err(conn)?;
    }
    Ok(())
}

impl SqliteRepository {
    async fn write(&self, updates: PathUpdate) -> Result<(), StorageError> {
        let written: Vec<StorePath> = updates.keys().cloned().collect();
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for (path, value) in updates {
            write_node(&mut tx, &path, value).await?;
        }
        tx.commit().await.map_err(conn)?;
        tracing::debug!(paths = written.len(), "sqlite write committed");

        self.notify(&written).await;
        Ok(())
    }

    /// Pushes fresh snapshots to every listener touched by `written`. The
    /// write is already committed, so a failed read only skips that listener.
    async fn notify(&self, written: &[StorePath]) {
        let affected = match self.subscribers.affected(written) {
            Ok(affected) => affected,
            Err(err) => {
                tracing::warn!(error = %err, "subscriber lookup failed, skipping notifications");
                return;
            }
        };
        let mut deliveries = Vec::with_capacity(affected.len());
        for (path, callback) in affected {
            let snapshot = match self.pool.acquire().await {
                Ok(mut conn_ref) => read_subtree(&mut conn_ref, &path).await,
                Err(err) => Err(conn(err)),
            };
            match snapshot {
                Ok(snapshot) => deliveries.push((callback, snapshot)),
                Err(err) => {
                    tracing::warn!(%path, error = %err, "snapshot read failed, subscriber not notified");
                }
            }
        }
        deliver(deliveries);
    }
}

#[async_trait::async_trait]
impl ActivityStore for SqliteRepository {
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StorageError> {
        let mut conn_ref = self.pool.acquire().await.map_err(conn)?;
        read_subtree(&mut conn_ref, path).await
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StorageError> {
        self.write(PathUpdate::from([(path.clone(), value)])).await
    }

    async fn update(&self, updates: PathUpdate) -> Result<(), StorageError> {
        check_disjoint(&updates)?;
        self.write(updates).await
    }

    async fn subscribe(
        &self,
        path: &StorePath,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StorageError> {
        let subscription = self
            .subscribers
            .register(path.clone(), std::sync::Arc::clone(&callback))?;
        let initial = self.get(path).await?;
        deliver(vec![(callback, initial)]);
        Ok(subscription)
    }
}
