use serde_json::Value;
use storage::{ActivityStore, StorePath};

/// Reads a snapshot for aggregation. A failed read is logged and treated as
/// an empty node so progress numbers stay well-formed.
pub(crate) async fn read_or_empty(store: &dyn ActivityStore, path: &StorePath) -> Option<Value> {
    match store.get(path).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::warn!(%path, error = %err, "snapshot read failed, using empty record");
            None
        }
    }
}
