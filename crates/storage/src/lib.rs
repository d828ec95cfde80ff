#![forbid(unsafe_code)]

pub mod path;
pub mod repository;
pub mod sqlite;
pub mod subscription;
pub mod tree;

pub use path::StorePath;
pub use repository::{ActivityStore, InMemoryStore, PathUpdate, Storage, StorageError};
pub use subscription::{SnapshotCallback, Subscription};
