//! Persistence primitives: index snapshots, append-only blob log and page stores.

mod blob_log;
mod page_store;
mod snapshot;

pub use blob_log::{BlobLog, BlobPointer};
pub use page_store::{LogPageStore, MemoryPageStore, PageStore};
pub use snapshot::{IndexSnapshot, SnapshotPostings, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
