pub mod collection;
pub mod query;

pub use collection::{LiveCollection, DEFAULT_PAGE_SIZE};
pub use query::{LiveQuery, SnapshotFn};
