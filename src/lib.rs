// todostore - To-do list store with pluggable local key/value storage

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod snapshot;
pub mod sqlite;
pub mod storage;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use error::ValidationError;
pub use filter::TaskFilter;
pub use models::{Task, now_iso, now_ms};
pub use sqlite::SqliteStorage;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::TodoStore;
