// Task snapshot serialization

use crate::models::Task;
use crate::storage::Storage;
use eyre::{Context, Result};
use std::collections::HashSet;
use tracing::{info, warn};

/// Storage key the task snapshot is kept under
pub const DEFAULT_KEY: &str = "tasks";

/// Write the full task sequence under `key`
pub fn save_tasks<S: Storage + ?Sized>(storage: &mut S, key: &str, tasks: &[Task]) -> Result<()> {
    let json = serde_json::to_string(tasks).context("Failed to serialize tasks")?;
    storage
        .set_item(key, &json)
        .with_context(|| format!("Failed to persist tasks under key '{}'", key))
}

/// Tasks read back from storage
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    /// Loading dropped or rewrote something, so the stored value no longer
    /// matches `tasks`
    pub repaired: bool,
}

/// Read the task sequence stored under `key`
///
/// A missing or unparsable snapshot yields an empty sequence. Individual
/// entries that fail to parse, repeat an earlier id, or carry blank text are
/// skipped. Errors from the storage itself are returned.
pub fn load_tasks<S: Storage + ?Sized>(storage: &S, key: &str) -> Result<Vec<Task>> {
    Ok(load_snapshot(storage, key)?.tasks)
}

/// Like `load_tasks`, also reporting whether the stored value needed repair
pub fn load_snapshot<S: Storage + ?Sized>(storage: &S, key: &str) -> Result<Snapshot> {
    let Some(raw) = storage
        .get_item(key)
        .with_context(|| format!("Failed to read tasks under key '{}'", key))?
    else {
        // Nothing stored yet
        return Ok(Snapshot::default());
    };

    Ok(parse_tasks(key, &raw))
}

fn parse_tasks(key: &str, raw: &str) -> Snapshot {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(key, error = ?e, "Stored tasks are not a JSON array, starting empty");
            return Snapshot {
                tasks: Vec::new(),
                repaired: true,
            };
        }
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(entries.len());
    let mut repaired = false;

    for (index, entry) in entries.into_iter().enumerate() {
        let mut task: Task = match serde_json::from_value(entry) {
            Ok(t) => t,
            Err(e) => {
                warn!(key, index, error = ?e, "Failed to parse task, skipping");
                repaired = true;
                continue;
            }
        };

        let trimmed = task.text.trim();
        if trimmed.is_empty() {
            warn!(key, index, id = task.id, "Task has empty text, skipping");
            repaired = true;
            continue;
        }
        if trimmed.len() != task.text.len() {
            task.text = trimmed.to_string();
            repaired = true;
        }

        if !seen.insert(task.id) {
            warn!(key, index, id = task.id, "Duplicate task id, skipping");
            repaired = true;
            continue;
        }

        tasks.push(task);
    }

    info!(key, count = tasks.len(), repaired, "Loaded tasks from storage");
    Snapshot { tasks, repaired }
}
