// Task store: the ordered task list, the current filter, and persistence

use crate::error::validate_text;
use crate::filter::TaskFilter;
use crate::models::Task;
use crate::snapshot::{self, DEFAULT_KEY};
use crate::storage::{Storage, validate_key};
use eyre::{Result, eyre};
use tracing::{debug, info};

/// Texts of the tasks a fresh store starts with, ids 1..=3
pub const SAMPLE_TASKS: [&str; 3] = [
    "Welcome to your ToDo app!",
    "Click the checkbox to mark tasks complete",
    "Double-click to edit a task",
];

/// In-memory task list kept in step with a storage snapshot
///
/// Every mutating operation writes the complete task sequence back to
/// storage before returning. New state is only committed in memory once
/// that write succeeds, so a storage failure leaves the store as it was.
pub struct TodoStore<S: Storage> {
    storage: S,
    key: String,
    tasks: Vec<Task>,
    filter: TaskFilter,
    /// `None` once the largest id is `i64::MAX`
    next_id: Option<i64>,
}

impl<S: Storage> TodoStore<S> {
    /// Open a store over `storage` using the default `tasks` key
    pub fn open(storage: S) -> Result<Self> {
        Self::open_with_key(storage, DEFAULT_KEY)
    }

    /// Open a store keeping its snapshot under `key`
    ///
    /// An empty snapshot (first run, cleared or corrupt storage) is replaced
    /// by the sample tasks, which are persisted straight away. A snapshot
    /// that needed repair on load is written back in its repaired form.
    pub fn open_with_key(storage: S, key: &str) -> Result<Self> {
        validate_key(key)?;

        let loaded = snapshot::load_snapshot(&storage, key)?;
        let mut store = Self {
            storage,
            key: key.to_string(),
            tasks: Vec::new(),
            filter: TaskFilter::default(),
            next_id: None,
        };

        if loaded.tasks.is_empty() {
            info!(key, "No stored tasks, seeding samples");
            store.commit(sample_tasks())?;
        } else if loaded.repaired {
            info!(key, count = loaded.tasks.len(), "Writing back repaired tasks");
            store.commit(loaded.tasks)?;
        } else {
            store.tasks = loaded.tasks;
        }

        store.next_id = next_id_after(&store.tasks);
        Ok(store)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a task at the front of the list and return its id
    pub fn add(&mut self, text: &str) -> Result<i64> {
        let text = validate_text(text)?;

        let id = self.next_id.ok_or_else(|| eyre!("Task id space exhausted"))?;
        let mut tasks = Vec::with_capacity(self.tasks.len() + 1);
        tasks.push(Task::new(id, text));
        tasks.extend(self.tasks.iter().cloned());

        self.commit(tasks)?;
        self.next_id = id.checked_add(1);
        debug!(id, "Added task");
        Ok(id)
    }

    /// Flip the completion state of task `id`
    ///
    /// Returns `false` without touching storage when no such task exists.
    pub fn toggle(&mut self, id: i64) -> Result<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let mut tasks = self.tasks.clone();
        tasks[index].completed = !tasks[index].completed;

        self.commit(tasks)?;
        debug!(id, "Toggled task");
        Ok(true)
    }

    /// Remove task `id`; `false` when it was already gone
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let mut tasks = self.tasks.clone();
        tasks.remove(index);

        self.commit(tasks)?;
        debug!(id, "Deleted task");
        Ok(true)
    }

    /// Replace the text of task `id`
    ///
    /// Blank text is rejected with a `ValidationError` whether or not the
    /// task exists. Returns `false` when the id is unknown.
    pub fn edit(&mut self, id: i64, new_text: &str) -> Result<bool> {
        let text = validate_text(new_text)?;

        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let mut tasks = self.tasks.clone();
        tasks[index].text = text.to_string();

        self.commit(tasks)?;
        debug!(id, "Edited task");
        Ok(true)
    }

    /// Remove every completed task and return how many went
    pub fn clear_completed(&mut self) -> Result<usize> {
        let tasks: Vec<Task> = self.tasks.iter().filter(|t| !t.completed).cloned().collect();
        let removed = self.tasks.len() - tasks.len();

        if removed > 0 {
            self.commit(tasks)?;
            debug!(removed, "Cleared completed tasks");
        }

        Ok(removed)
    }

    /// Change the view filter; filters are never persisted
    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    /// Tasks passing the current filter, in store order
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.visible_tasks_for(self.filter)
    }

    /// Tasks passing `filter`, in store order
    pub fn visible_tasks_for(&self, filter: TaskFilter) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    /// Number of tasks not yet completed
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.active_count()
    }

    /// All tasks, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn position(&self, id: i64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Persist `tasks`, then make them the current state
    fn commit(&mut self, tasks: Vec<Task>) -> Result<()> {
        snapshot::save_tasks(&mut self.storage, &self.key, &tasks)?;
        self.tasks = tasks;
        Ok(())
    }
}

/// First id above every id in `tasks`, `None` when there is none
fn next_id_after(tasks: &[Task]) -> Option<i64> {
    match tasks.iter().map(|t| t.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

fn sample_tasks() -> Vec<Task> {
    SAMPLE_TASKS
        .iter()
        .zip(1..)
        .map(|(text, id)| Task::new(id, *text))
        .collect()
}
