// End-to-end store behavior across storage reopen

use tempfile::TempDir;
use todostore::snapshot::{self, DEFAULT_KEY};
use todostore::{FileStorage, SqliteStorage, Storage, TaskFilter, TodoStore};

fn visible_ids<S: Storage>(store: &TodoStore<S>) -> Vec<i64> {
    store.visible_tasks().map(|t| t.id).collect()
}

#[test]
fn test_scenario_survives_reopen() {
    let temp = TempDir::new().unwrap();

    {
        let mut store = TodoStore::open(FileStorage::open(temp.path()).unwrap()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(visible_ids(&store), vec![1, 2, 3]);
        assert_eq!(store.active_count(), 3);

        let id = store.add("Test").unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.tasks()[0].id, id);
        assert_eq!(store.tasks()[0].text, "Test");

        store.toggle(1).unwrap();
        assert_eq!(store.active_count(), 3);

        store.set_filter(TaskFilter::Completed);
        assert_eq!(visible_ids(&store), vec![1]);
    }

    let mut store = TodoStore::open(FileStorage::open(temp.path()).unwrap()).unwrap();
    // Filter is not persisted, completion is
    assert_eq!(store.filter(), TaskFilter::All);
    assert!(store.get(1).unwrap().completed);
    assert_eq!(visible_ids(&store), vec![4, 1, 2, 3]);

    assert_eq!(store.clear_completed().unwrap(), 1);
    assert_eq!(store.len(), 3);

    let store = TodoStore::open(FileStorage::open(temp.path()).unwrap()).unwrap();
    assert_eq!(visible_ids(&store), vec![4, 2, 3]);
    assert_eq!(store.active_count(), 3);
}

#[test]
fn test_round_trip_is_field_for_field() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("todo.db");

    let expected = {
        let mut store = TodoStore::open(SqliteStorage::open(&db_path).unwrap()).unwrap();
        store.add("Buy milk").unwrap();
        store.add("Walk dog").unwrap();
        store.toggle(2).unwrap();
        store.edit(1, "Welcome back").unwrap();
        store.tasks().to_vec()
    };

    let store = TodoStore::open(SqliteStorage::open(&db_path).unwrap()).unwrap();
    assert_eq!(store.tasks(), expected.as_slice());
}

#[test]
fn test_corrupt_file_reseeds() {
    let temp = TempDir::new().unwrap();
    let mut storage = FileStorage::open(temp.path()).unwrap();
    storage.set_item(DEFAULT_KEY, "not json at all").unwrap();

    let store = TodoStore::open(storage).unwrap();
    assert_eq!(visible_ids(&store), vec![1, 2, 3]);

    // The seeded tasks replaced the corrupt snapshot on disk
    let on_disk = snapshot::load_tasks(store.storage(), DEFAULT_KEY).unwrap();
    assert_eq!(on_disk, store.tasks());
}

#[test]
fn test_separate_keys_are_independent() {
    let temp = TempDir::new().unwrap();

    {
        let mut work = TodoStore::open_with_key(FileStorage::open(temp.path()).unwrap(), "work").unwrap();
        work.add("Ship release").unwrap();
        assert_eq!(work.len(), 4);
    }

    let home = TodoStore::open_with_key(FileStorage::open(temp.path()).unwrap(), "home").unwrap();
    assert_eq!(home.len(), 3);

    let work = TodoStore::open_with_key(FileStorage::open(temp.path()).unwrap(), "work").unwrap();
    assert_eq!(work.tasks()[0].text, "Ship release");
}
