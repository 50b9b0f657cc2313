use crate::model::HistoryEntry;
use crate::store::{LocalStore, TASK_HISTORY_KEY};
use anyhow::Result;

pub fn load_history(store: &LocalStore) -> Vec<HistoryEntry> {
    let Some(stored) = store.get_item(TASK_HISTORY_KEY) else {
        return Vec::new();
    };
    let entries: Vec<serde_json::Value> = match serde_json::from_str(stored) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("Failed to load history: {}", e);
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<HistoryEntry>(entry) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping malformed history entry: {}", e);
                None
            }
        })
        .collect()
}

pub fn save_history(store: &mut LocalStore, history: &[HistoryEntry]) -> Result<()> {
    let encoded = serde_json::to_string(history)?;
    store.set_item(TASK_HISTORY_KEY, encoded)
}

pub fn clear_history(store: &mut LocalStore) -> Result<()> {
    store.remove_item(TASK_HISTORY_KEY)
}

/// Prepend `entry` and keep only the newest `HISTORY_LIMIT` entries.
pub fn push_entry(history: &[HistoryEntry], entry: HistoryEntry) -> Vec<HistoryEntry> {
    std::iter::once(entry)
        .chain(history.iter().cloned())
        .take(crate::HISTORY_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str) -> HistoryEntry {
        HistoryEntry {
            date: date.to_string(),
            tasks: Vec::new(),
            emails_processed: 1,
            status: "success".to_string(),
        }
    }

    #[test]
    fn push_prepends_newest() {
        let history = vec![entry("old")];
        let updated = push_entry(&history, entry("new"));
        assert_eq!(updated[0].date, "new");
        assert_eq!(updated[1].date, "old");
    }

    #[test]
    fn push_caps_at_limit() {
        let history: Vec<_> = (0..crate::HISTORY_LIMIT).map(|i| entry(&i.to_string())).collect();
        let updated = push_entry(&history, entry("latest"));
        assert_eq!(updated.len(), crate::HISTORY_LIMIT);
        assert_eq!(updated[0].date, "latest");
        assert_eq!(updated.last().unwrap().date, (crate::HISTORY_LIMIT - 2).to_string());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("store.json"));
        save_history(&mut store, &[entry("a"), entry("b")]).unwrap();

        let loaded = load_history(&LocalStore::open(store.path()));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date, "a");
    }

    #[test]
    fn clear_removes_stored_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("store.json"));
        save_history(&mut store, &[entry("a")]).unwrap();
        clear_history(&mut store).unwrap();
        assert!(load_history(&store).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped_individually() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("store.json"));
        store
            .set_item(
                TASK_HISTORY_KEY,
                r#"[{"date":"a","tasks":[],"emailsProcessed":1,"status":"success"},
                    {"tasks":[],"status":"success"},
                    {"date":"c","status":null},
                    {"date":"d","emailsProcessed":4}]"#,
            )
            .unwrap();

        let loaded = load_history(&store);
        let dates: Vec<&str> = loaded.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, ["a", "d"]);
        assert_eq!(loaded[1].emails_processed, 4);
    }

    #[test]
    fn unparseable_history_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("store.json"));
        store.set_item(TASK_HISTORY_KEY, "{oops").unwrap();
        assert!(load_history(&store).is_empty());
    }
}
