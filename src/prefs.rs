use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::FilterCriteria;

const WATCHLIST_KEY: &str = "watchlist";
const PRESETS_KEY: &str = "presets";

/// Single-profile key-value store backed by a JSON file. Device-local state:
/// deleting the file deletes the watchlist and saved presets with it.
pub struct PrefStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl PrefStore {
    /// A missing or unreadable file loads as an empty store rather than an
    /// error; preferences are best-effort state.
    pub fn load(path: &Path) -> PrefStore {
        let values = std::fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();

        PrefStore {
            path: path.to_path_buf(),
            values,
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> anyhow::Result<()> {
        let value = serde_json::to_value(value).context("failed to encode preference value")?;
        self.values.insert(key.to_string(), value);
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> anyhow::Result<bool> {
        let removed = self.values.remove(key).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(&Value::Object(self.values.clone()))
            .context("failed to encode preferences")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write preferences to {}", self.path.display()))
    }

    pub fn watchlist(&self) -> Vec<Uuid> {
        self.get::<Vec<Uuid>>(WATCHLIST_KEY).unwrap_or_default()
    }

    /// Returns the new membership state.
    pub fn toggle_watchlist(&mut self, id: Uuid) -> anyhow::Result<bool> {
        if self.watchlist().contains(&id) {
            self.remove_from_watchlist(id)?;
            Ok(false)
        } else {
            self.add_to_watchlist(id)?;
            Ok(true)
        }
    }

    /// Idempotent; returns whether the set grew.
    pub fn add_to_watchlist(&mut self, id: Uuid) -> anyhow::Result<bool> {
        let mut watchlist = self.watchlist();
        if watchlist.contains(&id) {
            return Ok(false);
        }
        watchlist.push(id);
        self.set(WATCHLIST_KEY, &watchlist)?;
        Ok(true)
    }

    /// Idempotent; returns whether the set shrank.
    pub fn remove_from_watchlist(&mut self, id: Uuid) -> anyhow::Result<bool> {
        let mut watchlist = self.watchlist();
        let before = watchlist.len();
        watchlist.retain(|entry| *entry != id);
        if watchlist.len() == before {
            return Ok(false);
        }
        self.set(WATCHLIST_KEY, &watchlist)?;
        Ok(true)
    }

    /// Overwrites any existing preset with the same name.
    pub fn save_preset(&mut self, name: &str, criteria: &FilterCriteria) -> anyhow::Result<()> {
        let mut presets = self
            .get::<Map<String, Value>>(PRESETS_KEY)
            .unwrap_or_default();
        let encoded =
            serde_json::to_value(criteria).context("failed to encode filter preset")?;
        presets.insert(name.to_string(), encoded);
        self.set(PRESETS_KEY, &presets)
    }

    pub fn preset(&self, name: &str) -> Option<FilterCriteria> {
        self.get::<Map<String, Value>>(PRESETS_KEY)
            .and_then(|presets| presets.get(name).cloned())
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn preset_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .get::<Map<String, Value>>(PRESETS_KEY)
            .map(|presets| presets.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FundingBucket, RiskLevel};

    fn temp_store(tag: &str) -> PrefStore {
        let path = std::env::temp_dir().join(format!("screener-prefs-{tag}-{}.json", Uuid::new_v4()));
        PrefStore::load(&path)
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = temp_store("missing");
        assert!(store.watchlist().is_empty());
        assert!(store.preset_names().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let path = std::env::temp_dir().join(format!("screener-prefs-corrupt-{}.json", Uuid::new_v4()));
        std::fs::write(&path, "{not json").expect("write corrupt file");
        let store = PrefStore::load(&path);
        assert!(store.watchlist().is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn get_set_remove_round_trip() {
        let mut store = temp_store("kv");
        store
            .set("grid_layout", &"list".to_string())
            .expect("set value");
        assert_eq!(store.get::<String>("grid_layout").as_deref(), Some("list"));

        assert!(store.remove("grid_layout").expect("remove value"));
        assert!(!store.remove("grid_layout").expect("remove again"));
        assert_eq!(store.get::<String>("grid_layout"), None);

        let _ = std::fs::remove_file(&store.path);
    }

    #[test]
    fn toggle_alternates_membership() {
        let mut store = temp_store("toggle");
        let id = Uuid::new_v4();

        assert!(store.toggle_watchlist(id).expect("toggle on"));
        assert_eq!(store.watchlist(), vec![id]);
        assert!(!store.toggle_watchlist(id).expect("toggle off"));
        assert!(store.watchlist().is_empty());

        let _ = std::fs::remove_file(&store.path);
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let mut store = temp_store("idempotent");
        let id = Uuid::new_v4();

        assert!(store.add_to_watchlist(id).expect("first add"));
        assert!(!store.add_to_watchlist(id).expect("second add"));
        assert_eq!(store.watchlist().len(), 1);

        assert!(store.remove_from_watchlist(id).expect("first remove"));
        assert!(!store.remove_from_watchlist(id).expect("second remove"));

        let _ = std::fs::remove_file(&store.path);
    }

    #[test]
    fn watchlist_survives_reload() {
        let mut store = temp_store("reload");
        let id = Uuid::new_v4();
        store.add_to_watchlist(id).expect("add");

        let reloaded = PrefStore::load(&store.path);
        assert_eq!(reloaded.watchlist(), vec![id]);

        let _ = std::fs::remove_file(&store.path);
    }

    #[test]
    fn same_named_preset_overwrites() {
        let mut store = temp_store("presets");
        let first = FilterCriteria {
            category: Some("technology".to_string()),
            risk_level: Some(RiskLevel::Low),
            ..FilterCriteria::default()
        };
        let second = FilterCriteria {
            funding_range: Some(FundingBucket::OverOneCrore),
            ..FilterCriteria::default()
        };

        store.save_preset("daily", &first).expect("save first");
        store.save_preset("daily", &second).expect("save second");

        assert_eq!(store.preset_names(), vec!["daily".to_string()]);
        let loaded = store.preset("daily").expect("preset exists");
        assert_eq!(loaded, second);

        let _ = std::fs::remove_file(&store.path);
    }
}
