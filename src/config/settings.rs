//! Persisted named settings
//!
//! Settings are plain strings identified by name, stored with an expiry
//! window that is refreshed on every write. They back the fields on the
//! settings page (theme, font size).
//!
//! # Main Types
//!
//! - [`SettingStore`] - get/set contract for named string values
//! - [`FileSettingStore`] - JSON file in the app data directory
//! - [`MemorySettingStore`] - in-memory store for tests and ephemeral sessions
//! - [`Setting`] - a field bound to a store with a change callback
//!
//! # Lifecycle
//!
//! [`use_setting`] initialises a field: a non-empty persisted value replaces
//! the field's current value, the result is written back (refreshing its
//! expiry) and the change callback runs once so dependent UI starts out
//! consistent. Every later [`Setting::change`] persists and calls back again.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Days a setting stays fresh after it was last written
pub const SETTING_TTL_DAYS: i64 = 30;

/// Setting name for the UI theme (`dark` / `light`)
pub const THEME_SETTING: &str = "theme";

/// Setting name for the editor font size in points
pub const FONT_SIZE_SETTING: &str = "font_size";

/// Contract for a store of named string settings
pub trait SettingStore: Send + Sync {
    /// Get a setting, `None` if it was never stored or has expired
    fn get(&self, name: &str) -> Option<String>;

    /// Store a setting that expires `ttl_days` from now
    fn set(&self, name: &str, value: &str, ttl_days: i64);
}

/// A stored value and its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSetting {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredSetting {
    fn new(value: &str, ttl_days: i64) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Utc::now() + ChronoDuration::days(ttl_days),
        }
    }

    /// Check whether this entry has passed its expiry
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// ==================== File Store ====================

/// Setting store persisted as a JSON map
pub struct FileSettingStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, StoredSetting>>,
}

impl FileSettingStore {
    /// Open a store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::read_entries(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to read settings from {:?}: {}", path, e);
            BTreeMap::new()
        });

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Open the store in the default app data location
    pub fn open_default() -> crate::error::Result<Self> {
        let dir = super::ensure_app_data_dir()?;
        Ok(Self::open(dir.join(super::SETTINGS_FILE)))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> crate::error::Result<BTreeMap<String, StoredSetting>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, StoredSetting>) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingStore for FileSettingStore {
    fn get(&self, name: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(name)
            .filter(|s| !s.is_expired(Utc::now()))
            .map(|s| s.value.clone())
    }

    fn set(&self, name: &str, value: &str, ttl_days: i64) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(name.to_string(), StoredSetting::new(value, ttl_days));

        let now = Utc::now();
        entries.retain(|_, s| !s.is_expired(now));

        if let Err(e) = self.write_entries(&entries) {
            tracing::warn!("Failed to persist setting '{}': {}", name, e);
        }
    }
}

// ==================== Memory Store ====================

/// Setting store that lives only as long as the process
#[derive(Default)]
pub struct MemorySettingStore {
    entries: Mutex<HashMap<String, StoredSetting>>,
}

impl MemorySettingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw entry including its expiry, for inspection
    pub fn entry(&self, name: &str) -> Option<StoredSetting> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(name).cloned()
    }
}

impl SettingStore for MemorySettingStore {
    fn get(&self, name: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(name)
            .filter(|s| !s.is_expired(Utc::now()))
            .map(|s| s.value.clone())
    }

    fn set(&self, name: &str, value: &str, ttl_days: i64) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(name.to_string(), StoredSetting::new(value, ttl_days));
    }
}

// ==================== Bound Setting ====================

/// Callback invoked with the new value whenever a setting changes
pub type OnChange = Box<dyn FnMut(&str) + Send>;

/// A UI field bound to a setting store
pub struct Setting {
    name: String,
    value: String,
    store: Arc<dyn SettingStore>,
    on_change: OnChange,
}

impl Setting {
    /// Setting name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current field value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Apply a new field value: persist it and notify
    pub fn change(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.store.set(&self.name, &self.value, SETTING_TTL_DAYS);
        (self.on_change)(&self.value);
    }
}

impl std::fmt::Debug for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Setting")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

/// Bind a field to a persisted setting
///
/// `field_value` is the value the field holds before any persisted value is
/// applied. `on_change` runs synchronously before this returns.
pub fn use_setting(
    store: Arc<dyn SettingStore>,
    name: impl Into<String>,
    field_value: impl Into<String>,
    on_change: impl FnMut(&str) + Send + 'static,
) -> Setting {
    let name = name.into();
    let mut value = field_value.into();

    if let Some(stored) = store.get(&name).filter(|v| !v.is_empty()) {
        value = stored;
    }

    let mut setting = Setting {
        name,
        value: String::new(),
        store,
        on_change: Box::new(on_change),
    };
    setting.change(value);
    setting
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl FnMut(&str) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v: &str| sink.lock().unwrap().push(v.to_string()))
    }

    #[test]
    fn test_use_setting_without_stored_value() {
        let store = Arc::new(MemorySettingStore::new());
        let (seen, cb) = recorder();

        let setting = use_setting(store.clone(), THEME_SETTING, "dark", cb);

        assert_eq!(setting.value(), "dark");
        assert_eq!(store.get(THEME_SETTING).as_deref(), Some("dark"));
        assert_eq!(*seen.lock().unwrap(), vec!["dark".to_string()]);
    }

    #[test]
    fn test_use_setting_prefers_stored_value() {
        let store = Arc::new(MemorySettingStore::new());
        store.set(THEME_SETTING, "light", SETTING_TTL_DAYS);
        let (seen, cb) = recorder();

        let setting = use_setting(store.clone(), THEME_SETTING, "dark", cb);

        assert_eq!(setting.value(), "light");
        assert_eq!(*seen.lock().unwrap(), vec!["light".to_string()]);
    }

    #[test]
    fn test_empty_stored_value_is_ignored() {
        let store = Arc::new(MemorySettingStore::new());
        store.set(FONT_SIZE_SETTING, "", SETTING_TTL_DAYS);
        let (_seen, cb) = recorder();

        let setting = use_setting(store, FONT_SIZE_SETTING, "14", cb);
        assert_eq!(setting.value(), "14");
    }

    #[test]
    fn test_change_persists_and_notifies() {
        let store = Arc::new(MemorySettingStore::new());
        let (seen, cb) = recorder();
        let mut setting = use_setting(store.clone(), FONT_SIZE_SETTING, "14", cb);

        setting.change("18");

        assert_eq!(store.get(FONT_SIZE_SETTING).as_deref(), Some("18"));
        assert_eq!(seen.lock().unwrap().len(), 2);

        let entry = store.entry(FONT_SIZE_SETTING).unwrap();
        let days_left = (entry.expires_at - Utc::now()).num_days();
        assert!((29..=30).contains(&days_left));
    }

    #[test]
    fn test_expired_setting_reads_as_absent() {
        let store = MemorySettingStore::new();
        store.set(THEME_SETTING, "light", -1);
        assert!(store.get(THEME_SETTING).is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileSettingStore::open(&path);
        store.set(THEME_SETTING, "light", SETTING_TTL_DAYS);
        drop(store);

        let reopened = FileSettingStore::open(&path);
        assert_eq!(reopened.get(THEME_SETTING).as_deref(), Some("light"));
    }

    #[test]
    fn test_file_store_prunes_expired_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileSettingStore::open(&path);
        store.set("stale", "x", -1);
        store.set(THEME_SETTING, "dark", SETTING_TTL_DAYS);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.contains(THEME_SETTING));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileSettingStore::open(&path);
        assert!(store.get(THEME_SETTING).is_none());
    }
}
