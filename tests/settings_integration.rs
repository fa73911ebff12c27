//! Integration tests for persisted settings and the application config

mod common;

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use streamlab_rs::config::settings::StoredSetting;
use streamlab_rs::config::{
    use_setting, AppConfig, FileSettingStore, NormaliseBinding, SettingStore, SETTING_TTL_DAYS,
};
use tempfile::TempDir;

#[test]
fn test_setting_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    {
        let store: Arc<dyn SettingStore> = Arc::new(FileSettingStore::open(&path));
        let mut theme = use_setting(store, "theme", "dark", |_| {});
        theme.change("light");
    }

    let store: Arc<dyn SettingStore> = Arc::new(FileSettingStore::open(&path));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = seen.clone();
    let theme = use_setting(store, "theme", "dark", move |v| {
        seen_cb.lock().unwrap().push(v.to_string());
    });

    assert_eq!(theme.value(), "light");
    assert_eq!(*seen.lock().unwrap(), vec!["light".to_string()]);
}

#[test]
fn test_expired_setting_reads_as_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    let mut entries = std::collections::BTreeMap::new();
    entries.insert(
        "theme".to_string(),
        StoredSetting {
            value: "light".to_string(),
            expires_at: Utc::now() - Duration::days(1),
        },
    );
    std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

    let store: Arc<dyn SettingStore> = Arc::new(FileSettingStore::open(&path));
    assert_eq!(store.get("theme"), None);

    let theme = use_setting(store, "theme", "dark", |_| {});
    assert_eq!(theme.value(), "dark");
}

#[test]
fn test_each_change_refreshes_expiry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let store = FileSettingStore::open(&path);

    store.set("font_size", "large", SETTING_TTL_DAYS);

    let raw = std::fs::read_to_string(&path).unwrap();
    let entries: std::collections::BTreeMap<String, StoredSetting> =
        serde_json::from_str(&raw).unwrap();
    let expires = entries["font_size"].expires_at;
    let remaining = expires - Utc::now();
    assert!(remaining > Duration::days(SETTING_TTL_DAYS - 1));
    assert!(remaining <= Duration::days(SETTING_TTL_DAYS));
}

#[test]
fn test_app_config_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("streamlab.toml");

    let mut config = AppConfig::default();
    config.service.origin = "https://lab.example.com".to_string();
    config.service.normalise = NormaliseBinding::Remote;
    config.engine.execute_timeout_secs = 5;
    config.save(&path).unwrap();

    let loaded = AppConfig::load(&path).unwrap();
    assert_eq!(loaded.service.origin, "https://lab.example.com");
    assert_eq!(loaded.service.normalise, NormaliseBinding::Remote);
    assert_eq!(loaded.engine.execute_timeout_secs, 5);
    assert_eq!(
        loaded.service_origin().unwrap().as_str(),
        "https://lab.example.com/"
    );
}
