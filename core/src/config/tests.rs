use super::*;
use std::sync::{Mutex, OnceLock};

const CONFIG_KEYS: &[&str] = &[
    "VECNEST_SNAPSHOT_PATH",
    "VECNEST_FLUSH_POLICY",
    "VECNEST_FLUSH_EVERY_N_WRITES",
    "VECNEST_LOAD_STRATEGY",
    "VECNEST_SYNC_ON_SAVE",
    "VECNEST_LOAD_ON_OPEN",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            if let Some(value) = value {
                env::set_var(key, value);
            } else {
                env::remove_var(key);
            }
        }
    }
}

fn with_env<R>(pairs: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let _lock = env_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = EnvGuard::capture(CONFIG_KEYS);

    for key in CONFIG_KEYS {
        env::remove_var(key);
    }
    for (key, value) in pairs {
        env::set_var(key, value);
    }

    f()
}

#[test]
fn from_env_uses_expected_defaults() {
    let config = with_env(&[], || {
        StoreConfig::from_env().expect("default config must parse")
    });
    assert_eq!(config, StoreConfig::default());
    assert_eq!(config.snapshot_path(), None);
    assert_eq!(config.flush_policy, FlushPolicy::WriteThrough);
    assert_eq!(config.load_strategy, LoadStrategy::ReplaceByTable);
    assert!(!config.sync_on_save);
    assert!(!config.load_on_open);
}

#[test]
fn from_env_applies_overrides() {
    let config = with_env(
        &[
            ("VECNEST_SNAPSHOT_PATH", "/tmp/vecnest_custom.json"),
            ("VECNEST_FLUSH_POLICY", "every_n"),
            ("VECNEST_FLUSH_EVERY_N_WRITES", "7"),
            ("VECNEST_LOAD_STRATEGY", "FULL_REPLACE"),
            ("VECNEST_SYNC_ON_SAVE", "yes"),
            ("VECNEST_LOAD_ON_OPEN", "1"),
        ],
        || StoreConfig::from_env().expect("override config must parse"),
    );
    assert_eq!(
        config.snapshot_path(),
        Some(Path::new("/tmp/vecnest_custom.json"))
    );
    assert_eq!(config.flush_policy, FlushPolicy::EveryNWrites(7));
    assert_eq!(config.load_strategy, LoadStrategy::FullReplace);
    assert!(config.sync_on_save);
    assert!(config.load_on_open);
}

#[test]
fn from_env_parses_manual_policy() {
    let config = with_env(&[("VECNEST_FLUSH_POLICY", "manual")], || {
        StoreConfig::from_env().expect("manual policy must parse")
    });
    assert_eq!(config.flush_policy, FlushPolicy::Manual);
}

#[test]
fn from_env_rejects_invalid_values() {
    let cases: &[&[(&str, &str)]] = &[
        &[("VECNEST_SNAPSHOT_PATH", "  ")],
        &[("VECNEST_FLUSH_POLICY", "sometimes")],
        &[("VECNEST_FLUSH_EVERY_N_WRITES", "0")],
        &[("VECNEST_FLUSH_EVERY_N_WRITES", "-3")],
        &[("VECNEST_LOAD_STRATEGY", "append")],
        &[("VECNEST_SYNC_ON_SAVE", "maybe")],
        &[("VECNEST_LOAD_ON_OPEN", "true")],
    ];

    for pairs in cases {
        let result = with_env(pairs, StoreConfig::from_env);
        assert!(result.is_err(), "expected error for {pairs:?}");
    }
}

#[test]
fn builder_setters_compose() {
    let config = StoreConfig::default()
        .with_snapshot_path("data/snap.json")
        .with_flush_policy(FlushPolicy::Manual)
        .with_load_strategy(LoadStrategy::FullReplace)
        .with_sync_on_save(true)
        .with_load_on_open(true);
    assert_eq!(config.snapshot_path(), Some(Path::new("data/snap.json")));
    assert_eq!(config.flush_policy, FlushPolicy::Manual);
    assert_eq!(config.load_strategy, LoadStrategy::FullReplace);
    assert!(config.sync_on_save);
    assert!(config.load_on_open);
}
