use super::load::{default_config_path, default_store_root, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn defaults_are_sane_and_validate() {
    let s = Settings::default();
    assert_eq!(s.transport.poll_interval_ms, 100);
    assert_eq!(s.snippets.boundary_epsilon_ms, 1000);
    assert_eq!(s.store.user, "local");
    assert!(s.store.root.is_none());
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_zero_poll_interval_and_epsilon() {
    let mut s = Settings::default();
    s.transport.poll_interval_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.snippets.boundary_epsilon_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.store.user = "  ".into();
    assert!(s.validate().is_err());
}

#[test]
fn resolve_config_path_prefers_ritaglio_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("RITAGLIO_CONFIG_PATH", "/tmp/ritaglio-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/ritaglio-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("ritaglio")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("ritaglio")
            .join("config.toml")
    );
}

#[test]
fn default_store_root_prefers_xdg_data_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_DATA_HOME", "/tmp/xdg-data-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_store_root().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-data-home").join("ritaglio")
    );

    let _g3 = EnvGuard::remove("XDG_DATA_HOME");
    assert_eq!(
        default_store_root().unwrap(),
        std::path::PathBuf::from("/tmp/home-should-not-win")
            .join(".local")
            .join("share")
            .join("ritaglio")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[transport]
poll_interval_ms = 50
seek_seconds = 10

[snippets]
boundary_epsilon_ms = 250

[store]
root = "/tmp/ritaglio-docs"
user = "joe"

[library]
extensions = ["mp3"]
recursive = false
include_hidden = false
follow_links = false

[ui]
header_text = "hello"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("RITAGLIO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("RITAGLIO__TRANSPORT__POLL_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.transport.poll_interval_ms, 50);
    assert_eq!(s.transport.seek_seconds, 10);
    assert_eq!(s.snippets.boundary_epsilon_ms, 250);
    assert_eq!(
        s.store.root.as_deref(),
        Some(std::path::Path::new("/tmp/ritaglio-docs"))
    );
    assert_eq!(s.store.user, "joe");
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.ui.header_text, "hello");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[transport]
poll_interval_ms = 100
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("RITAGLIO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("RITAGLIO__TRANSPORT__POLL_INTERVAL_MS", "25");

    let s = Settings::load().unwrap();
    assert_eq!(s.transport.poll_interval_ms, 25);
}
