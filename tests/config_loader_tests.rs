use outreach_crm::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const VARS: &[&str] = &[
    "OUTREACH_PROFILE",
    "OUTREACH_API_BIND_ADDR",
    "OUTREACH_LOG_LEVEL",
    "OUTREACH_LOG_FORMAT",
    "OUTREACH_API_TOKENS",
    "OUTREACH_API_TOKEN",
    "OUTREACH_IDENTITY_SERVICE_URL",
    "OUTREACH_RUN_MIGRATIONS",
    "OUTREACH_CORS_ALLOWED_ORIGINS",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

fn loader(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_base_dir(dir.path().to_path_buf())
}

#[test]
fn loads_defaults_when_only_a_token_is_set() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    unsafe {
        env::set_var("OUTREACH_API_TOKEN", "local-token");
    }

    let cfg = loader(&temp_dir).load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.log_format, "json");
    assert_eq!(cfg.api_tokens, vec!["local-token".to_string()]);
    assert!(cfg.run_migrations);
    assert_eq!(cfg.identity.cache_ttl_seconds, 60);
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "OUTREACH_API_BIND_ADDR=127.0.0.1:3000\nOUTREACH_API_TOKENS=a,b\n",
    );
    write_env_file(&temp_dir, ".env.test", "OUTREACH_API_BIND_ADDR=192.168.0.10:5000\n");
    write_env_file(&temp_dir, ".env.test.local", "OUTREACH_API_BIND_ADDR=10.0.0.5:6000\n");
    // Profile is chosen by .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "OUTREACH_PROFILE=test\nOUTREACH_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let cfg = loader(&temp_dir).load().expect("layered config loads");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.api_tokens, vec!["a".to_string(), "b".to_string()]);
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "OUTREACH_API_BIND_ADDR=127.0.0.1:3000\nOUTREACH_API_TOKEN=file-token\n",
    );
    unsafe {
        env::set_var("OUTREACH_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let cfg = loader(&temp_dir).load().expect("config loads");

    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.api_tokens, vec!["file-token".to_string()]);
    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    unsafe {
        env::set_var("OUTREACH_API_BIND_ADDR", "not-an-addr");
        env::set_var("OUTREACH_API_TOKEN", "token");
    }

    let err = loader(&temp_dir).load().expect_err("invalid bind addr should error");
    assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    clear_env();
}

#[test]
fn missing_auth_source_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let err = loader(&temp_dir).load().expect_err("no tokens and no identity service");
    assert!(matches!(err, ConfigError::MissingAuthSource));
    clear_env();
}

#[test]
fn identity_service_alone_is_an_auth_source() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "OUTREACH_IDENTITY_SERVICE_URL=https://identity.example.org\n",
    );

    let cfg = loader(&temp_dir).load().expect("identity-only config loads");
    assert!(cfg.api_tokens.is_empty());
    assert_eq!(
        cfg.identity.service_url.as_deref(),
        Some("https://identity.example.org")
    );
    clear_env();
}

#[test]
fn invalid_run_migrations_flag_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    unsafe {
        env::set_var("OUTREACH_API_TOKEN", "token");
        env::set_var("OUTREACH_RUN_MIGRATIONS", "sometimes");
    }

    let err = loader(&temp_dir).load().expect_err("bad boolean");
    assert!(matches!(err, ConfigError::InvalidBool { field: "RUN_MIGRATIONS", .. }));
    clear_env();
}

#[test]
fn cors_origins_are_split_and_trimmed() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    unsafe {
        env::set_var("OUTREACH_API_TOKEN", "token");
        env::set_var(
            "OUTREACH_CORS_ALLOWED_ORIGINS",
            " https://a.example.org , https://b.example.org,",
        );
    }

    let cfg = loader(&temp_dir).load().expect("config loads");
    assert_eq!(
        cfg.cors_allowed_origins,
        vec![
            "https://a.example.org".to_string(),
            "https://b.example.org".to_string()
        ]
    );
    clear_env();
}
