use std::sync::{Mutex, MutexGuard, OnceLock};
use tempfile::TempDir;

use crate::config::environment::{env_f32, env_string, env_u32, env_u64};
use crate::config::{
    Config, DEFAULT_CEREBRAS_BASE_URL, DEFAULT_MAX_BATCH_DAYS, DEFAULT_MODEL, LlmProvider,
};

fn env_lock<'a>() -> MutexGuard<'a, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

const MANAGED_VARS: &[&str] = &[
    "MEALGEN_PROVIDER",
    "MEALGEN_LLM_BASE_URL",
    "OPENROUTER_API_KEY",
    "CEREBRAS_API_KEY",
    "MEALGEN_TIMEOUT_SECS",
    "MEALGEN_MAX_TOKENS",
    "MEALGEN_MODEL",
    "MEALGEN_TEMPERATURE",
    "MEALGEN_MAX_BATCH_DAYS",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    /// Clears every variable the loader reads, then applies `vars`.
    fn new(vars: &[(&str, Option<&str>)]) -> Self {
        let mut keys: Vec<&str> = MANAGED_VARS.to_vec();
        keys.extend(vars.iter().map(|(key, _)| *key));

        let saved = keys
            .iter()
            .map(|key| (key.to_string(), std::env::var(key).ok()))
            .collect::<Vec<_>>();

        for key in MANAGED_VARS {
            unsafe { std::env::remove_var(key) };
        }
        for (key, value) in vars {
            match value {
                Some(val) => unsafe { std::env::set_var(key, val) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.iter().rev() {
            match value {
                Some(val) => unsafe { std::env::set_var(key, val) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

fn write_config_file(home: &TempDir, contents: &str) {
    let config_dir = home.path().join(".mealgen");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config"), contents).unwrap();
}

#[test]
fn load_from_env_only() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("OPENROUTER_API_KEY", Some("env-key")),
        ("MEALGEN_TIMEOUT_SECS", Some("45")),
        ("MEALGEN_MAX_TOKENS", Some("8192")),
        ("MEALGEN_MODEL", Some("env-model")),
        ("MEALGEN_MAX_BATCH_DAYS", Some("2")),
    ]);

    let config = Config::load().unwrap();
    assert_eq!(config.llm.api_key, "env-key");
    assert_eq!(config.llm.timeout_secs, 45);
    assert_eq!(config.models.max_tokens, 8192);
    assert_eq!(config.models.model, "env-model");
    assert_eq!(config.generation.max_batch_days, 2);
}

#[test]
fn load_prefers_env_over_file() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();
    write_config_file(
        &temp_home,
        r#"{
            "llm": { "api_key": "file-key", "timeout_secs": 20 },
            "models": { "model": "file-model", "max_tokens": 1024, "temperature": 0.1 }
        }"#,
    );

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("OPENROUTER_API_KEY", Some("env-key")),
        ("MEALGEN_TIMEOUT_SECS", Some("40")),
        ("MEALGEN_MODEL", Some("env-model")),
    ]);

    let config = Config::load().unwrap();
    assert_eq!(config.llm.api_key, "env-key");
    assert_eq!(config.llm.timeout_secs, 40);
    assert_eq!(config.models.max_tokens, 1024);
    assert_eq!(config.models.model, "env-model");
    assert!((config.models.temperature - 0.1).abs() < f32::EPSILON);
    assert_eq!(config.generation.max_batch_days, DEFAULT_MAX_BATCH_DAYS);
}

#[test]
fn load_errors_without_api_key() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[("HOME", Some(home.as_str()))]);

    let err = Config::load().unwrap_err();
    assert!(err.to_string().contains("OpenRouter API key not found"));
}

#[test]
fn load_unvalidated_tolerates_missing_api_key() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[("HOME", Some(home.as_str()))]);

    let config = Config::load_unvalidated().unwrap();
    assert!(config.llm.api_key.is_empty());
    assert_eq!(config.models.model, DEFAULT_MODEL);
}

#[test]
fn load_rejects_zero_batch_size() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("OPENROUTER_API_KEY", Some("env-key")),
        ("MEALGEN_MAX_BATCH_DAYS", Some("0")),
    ]);

    let err = Config::load().unwrap_err();
    assert!(err.to_string().contains("max_batch_days"));
}

#[test]
fn load_supports_cerebras_provider() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("MEALGEN_PROVIDER", Some("cerebras")),
        ("CEREBRAS_API_KEY", Some("cb-key")),
        ("OPENROUTER_API_KEY", Some("or-key")),
    ]);

    let config = Config::load().unwrap();
    assert_eq!(config.llm.provider, LlmProvider::Cerebras);
    assert_eq!(config.llm.api_key, "cb-key");
    assert_eq!(config.llm.base_url, DEFAULT_CEREBRAS_BASE_URL);
}

#[test]
fn load_rejects_unknown_provider_in_file() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();
    write_config_file(&temp_home, r#"{ "llm": { "provider": "mystery" } }"#);

    let _env = EnvGuard::new(&[("HOME", Some(home.as_str()))]);

    let err = Config::load_unvalidated().unwrap_err();
    assert!(format!("{err:#}").contains("Unknown LLM provider"));
}

#[test]
fn provider_names_parse_case_insensitively() {
    assert_eq!(" OpenRouter ".parse::<LlmProvider>().unwrap(), LlmProvider::OpenRouter);
    assert_eq!("CEREBRAS".parse::<LlmProvider>().unwrap(), LlmProvider::Cerebras);

    let err = "mystery".parse::<LlmProvider>().unwrap_err();
    assert!(err.to_string().contains("openrouter, cerebras"));
}

#[test]
fn switching_provider_replaces_base_url_only_on_change() {
    let mut config = Config::builder()
        .with_llm(|llm| llm.base_url = "http://localhost:8080/v1".to_string())
        .with_max_batch_days(2)
        .build()
        .unwrap();

    assert!(!config.llm.switch_provider(LlmProvider::OpenRouter));
    assert_eq!(config.llm.base_url, "http://localhost:8080/v1");

    assert!(config.llm.switch_provider(LlmProvider::Cerebras));
    assert_eq!(config.llm.base_url, DEFAULT_CEREBRAS_BASE_URL);
    assert_eq!(config.generation.max_batch_days, 2);

    let switched = Config::builder()
        .with_provider(LlmProvider::Cerebras)
        .build()
        .unwrap();
    assert_eq!(switched.llm.base_url, DEFAULT_CEREBRAS_BASE_URL);
}

#[test]
fn save_persists_nested_structure() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[("HOME", Some(home.as_str()))]);

    let mut config = Config::builder().build().unwrap();
    config.llm.api_key = "test-key".to_string();
    config.llm.timeout_secs = 55;
    config.models.max_tokens = 999;
    config.models.model = "custom/model".to_string();
    config.generation.max_batch_days = 2;
    config.save().unwrap();

    let persisted = std::fs::read_to_string(Config::config_path().unwrap()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&persisted).unwrap();
    assert_eq!(json["llm"]["api_key"], "test-key");
    assert_eq!(json["llm"]["provider"], "openrouter");
    assert_eq!(json["llm"]["timeout_secs"], 55);
    assert_eq!(json["models"]["model"], "custom/model");
    assert_eq!(json["models"]["max_tokens"], 999);
    assert_eq!(json["generation"]["max_batch_days"], 2);
}

#[test]
fn saved_config_loads_back() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[("HOME", Some(home.as_str()))]);

    let config = Config::builder()
        .with_llm(|llm| llm.api_key = "round-trip".to_string())
        .with_generation(|generation| generation.max_batch_days = 1)
        .build()
        .unwrap();
    config.save().unwrap();

    let loaded = Config::load().unwrap();
    assert_eq!(loaded.llm.api_key, "round-trip");
    assert_eq!(loaded.llm.provider, LlmProvider::OpenRouter);
    assert_eq!(loaded.generation.max_batch_days, 1);
}

#[test]
fn test_env_string() {
    let _lock = env_lock();
    let _env = EnvGuard::new(&[("TEST_VAR", Some("test_value"))]);

    assert_eq!(env_string("TEST_VAR").unwrap(), Some("test_value".to_string()));
    assert_eq!(env_string("NONEXISTENT_VAR").unwrap(), None);
}

#[test]
fn test_env_numbers() {
    let _lock = env_lock();
    let _env = EnvGuard::new(&[
        ("TEST_U64", Some("123")),
        ("TEST_U32", Some("456")),
        ("TEST_F32", Some("0.7")),
        ("TEST_BAD_U32", Some("many")),
    ]);

    assert_eq!(env_u64("TEST_U64").unwrap(), Some(123));
    assert_eq!(env_u32("TEST_U32").unwrap(), Some(456));
    assert_eq!(env_f32("TEST_F32").unwrap(), Some(0.7));
    assert_eq!(env_u32("NONEXISTENT_VAR").unwrap(), None);
    assert!(env_u32("TEST_BAD_U32").is_err());
}
