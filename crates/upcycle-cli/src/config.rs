//! Configuration file management for upcycle.
//!
//! Provides a TOML-based config file at `~/.config/upcycle/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use upcycle_core::model::{GeminiConfig, RetryConfig};
use upcycle_core::roadmap::{GeneratorConfig, LiteralRepair};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "UPCYCLE_GEMINI_MODEL";
pub const MAX_ATTEMPTS_VAR: &str = "UPCYCLE_MAX_ATTEMPTS";
pub const BASE_DELAY_VAR: &str = "UPCYCLE_BASE_DELAY_MS";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub roadmap: RoadmapSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RoadmapSection {
    /// `coerce` (default) or `off`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_repair: Option<LiteralRepair>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the upcycle config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/upcycle` or `~/.config/upcycle`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("upcycle");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("upcycle")
}

/// Return the path to the upcycle config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Like [`load_config`], but a missing file is `Ok(None)`.
pub fn load_config_if_present() -> Result<Option<ConfigFile>> {
    if config_path().exists() {
        load_config().map(Some)
    } else {
        Ok(None)
    }
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file holds an API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Show only the ends of a secret, e.g. `AIza...x9Qk`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct UpcycleConfig {
    pub gemini: GeminiConfig,
    pub generator: GeneratorConfig,
}

impl UpcycleConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `cli_api_key` > `GEMINI_API_KEY` > `gemini.api_key` > error
    /// - Model: `UPCYCLE_GEMINI_MODEL` > `gemini.model` > `GeminiConfig::DEFAULT_MODEL`
    /// - Attempts: `UPCYCLE_MAX_ATTEMPTS` > `retry.max_attempts` > 3
    /// - Base delay: `UPCYCLE_BASE_DELAY_MS` > `retry.base_delay_ms` > 1000
    pub fn resolve(cli_api_key: Option<&str>) -> Result<Self> {
        let file = load_config_if_present()?.unwrap_or_default();

        // API key resolution.
        let api_key = if let Some(key) = cli_api_key {
            key.to_string()
        } else if let Ok(key) = std::env::var(API_KEY_VAR) {
            key
        } else if let Some(key) = file.gemini.api_key.clone() {
            key
        } else {
            bail!(
                "Gemini API key not found; pass --api-key, set {API_KEY_VAR}, or run `upcycle init --api-key <KEY>`"
            );
        };
        if api_key.trim().is_empty() {
            bail!("Gemini API key is empty");
        }

        let mut gemini = GeminiConfig::new(api_key);
        if let Some(model) = std::env::var(MODEL_VAR).ok().or(file.gemini.model) {
            gemini = gemini.with_model(model);
        }
        if let Some(base_url) = file.gemini.base_url {
            gemini = gemini.with_base_url(base_url);
        }
        if let Some(secs) = file.gemini.timeout_secs {
            gemini = gemini.with_request_timeout(Duration::from_secs(secs));
        }

        let mut retry = RetryConfig::default();
        if let Some(attempts) = env_number::<u32>(MAX_ATTEMPTS_VAR)?.or(file.retry.max_attempts) {
            if attempts == 0 {
                bail!("max_attempts must be at least 1");
            }
            retry = retry.with_max_attempts(attempts);
        }
        if let Some(ms) = env_number::<u64>(BASE_DELAY_VAR)?.or(file.retry.base_delay_ms) {
            retry = retry.with_base_delay(Duration::from_millis(ms));
        }

        let generator = GeneratorConfig {
            retry,
            literal_repair: file.roadmap.literal_repair.unwrap_or_default(),
        };

        Ok(Self { gemini, generator })
    }
}

/// Parse a numeric env var. Unset is `None`; unparseable is an error.
fn env_number<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} is not a valid number: {raw:?}")),
        Err(_) => Ok(None),
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{ScopedEnv, lock_env};

    #[test]
    fn config_file_parses_partial_sections() {
        let config: ConfigFile = toml::from_str(
            r#"
            [gemini]
            api_key = "from-file"

            [roadmap]
            literal_repair = "off"
            "#,
        )
        .unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.gemini.model, None);
        assert_eq!(config.retry.max_attempts, None);
        assert_eq!(config.roadmap.literal_repair, Some(LiteralRepair::Off));
    }

    #[test]
    fn empty_config_file_is_valid() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = ScopedEnv::isolated(tmp.path());

        let original = ConfigFile {
            gemini: GeminiSection {
                api_key: Some("AIzaSyExampleKey1234".to_string()),
                model: Some("gemini-1.5-pro".to_string()),
                ..GeminiSection::default()
            },
            retry: RetrySection {
                max_attempts: Some(5),
                base_delay_ms: Some(250),
            },
            roadmap: RoadmapSection::default(),
        };
        save_config(&original).unwrap();

        assert!(config_path().starts_with(tmp.path()));
        let loaded = load_config().unwrap();
        assert_eq!(loaded.gemini.api_key, original.gemini.api_key);
        assert_eq!(loaded.gemini.model, original.gemini.model);
        assert_eq!(loaded.retry.max_attempts, Some(5));
        assert_eq!(loaded.retry.base_delay_ms, Some(250));
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = ScopedEnv::isolated(tmp.path());

        save_config(&ConfigFile::default()).unwrap();

        let meta = std::fs::metadata(config_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let env = ScopedEnv::isolated(tmp.path());
        env.set(API_KEY_VAR, "env-key");

        let config = UpcycleConfig::resolve(Some("cli-key")).unwrap();
        assert_eq!(config.gemini.api_key, "cli-key");
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let env = ScopedEnv::isolated(tmp.path());

        save_config(&ConfigFile {
            gemini: GeminiSection {
                api_key: Some("file-key".to_string()),
                model: Some("file-model".to_string()),
                ..GeminiSection::default()
            },
            retry: RetrySection {
                max_attempts: Some(5),
                base_delay_ms: Some(250),
            },
            roadmap: RoadmapSection::default(),
        })
        .unwrap();
        env.set(API_KEY_VAR, "env-key");
        env.set(MODEL_VAR, "env-model");
        env.set(MAX_ATTEMPTS_VAR, "7");

        let config = UpcycleConfig::resolve(None).unwrap();
        assert_eq!(config.gemini.api_key, "env-key");
        assert_eq!(config.gemini.model, "env-model");
        assert_eq!(config.generator.retry.max_attempts, 7);
        assert_eq!(
            config.generator.retry.base_delay,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn resolve_uses_defaults_when_only_key_is_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let env = ScopedEnv::isolated(tmp.path());
        env.set(API_KEY_VAR, "env-key");

        let config = UpcycleConfig::resolve(None).unwrap();
        assert_eq!(config.gemini.model, GeminiConfig::DEFAULT_MODEL);
        assert_eq!(config.gemini.base_url, GeminiConfig::DEFAULT_BASE_URL);
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn resolve_errors_when_no_api_key() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = ScopedEnv::isolated(tmp.path());

        let msg = UpcycleConfig::resolve(None).unwrap_err().to_string();
        assert!(msg.contains("API key not found"), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_rejects_unparseable_env_number() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let env = ScopedEnv::isolated(tmp.path());
        env.set(API_KEY_VAR, "k");
        env.set(BASE_DELAY_VAR, "soon");

        let msg = format!("{:#}", UpcycleConfig::resolve(None).unwrap_err());
        assert!(msg.contains(BASE_DELAY_VAR), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_rejects_zero_attempts() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let env = ScopedEnv::isolated(tmp.path());
        env.set(API_KEY_VAR, "k");
        env.set(MAX_ATTEMPTS_VAR, "0");

        assert!(UpcycleConfig::resolve(None).is_err());
    }

    #[test]
    fn resolve_reports_broken_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let env = ScopedEnv::isolated(tmp.path());
        env.set(API_KEY_VAR, "k");
        std::fs::create_dir_all(config_dir()).unwrap();
        std::fs::write(config_path(), "[gemini\napi_key = ").unwrap();

        let msg = UpcycleConfig::resolve(None).unwrap_err().to_string();
        assert!(msg.contains("failed to parse config file"), "unexpected error: {msg}");
    }

    #[test]
    fn mask_secret_hides_the_middle() {
        assert_eq!(mask_secret("AIzaSyExampleKey1234"), "AIza...1234");
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("upcycle/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
