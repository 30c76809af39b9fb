use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::QuillError;

/// Top-level Quill configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quill: QuillConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// How turns are laid out in the transcript document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Turns separated by a `***` rule line.
    #[default]
    Plain,
    /// One line per turn, wrapped in coloured `<span>` markers.
    Marker,
}

impl DocumentFormat {
    /// Human-readable name for display (e.g. in `quill status`).
    pub fn display_name(&self) -> &str {
        match self {
            Self::Plain => "plain",
            Self::Marker => "marker",
        }
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuillConfig {
    /// Path of the watched transcript.
    #[serde(default = "default_document")]
    pub document: String,
    #[serde(default)]
    pub format: DocumentFormat,
    /// Sent as the system message of every request. Empty = none.
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            document: default_document(),
            format: DocumentFormat::default(),
            system_prompt: String::new(),
            log_level: default_log_level(),
        }
    }
}

/// Provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider")]
    pub default: String,
    pub deepseek: Option<DeepSeekConfig>,
    pub openai: Option<OpenAiConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            deepseek: None,
            openai: None,
        }
    }
}

/// DeepSeek chat API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepSeekConfig {
    #[serde(default)]
    pub api_key: String,
    /// Environment variable consulted when `api_key` is empty.
    #[serde(default = "default_deepseek_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_deepseek_model")]
    pub model: String,
    #[serde(default = "default_deepseek_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_key_env: default_deepseek_key_env(),
            model: default_deepseek_model(),
            base_url: default_deepseek_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DeepSeekConfig {
    /// The configured key, or the one found in `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key, &self.api_key_env)
    }
}

/// OpenAI-compatible provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_key_env: default_openai_key_env(),
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OpenAiConfig {
    /// The configured key, or the one found in `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(&self.api_key, &self.api_key_env)
    }
}

/// File-change notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period after a change notification before the document is read.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Capacity of the notification queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_document() -> String {
    "chat.md".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_provider() -> String {
    "deepseek".to_string()
}
fn default_deepseek_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}
fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}
fn default_deepseek_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}
fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_openai_model() -> String {
    "gpt-4o".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_debounce_ms() -> u64 {
    50
}
fn default_queue_capacity() -> usize {
    10
}

fn resolve_key(explicit: &str, env_var: &str) -> Option<String> {
    if !explicit.trim().is_empty() {
        return Some(explicit.trim().to_string());
    }
    if env_var.is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Runs before logging
/// is set up, so the caller reports the fallback.
pub fn load(path: &str) -> Result<Config, QuillError> {
    let path = Path::new(path);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| QuillError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| QuillError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let cfg = load("/nonexistent/__quill_test__/quill.toml").unwrap();
        assert_eq!(cfg.quill.document, "chat.md");
        assert_eq!(cfg.quill.format, DocumentFormat::Plain);
        assert!(cfg.quill.system_prompt.is_empty());
        assert_eq!(cfg.provider.default, "deepseek");
        assert_eq!(cfg.watch.debounce_ms, 50);
        assert_eq!(cfg.watch.queue_capacity, 10);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.quill.log_level, "info");
        assert!(cfg.provider.deepseek.is_none());
    }

    #[test]
    fn test_marker_format_from_toml() {
        let toml_str = r#"
            [quill]
            document = "~/notes/chat.md"
            format = "marker"
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.quill.format, DocumentFormat::Marker);
        assert_eq!(cfg.quill.format.display_name(), "marker");
        assert_eq!(cfg.quill.document, "~/notes/chat.md");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let toml_str = r#"
            [quill]
            format = "html"
        "#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_deepseek_defaults_when_section_is_partial() {
        let toml_str = r#"
            [provider.deepseek]
            model = "deepseek-reasoner"
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        let ds = cfg.provider.deepseek.unwrap();
        assert_eq!(ds.model, "deepseek-reasoner");
        assert_eq!(ds.base_url, "https://api.deepseek.com/v1");
        assert_eq!(ds.api_key_env, "DEEPSEEK_API_KEY");
        assert_eq!(ds.timeout_secs, 30);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let ds = DeepSeekConfig {
            api_key: "  sk-inline ".into(),
            api_key_env: "__QUILL_TEST_UNSET_KEY__".into(),
            ..Default::default()
        };
        assert_eq!(ds.resolve_api_key().as_deref(), Some("sk-inline"));
    }

    #[test]
    fn test_api_key_from_env() {
        std::env::set_var("__QUILL_TEST_OPENAI_KEY__", "sk-from-env");
        let oa = OpenAiConfig {
            api_key_env: "__QUILL_TEST_OPENAI_KEY__".into(),
            ..Default::default()
        };
        assert_eq!(oa.resolve_api_key().as_deref(), Some("sk-from-env"));
        std::env::remove_var("__QUILL_TEST_OPENAI_KEY__");
    }

    #[test]
    fn test_missing_api_key() {
        let ds = DeepSeekConfig {
            api_key_env: "__QUILL_TEST_NEVER_SET__".into(),
            ..Default::default()
        };
        assert!(ds.resolve_api_key().is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let tmp = tempfile_path("__quill_test_bad_config__.toml");
        std::fs::write(&tmp, "[quill\ndocument =").unwrap();
        let err = load(tmp.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, QuillError::Config(_)));
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn test_shellexpand_home() {
        let expanded = shellexpand("~/chat.md");
        assert!(!expanded.starts_with("~/") || std::env::var_os("HOME").is_none());
        assert_eq!(shellexpand("/abs/chat.md"), "/abs/chat.md");
    }

    fn tempfile_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }
}
