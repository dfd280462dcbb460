//! Application configuration for ResearchPress.
//!
//! User config lives at `~/.researchpress/researchpress.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResearchError, Result};
use crate::template::Locale;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "researchpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".researchpress";

/// Upper bound on results requested per category.
pub const MAX_RESULTS_PER_CATEGORY: u32 = 25;

// ---------------------------------------------------------------------------
// Config structs (matching researchpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Search backend settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Results requested from each category.
    #[serde(default = "default_results_per_category")]
    pub results_per_category: u32,

    /// Look-back window, e.g. `2h`, `3d`, `1w`, `6m`.
    #[serde(default = "default_lookback")]
    pub lookback: String,

    /// Categories searched when none are given on the command line.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Directory exported articles are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Output locale for generated articles.
    #[serde(default)]
    pub locale: Locale,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            results_per_category: default_results_per_category(),
            lookback: default_lookback(),
            categories: default_categories(),
            output_dir: default_output_dir(),
            locale: Locale::default(),
        }
    }
}

fn default_results_per_category() -> u32 {
    5
}
fn default_lookback() -> String {
    "2h".into()
}
fn default_categories() -> Vec<String> {
    vec!["news".into()]
}
fn default_output_dir() -> String {
    "articles".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the search API key (never store the key itself).
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Search API base URL.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            base_url: default_search_base_url(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_key_env() -> String {
    "EXA_API_KEY".into()
}
fn default_search_base_url() -> String {
    "https://api.exa.ai".into()
}
fn default_search_timeout() -> u64 {
    30
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat-completion API base URL.
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,

    /// Model used for article generation.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token bound for the article request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_openrouter_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_openrouter_base_url(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_openrouter_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    5000
}
fn default_openrouter_timeout() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Look-back window
// ---------------------------------------------------------------------------

/// Parse a look-back window into hours.
///
/// Accepts `<n>h`, `<n>d`, `<n>w` and `<n>m` (30-day months), or a bare
/// number of hours. Zero is rejected.
pub fn parse_lookback(s: &str) -> Result<u32> {
    let s = s.trim().to_ascii_lowercase();
    let (digits, unit_hours) = match s.char_indices().last() {
        Some((i, 'h')) => (&s[..i], 1),
        Some((i, 'd')) => (&s[..i], 24),
        Some((i, 'w')) => (&s[..i], 24 * 7),
        Some((i, 'm')) => (&s[..i], 24 * 30),
        Some(_) => (s.as_str(), 1),
        None => return Err(ResearchError::validation("look-back window is empty")),
    };

    let count: u32 = digits.trim().parse().map_err(|_| {
        ResearchError::validation(format!(
            "invalid look-back window '{s}': expected e.g. 2h, 3d, 1w or 6m"
        ))
    })?;

    match count.checked_mul(unit_hours) {
        Some(0) => Err(ResearchError::validation("look-back window must be at least 1 hour")),
        Some(hours) => Ok(hours),
        None => Err(ResearchError::validation(format!("look-back window '{s}' is too large"))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.researchpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ResearchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.researchpress/researchpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ResearchError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ResearchError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ResearchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ResearchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ResearchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values the pipeline cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let n = config.defaults.results_per_category;
    if n == 0 || n > MAX_RESULTS_PER_CATEGORY {
        return Err(ResearchError::config(format!(
            "defaults.results_per_category must be between 1 and {MAX_RESULTS_PER_CATEGORY}, got {n}"
        )));
    }
    parse_lookback(&config.defaults.lookback)
        .map_err(|e| ResearchError::config(format!("defaults.lookback: {e}")))?;
    Ok(())
}

/// Read a credential from the environment variable named by `var_name`.
///
/// A missing or empty variable is a fatal configuration error.
pub fn resolve_api_key(var_name: &str, service: &str, signup_url: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ResearchError::config(format!(
            "{service} API key not found. Set the {var_name} environment variable.\n\
             Get a key at {signup_url}"
        ))),
    }
}

/// Resolve the search backend key.
pub fn search_api_key(config: &AppConfig) -> Result<String> {
    resolve_api_key(&config.search.api_key_env, "Exa", "https://dashboard.exa.ai")
}

/// Resolve the OpenRouter key.
pub fn openrouter_api_key(config: &AppConfig) -> Result<String> {
    resolve_api_key(
        &config.openrouter.api_key_env,
        "OpenRouter",
        "https://openrouter.ai/keys",
    )
}
