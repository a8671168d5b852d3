use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::paths;
use crate::rules::RuleSet;

/// Characters per token used when estimating token counts.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

const CONFIG_FILE_PATH: &str = "config.toml";

/// Unit the context budget is measured in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetUnit {
    #[default]
    Characters,
    Tokens,
}

impl std::str::FromStr for BudgetUnit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chars" | "characters" => Ok(BudgetUnit::Characters),
            "tokens" => Ok(BudgetUnit::Tokens),
            other => Err(format!("unknown budget unit: {other}")),
        }
    }
}

/// Truncation policy for the token limiter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenLimitSettings {
    /// Budget used when the caller does not pass one
    #[serde(default)]
    pub max_context_size: Option<usize>,
    #[serde(default)]
    pub unit: BudgetUnit,
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,
    /// Number of leading messages that are never removed
    #[serde(default)]
    pub preserve_head: usize,
    /// Size charged for each image part
    #[serde(default)]
    pub image_cost: usize,
}

fn default_chars_per_token() -> f64 {
    DEFAULT_CHARS_PER_TOKEN
}

impl Default for TokenLimitSettings {
    fn default() -> Self {
        Self {
            max_context_size: None,
            unit: BudgetUnit::Characters,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            preserve_head: 0,
            image_cost: 0,
        }
    }
}

/// Settings for building model context
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineSettings {
    #[serde(default)]
    pub token_limit: TokenLimitSettings,
    /// Global rule layer
    #[serde(default)]
    pub global_rules: RuleSet,
}

impl PipelineSettings {
    /// Load settings from the config directory, then `config.toml`, then env
    pub fn load() -> Self {
        let mut settings = Self::load_file(&paths::settings_json_path())
            .or_else(|| Self::load_file(Path::new(CONFIG_FILE_PATH)))
            .unwrap_or_default();
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings
    }

    /// Load settings from an explicit file, then apply env overrides
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut settings: Self = paths::load_config_file(path)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    fn load_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match paths::load_config_file::<Self>(path) {
            Ok(settings) => {
                log::debug!("Loaded pipeline settings from {}", path.display());
                Some(settings)
            }
            Err(e) => {
                log::warn!("Ignoring unreadable pipeline settings: {e:#}");
                None
            }
        }
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CONTEXT_MAX_SIZE") {
            match value.trim().parse::<usize>() {
                Ok(size) => self.token_limit.max_context_size = Some(size),
                Err(_) => log::warn!("CONTEXT_MAX_SIZE is not a number: {value:?}"),
            }
        }
        if let Some(value) = lookup("CONTEXT_PRESERVE_HEAD") {
            match value.trim().parse::<usize>() {
                Ok(head) => self.token_limit.preserve_head = head,
                Err(_) => log::warn!("CONTEXT_PRESERVE_HEAD is not a number: {value:?}"),
            }
        }
        if let Some(value) = lookup("CONTEXT_TOKEN_UNIT") {
            match value.parse::<BudgetUnit>() {
                Ok(unit) => self.token_limit.unit = unit,
                Err(e) => log::warn!("{e}"),
            }
        }
    }
}
