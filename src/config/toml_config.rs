use crate::adapters::processors::ProcessorRegistry;
use crate::app::menu::{Menu, DEFAULT_MENU_VALID_HOURS};
use crate::utils::error::{MenuError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_required_field,
    validate_url, Validate,
};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkolmatConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub menu_valid_hours: Option<u32>,
    pub http_timeout_seconds: Option<u64>,
    pub history_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub processor: Option<String>,
    pub processor_fn: Option<String>,
    /// Raw day filter settings, handed to `Menu::set_summary_filters` as is.
    pub filter: Option<serde_json::Value>,
}

impl SkolmatConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// Replace `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn menu_valid_hours(&self) -> u32 {
        self.settings.menu_valid_hours.unwrap_or(DEFAULT_MENU_VALID_HOURS)
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.settings
                .http_timeout_seconds
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS),
        )
    }

    pub fn history_dir(&self) -> Option<&str> {
        self.settings.history_dir.as_deref()
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

impl SourceConfig {
    /// Build the controller for this source: resolve the provider, attach
    /// the named entry processor if it exists and apply the filter.
    pub fn create_menu(&self, valid_hours: u32, registry: &ProcessorRegistry) -> Result<Menu> {
        let mut menu = Menu::create(&self.url)?.with_valid_hours(valid_hours);

        if let Some(module) = self.processor.as_deref().filter(|m| !m.trim().is_empty()) {
            if let Some(processor) = registry.lookup(module, self.processor_fn.as_deref()) {
                menu = menu.with_entry_processor(processor);
            }
        }

        if let Some(filter) = &self.filter {
            menu.set_summary_filters(filter);
        }

        tracing::info!(
            "[{}] Source '{}' uses {}",
            menu.provider_name(),
            self.name,
            menu.url()
        );
        Ok(menu)
    }
}

impl Validate for SourceConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("sources.name", &self.name)?;
        validate_url(&format!("sources.{}.url", self.name), &self.url)?;
        if self.processor_fn.is_some() {
            validate_required_field(&format!("sources.{}.processor", self.name), &self.processor)?;
        }
        if let Some(filter) = &self.filter {
            if !filter.is_object() {
                return Err(MenuError::InvalidConfigValueError {
                    field: format!("sources.{}.filter", self.name),
                    value: filter.to_string(),
                    reason: "filter must be a table".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Validate for SkolmatConfig {
    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(MenuError::MissingConfigError {
                field: "sources".to_string(),
            });
        }
        for source in &self.sources {
            source.validate()?;
        }

        let mut names: Vec<&str> = self.sources.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(MenuError::InvalidConfigValueError {
                field: "sources.name".to_string(),
                value: pair[0].to_string(),
                reason: "source names must be unique".to_string(),
            });
        }

        if let Some(hours) = self.settings.menu_valid_hours {
            validate_positive_number("settings.menu_valid_hours", u64::from(hours), 1)?;
        }
        if let Some(timeout) = self.settings.http_timeout_seconds {
            validate_positive_number("settings.http_timeout_seconds", timeout, 1)?;
        }
        if let Some(dir) = &self.settings.history_dir {
            validate_path("settings.history_dir", dir)?;
            if Path::new(dir).is_file() {
                return Err(MenuError::config(format!(
                    "history_dir '{}' is a file, expected a directory",
                    dir
                )));
            }
        }
        Ok(())
    }
}
