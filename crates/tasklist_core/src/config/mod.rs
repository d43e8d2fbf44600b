use crate::error::AppError;
use crate::model::{DEFAULT_REMINDER_SECONDS, Priority, PriorityFilter, SortKey};
use crate::storage::data_path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKLIST_CONFIG_PATH";
const RESET: &str = "\x1b[0m";

/// Lowercases and collapses separators: `Dark-Mode` becomes `dark_mode`.
pub fn canonical_key(raw: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
        } else if !cleaned.is_empty() && !cleaned.ends_with('_') {
            cleaned.push('_');
        }
    }

    let key = cleaned.trim_end_matches('_');
    (!key.is_empty()).then(|| key.to_string())
}

/// Terminal colouring for plain-text output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Theme {
    #[default]
    Plain,
    Noir,
    Solarized,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Plain => "plain",
            Theme::Noir => "noir",
            Theme::Solarized => "solarized",
        }
    }

    /// Highlights hints the user should act on.
    pub fn accent(self, text: &str) -> String {
        match self {
            Theme::Plain => text.to_string(),
            Theme::Noir => paint("\x1b[38;5;208m", text),
            Theme::Solarized => paint("\x1b[38;5;108m", text),
        }
    }

    /// Dims secondary lines such as list footers.
    pub fn muted(self, text: &str) -> String {
        match self {
            Theme::Plain => text.to_string(),
            Theme::Noir | Theme::Solarized => paint("\x1b[38;5;250m", text),
        }
    }
}

fn paint(code: &str, text: &str) -> String {
    format!("{code}{text}{RESET}")
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match canonical_key(raw).as_deref() {
            None | Some("plain" | "default" | "vanilla" | "light") => Ok(Theme::Plain),
            Some("noir" | "dark" | "dark_mode" | "darkmode") => Ok(Theme::Noir),
            Some("solarized") => Ok(Theme::Solarized),
            Some(_) => Err(AppError::invalid_input(format!("unknown theme '{}'", raw.trim()))),
        }
    }
}

impl TryFrom<String> for Theme {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

fn default_priority() -> Priority {
    Priority::Medium
}

fn default_reminder_seconds() -> u64 {
    DEFAULT_REMINDER_SECONDS
}

/// User preferences; every field may be left out of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_priority")]
    pub default_priority: Priority,
    #[serde(default = "default_reminder_seconds")]
    pub default_reminder_seconds: u64,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub filter: PriorityFilter,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
            default_reminder_seconds: default_reminder_seconds(),
            sort: SortKey::default(),
            filter: PriorityFilter::default(),
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// This config with every override that was given replacing its field.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Config {
        Config {
            default_priority: overrides.default_priority.unwrap_or(self.default_priority),
            default_reminder_seconds: overrides
                .default_reminder_seconds
                .unwrap_or(self.default_reminder_seconds),
            sort: overrides.sort.unwrap_or(self.sort),
            filter: overrides.filter.unwrap_or(self.filter),
            theme: overrides.theme.unwrap_or(self.theme),
        }
    }
}

/// Outcome of reading the config file: usable values plus the reason they
/// are defaults, if reading failed.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

impl From<Result<Option<Config>, AppError>> for ConfigLoad {
    fn from(result: Result<Option<Config>, AppError>) -> Self {
        match result {
            Ok(config) => ConfigLoad {
                config: config.unwrap_or_default(),
                error: None,
            },
            Err(err) => ConfigLoad {
                config: Config::default(),
                error: Some(err),
            },
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub default_priority: Option<Priority>,
    pub default_reminder_seconds: Option<u64>,
    pub sort: Option<SortKey>,
    pub filter: Option<PriorityFilter>,
    pub theme: Option<Theme>,
}

impl ConfigOverrides {
    /// Applies one `KEY=VALUE` pair. Keys are case and separator insensitive.
    pub fn apply(&mut self, raw: &str) -> Result<(), AppError> {
        let (key_raw, value_raw) = raw
            .trim()
            .split_once('=')
            .ok_or_else(|| AppError::invalid_input("override must be in KEY=VALUE format"))?;
        let key = canonical_key(key_raw)
            .ok_or_else(|| AppError::invalid_input("override key cannot be empty"))?;
        let value = value_raw.trim();

        match key.as_str() {
            "default_priority" | "priority" => self.default_priority = Some(value.parse()?),
            "default_reminder_seconds" | "reminder" | "reminder_seconds" => {
                let seconds = value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!("reminder must be a number of seconds: {value}"))
                })?;
                self.default_reminder_seconds = Some(seconds);
            }
            "sort" => self.sort = Some(value.parse()?),
            "filter" => self.filter = Some(value.parse()?),
            "theme" => self.theme = Some(value.parse()?),
            other => {
                return Err(AppError::invalid_input(format!(
                    "unknown config field '{other}'"
                )));
            }
        }

        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    data_path(CONFIG_ENV_VAR, CONFIG_FILE_NAME)
}

/// Reads the user's config. Never fails: problems come back alongside the
/// defaults so the caller can report them.
pub fn load_config_with_fallback() -> ConfigLoad {
    config_path().and_then(|path| read_config(&path)).into()
}

/// `Ok(None)` when there is no config file.
fn read_config(path: &Path) -> Result<Option<Config>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map(Some).map_err(|err| {
        AppError::invalid_data(format!("invalid config {}: {}", path.display(), err))
    })
}
