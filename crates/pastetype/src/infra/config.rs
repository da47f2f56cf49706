//! Configuration management utilities.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::clean::CleanProfile;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".pastetype/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub clean: BTreeMap<String, CleanRules>,
    #[serde(default)]
    pub notify: Notify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "Defaults::default_language")]
    pub language: String,
    #[serde(default)]
    pub just_types: bool,
}

impl Defaults {
    fn default_language() -> String {
        "swift".to_owned()
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            language: Self::default_language(),
            just_types: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "RuntimeConfig::default_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "RuntimeConfig::default_top_level")]
    pub top_level: String,
}

impl RuntimeConfig {
    fn default_command() -> String {
        crate::infra::runtime::DEFAULT_COMMAND.to_owned()
    }

    fn default_top_level() -> String {
        "TopLevel".into()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            args: Vec::new(),
            top_level: Self::default_top_level(),
        }
    }
}

/// Per-language cleaning rules, keyed by language identifier under `[clean]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CleanRules {
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

impl CleanRules {
    pub fn to_profile(&self) -> CleanProfile {
        CleanProfile::new(self.comments.clone(), self.imports.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notify {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "Notify::default_channel")]
    pub channel: String,
    #[serde(default = "Notify::default_username")]
    pub username: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub templates: NotifyTemplates,
}

impl Notify {
    fn default_channel() -> String {
        "#builds".to_owned()
    }

    fn default_username() -> String {
        "pastetype".into()
    }
}

impl Default for Notify {
    fn default() -> Self {
        Self {
            webhook_url: None,
            channel: Self::default_channel(),
            username: Self::default_username(),
            icon_url: None,
            templates: NotifyTemplates::default(),
        }
    }
}

/// Message template overrides under `[notify.templates]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotifyTemplates {
    #[serde(default)]
    pub passed: Option<String>,
    #[serde(default)]
    pub failed: Option<String>,
    #[serde(default)]
    pub deployed: Option<String>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    language: Option<String>,
    runtime_command: Option<String>,
    channel: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            language: env::var("PASTETYPE_LANGUAGE").ok(),
            runtime_command: env::var("PASTETYPE_RUNTIME").ok(),
            channel: env::var("PASTETYPE_CHANNEL").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(language: &str, runtime_command: &str, channel: &str) -> Self {
        Self {
            language: Some(language.to_owned()),
            runtime_command: Some(runtime_command.to_owned()),
            channel: Some(channel.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            runtime: merge_runtime(self.runtime, other.runtime),
            clean: merge_clean(self.clean, other.clean),
            notify: merge_notify(self.notify, other.notify),
        }
    }

    /// Cleaning rules for a language, from configuration when present and the
    /// built-in profile otherwise.
    pub fn clean_profile(&self, language: &str) -> CleanProfile {
        self.clean
            .get(language)
            .map(CleanRules::to_profile)
            .unwrap_or_default()
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        language: if overlay.language != Defaults::default_language() {
            overlay.language
        } else {
            base.language
        },
        just_types: overlay.just_types || base.just_types,
    }
}

fn merge_runtime(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
    RuntimeConfig {
        command: if overlay.command != RuntimeConfig::default_command() {
            overlay.command
        } else {
            base.command
        },
        args: if overlay.args.is_empty() {
            base.args
        } else {
            overlay.args
        },
        top_level: if overlay.top_level != RuntimeConfig::default_top_level() {
            overlay.top_level
        } else {
            base.top_level
        },
    }
}

fn merge_clean(
    mut base: BTreeMap<String, CleanRules>,
    overlay: BTreeMap<String, CleanRules>,
) -> BTreeMap<String, CleanRules> {
    base.extend(overlay);
    base
}

fn merge_notify(mut base: Notify, overlay: Notify) -> Notify {
    if let Some(url) = overlay.webhook_url {
        base.webhook_url = Some(url);
    }
    if overlay.channel != Notify::default_channel() {
        base.channel = overlay.channel;
    }
    if overlay.username != Notify::default_username() {
        base.username = overlay.username;
    }
    if let Some(icon) = overlay.icon_url {
        base.icon_url = Some(icon);
    }
    if let Some(template) = overlay.templates.passed {
        base.templates.passed = Some(template);
    }
    if let Some(template) = overlay.templates.failed {
        base.templates.failed = Some(template);
    }
    if let Some(template) = overlay.templates.deployed {
        base.templates.deployed = Some(template);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("pastetype/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(language) = env.language {
        config.defaults.language = language;
    }
    if let Some(command) = env.runtime_command {
        config.runtime.command = command;
    }
    if let Some(channel) = env.channel {
        config.notify.channel = channel;
    }
    config
}
