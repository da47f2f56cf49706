//! Build-status notifications posted to a chat webhook.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ValueEnum;
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

use crate::infra::config::{Config, NotifyTemplates};
use crate::infra::webhook::ChatMessage;

const PASSED_TEMPLATE: &str =
    "Build {{ build_number }} on {{ branch }} passed. :tada:{% if build_url %} {{ build_url }}{% endif %}";
const FAILED_TEMPLATE: &str =
    "Build {{ build_number }} on {{ branch }} failed. :rotating_light:{% if build_url %} {{ build_url }}{% endif %}";
const DEPLOYED_TEMPLATE: &str =
    "Build {{ build_number }} on {{ branch }} is on its way to testers. :airplane:{% if download_url %} Install: {{ download_url }}{% endif %}";

/// Build lifecycle events that produce chat notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildEvent {
    /// CI finished green.
    Passed,
    /// CI finished red.
    Failed,
    /// A build went out to testers.
    Deployed,
}

impl BuildEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildEvent::Passed => "passed",
            BuildEvent::Failed => "failed",
            BuildEvent::Deployed => "deployed",
        }
    }

    fn builtin_template(&self) -> &'static str {
        match self {
            BuildEvent::Passed => PASSED_TEMPLATE,
            BuildEvent::Failed => FAILED_TEMPLATE,
            BuildEvent::Deployed => DEPLOYED_TEMPLATE,
        }
    }
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown build event: {0}")]
pub struct ParseBuildEventError(String);

impl FromStr for BuildEvent {
    type Err = ParseBuildEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" | "pass" => Ok(BuildEvent::Passed),
            "failed" | "fail" => Ok(BuildEvent::Failed),
            "deployed" | "deploy" => Ok(BuildEvent::Deployed),
            other => Err(ParseBuildEventError(other.to_owned())),
        }
    }
}

/// Values interpolated into the message templates, typically assembled from
/// CI environment variables.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub branch: Option<String>,
    pub build_number: Option<String>,
    pub build_url: Option<String>,
    pub download_url: Option<String>,
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    branch: &'a str,
    build_number: &'a str,
    build_url: Option<&'a str>,
    download_url: Option<&'a str>,
}

impl BuildContext {
    fn template_context(&self) -> TemplateContext<'_> {
        TemplateContext {
            branch: self.branch.as_deref().unwrap_or("unknown"),
            build_number: self.build_number.as_deref().unwrap_or("?"),
            build_url: self.build_url.as_deref(),
            download_url: self.download_url.as_deref(),
        }
    }
}

/// Renders build-event messages and shapes webhook payloads.
pub struct Notifier {
    env: Environment<'static>,
    overrides: NotifyTemplates,
    channel: String,
    username: String,
    icon_url: Option<String>,
}

impl Notifier {
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut env = Environment::new();
        for event in [BuildEvent::Passed, BuildEvent::Failed, BuildEvent::Deployed] {
            env.add_template(event.as_str(), event.builtin_template())
                .with_context(|| format!("invalid built-in template for '{event}'"))?;
        }

        Ok(Self {
            env,
            overrides: config.notify.templates.clone(),
            channel: config.notify.channel.clone(),
            username: config.notify.username.clone(),
            icon_url: config.notify.icon_url.clone(),
        })
    }

    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        if let Some(channel) = channel {
            self.channel = channel;
        }
        self
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        if let Some(username) = username {
            self.username = username;
        }
        self
    }

    pub fn with_icon_url(mut self, icon_url: Option<String>) -> Self {
        if let Some(icon_url) = icon_url {
            self.icon_url = Some(icon_url);
        }
        self
    }

    /// Render the message for `event` and wrap it in a webhook payload.
    pub fn build_message(&self, event: BuildEvent, context: &BuildContext) -> Result<ChatMessage> {
        let text = self.render(event, context)?;
        Ok(ChatMessage {
            channel: self.channel.clone(),
            username: self.username.clone(),
            text,
            icon_url: self.icon_url.clone(),
        })
    }

    fn render(&self, event: BuildEvent, context: &BuildContext) -> Result<String> {
        let values = context.template_context();

        if let Some(source) = self.override_for(event) {
            let mut env = Environment::new();
            env.add_template("override", source)
                .with_context(|| format!("invalid notify template for '{event}'"))?;
            let template = env
                .get_template("override")
                .with_context(|| format!("missing notify template for '{event}'"))?;
            return template
                .render(values)
                .with_context(|| format!("failed to render '{event}' message"));
        }

        let template = self
            .env
            .get_template(event.as_str())
            .with_context(|| format!("missing notify template for '{event}'"))?;
        template
            .render(values)
            .with_context(|| format!("failed to render '{event}' message"))
    }

    fn override_for(&self, event: BuildEvent) -> Option<&str> {
        match event {
            BuildEvent::Passed => self.overrides.passed.as_deref(),
            BuildEvent::Failed => self.overrides.failed.as_deref(),
            BuildEvent::Deployed => self.overrides.deployed.as_deref(),
        }
    }
}
