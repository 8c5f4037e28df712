use std::{borrow::ToOwned, collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use command_store::CommandStore;
use matrix_sdk::{
    Client,
    room::Room,
    ruma::{OwnedUserId, events::room::message::RoomMessageEventContent},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Everything a plugin needs to answer one message.
#[derive(Clone)]
pub struct PluginContext {
    pub client: Client,
    pub room: Room,
    pub sender: OwnedUserId,
    pub registry: Arc<PluginRegistry>,
    pub store: Arc<dyn CommandStore>,
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn help(&self) -> &'static str;

    /// Default spec, merged with whatever the config file provides.
    fn spec(&self) -> PluginSpec;

    fn handles_room_messages(&self) -> bool {
        false
    }

    /// Invoked for a registered `!command`; `args` is the text after it.
    async fn run(&self, ctx: &PluginContext, args: &str, spec: &PluginSpec) -> Result<()>;

    /// Invoked for every text message when [`Plugin::handles_room_messages`]
    /// is true.
    async fn on_room_message(
        &self,
        _ctx: &PluginContext,
        _body: &str,
        _spec: &PluginSpec,
    ) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PluginTriggers {
    #[serde(default)]
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginSpec {
    pub id: String,
    #[serde(default = "enabled_true")]
    pub enabled: bool,
    #[serde(default)]
    pub triggers: PluginTriggers,
    #[serde(default)]
    pub config: serde_yaml::Value,
}

impl PluginSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, commands: &[&str]) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            triggers: PluginTriggers {
                commands: commands.iter().map(|c| (*c).to_owned()).collect(),
            },
            config: serde_yaml::Value::default(),
        }
    }
}

const fn enabled_true() -> bool {
    true
}

#[derive(Clone)]
pub struct PluginEntry {
    pub spec: PluginSpec,
    pub plugin: Arc<dyn Plugin>,
}

#[derive(Default)]
struct RegistryInner {
    by_id: HashMap<String, PluginEntry>,
    by_command: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct PluginRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, spec: PluginSpec, plugin: Arc<dyn Plugin>) -> Option<PluginEntry> {
        let mut inner = self.inner.write().await;
        let id = spec.id.clone();
        let previous = inner.by_id.insert(
            id.clone(),
            PluginEntry {
                spec: spec.clone(),
                plugin,
            },
        );
        inner.by_command.retain(|_, existing| *existing != id);
        for cmd in &spec.triggers.commands {
            inner.by_command.insert(normalize_cmd(cmd), id.clone());
        }
        previous
    }

    pub async fn entry(&self, id: &str) -> Option<PluginEntry> {
        let inner = self.inner.read().await;
        inner.by_id.get(id).cloned()
    }

    /// Entry registered for `token` (e.g. `!custom`), case-insensitively.
    pub async fn entry_by_command(&self, token: &str) -> Option<PluginEntry> {
        let inner = self.inner.read().await;
        inner
            .by_command
            .get(&normalize_cmd(token))
            .and_then(|id| inner.by_id.get(id))
            .cloned()
    }

    pub async fn entries(&self) -> Vec<(String, PluginEntry)> {
        let inner = self.inner.read().await;
        let mut entries: Vec<_> = inner
            .by_id
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub async fn is_enabled(&self, id: &str) -> bool {
        let inner = self.inner.read().await;
        inner.by_id.get(id).is_some_and(|entry| entry.spec.enabled)
    }
}

#[must_use]
pub fn normalize_cmd(s: &str) -> String {
    let s = s.trim().to_lowercase();
    if s.starts_with('!') { s } else { format!("!{s}") }
}

#[must_use]
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

pub async fn send_text(ctx: &PluginContext, text: impl Into<String>) -> Result<()> {
    let content = RoomMessageEventContent::text_plain(text.into());
    ctx.room.send(content).await?;
    Ok(())
}

/// Splits `!command rest of line` into the command token and its arguments.
#[must_use]
pub fn split_command(body: &str) -> Option<(&str, &str)> {
    let body = body.trim();
    if !body.starts_with('!') {
        return None;
    }
    let (cmd, args) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
    Some((cmd, args.trim()))
}
