use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use plugin_core::{Plugin, PluginContext, PluginSpec, send_text};
use responses::{Addressing, Engine, EngineConfig, Reply, Speaker, parse_message};
use tracing::{debug, info, warn};

/// Answers any message that talks to or about the bot.
#[derive(Debug)]
pub struct Screambot;

fn parse_config(spec: &PluginSpec) -> EngineConfig {
    match serde_yaml::from_value::<EngineConfig>(spec.config.clone()) {
        Ok(cfg) => cfg,
        Err(err) => {
            warn!(plugin = "screambot", error = %err, "Failed to parse screambot config, using defaults");
            EngineConfig::default()
        }
    }
}

/// Cheap relevance check so unrelated chatter never costs a member lookup.
fn concerns_bot(body: &str, config: &EngineConfig, own_id: &str) -> bool {
    parse_message(body, &config.bot_name, own_id) != Addressing::Irrelevant
}

async fn display_name(ctx: &PluginContext) -> String {
    match ctx.room.get_member_no_sync(&ctx.sender).await {
        Ok(Some(member)) => member
            .display_name()
            .map_or_else(|| ctx.sender.localpart().to_owned(), ToOwned::to_owned),
        Ok(None) => ctx.sender.localpart().to_owned(),
        Err(e) => {
            debug!(error = %e, sender = %ctx.sender, "Member lookup failed");
            ctx.sender.localpart().to_owned()
        }
    }
}

async fn open_command_manager(ctx: &PluginContext) -> Result<()> {
    let Some(entry) = ctx.registry.entry("custom").await else {
        return send_text(ctx, "Custom commands aren't enabled here.").await;
    };
    if !ctx.registry.is_enabled("custom").await {
        return send_text(ctx, "Custom commands aren't enabled here.").await;
    }
    entry.plugin.run(ctx, "list", &entry.spec).await
}

#[async_trait]
impl Plugin for Screambot {
    fn id(&self) -> &'static str {
        "screambot"
    }

    fn help(&self) -> &'static str {
        "Talk to screambot: \"screambot scream <thing>\", \"screambot help\""
    }

    fn spec(&self) -> PluginSpec {
        let mut spec = PluginSpec::new("screambot", &["!screambot"]);
        spec.config = serde_yaml::to_value(EngineConfig::default()).unwrap_or_default();
        spec
    }

    fn handles_room_messages(&self) -> bool {
        true
    }

    /// `!screambot <command>` skips addressing and goes straight to the rules.
    async fn run(&self, ctx: &PluginContext, args: &str, spec: &PluginSpec) -> Result<()> {
        let engine = Engine::new(parse_config(spec)).with_store(Arc::clone(&ctx.store));
        let name = display_name(ctx).await;
        let speaker = Speaker {
            display_name: Some(&name),
            user_id: Some(ctx.sender.as_str()),
        };
        let reply = if args.trim().is_empty() {
            Reply::Text(engine.resolve_ambient(""))
        } else {
            engine.resolve_command(args, &speaker)
        };
        match reply {
            Reply::Text(text) => send_text(ctx, text).await,
            Reply::OpenCommandManager => open_command_manager(ctx).await,
        }
    }

    async fn on_room_message(
        &self,
        ctx: &PluginContext,
        body: &str,
        spec: &PluginSpec,
    ) -> Result<()> {
        let Some(own_id) = ctx.client.user_id() else {
            return Ok(());
        };
        let config = parse_config(spec);
        if !concerns_bot(body, &config, own_id.as_str()) {
            return Ok(());
        }
        let engine = Engine::new(config).with_store(Arc::clone(&ctx.store));
        let name = display_name(ctx).await;
        let speaker = Speaker {
            display_name: Some(&name),
            user_id: Some(ctx.sender.as_str()),
        };

        match engine.create_response(body, own_id.as_str(), &speaker) {
            None => Ok(()),
            Some(Reply::Text(text)) => {
                info!(room_id = %ctx.room.room_id(), sender = %ctx.sender, "Replying");
                send_text(ctx, text).await
            }
            Some(Reply::OpenCommandManager) => {
                info!(room_id = %ctx.room.room_id(), sender = %ctx.sender, "Opening command manager");
                open_command_manager(ctx).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_carries_engine_config() {
        let spec = Screambot.spec();
        assert_eq!(spec.id, "screambot");
        assert_eq!(spec.triggers.commands, vec!["!screambot"]);
        assert_eq!(parse_config(&spec), EngineConfig::default());
    }

    #[test]
    fn config_overrides_bot_name() {
        let mut spec = Screambot.spec();
        spec.config = serde_yaml::from_str("bot_name: yellbot\nmax_command_len: 42").unwrap();
        let cfg = parse_config(&spec);
        assert_eq!(cfg.bot_name, "yellbot");
        assert_eq!(cfg.max_command_len, 42);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let mut spec = Screambot.spec();
        spec.config = serde_yaml::from_str("max_command_len: lots").unwrap();
        assert_eq!(parse_config(&spec), EngineConfig::default());
    }

    #[test]
    fn only_messages_about_the_bot_need_a_speaker() {
        let config = EngineConfig::default();
        let own_id = "@screambot:example.org";
        assert!(!concerns_bot("lunch anyone?", &config, own_id));
        assert!(!concerns_bot("@alice:example.org lunch?", &config, own_id));
        assert!(concerns_bot("screambot hug", &config, own_id));
        assert!(concerns_bot("@screambot:example.org hug", &config, own_id));
        assert!(concerns_bot("@alice:example.org ask screambot", &config, own_id));
    }
}
