use std::{collections::HashMap, path::Path, sync::Arc};

use plugin_core::{Plugin, PluginRegistry, PluginSpec};
use tracing::{info, warn};

use crate::BotConfig;

/// Registers the built-in plugins, applying `config.plugins` and any
/// `<plugins_dir>/<id>/config.yaml` overrides.
pub async fn build_registry(config: &BotConfig, plugins_dir: &Path) -> Arc<PluginRegistry> {
    #[rustfmt::skip]
    let plugins: HashMap<&'static str, Arc<dyn Plugin>> = HashMap::from([
        ("screambot", Arc::new(plugin_screambot::Screambot) as Arc<dyn Plugin>),
        ("custom", Arc::new(plugin_custom::CustomCommands) as Arc<dyn Plugin>),
    ]);

    let mut specs = config.plugins.clone().unwrap_or_default();
    if let Some(name) = &config.bot_name {
        inject_bot_name(&mut specs, name);
    }
    for p in plugins.values() {
        merge_default_spec(&mut specs, p.spec());
    }

    let registry = Arc::new(PluginRegistry::new());
    for mut spec in specs {
        let Some(plugin) = plugins.get(spec.id.as_str()) else {
            warn!("Unknown plugin ID: {}", spec.id);
            continue;
        };
        if let Some(file_cfg) = load_plugin_config(plugins_dir, &spec.id) {
            spec.config = merge_yaml(file_cfg, spec.config);
        }
        info!(plugin = %spec.id, enabled = spec.enabled, commands = ?spec.triggers.commands, "Registering plugin");
        registry.register(spec, Arc::clone(plugin)).await;
    }

    registry
}

/// Deep merge where `file_cfg` wins; sequences concatenate.
fn merge_yaml(file_cfg: serde_yaml::Value, spec_cfg: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value::{Mapping, Null, Sequence};
    match (file_cfg, spec_cfg) {
        (Mapping(mut a), Mapping(b)) => {
            for (k, v_b) in b {
                match a.get_mut(&k) {
                    Some(v_a) => {
                        let merged = merge_yaml(v_a.clone(), v_b);
                        *v_a = merged;
                    }
                    None => {
                        a.insert(k, v_b);
                    }
                }
            }
            Mapping(a)
        }
        (Sequence(mut a), Sequence(b)) => {
            a.extend(b);
            Sequence(a)
        }
        (Null, b) => b,
        (a, _b) => a,
    }
}

/// The top-level `bot_name` applies unless the screambot spec sets its own.
fn inject_bot_name(specs: &mut Vec<PluginSpec>, name: &str) {
    if let Some(spec) = specs.iter_mut().find(|s| s.id == "screambot") {
        spec.config = with_default_key(spec.config.clone(), "bot_name", name);
    } else {
        let mut spec = PluginSpec::new("screambot", &[]);
        spec.config = with_default_key(spec.config, "bot_name", name);
        specs.push(spec);
    }
}

/// Sets `key` unless the mapping already has a non-null value for it.
fn with_default_key(cfg: serde_yaml::Value, key: &str, value: &str) -> serde_yaml::Value {
    let mut map = if let serde_yaml::Value::Mapping(map) = cfg {
        map
    } else {
        serde_yaml::Mapping::new()
    };
    let key = serde_yaml::Value::from(key);
    if map.get(&key).is_none_or(serde_yaml::Value::is_null) {
        map.insert(key, serde_yaml::Value::from(value));
    }
    serde_yaml::Value::Mapping(map)
}

fn load_plugin_config(root: &Path, id: &str) -> Option<serde_yaml::Value> {
    let path = root.join(id).join("config.yaml");
    match std::fs::read_to_string(&path) {
        Ok(s) => match serde_yaml::from_str::<serde_yaml::Value>(&s) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(plugin = %id, file = %path.display(), error = %e, "Failed to parse plugin config YAML");
                None
            }
        },
        Err(e) => {
            if path.exists() {
                warn!(plugin = %id, file = %path.display(), error = %e, "Failed to read plugin config file");
            }
            None
        }
    }
}

fn merge_default_spec(specs: &mut Vec<PluginSpec>, default: PluginSpec) {
    if let Some(existing) = specs.iter_mut().find(|s| s.id == default.id) {
        for cmd in default.triggers.commands {
            if !existing
                .triggers
                .commands
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&cmd))
            {
                existing.triggers.commands.push(cmd);
            }
        }
        // File config merges later; defaults only fill gaps.
        existing.config = merge_yaml(existing.config.clone(), default.config);
    } else {
        specs.push(default);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn file_config_wins_over_spec_config() {
        let merged = merge_yaml(
            yaml("bot_name: yellbot"),
            yaml("bot_name: screambot\nmax_command_len: 500"),
        );
        assert_eq!(merged["bot_name"], yaml("yellbot"));
        assert_eq!(merged["max_command_len"], yaml("500"));
        assert_eq!(merge_yaml(serde_yaml::Value::Null, yaml("a: 1")), yaml("a: 1"));
    }

    #[test]
    fn default_key_only_fills_gaps() {
        let filled = with_default_key(yaml("max_command_len: 10"), "bot_name", "yellbot");
        assert_eq!(filled["bot_name"], yaml("yellbot"));
        assert_eq!(filled["max_command_len"], yaml("10"));
        assert_eq!(
            with_default_key(yaml("bot_name: screambot"), "bot_name", "yellbot"),
            yaml("bot_name: screambot")
        );
        assert_eq!(
            with_default_key(serde_yaml::Value::Null, "bot_name", "yellbot"),
            yaml("bot_name: yellbot")
        );
    }

    #[test]
    fn configured_specs_keep_default_commands() {
        let mut specs = vec![yaml_spec("id: custom\nenabled: false\ntriggers:\n  commands: [\"!cmds\"]")];
        merge_default_spec(&mut specs, plugin_custom::CustomCommands.spec());
        merge_default_spec(&mut specs, plugin_screambot::Screambot.spec());
        assert_eq!(specs.len(), 2);
        assert!(!specs[0].enabled);
        assert_eq!(specs[0].triggers.commands, vec!["!cmds", "!custom"]);
    }

    #[test]
    fn explicit_screambot_name_beats_top_level_name() {
        let mut specs = vec![yaml_spec("id: screambot\nconfig:\n  bot_name: screambot")];
        inject_bot_name(&mut specs, "yellbot");
        assert_eq!(specs[0].config["bot_name"], yaml("screambot"));

        let mut specs = Vec::new();
        inject_bot_name(&mut specs, "yellbot");
        merge_default_spec(&mut specs, plugin_screambot::Screambot.spec());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].config["bot_name"], yaml("yellbot"));
        assert_eq!(specs[0].config["max_command_len"], yaml("500"));
    }

    fn yaml_spec(s: &str) -> PluginSpec {
        serde_yaml::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn registry_applies_bot_name_and_plugin_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("screambot")).unwrap();
        std::fs::write(
            dir.path().join("screambot/config.yaml"),
            "max_command_len: 80\n",
        )
        .unwrap();

        let config: BotConfig = serde_yaml::from_str("bot_name: yellbot").unwrap();
        let registry = build_registry(&config, dir.path()).await;

        let entry = registry.entry("screambot").await.unwrap();
        assert_eq!(entry.spec.config["bot_name"], yaml("yellbot"));
        assert_eq!(entry.spec.config["max_command_len"], yaml("80"));
        assert!(registry.entry_by_command("!custom").await.is_some());
    }
}
