mod logging;
mod plugins;

use core::time::Duration;
use std::{
    fs,
    io::IsTerminal as _,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use command_store::{CommandStore, JsonStore};
use matrix_sdk::{
    Client, SessionMeta,
    authentication::{SessionTokens, matrix::MatrixSession},
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent},
        message::{MessageType, OriginalSyncRoomMessageEvent},
    },
};
use plugin_core::{PluginContext, PluginRegistry, PluginSpec, split_command, truncate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "screambot", version, about = "A Matrix bot that screams back")]
struct Args {
    /// Homeserver base URL, e.g. `https://matrix-client.matrix.org`.
    #[arg(long, env = "MATRIX_HOMESERVER")]
    homeserver: String,

    /// Username (localpart or full user ID)
    #[arg(long, env = "MATRIX_USERNAME")]
    username: String,

    /// Password (if omitted, will prompt if needed)
    #[arg(long, env = "MATRIX_PASSWORD")]
    password: Option<String>,

    /// Directory for persistent state (encryption keys, sync cache)
    #[arg(long, env = "MATRIX_STORE", default_value = "./bot-store")]
    store: PathBuf,

    /// JSON session file for access token/device info
    #[arg(long, env = "MATRIX_SESSION_FILE", default_value = "./session.json")]
    session_file: PathBuf,

    /// Device display name
    #[arg(long, env = "MATRIX_DEVICE_NAME", default_value = "screambot")]
    device_name: String,

    /// YAML config with the bot name and plugin settings
    #[arg(long, env = "MATRIX_CONFIG", default_value = "./config.yaml")]
    config: PathBuf,

    /// JSON file holding custom commands (defaults to `<store>/commands.json`)
    #[arg(long, env = "SCREAMBOT_COMMANDS_FILE")]
    commands_file: Option<PathBuf>,

    /// Directory with per-plugin `<id>/config.yaml` overrides
    #[arg(long, env = "PLUGINS_DIR", default_value = "./plugins")]
    plugins_dir: PathBuf,

    /// Disable auto-joining rooms when invited
    #[arg(long)]
    no_autojoin: bool,

    /// Sync timeout in milliseconds
    #[arg(long, env = "MATRIX_SYNC_TIMEOUT_MS", default_value_t = 30000)]
    sync_timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user_id: String,
    device_id: String,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub(crate) struct BotConfig {
    /// Name the bot answers to; overrides the screambot plugin default.
    #[serde(default)]
    pub(crate) bot_name: Option<String>,
    #[serde(default)]
    pub(crate) commands_file: Option<PathBuf>,
    #[serde(default)]
    pub(crate) plugins: Option<Vec<PluginSpec>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    // Load .env if present so clap can pick up env vars.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    fs::create_dir_all(&args.store)
        .with_context(|| format!("creating store directory at {}", args.store.display()))?;

    let client = Client::builder()
        .homeserver_url(&args.homeserver)
        .handle_refresh_tokens()
        .sqlite_store(&args.store, None)
        .build()
        .await
        .context("building matrix client")?;

    if let Some(session) = load_session(&args.session_file)? {
        info!("Restoring session for {}", session.user_id);
        let matrix_session = MatrixSession {
            meta: SessionMeta {
                user_id: session.user_id.parse().context("invalid stored user_id")?,
                device_id: session.device_id.into(),
            },
            tokens: SessionTokens {
                access_token: session.access_token,
                refresh_token: session.refresh_token,
            },
        };
        client
            .restore_session(matrix_session)
            .await
            .context("restoring session")?;
    } else {
        let password = resolve_password(&args)?;

        info!("Logging in as {}", args.username);
        let response = client
            .matrix_auth()
            .login_username(&args.username, &password)
            .initial_device_display_name(&args.device_name)
            .request_refresh_token()
            .send()
            .await
            .context("login failed")?;

        let session = SavedSession {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            user_id: response.user_id.to_string(),
            device_id: response.device_id.to_string(),
        };
        save_session(&args.session_file, &session)?;
        info!(
            "Logged in: user={} device={}",
            session.user_id, session.device_id
        );
    }

    let config = load_config(&args.config)?;
    let commands_file = commands_path(args.commands_file.as_deref(), &config, &args.store);
    let store: Arc<dyn CommandStore> = Arc::new(
        JsonStore::open(&commands_file)
            .with_context(|| format!("opening custom commands at {}", commands_file.display()))?,
    );

    let registry = plugins::build_registry(&config, &args.plugins_dir).await;
    let mut command_keys: Vec<String> = Vec::new();
    let mut passive: Vec<String> = Vec::new();
    for (id, entry) in registry.entries().await {
        command_keys.extend(entry.spec.triggers.commands.iter().cloned());
        if entry.plugin.handles_room_messages() {
            passive.push(id);
        }
    }
    info!(commands = ?command_keys, passive = ?passive, "Registered plugin triggers");

    if !args.no_autojoin {
        client.add_event_handler(
            async move |ev: StrippedRoomMemberEvent, room: Room, client: Client| {
                if ev.content.membership != MembershipState::Invite {
                    return;
                }
                let Some(own_id) = client.user_id() else {
                    return;
                };
                if ev.state_key != own_id.as_str() {
                    return;
                }
                info!(room_id = %room.room_id(), "Auto-joining invited room");
                if let Err(e) = room.join().await {
                    warn!(error = %e, "Failed to accept invite");
                }
            },
        );
    }

    client.add_event_handler(
        async move |ev: OriginalSyncRoomMessageEvent, room: Room, client: Client| {
            let Some(own_id) = client.user_id() else {
                return;
            };
            if ev.sender == own_id {
                return;
            }
            let body = match &ev.content.msgtype {
                MessageType::Text(t) => t.body.as_str(),
                MessageType::Notice(n) => n.body.as_str(),
                MessageType::Audio(_)
                | MessageType::Emote(_)
                | MessageType::File(_)
                | MessageType::Image(_)
                | MessageType::Location(_)
                | MessageType::ServerNotice(_)
                | MessageType::Video(_)
                | MessageType::VerificationRequest(_)
                | _ => return,
            };
            info!(room_id = %room.room_id(), sender = %ev.sender, body = %truncate(body, 200), "Incoming message");

            let ctx = PluginContext {
                client: client.clone(),
                room,
                sender: ev.sender.clone(),
                registry: Arc::clone(&registry),
                store: Arc::clone(&store),
            };
            dispatch(&ctx, body.trim()).await;
        },
    );

    info!(
        timeout_ms = args.sync_timeout_ms,
        "Starting sync… Press Ctrl+C to stop."
    );
    let settings = SyncSettings::new().timeout(Duration::from_millis(args.sync_timeout_ms));
    tokio::select! {
        res = client.sync(settings) => res.map_err(|e| anyhow!("sync terminated: {e}")),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}

/// Routes a `!command` to its plugin; anything else goes to every passive
/// plugin.
async fn dispatch(ctx: &PluginContext, body: &str) {
    let registry: &PluginRegistry = &ctx.registry;
    if let Some((cmd, args)) = split_command(body)
        && let Some(entry) = registry.entry_by_command(cmd).await
    {
        let plugin_id = entry.spec.id.clone();
        if !entry.spec.enabled {
            info!(plugin = %plugin_id, "Plugin disabled");
            return;
        }
        info!(plugin = %plugin_id, cmd = %cmd, args = %args, "Running command");
        if let Err(e) = entry.plugin.run(ctx, args, &entry.spec).await {
            warn!(error = %e, plugin = %plugin_id, "Plugin failed");
        }
        return;
    }

    for (id, entry) in registry.entries().await {
        if !entry.spec.enabled || !entry.plugin.handles_room_messages() {
            continue;
        }
        debug!(plugin = %id, "Offering message to passive plugin");
        if let Err(e) = entry.plugin.on_room_message(ctx, body, &entry.spec).await {
            warn!(error = %e, plugin = %id, "Plugin failed");
        }
    }
}

fn resolve_password(args: &Args) -> Result<String> {
    // Treat empty env/arg as missing; avoid prompting in non-interactive (Docker) mode.
    if let Some(p) = args
        .password
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Ok(p.to_owned());
    }
    if !std::io::stdin().is_terminal() {
        return Err(anyhow!(
            "No MATRIX_PASSWORD provided and no stored session. In non-interactive mode, set MATRIX_PASSWORD or mount an existing session at {}",
            args.session_file.display()
        ));
    }
    warn!("No password provided via --password or MATRIX_PASSWORD. Prompting...");
    #[cfg(feature = "rpassword")]
    {
        rpassword::prompt_password("Matrix password:")
            .map_err(|e| anyhow!("Failed to read password: {e}"))
    }
    #[cfg(not(feature = "rpassword"))]
    {
        Err(anyhow!(
            "rpassword feature is not enabled. Cannot prompt for password."
        ))
    }
}

/// A missing config file means defaults; a malformed one is an error.
fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        info!(path = %path.display(), "No config file, using defaults");
        return Ok(BotConfig::default());
    }
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {}", path.display()))?;
    let cfg: BotConfig = serde_yaml::from_str(&yaml).context("parsing YAML config")?;
    Ok(cfg)
}

/// Flag or env first, then the config file, then the matrix store directory.
fn commands_path(flag: Option<&Path>, config: &BotConfig, store_dir: &Path) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.commands_file.clone())
        .unwrap_or_else(|| store_dir.join("commands.json"))
}

fn load_session(path: &Path) -> Result<Option<SavedSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading session file at {}", path.display()))?;
    let session: SavedSession = serde_json::from_str(&data).context("parsing session JSON")?;
    Ok(Some(session))
}

fn save_session(path: &Path, session: &SavedSession) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(session)?;
    fs::write(path, data).with_context(|| format!("writing session file at {}", path.display()))?;
    Ok(())
}
