use core::fmt;
use std::sync::{Arc, OnceLock};

use command_store::CommandStore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    content, help,
    parser::{Addressing, ParsedCommand, parse_message},
    rage,
    random::{RandomSource, ThreadRandom},
    rules::{Action, Builtin, CONTAIN, CONVERSATION, RuleMatch, STANDALONE, STARTERS},
    template, text,
};

/// Sentinel handed to the host when the speaker asked to manage custom commands.
pub const OPEN_MANAGE_COMMANDS_UI: &str = "__OPEN_MANAGE_COMMANDS_UI__";

pub const DEFAULT_BOT_NAME: &str = "screambot";
pub const DEFAULT_MAX_COMMAND_LEN: usize = 500;

pub const TOO_LONG_REPLY: &str =
    "Sorry, that's way too much for me to handle. Can you say it in fewer words?";
pub const TALKING_ABOUT_ME_REPLY: &str = "You're talking about me <3";

static EMOJI: OnceLock<Regex> = OnceLock::new();

fn emoji() -> &'static Regex {
    EMOJI.get_or_init(|| Regex::new(r"^:[\w+-]+:$").expect("emoji regex is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Literal name the bot answers to.
    pub bot_name: String,
    /// Longest message, in characters, the bot will try to interpret.
    pub max_command_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bot_name: DEFAULT_BOT_NAME.to_owned(),
            max_command_len: DEFAULT_MAX_COMMAND_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// The host should show the custom command manager instead of replying.
    OpenCommandManager,
}

impl Reply {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::OpenCommandManager => OPEN_MANAGE_COMMANDS_UI,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who sent the message being answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Speaker<'a> {
    pub display_name: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

impl Speaker<'_> {
    fn name(&self) -> &str {
        self.display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("friend")
    }
}

/// Decides what, if anything, to say back to a message.
pub struct Engine {
    config: EngineConfig,
    store: Option<Arc<dyn CommandStore>>,
    random: Arc<dyn RandomSource>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: None,
            random: Arc::new(ThreadRandom),
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CommandStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Entry point for one inbound message. `None` means stay quiet.
    #[must_use]
    pub fn create_response(
        &self,
        message: &str,
        bot_id: &str,
        speaker: &Speaker<'_>,
    ) -> Option<Reply> {
        let addressing = parse_message(message, &self.config.bot_name, bot_id);
        if addressing == Addressing::Irrelevant {
            return None;
        }
        if message.chars().count() > self.config.max_command_len {
            debug!(len = message.len(), "Message too long to interpret");
            return Some(Reply::Text(TOO_LONG_REPLY.to_owned()));
        }

        let reply = match addressing {
            Addressing::Irrelevant => return None,
            Addressing::ThirdParty => Reply::Text(TALKING_ABOUT_ME_REPLY.to_owned()),
            Addressing::Parsed(ParsedCommand {
                command: Some(command),
                is_direct: true,
            }) if !command.trim().is_empty() => self.resolve_command(command, speaker),
            Addressing::Parsed(ParsedCommand { is_direct: true, .. }) => Reply::Text(self.prompt()),
            Addressing::Parsed(ParsedCommand { is_direct: false, .. }) => {
                Reply::Text(self.resolve_ambient(message))
            }
        };
        Some(reply)
    }

    /// Resolves a command already known to be addressed to the bot.
    #[must_use]
    pub fn resolve_command(&self, command: &str, speaker: &Speaker<'_>) -> Reply {
        let command = command.trim();
        if command.chars().count() > self.config.max_command_len {
            return Reply::Text(TOO_LONG_REPLY.to_owned());
        }
        if command.eq_ignore_ascii_case("custom") {
            return Reply::OpenCommandManager;
        }

        let stripped = text::strip_punctuation(command);
        let custom = self.custom_reply(command).or_else(|| {
            (!stripped.is_empty() && stripped != command)
                .then(|| self.custom_reply(&stripped))
                .flatten()
        });
        if let Some(text) = custom {
            debug!(user = ?speaker.user_id, "Matched custom command");
            return Reply::Text(text);
        }

        if let Some(found) = STANDALONE.find(command).or_else(|| STANDALONE.find(&stripped)) {
            return Reply::Text(self.apply(STANDALONE.category.as_str(), found, speaker));
        }

        if emoji().is_match(command) {
            debug!(command, "Amplifying emoji");
            return Reply::Text(format!("{command}{command}{command}!"));
        }

        for table in STARTERS {
            if let Some(found) = table.find(command) {
                return Reply::Text(self.apply(table.category.as_str(), found, speaker));
            }
        }

        if let Some(found) = CONTAIN.find(command) {
            return Reply::Text(self.apply(CONTAIN.category.as_str(), found, speaker));
        }

        debug!(command, "No rule matched");
        Reply::Text(format!(
            "I don't know how to {command}, {speaker}. You can teach me: say `{bot} custom`.",
            speaker = speaker.name(),
            bot = self.config.bot_name,
        ))
    }

    /// Reply to a message that mentions the bot without commanding it.
    #[must_use]
    pub fn resolve_ambient(&self, message: &str) -> String {
        CONVERSATION.find(message).map_or_else(
            || self.prompt(),
            |found| self.apply(CONVERSATION.category.as_str(), found, &Speaker::default()),
        )
    }

    fn prompt(&self) -> String {
        format!(
            "Want me to do something? Start your message with @{}.",
            self.config.bot_name
        )
    }

    /// Exact custom trigger first, then the longest trigger that prefixes the
    /// command followed by more words. Store failures mean no match.
    fn custom_reply(&self, command: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.lookup(command) {
            Ok(Some(response)) => return Some(response),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Custom command lookup failed; using built-in rules");
                return None;
            }
        }

        let commands = match store.list_all() {
            Ok(commands) => commands,
            Err(e) => {
                warn!(error = %e, "Listing custom commands failed; using built-in rules");
                return None;
            }
        };
        commands
            .iter()
            .filter_map(|custom| {
                let rest = text::strip_prefix_ci(command, &custom.trigger)?;
                if !rest.starts_with(char::is_whitespace) {
                    return None;
                }
                let capture = rest.trim();
                (!capture.is_empty()).then_some((custom, capture))
            })
            .max_by_key(|(custom, _)| custom.trigger.chars().count())
            .map(|(custom, capture)| template::render(&custom.response, capture))
    }

    fn apply(&self, category: &str, found: RuleMatch<'_>, speaker: &Speaker<'_>) -> String {
        debug!(category, trigger = found.rule.trigger, "Matched rule");
        match found.rule.action {
            Action::Literal(text) => text.to_owned(),
            Action::Template(t) => template::render(t, found.capture),
            Action::Function(builtin) => self.call(builtin, found.capture, speaker),
        }
    }

    fn call(&self, builtin: Builtin, capture: &str, speaker: &Speaker<'_>) -> String {
        let random = self.random.as_ref();
        match builtin {
            Builtin::Uppercase => capture.to_uppercase(),
            Builtin::Help => help::help_message(&self.config.bot_name),
            Builtin::Quote(category) => content::random_quote(random, category).to_owned(),
            Builtin::Rage => rage::rampage(random, Some(capture), Some(1.0)),
            Builtin::RandomRage => rage::rampage(random, None, None),
            Builtin::Greeting => {
                let who = capture.trim();
                content::random_greeting(random, if who.is_empty() { speaker.name() } else { who })
            }
            Builtin::GreetSpeaker => content::random_greeting(random, speaker.name()),
            Builtin::Reason => format!("Because {}", content::random_reason(random)),
        }
    }
}
