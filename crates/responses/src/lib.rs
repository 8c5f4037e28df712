//! Response resolution for screambot.
//!
//! [`Engine::create_response`] takes one chat message and decides what, if
//! anything, to say back: custom commands first, then the built-in rule
//! tables in [`rules`] (standalone, starters, contain), and finally a
//! "don't know how" fallback. Messages that only mention the bot are answered
//! from the conversation table.

pub mod content;
mod engine;
pub mod help;
pub mod parser;
pub mod rage;
pub mod random;
pub mod rules;
pub mod template;
pub mod text;

pub use engine::{
    DEFAULT_BOT_NAME, DEFAULT_MAX_COMMAND_LEN, Engine, EngineConfig, OPEN_MANAGE_COMMANDS_UI,
    Reply, Speaker, TALKING_ABOUT_ME_REPLY, TOO_LONG_REPLY,
};
pub use parser::{Addressing, ParsedCommand, parse_message};
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
