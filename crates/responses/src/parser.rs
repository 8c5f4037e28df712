use std::sync::OnceLock;

use regex::Regex;

use crate::text;

static LEADING_MENTION: OnceLock<Regex> = OnceLock::new();
static LEADING_USER_ID: OnceLock<Regex> = OnceLock::new();

/// `<@IDENTITY>` at the start of a message, optionally followed by `:` or `,`.
fn leading_mention() -> &'static Regex {
    LEADING_MENTION.get_or_init(|| {
        Regex::new(r"(?s)^\s*<@([^>|\s]+)(?:\|[^>]*)?>[:,]?\s*(.*)$")
            .expect("leading mention regex is valid")
    })
}

/// A Matrix user id (`@localpart:server[:port]`) opening a message, optionally
/// followed by `:` or `,`.
fn leading_user_id() -> &'static Regex {
    LEADING_USER_ID.get_or_init(|| {
        Regex::new(r"(?s)^\s*(@[A-Za-z0-9._=/+-]+:[A-Za-z0-9.-]+(?::[0-9]+)?)[:,]?(?:\s+(.*))?$")
            .expect("leading user id regex is valid")
    })
}

/// How a message relates to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing<'a> {
    /// Neither the bot's name nor its identity appears.
    Irrelevant,
    /// Addressed to someone else while talking about the bot.
    ThirdParty,
    Parsed(ParsedCommand<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub command: Option<&'a str>,
    pub is_direct: bool,
}

impl<'a> ParsedCommand<'a> {
    const fn direct(command: &'a str) -> Self {
        Self {
            command: Some(command),
            is_direct: true,
        }
    }

    const fn ambient() -> Self {
        Self {
            command: None,
            is_direct: false,
        }
    }
}

/// Classifies `message` for a bot called `bot_name` whose platform identity
/// is `bot_id`, extracting the command when the bot is addressed.
#[must_use]
pub fn parse_message<'a>(message: &'a str, bot_name: &str, bot_id: &str) -> Addressing<'a> {
    let mentions_id = !bot_id.is_empty() && text::contains_ci(message, bot_id);
    if !mentions_id && !text::contains_ci(message, bot_name) {
        return Addressing::Irrelevant;
    }

    // "@screambot:example.org do a thing" / "@alice:example.org, ask screambot"
    if let Some(caps) = leading_user_id().captures(message) {
        let mentioned = caps.get(1).map_or("", |m| m.as_str());
        if !mentioned.eq_ignore_ascii_case(bot_id) {
            return Addressing::ThirdParty;
        }
        let command = caps.get(2).map_or("", |m| m.as_str()).trim_end();
        return Addressing::Parsed(ParsedCommand::direct(command));
    }

    // "screambot, do a thing" / "@screambot: do a thing"
    let leading = message.trim_start();
    let leading = leading.strip_prefix('@').unwrap_or(leading);
    if let Some(rest) = text::strip_prefix_ci(leading, bot_name)
        && !starts_with_word_char(rest)
    {
        let command = text::skip_address_separators(rest).trim_end();
        return Addressing::Parsed(ParsedCommand::direct(command));
    }

    if let Some(caps) = leading_mention().captures(message) {
        let mentioned = caps.get(1).map_or("", |m| m.as_str());
        if !mentioned.eq_ignore_ascii_case(bot_id) {
            return Addressing::ThirdParty;
        }
        let command = caps.get(2).map_or("", |m| m.as_str()).trim_end();
        return Addressing::Parsed(ParsedCommand::direct(command));
    }

    let tagged = format!("<@{bot_id}>");
    let needles: [&str; 3] = if bot_id.is_empty() {
        [bot_name, "", ""]
    } else {
        [tagged.as_str(), bot_id, bot_name]
    };
    match first_mention(message, &needles) {
        Some(rest) => {
            let command = text::skip_address_separators(rest).trim_end();
            if command.is_empty() {
                Addressing::Parsed(ParsedCommand::ambient())
            } else {
                Addressing::Parsed(ParsedCommand::direct(command))
            }
        }
        None => Addressing::Parsed(ParsedCommand::ambient()),
    }
}

fn starts_with_word_char(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Text after the earliest standalone occurrence of any needle.
fn first_mention<'a>(message: &'a str, needles: &[&str]) -> Option<&'a str> {
    message.char_indices().find_map(|(idx, _)| {
        let tail = &message[idx..];
        needles
            .iter()
            .filter(|needle| !needle.is_empty())
            .find_map(|needle| {
                let rest = text::strip_prefix_ci(tail, needle)?;
                (!starts_with_word_char(rest)).then_some(rest)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "screambot";
    const ID: &str = "UA1234567";

    fn parse(message: &str) -> Addressing<'_> {
        parse_message(message, NAME, ID)
    }

    fn direct(command: &str) -> Addressing<'_> {
        Addressing::Parsed(ParsedCommand::direct(command))
    }

    #[test]
    fn unrelated_messages_are_irrelevant() {
        assert_eq!(parse("lunch anyone?"), Addressing::Irrelevant);
    }

    #[test]
    fn name_prefix_extracts_command() {
        assert_eq!(parse("screambot scream something"), direct("scream something"));
        assert_eq!(parse("Screambot yo"), direct("yo"));
        assert_eq!(parse("@screambot: hug a cat"), direct("hug a cat"));
        assert_eq!(parse("screambot, help!"), direct("help!"));
    }

    #[test]
    fn bare_name_is_direct_with_empty_command() {
        assert_eq!(parse("screambot   "), direct(""));
        assert_eq!(parse("screambot?"), direct(""));
    }

    #[test]
    fn identity_mention_extracts_command() {
        assert_eq!(parse("<@UA1234567> hug"), direct("hug"));
        assert_eq!(parse("<@ua1234567>: scream hi"), direct("scream hi"));
        assert_eq!(parse("<@UA1234567>"), direct(""));
    }

    #[test]
    fn other_identity_is_third_party() {
        assert_eq!(parse("<@UAXXXXXXX> what is screambot?"), Addressing::ThirdParty);
    }

    #[test]
    fn mention_in_the_middle_with_trailing_text_is_direct() {
        assert_eq!(parse("does screambot want a botsnack?"), direct("want a botsnack?"));
        assert_eq!(parse("hey <@UA1234567>, scream hi"), direct("scream hi"));
    }

    #[test]
    fn mention_at_the_end_is_ambient() {
        let ambient = Addressing::Parsed(ParsedCommand::ambient());
        assert_eq!(parse("thanks, @screambot"), ambient);
        assert_eq!(parse("good work, screambot"), ambient);
        assert_eq!(parse("screambots are neat"), ambient);
    }

    #[test]
    fn empty_identity_only_matches_name() {
        assert_eq!(parse_message("screambot hug", NAME, ""), direct("hug"));
        assert_eq!(parse_message("hello there", NAME, ""), Addressing::Irrelevant);
    }

    const MATRIX_ID: &str = "@screambot:example.org";

    #[test]
    fn leading_matrix_id_extracts_command() {
        assert_eq!(parse_message("@screambot:example.org hug", NAME, MATRIX_ID), direct("hug"));
        assert_eq!(
            parse_message("@ScreamBot:example.org: scream hi", NAME, MATRIX_ID),
            direct("scream hi")
        );
        assert_eq!(parse_message("@screambot:example.org", NAME, MATRIX_ID), direct(""));
        assert_eq!(parse_message("@screambot: hug", NAME, MATRIX_ID), direct("hug"));
    }

    #[test]
    fn other_matrix_id_is_third_party() {
        assert_eq!(
            parse_message("@alice:example.org what is screambot?", NAME, MATRIX_ID),
            Addressing::ThirdParty
        );
        assert_eq!(
            parse_message("@screambot:elsewhere.net, is screambot you?", NAME, MATRIX_ID),
            Addressing::ThirdParty
        );
        assert_eq!(
            parse_message("@alice:example.org lunch?", NAME, MATRIX_ID),
            Addressing::Irrelevant
        );
    }
}
