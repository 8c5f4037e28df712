//! Built-in rule tables.
//!
//! Each table is an immutable, ordered list of rules sharing one matching
//! strategy. Within a table the first matching rule wins.

use crate::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Trigger equals the whole command.
    Exact,
    /// Command starts with the trigger; the rest is captured.
    Prefix,
    /// Trigger appears anywhere; the whole text is captured.
    Substring,
}

/// Behaviors a rule can invoke instead of returning text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Uppercase,
    Help,
    Quote(&'static str),
    /// Rampage through the captured city.
    Rage,
    /// Rampage through a random city at a random intensity.
    RandomRage,
    /// Greet whoever was captured.
    Greeting,
    /// Greet the person who spoke.
    GreetSpeaker,
    Reason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Literal(&'static str),
    /// Text with a [`crate::template::PLACEHOLDER`] for the capture.
    Template(&'static str),
    Function(Builtin),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub trigger: &'static str,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Standalone,
    StarterLong,
    StarterEasterEgg,
    Starter,
    Contain,
    Conversation,
}

impl Category {
    /// Whether the category's triggers are advertised by the help text.
    #[must_use]
    pub const fn in_help(self) -> bool {
        matches!(self, Self::Standalone | Self::StarterLong | Self::Starter)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::StarterLong => "starter-long",
            Self::StarterEasterEgg => "starter-easter-egg",
            Self::Starter => "starter",
            Self::Contain => "contain",
            Self::Conversation => "conversation",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RuleTable {
    pub category: Category,
    pub matcher: Matcher,
    pub rules: &'static [Rule],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub rule: &'static Rule,
    pub capture: &'a str,
}

impl RuleTable {
    /// First rule in this table matching `text`, case-insensitively.
    #[must_use]
    pub fn find<'a>(&self, text: &'a str) -> Option<RuleMatch<'a>> {
        self.rules.iter().find_map(|rule| {
            let capture = match self.matcher {
                Matcher::Exact => text::eq_ci(text, rule.trigger).then_some(text)?,
                Matcher::Prefix => text::strip_prefix_ci(text, rule.trigger)?,
                Matcher::Substring => text::contains_ci(text, rule.trigger).then_some(text)?,
            };
            Some(RuleMatch { rule, capture })
        })
    }

    pub fn triggers(&self) -> impl Iterator<Item = &'static str> {
        self.rules.iter().map(|rule| rule.trigger)
    }
}

const fn say(trigger: &'static str, text: &'static str) -> Rule {
    Rule {
        trigger,
        action: Action::Literal(text),
    }
}

const fn fill(trigger: &'static str, template: &'static str) -> Rule {
    Rule {
        trigger,
        action: Action::Template(template),
    }
}

const fn call(trigger: &'static str, builtin: Builtin) -> Rule {
    Rule {
        trigger,
        action: Action::Function(builtin),
    }
}

const CODE_REPLY: &str = "My code's at https://github.com/whereistanya/screambot. Send Tanya a PR. :computer:";

pub const STANDALONE: RuleTable = RuleTable {
    category: Category::Standalone,
    matcher: Matcher::Exact,
    rules: &[
        say("botsnack", ":cookie:"),
        say("freak out", "*breathes into a paper bag*"),
        say("lose it", "I am kind of losing my shit right now?"),
        say("lose your shit", "I am kind of losing my shit right now?"),
        say("scream", "AAAARRGGHHHHHHHHHHHHHH"),
        say("thank you", "Glad to help <3"),
        say("thanks", "Any time, friend."),
        say("hug", ":virtualhug:"),
        say("flip", "(╯°□°）╯︵ ┻━┻"),
        say(":heart:", ":heart:"),
        say(":poop:", "Seriously."),
        say("yo", "Yo."),
        say(":yo:", "Yo."),
        call("hi", Builtin::GreetSpeaker),
        call("hello", Builtin::GreetSpeaker),
        call("excuse", Builtin::Reason),
    ],
};

/// Multi-word starters, tried before the single-word ones so that a short
/// trigger never truncates a longer phrase's capture.
pub const STARTER_LONG: RuleTable = RuleTable {
    category: Category::StarterLong,
    matcher: Matcher::Prefix,
    rules: &[
        fill(
            "announce that ",
            ":star: :star: EXCUSE ME HI I HAVE AN ANNOUNCEMENT: $what :star: :star:",
        ),
        fill("freak out about ", "I am LOSING MY SHIT about $what right now."),
        fill("lose it about ", "AGH what is the deal with $what?"),
        fill("lose your shit about ", "OH SHIT did you know about $what?"),
        fill("react to ", "EXCUSE ME HI I have opinions about $what"),
        call("what can you ", Builtin::Help),
        call("say hi to ", Builtin::Greeting),
        call("explain why ", Builtin::Reason),
    ],
};

/// Starters left out of the help text.
pub const STARTER_EASTER_EGG: RuleTable = RuleTable {
    category: Category::StarterEasterEgg,
    matcher: Matcher::Prefix,
    rules: &[
        say("you", "I promise to always try."),
        say("is ", "I'm just a small bot making my way in the world."),
        say("i love you", "It's mutual, I promise you."),
        say("<3", "Right back at you <3"),
        say("why ", "I'm a simple bot. It is not for me to speculate."),
        say("good bot", ":heart:"),
    ],
};

pub const STARTER: RuleTable = RuleTable {
    category: Category::Starter,
    matcher: Matcher::Prefix,
    rules: &[
        fill("hug ", ":virtualhug: for $what"),
        fill("blame ", "Grr, $what strikes again."),
        fill("flip ", "(╯°□°）╯︵ $what"),
        fill("hate ", "I hate $what SO MUCH. Ugh, the worst."),
        call("scream ", Builtin::Uppercase),
        call("help", Builtin::Help),
        call("destroy ", Builtin::Rage),
        call("greet ", Builtin::Greeting),
    ],
};

pub const CONTAIN: RuleTable = RuleTable {
    category: Category::Contain,
    matcher: Matcher::Substring,
    rules: &[
        say("botsnack", ":cookie:"),
        say("code", CODE_REPLY),
        say("github", CODE_REPLY),
        say("can you even", "I literally can't even."),
        say("work", "WERK!"),
        say("industry", ":poop::fire:"),
        call("patriarchy", Builtin::Quote("feminism")),
        call("tech", Builtin::Quote("tech")),
        call("destroy", Builtin::RandomRage),
        call("rampage", Builtin::RandomRage),
    ],
};

/// Substring rules for messages that mention the bot without addressing it.
pub const CONVERSATION: RuleTable = RuleTable {
    category: Category::Conversation,
    matcher: Matcher::Substring,
    rules: &[
        say("botsnack", ":cookie:"),
        say(
            "code",
            "My code's at https://github.com/whereistanya/screambot. Send Tanya a PR.",
        ),
        say(
            "github",
            "My code's at https://github.com/whereistanya/screambot. Send Tanya a PR.",
        ),
        say("thank", "Any time."),
        say(":heart:", ":heart_eyes:"),
        say("love", ":heart_eyes:"),
        say("good", ":heart_eyes:"),
    ],
};

/// Starter tables in the order they are consulted.
pub const STARTERS: [RuleTable; 3] = [STARTER_LONG, STARTER_EASTER_EGG, STARTER];

/// Every table, in resolution order.
pub const ALL_TABLES: [RuleTable; 6] = [
    STANDALONE,
    STARTER_LONG,
    STARTER_EASTER_EGG,
    STARTER,
    CONTAIN,
    CONVERSATION,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_starters_are_multi_word() {
        for trigger in STARTER_LONG.triggers() {
            assert!(trigger.trim().contains(' '), "{trigger:?} is not multi-word");
        }
        for trigger in STARTER.triggers() {
            assert!(!trigger.trim().contains(' '), "{trigger:?} belongs in STARTER_LONG");
        }
    }

    #[test]
    fn triggers_are_lowercase() {
        for table in ALL_TABLES {
            for trigger in table.triggers() {
                assert_eq!(trigger, trigger.to_lowercase());
            }
        }
    }

    #[test]
    fn prefix_capture_keeps_case() {
        let found = STARTER.find("Hug A Cat").unwrap();
        assert_eq!(found.rule.trigger, "hug ");
        assert_eq!(found.capture, "A Cat");
    }

    #[test]
    fn exact_requires_whole_command() {
        assert!(STANDALONE.find("Hug").is_some());
        assert!(STANDALONE.find("hug a cat").is_none());
    }

    #[test]
    fn substring_captures_whole_text() {
        let found = CONTAIN.find("how about that Patriarchy").unwrap();
        assert_eq!(found.rule.action, Action::Function(Builtin::Quote("feminism")));
        assert_eq!(found.capture, "how about that Patriarchy");
    }

    #[test]
    fn first_rule_in_table_wins() {
        let found = CONVERSATION.find("thanks for the code").unwrap();
        assert_eq!(found.rule.trigger, "code");
    }

    #[test]
    fn help_categories() {
        assert!(Category::Starter.in_help());
        assert!(!Category::StarterEasterEgg.in_help());
        assert!(!Category::Contain.in_help());
    }
}
