use std::collections::BTreeSet;

use crate::rules::ALL_TABLES;

/// Every advertised trigger, trimmed, deduplicated and sorted.
#[must_use]
pub fn advertised_commands() -> Vec<&'static str> {
    ALL_TABLES
        .iter()
        .filter(|table| table.category.in_help())
        .flat_map(|table| table.triggers())
        .map(str::trim)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[must_use]
pub fn help_message(bot_name: &str) -> String {
    format!(
        "Hi, I'm {name}. I see all traffic in any room I'm invited to, but I promise I don't log anything. \
         You can see and modify my code at https://github.com/whereistanya/screambot\n\
         Commands: {commands}\n\
         Say `{bot_name} custom` to teach me your own.",
        name = capitalize(bot_name),
        commands = advertised_commands().join("; "),
    )
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_standalone_and_starters() {
        let commands = advertised_commands();
        assert!(commands.contains(&"scream"));
        assert!(commands.contains(&"lose it about"));
        assert!(commands.contains(&"botsnack"));
        assert_eq!(commands.iter().filter(|c| **c == "hug").count(), 1);
    }

    #[test]
    fn hides_easter_eggs_and_contain_rules() {
        let commands = advertised_commands();
        assert!(!commands.contains(&"good bot"));
        assert!(!commands.contains(&"patriarchy"));
    }

    #[test]
    fn message_names_the_bot() {
        let text = help_message("screambot");
        assert!(text.starts_with("Hi, I'm Screambot."));
        assert!(text.contains("scream;"));
        assert!(text.contains("`screambot custom`"));
    }
}
