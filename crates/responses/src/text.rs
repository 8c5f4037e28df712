//! Case-insensitive matching helpers that keep slices into the original text,
//! so captured text retains the speaker's casing.

/// Returns the part of `text` after `prefix` when `text` starts with it,
/// ignoring case.
#[must_use]
pub fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut want = prefix.chars().flat_map(char::to_lowercase).peekable();
    for (idx, ch) in text.char_indices() {
        if want.peek().is_none() {
            return Some(&text[idx..]);
        }
        for lower in ch.to_lowercase() {
            if want.next() != Some(lower) {
                return None;
            }
        }
    }
    if want.next().is_none() { Some("") } else { None }
}

/// Byte offset of the first case-insensitive occurrence of `needle`, along
/// with the text following it.
#[must_use]
pub fn find_ci<'a>(haystack: &'a str, needle: &str) -> Option<(usize, &'a str)> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .char_indices()
        .find_map(|(idx, _)| strip_prefix_ci(&haystack[idx..], needle).map(|rest| (idx, rest)))
}

#[must_use]
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle).is_some()
}

#[must_use]
pub fn eq_ci(a: &str, b: &str) -> bool {
    strip_prefix_ci(a, b).is_some_and(str::is_empty)
}

/// Drops every punctuation character, so "hug!" compares equal to "hug".
#[must_use]
pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Skips separators that commonly follow an address, as in "screambot, hi".
#[must_use]
pub fn skip_address_separators(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | '?' | '!' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_keeps_original_case() {
        assert_eq!(strip_prefix_ci("Scream Hello World", "scream "), Some("Hello World"));
        assert_eq!(strip_prefix_ci("scream", "scream "), None);
        assert_eq!(strip_prefix_ci("hug", "hug"), Some(""));
        assert_eq!(strip_prefix_ci("", "x"), None);
    }

    #[test]
    fn find_reports_offset() {
        assert_eq!(find_ci("does ScreamBot want", "screambot"), Some((5, " want")));
        assert_eq!(find_ci("nothing here", "screambot"), None);
        assert_eq!(find_ci("héllo screambot!", "screambot"), Some((7, "!")));
    }

    #[test]
    fn equality_and_contains() {
        assert!(eq_ci("Thank You", "thank you"));
        assert!(!eq_ci("thank you!", "thank you"));
        assert!(contains_ci("How about that PATRIARCHY", "patriarchy"));
    }

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(strip_punctuation("hug!"), "hug");
        assert_eq!(strip_punctuation("thank you."), "thank you");
    }

    #[test]
    fn separators_are_skipped() {
        assert_eq!(skip_address_separators(", scream hi"), "scream hi");
        assert_eq!(skip_address_separators(":  "), "");
    }
}
