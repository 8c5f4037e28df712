use crate::{
    random::{RandomSource, choose},
    template,
};

pub const DEFAULT_QUOTE_CATEGORY: &str = "tech";

const FEMINISM_QUOTES: &[&str] = &[
    "\"I am deliberate and afraid of nothing.\" -- Audre Lorde",
    "\"Freedom cannot be achieved unless women have been emancipated from all forms of oppression.\" -- Nelson Mandela",
    "\"I've never been interested in being invisible and erased.\" -- Laverne Cox",
    "\"[Unlikeable women] accept the consequences of their choices, and those consequences become stories worth reading.\" -- Roxane Gay",
    "\"I want to be respected in all my femaleness. Because I deserve to be.\" -- Chimamanda Ngozi Adichie",
    "\"No woman can call herself free who does not own and control her own body.\" -- Margaret Sanger",
    "\"Nolite te bastardes carborundorum.\" -- Margaret Atwood",
    "\"There is no gate, no lock, no bolt that you can set upon the freedom of my mind.\" -- Virginia Woolf",
    "\"If one man can destroy everything, why can't one girl change it?\" -- Malala Yousafzai",
    "\"Time is on the side of change.\" -- Ruth Bader Ginsburg",
    "\"Some people really feel uncomfortable around women who don't hate themselves. So that's why you need to be a little bit brave.\" -- Mindy Kaling",
    "\"We're all building our world, right now, in real time.\" -- Lindy West",
    "\"So use that anger. You write it. You paint it. You dance it. You march it. You vote it. You do everything about it. You talk it. Never stop talking it.\" -- Maya Angelou",
    "\"If we do not share our stories and shine a light on inequities, things will not change.\" -- Ellen Pao",
];

const TECH_QUOTES: &[&str] = &[
    "\"I also say to my team: Do 10% of your job shittily. It's okay to do something shittily. Perfectionism prevents us from taking double steps in our career.\" -- Reshma Saujani",
    "\"I am a big supporter of the minimum viable product and taking something that is the simplest explanation of your idea and putting it into the marketplace so you can start to get feedback.\" -- Kathryn Minshew",
    "\"Feeling a little uncomfortable with your skills is a sign of learning, and continuous learning is what the tech industry thrives on!\" -- Vanessa Hurst",
    "\"The most dangerous phrase in the language is: we've always done it this way.\" -- Grace Hopper",
];

const QUOTES: &[(&str, &[&str])] = &[("feminism", FEMINISM_QUOTES), ("tech", TECH_QUOTES)];

const REASONS: &[&str] = &[
    "Mercury is in retrograde.",
    "it's always DNS.",
    "somebody deployed on a Friday.",
    "the cloud is just someone else's computer.",
    "the intern had root.",
    "a cosmic ray flipped a bit.",
    "it worked on my machine.",
    "the cache was lying.",
    "nobody read the README.",
];

const GREETINGS: &[&str] = &[
    "Hi $what!",
    "HELLO $what!!!",
    "Oh hey $what :wave:",
    "$what! Good to see you.",
    "AAAH HI $what",
];

pub const CITIES: &[&str] = &[
    "Tokyo",
    "New York",
    "London",
    "Dublin",
    "San Francisco",
    "Seattle",
    "Paris",
    "Sydney",
    "Berlin",
    "Mumbai",
    "Lagos",
    "Toronto",
    "Zurich",
    "Mexico City",
];

/// Names of every quote category.
pub fn quote_categories() -> impl Iterator<Item = &'static str> {
    QUOTES.iter().map(|(name, _)| *name)
}

fn quotes_for(category: &str) -> &'static [&'static str] {
    QUOTES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(category.trim()))
        .or_else(|| QUOTES.iter().find(|(name, _)| *name == DEFAULT_QUOTE_CATEGORY))
        .map_or(TECH_QUOTES, |(_, list)| list)
}

/// Random quote from `category`, falling back to the default category for
/// unknown keys.
#[must_use]
pub fn random_quote(random: &dyn RandomSource, category: &str) -> &'static str {
    choose(random, quotes_for(category)).copied().unwrap_or(TECH_QUOTES[0])
}

#[must_use]
pub fn random_reason(random: &dyn RandomSource) -> &'static str {
    choose(random, REASONS).copied().unwrap_or(REASONS[0])
}

/// Random greeting addressed to `who`.
#[must_use]
pub fn random_greeting(random: &dyn RandomSource, who: &str) -> String {
    let greeting = choose(random, GREETINGS).copied().unwrap_or(GREETINGS[0]);
    template::render(greeting, who)
}

#[must_use]
pub fn random_city(random: &dyn RandomSource) -> &'static str {
    choose(random, CITIES).copied().unwrap_or(CITIES[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FixedRandom, SeededRandom};

    #[test]
    fn quote_comes_from_requested_category() {
        let random = SeededRandom::new(3);
        for _ in 0..20 {
            assert!(FEMINISM_QUOTES.contains(&random_quote(&random, "feminism")));
            assert!(FEMINISM_QUOTES.contains(&random_quote(&random, "Feminism")));
        }
    }

    #[test]
    fn unknown_category_falls_back_to_default() {
        let random = SeededRandom::new(11);
        for _ in 0..20 {
            assert!(TECH_QUOTES.contains(&random_quote(&random, "no-such-category")));
        }
        assert_eq!(random_quote(&FixedRandom::default(), ""), TECH_QUOTES[0]);
    }

    #[test]
    fn fixed_source_is_reproducible() {
        let random = FixedRandom::default();
        assert_eq!(random_reason(&random), "Mercury is in retrograde.");
        assert_eq!(random_greeting(&random, "Tanya"), "Hi Tanya!");
        assert_eq!(random_city(&random), "Tokyo");
    }

    #[test]
    fn categories_are_listed() {
        let names: Vec<_> = quote_categories().collect();
        assert_eq!(names, ["feminism", "tech"]);
    }
}
