use crate::{content, random::RandomSource};

/// Intensities below this get the deadpan follow-up.
pub const CALM_THRESHOLD: f64 = 0.2;

pub const DEADPAN_REMARK: &str = "...just kidding, I hear it's lovely this time of year.";

/// Fixed-format rampage through `city`. Deterministic.
#[must_use]
pub fn rage(city: &str, intensity: f64) -> String {
    let line = format!(":t-rex: RARRRRR DESTROY {} :t-rex:", city.trim().to_uppercase());
    if intensity < CALM_THRESHOLD {
        format!("{line}\n{DEADPAN_REMARK}")
    } else {
        line
    }
}

/// Rampage with any missing input drawn from `random`: a blank or absent
/// city picks one from [`content::CITIES`], an absent intensity draws a
/// fresh value.
#[must_use]
pub fn rampage(random: &dyn RandomSource, city: Option<&str>, intensity: Option<f64>) -> String {
    let city = city
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| content::random_city(random));
    let intensity = intensity.unwrap_or_else(|| random.unit());
    rage(city, intensity)
}
