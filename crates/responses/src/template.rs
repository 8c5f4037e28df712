/// Marker replaced with the captured text.
pub const PLACEHOLDER: &str = "$what";

/// Substitutes `capture` for every [`PLACEHOLDER`] in `template`.
///
/// Substitution is literal: the capture is never expanded again, and a
/// template without the marker comes back unchanged.
#[must_use]
pub fn render(template: &str, capture: &str) -> String {
    if template.contains(PLACEHOLDER) {
        template.replace(PLACEHOLDER, capture)
    } else {
        template.to_owned()
    }
}
