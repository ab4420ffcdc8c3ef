//! Language-aware speech rate estimation.

/// Approximate speaking rate in characters per second, keyed by ISO 639-1 code.
const CHARS_PER_SEC: &[(&str, f64)] = &[("en", 13.0), ("ko", 7.0), ("ja", 8.0), ("zh", 7.0)];

/// Rate used for languages without a table entry.
pub const DEFAULT_CHARS_PER_SEC: f64 = 12.0;

/// Expected characters per second for `language`.
///
/// Only the first two characters are significant, so `en-US` and `EN`
/// both resolve to English.
pub fn estimate_chars_per_sec(language: &str) -> f64 {
    let code: String = language.chars().take(2).collect::<String>().to_lowercase();

    CHARS_PER_SEC
        .iter()
        .find(|(lang, _)| *lang == code)
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_CHARS_PER_SEC)
}
