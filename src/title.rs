// Library title normalization
// Turns "Show: Subtitle (2019) (Extended)" into a plain search string

use regex::Regex;
use std::sync::LazyLock;

static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(\d{4}\)").unwrap());
static RE_MAIN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)(?::\s*(.*))?(\(\d{4}\))?(?:\s*\(.*?\))?$").unwrap()
});

/// Derive the canonical search string for a raw library title.
///
/// Year parentheticals are dropped wherever they appear, then the segment
/// before the first colon (and before any trailing parenthetical) is kept.
/// Falls back to the input when nothing usable remains.
pub fn normalize(raw_title: &str) -> String {
    let without_year = RE_YEAR.replace_all(raw_title, "");

    let Some(caps) = RE_MAIN_NAME.captures(&without_year) else {
        return raw_title.to_string();
    };

    let main = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    if !main.is_empty() {
        return main.to_string();
    }

    // Leading colon: the subtitle is all there is
    let subtitle = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
    if !subtitle.is_empty() {
        return subtitle.to_string();
    }

    raw_title.to_string()
}
