//! Text helpers for rendering media.

use std::sync::LazyLock;

use regex::Regex;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>\n?").expect("valid regex pattern"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex pattern"));

/// Turn an upstream description into plain text: `<br>` becomes a newline
/// (swallowing one newline that follows it) and other tags are dropped.
#[must_use]
pub fn sanitize_description(text: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(text, "\n");
    TAG.replace_all(&with_breaks, "").into_owned()
}

/// Upper-snake enum value as words: `TV_SHORT` -> `Tv Short`.
#[must_use]
pub fn humanize_enum(value: &str) -> String {
    value
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaks_become_newlines() {
        assert_eq!(sanitize_description("one<br>two<BR />three"), "one\ntwo\nthree");
        assert_eq!(sanitize_description("one<br>\ntwo"), "one\ntwo");
    }

    #[test]
    fn other_tags_are_stripped() {
        assert_eq!(
            sanitize_description("<i>Frieren</i> travels <b>on</b>."),
            "Frieren travels on."
        );
        assert_eq!(sanitize_description(""), "");
    }

    #[test]
    fn enum_values_read_as_words() {
        assert_eq!(humanize_enum("TV_SHORT"), "Tv Short");
        assert_eq!(humanize_enum("MANGA"), "Manga");
        assert_eq!(humanize_enum(""), "");
    }
}
