//! Plain-text rendering of catalog entries.

use std::fmt::Write as _;

use mediadb_catalog::{MediaDetail, MediaSummary, humanize_enum, sanitize_description};

/// One list line: `  1. Title (TV, 2023) - 91%`.
pub fn summary_line(position: usize, media: &MediaSummary) -> String {
    let mut line = format!("{position:>3}. {}", media.title.display());

    let facts: Vec<String> = [
        media.format.as_deref().map(humanize_enum),
        media.season_year.map(|year| year.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !facts.is_empty() {
        let _ = write!(line, " ({})", facts.join(", "));
    }
    if let Some(score) = media.average_score {
        let _ = write!(line, " - {score}%");
    }
    line
}

/// Multi-line detail view.
pub fn detail(media: &MediaDetail) -> String {
    let mut out = String::new();
    let title = media.title.display();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));

    if let Some(native) = media.title.native.as_deref().filter(|n| *n != title) {
        field(&mut out, "Native", native);
    }
    if let Some(format) = &media.format {
        field(&mut out, "Format", &humanize_enum(format));
    }
    if let Some(status) = &media.status {
        field(&mut out, "Status", &humanize_enum(status));
    }
    if let Some(episodes) = media.episodes {
        let episodes = media.duration.map_or_else(
            || episodes.to_string(),
            |minutes| format!("{episodes} x {minutes} min"),
        );
        field(&mut out, "Episodes", &episodes);
    }
    match (media.season.as_deref(), media.season_year) {
        (Some(season), Some(year)) => {
            field(&mut out, "Season", &format!("{} {year}", humanize_enum(season)));
        }
        (None, Some(year)) => field(&mut out, "Season", &year.to_string()),
        _ => {}
    }
    let start = media.start_date.unwrap_or_default().to_string();
    let end = media.end_date.unwrap_or_default().to_string();
    match (start.is_empty(), end.is_empty()) {
        (false, false) => field(&mut out, "Aired", &format!("{start} to {end}")),
        (false, true) => field(&mut out, "Aired", &start),
        _ => {}
    }
    if let Some(score) = media.average_score {
        field(&mut out, "Score", &format!("{score}%"));
    }
    if let Some(popularity) = media.popularity {
        field(&mut out, "Popularity", &popularity.to_string());
    }
    if let Some(studios) = &media.studios {
        let names: Vec<&str> = studios.main_studios().map(|s| s.name.as_str()).collect();
        if !names.is_empty() {
            field(&mut out, "Studios", &names.join(", "));
        }
    }
    if !media.genres.is_empty() {
        field(&mut out, "Genres", &media.genres.join(", "));
    }
    let tags: Vec<&str> = media
        .tags
        .iter()
        .filter(|tag| !tag.is_spoiler())
        .map(|tag| tag.name.as_str())
        .collect();
    if !tags.is_empty() {
        field(&mut out, "Tags", &tags.join(", "));
    }
    if let Some(next) = media.next_airing_episode.and_then(|next| next.episode) {
        field(&mut out, "Next episode", &next.to_string());
    }
    if let Some(url) = &media.site_url {
        field(&mut out, "Link", url);
    }

    if let Some(description) = media.description.as_deref() {
        let text = sanitize_description(description);
        let text = text.trim();
        if !text.is_empty() {
            let _ = write!(out, "\n{text}\n");
        }
    }
    out
}

fn field(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{:<13} {value}", format!("{label}:"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(value: serde_json::Value) -> MediaSummary {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn summary_line_includes_known_facts() {
        let media = summary(serde_json::json!({
            "id": 1,
            "title": {"english": "Frieren"},
            "format": "TV_SHORT",
            "seasonYear": 2023,
            "averageScore": 91
        }));
        assert_eq!(summary_line(1, &media), "  1. Frieren (Tv Short, 2023) - 91%");
    }

    #[test]
    fn summary_line_skips_missing_facts() {
        let media = summary(serde_json::json!({"id": 2, "title": {}}));
        assert_eq!(summary_line(12, &media), " 12. Untitled");
    }

    #[test]
    fn detail_hides_spoiler_tags_and_markup() {
        let media: MediaDetail = serde_json::from_value(serde_json::json!({
            "id": 5,
            "title": {"romaji": "Mushishi"},
            "format": "TV",
            "episodes": 26,
            "duration": 25,
            "startDate": {"year": 2005, "month": 10, "day": 23},
            "endDate": {"year": 2006, "month": 6, "day": 19},
            "tags": [
                {"name": "Iyashikei"},
                {"name": "Twist", "isMediaSpoiler": true}
            ],
            "description": "Ginko travels.<br><br>\n<i>Mushi</i> appear."
        }))
        .unwrap();

        let text = detail(&media);
        assert!(text.starts_with("Mushishi\n========\n"));
        assert!(text.contains("Episodes:     26 x 25 min\n"));
        assert!(text.contains("Aired:        2005-10-23 to 2006-06-19\n"));
        assert!(text.contains("Tags:         Iyashikei\n"));
        assert!(!text.contains("Twist"));
        assert!(text.ends_with("Ginko travels.\n\nMushi appear.\n"));
    }
}
