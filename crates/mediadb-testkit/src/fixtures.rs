//! JSON fixtures shaped like the catalog's upstream responses.

use serde_json::{Value, json};

/// A media item with the fields list views select.
#[must_use]
pub fn media(id: u64) -> Value {
    json!({
        "id": id,
        "title": {
            "romaji": format!("Title {id}"),
            "english": null,
            "native": null
        },
        "coverImage": {
            "large": format!("https://img.example/{id}.jpg"),
            "color": null
        },
        "averageScore": 80,
        "popularity": 1000 + id,
        "episodes": 12,
        "format": "TV",
        "season": "SPRING",
        "seasonYear": 2024
    })
}

/// `data` payload of a page query holding `ids`.
#[must_use]
pub fn page_data(ids: &[u64], has_next_page: bool) -> Value {
    json!({
        "Page": {
            "pageInfo": { "hasNextPage": has_next_page },
            "media": ids.iter().copied().map(media).collect::<Vec<_>>()
        }
    })
}

/// `data` payload of a page query with `count` consecutive ids for `page`.
#[must_use]
pub fn numbered_page_data(page: u64, per_page: u64, count: u64, has_next_page: bool) -> Value {
    let first = page.saturating_sub(1) * per_page + 1;
    let ids: Vec<u64> = (first..first + count).collect();
    page_data(&ids, has_next_page)
}

/// Full GraphQL error body.
#[must_use]
pub fn graphql_error(message: &str, status: Option<u16>) -> Value {
    let mut error = json!({ "message": message, "locations": [] });
    if let Some(status) = status {
        error["status"] = json!(status);
    }
    json!({ "data": null, "errors": [error] })
}
