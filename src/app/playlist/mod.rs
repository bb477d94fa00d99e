mod cache;
mod registry;
mod resolver;

pub(crate) use cache::{load_cached, store_snapshot};
pub(crate) use registry::record_playlist;
pub(crate) use resolver::Resolver;

#[cfg(test)]
pub(crate) use cache::CACHE_TTL_HOURS;
#[cfg(test)]
pub(crate) use resolver::{PRIVATE_VIDEO_TITLE, parse_page};

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MediaItem {
    pub(crate) id: String,
    pub(crate) title: String,
}

#[derive(Debug, Clone)]
pub(crate) struct PlaylistSnapshot {
    pub(crate) playlist_id: String,
    pub(crate) items: Vec<MediaItem>,
    pub(crate) resolved_at: DateTime<Utc>,
}

/// Accepts a bare playlist id or a full watch/playlist URL carrying a `list`
/// query parameter. Anything that does not look like a URL falls through as
/// the trimmed raw input.
pub(crate) fn normalize_playlist_input(raw: &str) -> String {
    let trimmed = raw.trim();
    let looks_like_url =
        trimmed.starts_with("http://") || trimmed.starts_with("https://");
    if !looks_like_url {
        return trimmed.to_string();
    }

    let Some((_, query)) = trimmed.split_once('?') else {
        return trimmed.to_string();
    };
    let query = query.split('#').next().unwrap_or(query);
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=')
            && key == "list"
            && !value.is_empty()
        {
            return value.to_string();
        }
    }
    trimmed.to_string()
}

pub(crate) fn items_to_json(items: &[MediaItem]) -> String {
    let values: Vec<Value> = items
        .iter()
        .map(|item| json!({ "id": item.id, "title": item.title }))
        .collect();
    Value::Array(values).to_string()
}

/// `None` on anything unparsable; corrupt rows are cache misses, not errors.
pub(crate) fn items_from_json(raw: &str) -> Option<Vec<MediaItem>> {
    let parsed: Value = serde_json::from_str(raw).ok()?;
    let entries = parsed.as_array()?;

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = entry.get("id")?.as_str()?;
        let title = entry.get("title")?.as_str()?;
        if id.is_empty() {
            return None;
        }
        items.push(MediaItem {
            id: id.to_string(),
            title: title.to_string(),
        });
    }
    Some(items)
}
