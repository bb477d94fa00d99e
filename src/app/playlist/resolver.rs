use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;

use crate::http::get_text;

use super::MediaItem;

pub(crate) const PRIVATE_VIDEO_TITLE: &str = "Private video";
pub(crate) const DELETED_VIDEO_TITLE: &str = "Deleted video";

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: u32 = 50;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub(crate) struct ResolvedPlaylist {
    pub(crate) items: Vec<MediaItem>,
    pub(crate) warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedPage {
    pub(crate) entries: Vec<MediaItem>,
    pub(crate) received: usize,
    pub(crate) next_page_token: Option<String>,
}

pub(crate) struct Resolver {
    api_base: String,
}

impl Resolver {
    pub(crate) fn new() -> Self {
        Self {
            api_base: YOUTUBE_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_api_base(api_base: &str) -> Self {
        Self {
            api_base: api_base.to_string(),
        }
    }

    /// Walks the paginated listing endpoint and accumulates playable entries.
    /// Any transport, decode, or upstream error stops pagination and keeps
    /// whatever was fetched so far; large playlists survive one bad page at
    /// the cost of a truncated result. Duplicate video ids across pages are
    /// dropped, first seen wins.
    pub(crate) fn resolve(&self, playlist_id: &str, api_key: &str) -> ResolvedPlaylist {
        let mut items: Vec<MediaItem> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part".to_string(), "snippet".to_string()),
                ("maxResults".to_string(), PAGE_SIZE.to_string()),
                ("playlistId".to_string(), playlist_id.to_string()),
                ("key".to_string(), api_key.to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken".to_string(), token.clone()));
            }

            let url = format!("{}/playlistItems", self.api_base);
            let raw = match get_text(&url, &query, CONNECT_TIMEOUT, READ_TIMEOUT) {
                Ok(raw) => raw,
                Err(err) => {
                    warnings.push(format!("playlist fetch stopped early: {err}"));
                    break;
                }
            };

            let page = match parse_page(&raw) {
                Ok(page) => page,
                Err(err) => {
                    warnings.push(format!("playlist fetch stopped early: {err}"));
                    break;
                }
            };

            if page.received == 0 {
                break;
            }
            for entry in page.entries {
                if seen.insert(entry.id.clone()) {
                    items.push(entry);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        ResolvedPlaylist { items, warnings }
    }

    /// Single-shot display-name lookup. Degrades to the playlist id on any
    /// failure; callers never see an error from this path.
    pub(crate) fn resolve_title(&self, playlist_id: &str, api_key: &str) -> String {
        let query = vec![
            ("part".to_string(), "snippet".to_string()),
            ("id".to_string(), playlist_id.to_string()),
            ("key".to_string(), api_key.to_string()),
        ];
        let url = format!("{}/playlists", self.api_base);
        match get_text(&url, &query, CONNECT_TIMEOUT, READ_TIMEOUT) {
            Ok(raw) => parse_playlist_title(&raw).unwrap_or_else(|_| playlist_id.to_string()),
            Err(_) => playlist_id.to_string(),
        }
    }
}

pub(crate) fn parse_page(raw: &str) -> Result<ParsedPage, String> {
    let parsed: Value =
        serde_json::from_str(raw).map_err(|err| format!("response decode failed: {err}"))?;

    if let Some(message) = parsed.pointer("/error/message").and_then(Value::as_str) {
        return Err(format!("upstream error: {message}"));
    }

    let Some(raw_items) = parsed.get("items").and_then(Value::as_array) else {
        return Err("response missing items list".to_string());
    };

    let entries = raw_items
        .iter()
        .filter_map(|item| {
            let id = item
                .pointer("/snippet/resourceId/videoId")
                .and_then(Value::as_str)?
                .trim();
            let title = item.pointer("/snippet/title").and_then(Value::as_str)?.trim();
            if id.is_empty() || title.is_empty() {
                return None;
            }
            if title == PRIVATE_VIDEO_TITLE || title == DELETED_VIDEO_TITLE {
                return None;
            }
            Some(MediaItem {
                id: id.to_string(),
                title: title.to_string(),
            })
        })
        .collect();

    let next_page_token = parsed
        .get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    Ok(ParsedPage {
        entries,
        received: raw_items.len(),
        next_page_token,
    })
}

pub(crate) fn parse_playlist_title(raw: &str) -> Result<String, String> {
    let parsed: Value =
        serde_json::from_str(raw).map_err(|err| format!("response decode failed: {err}"))?;

    if let Some(message) = parsed.pointer("/error/message").and_then(Value::as_str) {
        return Err(format!("upstream error: {message}"));
    }

    parsed
        .pointer("/items/0/snippet/title")
        .and_then(Value::as_str)
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .ok_or_else(|| "response missing playlist title".to_string())
}
