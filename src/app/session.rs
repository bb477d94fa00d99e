use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};

use crate::db::Database;

use super::playlist::{
    MediaItem, PlaylistSnapshot, Resolver, load_cached, normalize_playlist_input, record_playlist,
    store_snapshot,
};

pub(crate) const API_KEY_SETTING: &str = "api_key";

/// First half of a load: input validation, identifier normalization, and the
/// cache probe. The network half runs separately so the TUI can push it onto
/// a worker thread while the database stays on the main thread.
#[derive(Debug, Clone)]
pub(crate) enum LoadStart {
    CacheHit {
        playlist_id: String,
        items: Vec<MediaItem>,
        needs_registration: bool,
    },
    Fetching {
        playlist_id: String,
    },
}

/// Worker-thread result of resolving one playlist upstream.
#[derive(Debug, Clone)]
pub(crate) struct FetchedPlaylist {
    pub(crate) playlist_id: String,
    pub(crate) items: Vec<MediaItem>,
    pub(crate) title: String,
    pub(crate) warnings: Vec<String>,
}

pub(crate) fn begin_load(
    db: &Database,
    raw_input: &str,
    api_key: &str,
    force: bool,
    now: DateTime<Utc>,
) -> Result<LoadStart> {
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key required: pass --api-key once to store it"));
    }
    let playlist_id = normalize_playlist_input(raw_input);
    if playlist_id.is_empty() {
        return Err(anyhow!("playlist URL or id required"));
    }

    if let Some(snapshot) = load_cached(db, &playlist_id, now, force)? {
        let needs_registration = !db.registry_contains(&playlist_id)?;
        return Ok(LoadStart::CacheHit {
            playlist_id: snapshot.playlist_id,
            items: snapshot.items,
            needs_registration,
        });
    }

    Ok(LoadStart::Fetching { playlist_id })
}

/// Network half of a cache miss; safe to run off the main thread. Resolves
/// the item list and the display title in one trip so the registry insert
/// back on the main thread needs no further I/O.
pub(crate) fn fetch_playlist(playlist_id: &str, api_key: &str) -> FetchedPlaylist {
    let resolver = Resolver::new();
    let resolved = resolver.resolve(playlist_id, api_key);
    let title = resolver.resolve_title(playlist_id, api_key);
    FetchedPlaylist {
        playlist_id: playlist_id.to_string(),
        items: resolved.items,
        title,
        warnings: resolved.warnings,
    }
}

/// Persists a completed fetch: snapshot first, then the registry entry. An
/// empty fetch stores nothing; the caller surfaces that as a user-visible
/// error rather than a silent no-op.
pub(crate) fn finish_fetch(db: &Database, fetched: &FetchedPlaylist, now: DateTime<Utc>) -> Result<()> {
    if fetched.items.is_empty() {
        return Ok(());
    }
    let snapshot = PlaylistSnapshot {
        playlist_id: fetched.playlist_id.clone(),
        items: fetched.items.clone(),
        resolved_at: now,
    };
    store_snapshot(db, &snapshot)?;
    record_playlist(db, &fetched.playlist_id, || fetched.title.clone())
}

/// Worker-safe title lookup for the cache-hit registration path.
pub(crate) fn lookup_title(playlist_id: &str, api_key: &str) -> String {
    Resolver::new().resolve_title(playlist_id, api_key)
}

/// Cache-hit path registration: the title lookup already happened on a worker
/// thread, the insert happens here.
pub(crate) fn register_known_playlist(db: &Database, playlist_id: &str, title: &str) -> Result<()> {
    record_playlist(db, playlist_id, || title.to_string())
}

/// A key passed on the command line wins and is persisted for later runs;
/// otherwise the stored one is used.
pub(crate) fn resolve_api_key(db: &Database, cli_key: Option<&str>) -> Result<Option<String>> {
    match cli_key {
        Some(key) if !key.trim().is_empty() => {
            let key = key.trim().to_string();
            db.set_setting(API_KEY_SETTING, &key)?;
            Ok(Some(key))
        }
        _ => db.setting(API_KEY_SETTING),
    }
}
