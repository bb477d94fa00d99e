use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::db::Database;

use super::{PlaylistSnapshot, items_from_json, items_to_json};

pub(crate) const CACHE_TTL_HOURS: i64 = 24;

/// Read-time freshness check: a row older than the TTL (or one that fails to
/// parse) counts as absent. `force` treats every row as absent without
/// deleting it; the write after a forced refresh overwrites in place.
pub(crate) fn load_cached(
    db: &Database,
    playlist_id: &str,
    now: DateTime<Utc>,
    force: bool,
) -> Result<Option<PlaylistSnapshot>> {
    if force {
        return Ok(None);
    }

    let Some(row) = db.cache_row(playlist_id)? else {
        return Ok(None);
    };
    let Ok(stored_at) = DateTime::parse_from_rfc3339(&row.stored_at) else {
        return Ok(None);
    };
    let stored_at = stored_at.with_timezone(&Utc);
    if now - stored_at >= Duration::hours(CACHE_TTL_HOURS) {
        return Ok(None);
    }
    let Some(items) = items_from_json(&row.items_json) else {
        return Ok(None);
    };

    Ok(Some(PlaylistSnapshot {
        playlist_id: playlist_id.to_string(),
        items,
        resolved_at: stored_at,
    }))
}

pub(crate) fn store_snapshot(db: &Database, snapshot: &PlaylistSnapshot) -> Result<()> {
    db.put_cache_row(
        &snapshot.playlist_id,
        &items_to_json(&snapshot.items),
        &snapshot.resolved_at.to_rfc3339(),
    )
}
