use anyhow::Result;

use crate::db::Database;

/// Idempotent upsert: a playlist already in the registry is left untouched,
/// title included. The lookup only runs for new entries, so registering an
/// unknown playlist costs one network round-trip before the entry becomes
/// visible.
// TODO: lookups for several new playlists serialize; batch them if the
// selection UI ever registers more than one at a time.
pub(crate) fn record_playlist<F>(db: &Database, playlist_id: &str, lookup_title: F) -> Result<()>
where
    F: FnOnce() -> String,
{
    if db.registry_contains(playlist_id)? {
        return Ok(());
    }
    let title = lookup_title();
    db.insert_registry(playlist_id, &title)
}
