use std::sync::mpsc;

use anyhow::Result;
use chrono::Utc;
use ratatui::widgets::TableState;

use crate::db::{Database, RegistryEntry};
use crate::player::PlayerControl;

use super::super::sequencer::{Notice, Sequencer};
use super::super::session::{
    FetchedPlaylist, LoadStart, begin_load, fetch_playlist, finish_fetch, lookup_title,
    register_known_playlist,
};
use super::LoadResult;

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

pub(super) fn refresh_entries(
    db: &Database,
    entries: &mut Vec<RegistryEntry>,
    table_state: &mut TableState,
    preferred_id: Option<&str>,
) -> Result<()> {
    *entries = db.list_registry()?;
    if entries.is_empty() {
        table_state.select(None);
        return Ok(());
    }

    if let Some(id) = preferred_id
        && let Some(idx) = entries.iter().position(|entry| entry.playlist_id == id)
    {
        table_state.select(Some(idx));
        return Ok(());
    }

    match table_state.selected() {
        Some(selected) => table_state.select(Some(selected.min(entries.len() - 1))),
        None => table_state.select(Some(0)),
    }
    Ok(())
}

/// Kicks off one load. The cache probe runs inline; a miss moves the network
/// work onto a worker thread whose result comes back through `load_tx`. At
/// most one load is in flight; further requests are ignored with a status
/// note until the current one lands.
#[allow(clippy::too_many_arguments)]
pub(super) fn start_load(
    db: &Database,
    input: &str,
    api_key: Option<&str>,
    force: bool,
    load_in_flight: &mut bool,
    active_playlist: &mut Option<String>,
    sequencer: &mut Sequencer,
    player: &mut dyn PlayerControl,
    load_tx: &mpsc::Sender<LoadResult>,
) -> String {
    if *load_in_flight {
        return status_info("A playlist load is already in progress.");
    }

    let api_key = api_key.unwrap_or("");
    match begin_load(db, input, api_key, force, Utc::now()) {
        Err(err) => status_error(&format!("Load failed: {err}")),
        Ok(LoadStart::CacheHit {
            playlist_id,
            items,
            needs_registration,
        }) => {
            *active_playlist = Some(playlist_id.clone());
            let count = items.len();
            match sequencer.load(items, player) {
                Ok(true) => {
                    if needs_registration {
                        let tx = load_tx.clone();
                        let key = api_key.to_string();
                        std::thread::spawn(move || {
                            let title = lookup_title(&playlist_id, &key);
                            let _ = tx.send(LoadResult::TitleResolved { playlist_id, title });
                        });
                    }
                    status_info(&format!(
                        "Loaded {count} videos from cache. Playing first video."
                    ))
                }
                Ok(false) => status_error("Cached playlist is empty."),
                Err(err) => status_error(&format!("Player error: {err}")),
            }
        }
        Ok(LoadStart::Fetching { playlist_id }) => {
            *load_in_flight = true;
            *active_playlist = Some(playlist_id.clone());
            let tx = load_tx.clone();
            let key = api_key.to_string();
            std::thread::spawn(move || {
                let fetched = fetch_playlist(&playlist_id, &key);
                let _ = tx.send(LoadResult::Fetched(fetched));
            });
            status_info("Fetching playlist...")
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn drain_load_results(
    db: &Database,
    rx: &mpsc::Receiver<LoadResult>,
    load_in_flight: &mut bool,
    entries: &mut Vec<RegistryEntry>,
    table_state: &mut TableState,
    sequencer: &mut Sequencer,
    player: &mut dyn PlayerControl,
    status: &mut String,
) -> Result<()> {
    while let Ok(result) = rx.try_recv() {
        match result {
            LoadResult::Fetched(fetched) => {
                *load_in_flight = false;
                if fetched.items.is_empty() {
                    *status = status_error(&with_warnings(
                        "No videos found.".to_string(),
                        &fetched.warnings,
                    ));
                    continue;
                }

                finish_fetch(db, &fetched, Utc::now())?;
                let count = fetched.items.len();
                let FetchedPlaylist {
                    items, warnings, ..
                } = fetched;
                *status = match sequencer.load(items, player) {
                    Ok(_) => status_info(&with_warnings(
                        format!("Fetched {count} videos. Playing first video."),
                        &warnings,
                    )),
                    Err(err) => status_error(&format!("Player error: {err}")),
                };
                refresh_entries(db, entries, table_state, None)?;
            }
            LoadResult::TitleResolved { playlist_id, title } => {
                register_known_playlist(db, &playlist_id, &title)?;
                refresh_entries(db, entries, table_state, None)?;
            }
        }
    }
    Ok(())
}

pub(super) fn apply_notices(notices: &[Notice], status: &mut String) {
    for notice in notices {
        *status = match notice {
            Notice::NowPlaying {
                title,
                position,
                total,
            } => status_info(&format!("Now playing [{position}/{total}]: {title}")),
            Notice::Skipped { title, code } => {
                status_info(&format!("Skipped unplayable video (code {code}): {title}"))
            }
            Notice::Unplayable { title, code } => {
                status_error(&format!("Playback error {code} on \"{title}\"; not advancing."))
            }
        };
    }
}

fn with_warnings(mut message: String, warnings: &[String]) -> String {
    if !warnings.is_empty() {
        message.push(' ');
        message.push_str(&warnings.join(" | "));
    }
    message
}
