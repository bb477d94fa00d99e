mod actions;
mod render;
mod term;

use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MediaKeyCode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use crate::db::Database;
use crate::player::{PlayerControl, mpv::MpvPlayer};

use super::sequencer::{Sequencer, Trigger};
use super::session::FetchedPlaylist;

use self::actions::{
    apply_notices, drain_load_results, refresh_entries, start_load, status_error, status_info,
};
use self::render::draw_tui;
use self::term::TerminalSession;

/// Results coming back from load worker threads.
#[derive(Debug)]
pub(super) enum LoadResult {
    Fetched(FetchedPlaylist),
    TitleResolved { playlist_id: String, title: String },
}

pub(crate) fn run_tui(db: &Database, api_key: Option<String>) -> Result<()> {
    let mut session = TerminalSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut player = MpvPlayer::spawn()?;
    let mut sequencer = Sequencer::new();
    let mut entries = db.list_registry()?;
    let mut table_state = TableState::default();
    table_state.select((!entries.is_empty()).then_some(0));
    let mut prompt: Option<String> = None;
    let mut load_in_flight = false;
    let mut active_playlist: Option<String> = None;
    let (load_tx, load_rx) = mpsc::channel::<LoadResult>();
    let mut status = if entries.is_empty() {
        status_info("No playlists yet. Press `o` and paste a playlist URL or id.")
    } else {
        status_info("Ready. Enter plays the selected playlist, `o` opens a new one.")
    };

    loop {
        drain_load_results(
            db,
            &load_rx,
            &mut load_in_flight,
            &mut entries,
            &mut table_state,
            &mut sequencer,
            &mut player,
            &mut status,
        )?;
        for player_event in player.poll_events() {
            let notices =
                sequencer.on_player_event(&player_event, Instant::now(), &mut player)?;
            apply_notices(&notices, &mut status);
        }

        terminal.draw(|frame| {
            draw_tui(
                frame,
                &entries,
                &mut table_state,
                &sequencer,
                player.is_playing(),
                load_in_flight,
                &status,
                prompt.as_deref(),
            )
        })?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // While the prompt is open, every key belongs to it; transition keys
        // must not leak through to the player.
        if let Some(buffer) = prompt.as_mut() {
            match key.code {
                KeyCode::Esc => {
                    prompt = None;
                    status = status_info("Load canceled.");
                }
                KeyCode::Enter => {
                    let input = buffer.trim().to_string();
                    prompt = None;
                    status = start_load(
                        db,
                        &input,
                        api_key.as_deref(),
                        false,
                        &mut load_in_flight,
                        &mut active_playlist,
                        &mut sequencer,
                        &mut player,
                        &load_tx,
                    );
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(ch) => buffer.push(ch),
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Char('o') => {
                prompt = Some(String::new());
                status = status_info("Paste a playlist URL or id, then press Enter.");
            }
            KeyCode::Char('r') => {
                let target = active_playlist.clone().or_else(|| {
                    table_state
                        .selected()
                        .and_then(|idx| entries.get(idx))
                        .map(|entry| entry.playlist_id.clone())
                });
                match target {
                    Some(playlist_id) => {
                        status = start_load(
                            db,
                            &playlist_id,
                            api_key.as_deref(),
                            true,
                            &mut load_in_flight,
                            &mut active_playlist,
                            &mut sequencer,
                            &mut player,
                            &load_tx,
                        );
                    }
                    None => status = status_error("Nothing to refresh yet."),
                }
            }
            KeyCode::Enter => {
                let Some(selected) = table_state.selected() else {
                    continue;
                };
                let Some(entry) = entries.get(selected) else {
                    continue;
                };
                let playlist_id = entry.playlist_id.clone();
                status = start_load(
                    db,
                    &playlist_id,
                    api_key.as_deref(),
                    false,
                    &mut load_in_flight,
                    &mut active_playlist,
                    &mut sequencer,
                    &mut player,
                    &load_tx,
                );
            }
            KeyCode::Char('d') => {
                let Some(selected) = table_state.selected() else {
                    status = status_error("No playlist selected.");
                    continue;
                };
                let Some(entry) = entries.get(selected) else {
                    continue;
                };
                let playlist_id = entry.playlist_id.clone();
                let title = entry.title.clone();
                match db.delete_registry(&playlist_id) {
                    Ok(true) => {
                        status = status_info(&format!("Removed from list: {title}"));
                        refresh_entries(db, &mut entries, &mut table_state, None)?;
                    }
                    Ok(false) => {
                        status = status_error("Remove failed: entry no longer exists.");
                        refresh_entries(db, &mut entries, &mut table_state, None)?;
                    }
                    Err(err) => status = status_error(&format!("Remove failed: {err}")),
                }
            }
            KeyCode::Up => {
                if let Some(selected) = table_state.selected() {
                    table_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down => {
                if let Some(selected) = table_state.selected()
                    && !entries.is_empty()
                {
                    let next = (selected + 1).min(entries.len().saturating_sub(1));
                    table_state.select(Some(next));
                }
            }
            KeyCode::Char('n') | KeyCode::Right | KeyCode::Media(MediaKeyCode::TrackNext) => {
                let notice = sequencer.request_next(Trigger::Manual, Instant::now(), &mut player)?;
                apply_notices(notice.as_slice(), &mut status);
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::Media(MediaKeyCode::TrackPrevious) => {
                let notice = sequencer.request_prev(Trigger::Manual, Instant::now(), &mut player)?;
                apply_notices(notice.as_slice(), &mut status);
            }
            KeyCode::Char(' ')
            | KeyCode::Media(MediaKeyCode::Play)
            | KeyCode::Media(MediaKeyCode::Pause)
            | KeyCode::Media(MediaKeyCode::PlayPause) => {
                if sequencer.is_empty() || !sequencer.player_ready() {
                    continue;
                }
                let result = if player.is_playing() {
                    player.pause()
                } else {
                    player.play()
                };
                if let Err(err) = result {
                    status = status_error(&format!("Player error: {err}"));
                }
            }
            _ => {}
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
