mod playlist;
mod sequencer;
mod session;
#[cfg(unix)]
mod tui;


use anyhow::Result;

use crate::cli::{Cli, Command};
use crate::db::Database;
use crate::paths::database_file_path;

pub fn run(cli: Cli) -> Result<()> {
    let db = open_db()?;
    let api_key = session::resolve_api_key(&db, cli.api_key.as_deref())?;

    match cli.command {
        Some(Command::Play { playlist, refresh }) => {
            run_play(&db, &playlist, api_key.as_deref(), refresh)?
        }
        Some(Command::List) => run_list(&db)?,
        Some(Command::Tui) | None => run_tui(&db, api_key)?,
    }

    Ok(())
}

fn run_list(db: &Database) -> Result<()> {
    let entries = db.list_registry()?;
    if entries.is_empty() {
        println!("No playlists yet. Run `tubeshuffle play <url-or-id>` first.");
        return Ok(());
    }

    println!("{:<44} {:<36}", "TITLE", "PLAYLIST ID");
    for entry in entries {
        println!("{:<44} {:<36}", entry.title, entry.playlist_id);
    }
    Ok(())
}

#[cfg(unix)]
fn run_tui(db: &Database, api_key: Option<String>) -> Result<()> {
    tui::run_tui(db, api_key)
}

#[cfg(not(unix))]
fn run_tui(_db: &Database, _api_key: Option<String>) -> Result<()> {
    Err(anyhow::anyhow!(
        "mpv control uses a unix IPC socket; this platform is not supported"
    ))
}

#[cfg(unix)]
fn run_play(db: &Database, input: &str, api_key: Option<&str>, refresh: bool) -> Result<()> {
    use std::time::{Duration, Instant};

    use anyhow::anyhow;
    use chrono::Utc;

    use crate::player::mpv::MpvPlayer;

    use self::sequencer::{Notice, Sequencer};
    use self::session::LoadStart;

    let api_key = api_key.unwrap_or("");
    let items = match session::begin_load(db, input, api_key, refresh, Utc::now())? {
        LoadStart::CacheHit {
            playlist_id,
            items,
            needs_registration,
        } => {
            println!("Loaded {} videos from cache.", items.len());
            if needs_registration {
                let title = session::lookup_title(&playlist_id, api_key);
                session::register_known_playlist(db, &playlist_id, &title)?;
            }
            items
        }
        LoadStart::Fetching { playlist_id } => {
            println!("Fetching playlist...");
            let fetched = session::fetch_playlist(&playlist_id, api_key);
            for warning in &fetched.warnings {
                eprintln!("Warning: {warning}");
            }
            if fetched.items.is_empty() {
                return Err(anyhow!("no videos found for playlist {playlist_id}"));
            }
            session::finish_fetch(db, &fetched, Utc::now())?;
            println!("Fetched {} videos.", fetched.items.len());
            fetched.items
        }
    };

    let mut player = MpvPlayer::spawn()?;
    let mut sequencer = Sequencer::new();
    sequencer.load(items, &mut player)?;
    println!(
        "Shuffled {} videos. Close the player window to stop.",
        sequencer.len()
    );

    while player.is_running() {
        for event in player.poll_events() {
            let notices = sequencer.on_player_event(&event, Instant::now(), &mut player)?;
            for notice in &notices {
                match notice {
                    Notice::NowPlaying {
                        title,
                        position,
                        total,
                    } => println!("Now playing [{position}/{total}]: {title}"),
                    Notice::Skipped { title, code } => {
                        eprintln!("Warning: skipped unplayable video (code {code}): {title}");
                    }
                    Notice::Unplayable { title, code } => {
                        eprintln!("Playback error {code} on \"{title}\"; not advancing.");
                    }
                }
            }
        }
        std::thread::sleep(Duration::from_millis(200));
    }
    Ok(())
}

#[cfg(not(unix))]
fn run_play(_db: &Database, _input: &str, _api_key: Option<&str>, _refresh: bool) -> Result<()> {
    Err(anyhow::anyhow!(
        "mpv control uses a unix IPC socket; this platform is not supported"
    ))
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}
