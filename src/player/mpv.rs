use std::env;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command as ProcessCommand, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};

use crate::paths::mpv_socket_path;

use super::{ERR_PLAYBACK, ERR_UNAVAILABLE, PlayerControl, PlayerEvent, PlayerState};

const CONNECT_DEADLINE: Duration = Duration::from_secs(10);
const CONNECT_POLL: Duration = Duration::from_millis(100);

pub(crate) fn resolve_mpv_bin() -> PathBuf {
    resolve_mpv_bin_from_env(env::var_os("TUBESHUFFLE_MPV_BIN"))
}

pub(crate) fn resolve_mpv_bin_from_env(env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from("mpv"),
    }
}

/// mpv driven over its JSON IPC socket. The process is spawned idle and
/// detached from the terminal; a connector thread waits for the socket to
/// appear, then a reader thread forwards IPC lines as `PlayerEvent`s. Nothing
/// is written to the socket until the `Ready` event has been observed, which
/// the sequencer's readiness gate guarantees.
pub(crate) struct MpvPlayer {
    child: Child,
    socket: PathBuf,
    writer: Option<UnixStream>,
    conn_rx: mpsc::Receiver<std::io::Result<UnixStream>>,
    event_rx: mpsc::Receiver<PlayerEvent>,
    event_tx: mpsc::Sender<PlayerEvent>,
    playing: bool,
    loaded: bool,
}

impl MpvPlayer {
    pub(crate) fn spawn() -> Result<Self> {
        let socket = mpv_socket_path();
        let _ = std::fs::remove_file(&socket);

        let bin = resolve_mpv_bin();
        let child = ProcessCommand::new(&bin)
            .arg("--idle=yes")
            .arg("--really-quiet")
            .arg("--no-terminal")
            .arg("--force-window=yes")
            .arg(format!("--input-ipc-server={}", socket.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch {}", bin.display()))?;

        let (conn_tx, conn_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let connect_target = socket.clone();
        std::thread::spawn(move || {
            let _ = conn_tx.send(connect_with_deadline(&connect_target, CONNECT_DEADLINE));
        });

        Ok(Self {
            child,
            socket,
            writer: None,
            conn_rx,
            event_rx,
            event_tx,
            playing: false,
            loaded: false,
        })
    }

    /// Non-blocking drain of pending player events. Emits `Ready` exactly
    /// once, when the connector thread hands over the socket.
    pub(crate) fn poll_events(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();

        if self.writer.is_none()
            && let Ok(connected) = self.conn_rx.try_recv()
        {
            match connected {
                Ok(stream) => {
                    if self.attach(stream).is_ok() {
                        events.push(PlayerEvent::Ready);
                    }
                }
                // a failed IPC handshake surfaces as a plain playback failure
                Err(_) => events.push(PlayerEvent::Error { code: ERR_PLAYBACK }),
            }
        }

        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                PlayerEvent::StateChange(PlayerState::Playing) => self.playing = true,
                PlayerEvent::StateChange(PlayerState::Paused) => self.playing = false,
                PlayerEvent::StateChange(PlayerState::Ended) => {
                    self.playing = false;
                    self.loaded = false;
                }
                PlayerEvent::Error { .. } => {
                    self.playing = false;
                    self.loaded = false;
                }
                PlayerEvent::Ready => {}
            }
            events.push(event);
        }

        events
    }

    pub(crate) fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn attach(&mut self, stream: UnixStream) -> Result<()> {
        let reader_stream = stream.try_clone().context("failed to clone mpv socket")?;
        let tx = self.event_tx.clone();
        std::thread::spawn(move || read_ipc_events(reader_stream, tx));

        self.writer = Some(stream);
        self.send_command(&json!(["observe_property", 1, "pause"]))?;
        Ok(())
    }

    fn send_command(&mut self, command: &Value) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| anyhow!("mpv IPC socket not connected yet"))?;
        let line = json!({ "command": command }).to_string();
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .context("failed writing to mpv IPC socket")
    }
}

impl PlayerControl for MpvPlayer {
    fn load_by_id(&mut self, video_id: &str) -> Result<()> {
        let target = format!("ytdl://{video_id}");
        self.send_command(&json!(["loadfile", target, "replace"]))?;
        self.send_command(&json!(["set_property", "pause", false]))?;
        self.loaded = true;
        self.playing = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.send_command(&json!(["set_property", "pause", false]))?;
        self.playing = self.loaded;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.send_command(&json!(["set_property", "pause", true]))?;
        self.playing = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if self.writer.is_some() {
            let _ = self.send_command(&json!(["quit"]));
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.socket);
    }
}

fn connect_with_deadline(socket: &std::path::Path, deadline: Duration) -> std::io::Result<UnixStream> {
    let started = Instant::now();
    loop {
        match UnixStream::connect(socket) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                if started.elapsed() >= deadline {
                    return Err(err);
                }
                std::thread::sleep(CONNECT_POLL);
            }
        }
    }
}

fn read_ipc_events(stream: UnixStream, tx: mpsc::Sender<PlayerEvent>) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        let Ok(parsed) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        let Some(event) = translate_ipc_event(&parsed) else {
            continue;
        };
        if tx.send(event).is_err() {
            break;
        }
    }
}

/// Maps raw mpv IPC events onto the player contract. Load failures are almost
/// always unavailable or restricted content when streaming by video id, so
/// `end-file` with an error reason maps to the unavailable code; everything
/// else surfaces as a plain playback failure.
pub(crate) fn translate_ipc_event(parsed: &Value) -> Option<PlayerEvent> {
    match parsed.get("event").and_then(Value::as_str) {
        Some("end-file") => match parsed.get("reason").and_then(Value::as_str) {
            Some("eof") => Some(PlayerEvent::StateChange(PlayerState::Ended)),
            Some("error") => {
                let code = if parsed.get("file_error").and_then(Value::as_str).is_some() {
                    ERR_UNAVAILABLE
                } else {
                    ERR_PLAYBACK
                };
                Some(PlayerEvent::Error { code })
            }
            _ => None,
        },
        Some("property-change") => {
            if parsed.get("name").and_then(Value::as_str) != Some("pause") {
                return None;
            }
            match parsed.get("data").and_then(Value::as_bool) {
                Some(true) => Some(PlayerEvent::StateChange(PlayerState::Paused)),
                Some(false) => Some(PlayerEvent::StateChange(PlayerState::Playing)),
                None => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_mpv_bin_defaults_to_mpv() {
        assert_eq!(resolve_mpv_bin_from_env(None), PathBuf::from("mpv"));
        assert_eq!(
            resolve_mpv_bin_from_env(Some(OsString::new())),
            PathBuf::from("mpv")
        );
    }

    #[test]
    fn resolve_mpv_bin_honors_override() {
        assert_eq!(
            resolve_mpv_bin_from_env(Some(OsString::from("/opt/mpv/bin/mpv"))),
            PathBuf::from("/opt/mpv/bin/mpv")
        );
    }

    #[test]
    fn end_of_file_becomes_ended_state() {
        let raw = json!({ "event": "end-file", "reason": "eof" });
        assert_eq!(
            translate_ipc_event(&raw),
            Some(PlayerEvent::StateChange(PlayerState::Ended))
        );
    }

    #[test]
    fn load_error_maps_to_unavailable_code() {
        let raw = json!({ "event": "end-file", "reason": "error", "file_error": "loading failed" });
        assert_eq!(
            translate_ipc_event(&raw),
            Some(PlayerEvent::Error { code: ERR_UNAVAILABLE })
        );
    }

    #[test]
    fn pause_property_changes_map_to_states() {
        let paused = json!({ "event": "property-change", "name": "pause", "data": true });
        let playing = json!({ "event": "property-change", "name": "pause", "data": false });
        assert_eq!(
            translate_ipc_event(&paused),
            Some(PlayerEvent::StateChange(PlayerState::Paused))
        );
        assert_eq!(
            translate_ipc_event(&playing),
            Some(PlayerEvent::StateChange(PlayerState::Playing))
        );
    }

    #[test]
    fn user_stop_is_not_an_ended_event() {
        let raw = json!({ "event": "end-file", "reason": "stop" });
        assert_eq!(translate_ipc_event(&raw), None);
    }
}
