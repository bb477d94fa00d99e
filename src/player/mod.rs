#[cfg(unix)]
pub(crate) mod mpv;

use anyhow::Result;

/// Playback error codes, kept on the code space the embedded web player uses
/// so the skip policy reads the same everywhere: 100 content removed or
/// missing, 101/150 playback restricted by the owner, anything else a plain
/// playback failure.
pub(crate) const ERR_UNAVAILABLE: u32 = 100;
pub(crate) const ERR_RESTRICTED: u32 = 101;
pub(crate) const ERR_RESTRICTED_ALT: u32 = 150;
pub(crate) const ERR_PLAYBACK: u32 = 5;

/// Codes the upstream player documents as unrecoverable for this item;
/// playback should skip past them without bothering the user.
pub(crate) fn error_is_skippable(code: u32) -> bool {
    matches!(code, ERR_UNAVAILABLE | ERR_RESTRICTED | ERR_RESTRICTED_ALT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayerState {
    Playing,
    Paused,
    Ended,
}

/// Inbound notifications from the external player, drained by the event loop
/// and fed to the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlayerEvent {
    Ready,
    StateChange(PlayerState),
    Error { code: u32 },
}

/// The narrow contract the sequencer drives. The player itself is an external
/// collaborator; everything beyond load/play/pause/state stays on its side.
pub(crate) trait PlayerControl {
    fn load_by_id(&mut self, video_id: &str) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn is_playing(&self) -> bool;
}
