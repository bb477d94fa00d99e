use std::time::{Duration, Instant};

use anyhow::Result;
use rand::seq::SliceRandom;

use crate::player::{PlayerControl, PlayerEvent, PlayerState, error_is_skippable};

use super::playlist::MediaItem;

/// Minimum spacing between accepted manual transitions. Hardware media keys
/// and key repeat both like to double-fire; anything inside the window is
/// dropped silently. Automatic transitions are never throttled.
pub(crate) const MIN_MANUAL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Manual,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    NowPlaying {
        title: String,
        position: usize,
        total: usize,
    },
    Skipped {
        title: String,
        code: u32,
    },
    Unplayable {
        title: String,
        code: u32,
    },
}

/// Owns the shuffled item order, the cursor, and every transition path:
/// manual next/prev, auto-advance on end, auto-skip on unplayable items.
/// Nothing is sent to the player until its ready notification has been seen;
/// a load that arrives earlier is parked and flushed on `Ready`.
pub(crate) struct Sequencer {
    items: Vec<MediaItem>,
    position: usize,
    last_manual: Option<Instant>,
    player_ready: bool,
    pending_start: bool,
}

impl Sequencer {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            position: 0,
            last_manual: None,
            player_ready: false,
            pending_start: false,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    #[cfg(test)]
    pub(crate) fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub(crate) fn current(&self) -> Option<&MediaItem> {
        self.items.get(self.position)
    }

    pub(crate) fn player_ready(&self) -> bool {
        self.player_ready
    }

    /// Replaces the active order with a fresh shuffle of `items` and starts
    /// from the top. Returns `false` for an empty sequence, which leaves the
    /// sequencer empty; the caller owes the user an error for that case.
    pub(crate) fn load(
        &mut self,
        mut items: Vec<MediaItem>,
        player: &mut dyn PlayerControl,
    ) -> Result<bool> {
        if items.is_empty() {
            return Ok(false);
        }

        items.shuffle(&mut rand::thread_rng());
        self.items = items;
        self.position = 0;

        if self.player_ready {
            self.start_current(player)?;
        } else {
            self.pending_start = true;
        }
        Ok(true)
    }

    pub(crate) fn request_next(
        &mut self,
        trigger: Trigger,
        now: Instant,
        player: &mut dyn PlayerControl,
    ) -> Result<Option<Notice>> {
        self.request_step(1, trigger, now, player)
    }

    pub(crate) fn request_prev(
        &mut self,
        trigger: Trigger,
        now: Instant,
        player: &mut dyn PlayerControl,
    ) -> Result<Option<Notice>> {
        self.request_step(-1, trigger, now, player)
    }

    pub(crate) fn on_player_event(
        &mut self,
        event: &PlayerEvent,
        now: Instant,
        player: &mut dyn PlayerControl,
    ) -> Result<Vec<Notice>> {
        let mut notices = Vec::new();
        match event {
            PlayerEvent::Ready => {
                self.player_ready = true;
                if self.pending_start {
                    self.pending_start = false;
                    if !self.items.is_empty() {
                        self.start_current(player)?;
                        notices.extend(self.now_playing());
                    }
                }
            }
            PlayerEvent::StateChange(PlayerState::Ended) => {
                if let Some(notice) = self.request_next(Trigger::Auto, now, player)? {
                    notices.push(notice);
                }
            }
            PlayerEvent::StateChange(_) => {}
            PlayerEvent::Error { code } => {
                let title = self
                    .current()
                    .map(|item| item.title.clone())
                    .unwrap_or_default();
                if error_is_skippable(*code) {
                    notices.push(Notice::Skipped { title, code: *code });
                    if let Some(notice) = self.request_next(Trigger::Auto, now, player)? {
                        notices.push(notice);
                    }
                } else {
                    notices.push(Notice::Unplayable { title, code: *code });
                }
            }
        }
        Ok(notices)
    }

    fn request_step(
        &mut self,
        delta: isize,
        trigger: Trigger,
        now: Instant,
        player: &mut dyn PlayerControl,
    ) -> Result<Option<Notice>> {
        if self.items.is_empty() || !self.player_ready {
            return Ok(None);
        }
        if trigger == Trigger::Manual {
            if let Some(last) = self.last_manual
                && now.duration_since(last) < MIN_MANUAL_INTERVAL
            {
                return Ok(None);
            }
            self.last_manual = Some(now);
        }

        let len = self.items.len() as isize;
        self.position = ((self.position as isize + delta).rem_euclid(len)) as usize;
        self.start_current(player)?;
        Ok(self.now_playing())
    }

    fn start_current(&mut self, player: &mut dyn PlayerControl) -> Result<()> {
        if let Some(item) = self.items.get(self.position) {
            player.load_by_id(&item.id)?;
        }
        Ok(())
    }

    fn now_playing(&self) -> Option<Notice> {
        self.current().map(|item| Notice::NowPlaying {
            title: item.title.clone(),
            position: self.position + 1,
            total: self.items.len(),
        })
    }
}
