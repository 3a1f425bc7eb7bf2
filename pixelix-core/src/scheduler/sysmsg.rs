//! System message provider
//!
//! Shows status and error texts on top of the normal rotation. Texts are
//! posted from other contexts into a message proxy; when one arrives the
//! provider enables itself, locks its slot and requests activation. Once
//! the queue is empty it disables itself and unlocks the slot again.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_graphics::mono_font::ascii::FONT_4X6;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use super::requests::ProviderContext;
use crate::config::{INFINITE_DURATION_MS, MATRIX_WIDTH, UPDATE_PERIOD_MS};
use crate::gfx::MatrixFrame;
use crate::proxy::{Message, MessageProxy};
use crate::timer::Countdown;
use crate::traits::{ContentProvider, ProviderUid};

/// Provider type name
pub const SYSTEM_MESSAGE_NAME: &str = "SysMsg";

/// Maximum text length of one message
pub const MAX_MESSAGE_LEN: usize = 64;

/// Capacity of the message inbox
pub const MAX_QUEUED_MESSAGES: usize = 4;

/// Glyph width of the message font
const GLYPH_WIDTH: i32 = 4;

/// Scroll by one pixel every this many frames
const SCROLL_DIVIDER: u32 = 2;

/// Message kinds accepted by the inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemMessageKind {
    /// Show the payload text
    Show,
    /// Drop the current and all queued texts
    Clear,
}

/// Text to show and for how long
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemText {
    pub text: String<MAX_MESSAGE_LEN>,
    /// `INFINITE_DURATION_MS` keeps the text until it is skipped
    pub duration_ms: u32,
}

pub type SystemMessageEnvelope = Message<SystemMessageKind, SystemText>;

/// Inbox shared between the posting contexts and the provider
pub type SystemMessageInbox<M> = MessageProxy<M, SystemMessageEnvelope, MAX_QUEUED_MESSAGES>;

/// Post a text, truncated to `MAX_MESSAGE_LEN`
///
/// Returns false if the inbox is full.
pub fn post_text<M: RawMutex>(inbox: &SystemMessageInbox<M>, text: &str, duration_ms: u32) -> bool {
    let mut truncated = String::new();
    for c in text.chars() {
        if truncated.push(c).is_err() {
            break;
        }
    }
    inbox.send(Message::with_payload(
        SystemMessageKind::Show,
        SystemText {
            text: truncated,
            duration_ms,
        },
    ))
}

/// Ask the provider to drop all texts
pub fn post_clear<M: RawMutex>(inbox: &SystemMessageInbox<M>) -> bool {
    inbox.send(Message::new(SystemMessageKind::Clear))
}

pub struct SystemMessage<'a, M: RawMutex> {
    uid: ProviderUid,
    enabled: bool,
    inbox: &'a SystemMessageInbox<M>,
    current: Option<SystemText>,
    /// Next texts, received from the inbox but not shown yet
    pending: heapless::Deque<SystemText, MAX_QUEUED_MESSAGES>,
    timer: Countdown,
    done: bool,
    frame_count: u32,
    scroll_x: i32,
}

impl<M: RawMutex> core::fmt::Debug for SystemMessage<'_, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SystemMessage")
            .field("uid", &self.uid)
            .field("enabled", &self.enabled)
            .field("current", &self.current)
            .field("pending", &self.pending)
            .field("timer", &self.timer)
            .field("done", &self.done)
            .field("frame_count", &self.frame_count)
            .field("scroll_x", &self.scroll_x)
            .finish_non_exhaustive()
    }
}

impl<'a, M: RawMutex> SystemMessage<'a, M> {
    pub fn new(uid: ProviderUid, inbox: &'a SystemMessageInbox<M>) -> Self {
        Self {
            uid,
            enabled: false,
            inbox,
            current: None,
            pending: heapless::Deque::new(),
            timer: Countdown::new(),
            done: false,
            frame_count: 0,
            scroll_x: 0,
        }
    }

    /// A text is being shown or waiting
    pub fn is_busy(&self) -> bool {
        self.current.is_some() || !self.pending.is_empty()
    }

    fn drain_inbox(&mut self) {
        while let Some(msg) = self.inbox.receive() {
            match (msg.kind, msg.payload) {
                (SystemMessageKind::Show, Some(text)) => {
                    if self.pending.push_back(text).is_err() {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("System message queue full, dropping message");
                    }
                }
                (SystemMessageKind::Clear, _) => {
                    self.pending.clear();
                    if self.current.is_some() {
                        self.done = true;
                    }
                }
                (SystemMessageKind::Show, None) => {}
            }
        }
    }

    fn text_width(text: &str) -> i32 {
        text.chars().count() as i32 * GLYPH_WIDTH
    }

    /// Duration needed to scroll a text through once
    fn scroll_duration_ms(text: &str) -> u32 {
        let width = Self::text_width(text);
        if width <= MATRIX_WIDTH as i32 {
            return 0;
        }
        (width as u32 + MATRIX_WIDTH as u32) * SCROLL_DIVIDER * UPDATE_PERIOD_MS
    }

    fn begin(&mut self, text: SystemText) {
        self.current = Some(text);
        self.done = false;
        self.timer.stop();
        self.frame_count = 0;
        self.scroll_x = 0;
    }
}

impl<M: RawMutex> ContentProvider for SystemMessage<'_, M> {
    fn uid(&self) -> ProviderUid {
        self.uid
    }

    fn name(&self) -> &'static str {
        SYSTEM_MESSAGE_NAME
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn duration(&self) -> u32 {
        INFINITE_DURATION_MS
    }

    fn stop(&mut self) {
        self.inbox.clear();
        self.pending.clear();
        self.current = None;
        self.enabled = false;
    }

    fn process(&mut self, _is_connected: bool, ctx: &mut ProviderContext) {
        self.drain_inbox();
        let now_ms = ctx.now_ms();

        if let Some(current) = &self.current {
            if ctx.is_active() {
                if !self.timer.is_running() && current.duration_ms != INFINITE_DURATION_MS {
                    let duration = current.duration_ms.max(Self::scroll_duration_ms(&current.text));
                    self.timer.start(duration, now_ms);
                }
                if self.timer.is_expired(now_ms) {
                    self.done = true;
                }
            }
        }

        if self.done || self.current.is_none() {
            self.current = None;
            self.done = false;
            self.timer.stop();

            match self.pending.pop_front() {
                Some(next) => {
                    self.begin(next);
                    self.enabled = true;
                    ctx.lock_slot();
                    if !ctx.is_active() {
                        ctx.activate_slot();
                    }
                }
                None if self.enabled => {
                    self.enabled = false;
                    ctx.unlock_slot();
                }
                None => {}
            }
        }
    }

    fn active(&mut self, frame: &mut MatrixFrame) {
        self.frame_count = 0;
        self.scroll_x = 0;
        self.timer.stop();
        self.update(frame);
    }

    fn update(&mut self, frame: &mut MatrixFrame) {
        frame.clear();
        let Some(current) = &self.current else {
            return;
        };

        let width = Self::text_width(&current.text);
        let x = if width > MATRIX_WIDTH as i32 {
            // Enter from the right, leave to the left, repeat
            MATRIX_WIDTH as i32 - self.scroll_x
        } else {
            (MATRIX_WIDTH as i32 - width) / 2
        };

        let style = MonoTextStyle::new(&FONT_4X6, Rgb888::WHITE);
        let _ = Text::with_baseline(&current.text, Point::new(x, 1), style, Baseline::Top).draw(frame);

        self.frame_count = self.frame_count.wrapping_add(1);
        if self.frame_count % SCROLL_DIVIDER == 0 {
            self.scroll_x += 1;
            if self.scroll_x > width + MATRIX_WIDTH as i32 {
                self.scroll_x = 0;
            }
        }
    }

    fn skip_content(&mut self) -> bool {
        if self.current.is_some() && !self.done {
            self.done = true;
            true
        } else {
            false
        }
    }
}
