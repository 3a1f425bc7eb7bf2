//! Content providers built into the firmware
//!
//! The display manager stores one provider type, so every provider the
//! firmware knows is a variant of `Provider`. `build_provider` creates
//! them by type name for the registry.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_graphics::mono_font::ascii::FONT_4X6;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use pixelix_core::config::MATRIX_WIDTH;
use pixelix_core::gfx::MatrixFrame;
use pixelix_core::scheduler::{ProviderContext, ProviderRegistry, SystemMessage, SYSTEM_MESSAGE_NAME};
use pixelix_core::traits::{ContentProvider, ProviderError, ProviderUid};

use crate::channels::SYSTEM_INBOX;

/// Type name of the static text provider
pub const JUST_TEXT_NAME: &str = "JustText";

/// Longest static text
const MAX_TEXT_LEN: usize = 32;

/// Static text, centered or scrolled
pub struct JustText {
    uid: ProviderUid,
    enabled: bool,
    text: String<MAX_TEXT_LEN>,
    color: Rgb888,
    scroll_x: i32,
}

impl JustText {
    pub fn new(uid: ProviderUid, text: &str, color: Rgb888) -> Self {
        let mut this = Self {
            uid,
            enabled: true,
            text: String::new(),
            color,
            scroll_x: 0,
        };
        this.set_text(text);
        this
    }

    /// Replace the text, truncated to the buffer size
    pub fn set_text(&mut self, text: &str) {
        self.text.clear();
        for c in text.chars() {
            if self.text.push(c).is_err() {
                break;
            }
        }
        self.scroll_x = 0;
    }

    fn text_width(&self) -> i32 {
        self.text.chars().count() as i32 * FONT_4X6.character_size.width as i32
    }
}

impl ContentProvider for JustText {
    fn uid(&self) -> ProviderUid {
        self.uid
    }

    fn name(&self) -> &'static str {
        JUST_TEXT_NAME
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn start(&mut self, width: u16, _height: u16) -> Result<(), ProviderError> {
        if width as usize != MATRIX_WIDTH {
            return Err(ProviderError::UnsupportedSize);
        }
        Ok(())
    }

    fn active(&mut self, frame: &mut MatrixFrame) {
        self.scroll_x = 0;
        self.update(frame);
    }

    fn update(&mut self, frame: &mut MatrixFrame) {
        frame.clear();

        let width = self.text_width();
        let x = if width > MATRIX_WIDTH as i32 {
            let x = MATRIX_WIDTH as i32 - self.scroll_x;
            self.scroll_x = (self.scroll_x + 1) % (width + MATRIX_WIDTH as i32);
            x
        } else {
            (MATRIX_WIDTH as i32 - width) / 2
        };

        let style = MonoTextStyle::new(&FONT_4X6, self.color);
        let _ = Text::with_baseline(&self.text, Point::new(x, 1), style, Baseline::Top).draw(frame);
    }
}

/// Every provider the firmware can install
pub enum Provider {
    SysMsg(SystemMessage<'static, CriticalSectionRawMutex>),
    JustText(JustText),
}

macro_rules! dispatch {
    ($self:ident, $p:ident => $body:expr) => {
        match $self {
            Provider::SysMsg($p) => $body,
            Provider::JustText($p) => $body,
        }
    };
}

impl ContentProvider for Provider {
    fn uid(&self) -> ProviderUid {
        dispatch!(self, p => p.uid())
    }

    fn name(&self) -> &'static str {
        dispatch!(self, p => p.name())
    }

    fn is_enabled(&self) -> bool {
        dispatch!(self, p => p.is_enabled())
    }

    fn set_enabled(&mut self, enabled: bool) {
        dispatch!(self, p => p.set_enabled(enabled))
    }

    fn duration(&self) -> u32 {
        dispatch!(self, p => p.duration())
    }

    fn start(&mut self, width: u16, height: u16) -> Result<(), ProviderError> {
        dispatch!(self, p => p.start(width, height))
    }

    fn stop(&mut self) {
        dispatch!(self, p => p.stop())
    }

    fn process(&mut self, is_connected: bool, ctx: &mut ProviderContext) {
        dispatch!(self, p => p.process(is_connected, ctx))
    }

    fn active(&mut self, frame: &mut MatrixFrame) {
        dispatch!(self, p => p.active(frame))
    }

    fn inactive(&mut self) {
        dispatch!(self, p => p.inactive())
    }

    fn update(&mut self, frame: &mut MatrixFrame) {
        dispatch!(self, p => p.update(frame))
    }

    fn skip_content(&mut self) -> bool {
        dispatch!(self, p => p.skip_content())
    }
}

/// Registry creating firmware providers
pub type Registry = ProviderRegistry<fn(&str, ProviderUid) -> Option<Provider>>;

/// Create a firmware provider by type name
pub fn build_provider(name: &str, uid: ProviderUid) -> Option<Provider> {
    match name {
        SYSTEM_MESSAGE_NAME => Some(Provider::SysMsg(SystemMessage::new(uid, &SYSTEM_INBOX))),
        JUST_TEXT_NAME => Some(Provider::JustText(JustText::new(uid, "PIXELIX", Rgb888::new(255, 120, 0)))),
        _ => None,
    }
}
