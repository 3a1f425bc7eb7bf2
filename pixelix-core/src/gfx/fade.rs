//! Fade transitions between two slot activations
//!
//! The outgoing content fades out, then the incoming content fades in.
//! Progress advances one step per scheduler tick and always returns to
//! `Idle` before a new rotation may begin.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use super::frame::Frame;
use crate::config::{FADE_MAX, FADE_STEP};

/// Visual style of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FadeEffect {
    /// Hard cut (one blank frame)
    None = 0,
    /// Dim out, dim in
    #[default]
    Linear = 1,
    /// Slide towards negative x
    MoveX = 2,
    /// Slide towards negative y
    MoveY = 3,
}

impl FadeEffect {
    pub const COUNT: u8 = 4;

    /// Convert from the stored id, unknown ids fall back to `Linear`
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Linear,
            2 => Self::MoveX,
            3 => Self::MoveY,
            _ => Self::Linear,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Cycle `None → Linear → MoveX → MoveY → None`
    pub fn next(self) -> Self {
        Self::from_u8((self.as_u8() + 1) % Self::COUNT)
    }
}

/// Transition progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FadeState {
    #[default]
    Idle,
    /// Outgoing content disappearing, progress `0..=FADE_MAX`
    FadingOut(u8),
    /// Incoming content appearing, progress `0..=FADE_MAX`
    FadingIn(u8),
}

impl FadeState {
    pub fn is_idle(&self) -> bool {
        matches!(self, FadeState::Idle)
    }

    /// Visibility of the frame content in this state (0 = gone, 255 = full)
    pub fn visibility(&self) -> u8 {
        match *self {
            FadeState::Idle => FADE_MAX,
            FadeState::FadingOut(p) => FADE_MAX - p,
            FadeState::FadingIn(p) => p,
        }
    }
}

/// Phase finished by `Fader::advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FadePhase {
    Out,
    In,
}

/// Fade state machine with a deferred effect change
#[derive(Debug, Clone)]
pub struct Fader {
    effect: FadeEffect,
    pending: Option<FadeEffect>,
    state: FadeState,
    step: u8,
}

impl Default for Fader {
    fn default() -> Self {
        Self::new(FadeEffect::default())
    }
}

impl Fader {
    pub const fn new(effect: FadeEffect) -> Self {
        Self {
            effect,
            pending: None,
            state: FadeState::Idle,
            step: FADE_STEP,
        }
    }

    /// Effect used by the running (or next) transition
    pub fn effect(&self) -> FadeEffect {
        self.effect
    }

    /// Effect that will be in use once pending changes are applied
    pub fn selected_effect(&self) -> FadeEffect {
        self.pending.unwrap_or(self.effect)
    }

    /// Queue an effect change; applied by `apply_pending` while idle
    pub fn request_effect(&mut self, effect: FadeEffect) {
        self.pending = Some(effect);
    }

    /// Apply a queued effect change if no transition is running
    pub fn apply_pending(&mut self) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        match self.pending.take() {
            Some(effect) => {
                self.effect = effect;
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> FadeState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn start_fade_out(&mut self) {
        self.state = match self.effect {
            // Jump straight to the end, one blank frame
            FadeEffect::None => FadeState::FadingOut(FADE_MAX),
            _ => FadeState::FadingOut(0),
        };
    }

    pub fn start_fade_in(&mut self) {
        self.state = match self.effect {
            FadeEffect::None => FadeState::FadingIn(FADE_MAX),
            _ => FadeState::FadingIn(0),
        };
    }

    /// Advance one tick
    ///
    /// Returns the phase that completed on this tick. A finished fade-out
    /// moves on to `FadingIn(0)`, a finished fade-in returns to `Idle`.
    pub fn advance(&mut self) -> Option<FadePhase> {
        match self.state {
            FadeState::Idle => None,
            FadeState::FadingOut(p) => {
                if p >= FADE_MAX {
                    self.start_fade_in();
                    Some(FadePhase::Out)
                } else {
                    self.state = FadeState::FadingOut(p.saturating_add(self.step));
                    None
                }
            }
            FadeState::FadingIn(p) => {
                if p >= FADE_MAX {
                    self.state = FadeState::Idle;
                    Some(FadePhase::In)
                } else {
                    self.state = FadeState::FadingIn(p.saturating_add(self.step));
                    None
                }
            }
        }
    }

    /// Abort any running transition
    pub fn reset(&mut self) {
        self.state = FadeState::Idle;
    }
}

/// Render `src` into `dst` according to the effect and progress
pub fn compose<const W: usize, const H: usize>(
    effect: FadeEffect,
    state: FadeState,
    src: &Frame<W, H>,
    dst: &mut Frame<W, H>,
) {
    let visibility = state.visibility();

    if state.is_idle() || visibility == FADE_MAX {
        dst.copy_from(src);
        return;
    }

    match effect {
        FadeEffect::None => {
            if visibility == 0 {
                dst.clear();
            } else {
                dst.copy_from(src);
            }
        }
        FadeEffect::Linear => {
            for (y, row) in src.rows().iter().enumerate() {
                for (x, color) in row.iter().enumerate() {
                    dst.draw_pixel(x as i32, y as i32, dim(*color, visibility));
                }
            }
        }
        FadeEffect::MoveX => {
            let offset = hidden_share(W, visibility) as i32;
            let shift = if matches!(state, FadeState::FadingIn(_)) { offset } else { -offset };
            shifted(src, dst, shift, 0);
        }
        FadeEffect::MoveY => {
            let offset = hidden_share(H, visibility) as i32;
            let shift = if matches!(state, FadeState::FadingIn(_)) { offset } else { -offset };
            shifted(src, dst, 0, shift);
        }
    }
}

/// Scale a color by `level / 255`
fn dim(color: Rgb888, level: u8) -> Rgb888 {
    let scale = |c: u8| ((c as u16 * level as u16) / FADE_MAX as u16) as u8;
    Rgb888::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

/// Number of rows/columns not yet (or no longer) visible
fn hidden_share(extent: usize, visibility: u8) -> usize {
    extent * (FADE_MAX - visibility) as usize / FADE_MAX as usize
}

fn shifted<const W: usize, const H: usize>(
    src: &Frame<W, H>,
    dst: &mut Frame<W, H>,
    dx: i32,
    dy: i32,
) {
    dst.clear();
    for (y, row) in src.rows().iter().enumerate() {
        for (x, color) in row.iter().enumerate() {
            dst.draw_pixel(x as i32 + dx, y as i32 + dy, *color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_cycle() {
        assert_eq!(FadeEffect::None.next(), FadeEffect::Linear);
        assert_eq!(FadeEffect::Linear.next(), FadeEffect::MoveX);
        assert_eq!(FadeEffect::MoveX.next(), FadeEffect::MoveY);
        assert_eq!(FadeEffect::MoveY.next(), FadeEffect::None);
    }

    #[test]
    fn test_unknown_effect_id_falls_back_to_linear() {
        assert_eq!(FadeEffect::from_u8(42), FadeEffect::Linear);
        assert_eq!(FadeEffect::from_u8(2), FadeEffect::MoveX);
    }

    #[test]
    fn test_full_transition_returns_to_idle() {
        let mut fader = Fader::new(FadeEffect::Linear);
        fader.start_fade_out();

        let mut ticks = 0;
        let mut out_done = None;
        loop {
            ticks += 1;
            match fader.advance() {
                Some(FadePhase::Out) => out_done = Some(ticks),
                Some(FadePhase::In) => break,
                None => {}
            }
            assert!(ticks < 1000, "fade never finished");
        }

        assert!(fader.is_idle());
        // 255 / 15 = 17 steps to reach the end, one more to report it
        assert_eq!(out_done, Some(18));
        assert_eq!(ticks, 36);
    }

    #[test]
    fn test_no_effect_is_two_ticks() {
        let mut fader = Fader::new(FadeEffect::None);
        fader.start_fade_out();
        assert_eq!(fader.advance(), Some(FadePhase::Out));
        assert_eq!(fader.advance(), Some(FadePhase::In));
        assert!(fader.is_idle());
    }

    #[test]
    fn test_pending_effect_waits_for_idle() {
        let mut fader = Fader::new(FadeEffect::Linear);
        fader.start_fade_out();
        fader.request_effect(FadeEffect::MoveY);

        assert!(!fader.apply_pending());
        assert_eq!(fader.effect(), FadeEffect::Linear);
        assert_eq!(fader.selected_effect(), FadeEffect::MoveY);

        fader.reset();
        assert!(fader.apply_pending());
        assert_eq!(fader.effect(), FadeEffect::MoveY);
    }

    #[test]
    fn test_linear_dims() {
        let mut src = Frame::<2, 1>::new();
        src.fill_screen(Rgb888::new(200, 100, 0));
        let mut dst = Frame::<2, 1>::new();

        compose(FadeEffect::Linear, FadeState::FadingOut(FADE_MAX), &src, &mut dst);
        assert_eq!(dst.pixel(0, 0), Some(Rgb888::BLACK));

        compose(FadeEffect::Linear, FadeState::FadingIn(FADE_MAX), &src, &mut dst);
        assert_eq!(dst.pixel(1, 0), Some(Rgb888::new(200, 100, 0)));

        compose(FadeEffect::Linear, FadeState::FadingIn(0), &src, &mut dst);
        assert_eq!(dst.pixel(1, 0), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_move_x_slides_left() {
        let mut src = Frame::<4, 1>::new();
        src.draw_pixel(2, 0, Rgb888::RED);
        let mut dst = Frame::<4, 1>::new();

        // Halfway out: content moved about half the width to the left
        compose(FadeEffect::MoveX, FadeState::FadingOut(128), &src, &mut dst);
        assert_eq!(dst.pixel(0, 0), Some(Rgb888::RED));

        // Just started in: content still mostly outside on the right
        compose(FadeEffect::MoveX, FadeState::FadingIn(64), &src, &mut dst);
        assert!(dst.rows().iter().flatten().all(|c| *c == Rgb888::BLACK));
    }

    #[test]
    fn test_move_y_slides_up() {
        let mut src = Frame::<1, 4>::new();
        src.draw_pixel(0, 3, Rgb888::BLUE);
        let mut dst = Frame::<1, 4>::new();

        compose(FadeEffect::MoveY, FadeState::FadingOut(128), &src, &mut dst);
        assert_eq!(dst.pixel(0, 1), Some(Rgb888::BLUE));
    }
}
