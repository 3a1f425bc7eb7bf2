//! Button pins
//!
//! Edge tasks own the physical pins and publish the last sampled level in
//! a `PinLevels` mirror. The debounce task reads the mirror through the
//! `ButtonPins` trait, so the debouncer never touches hardware itself.
//!
//! An edge that arrives while no wait is pending is lost, so the edge task
//! also re-reads the pin with `refresh` whenever its wait times out. The
//! mirror is therefore never older than that timeout.

use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;
use portable_atomic::{AtomicU8, Ordering};

use pixelix_core::input::{ButtonId, PinLevel, BUTTON_COUNT};
use pixelix_core::traits::ButtonPins;

const NOT_CONNECTED: u8 = 0;
const LOW: u8 = 1;
const HIGH: u8 = 2;

/// Last sampled level of every button, shared between tasks
pub struct PinLevels {
    levels: [AtomicU8; BUTTON_COUNT],
}

impl Default for PinLevels {
    fn default() -> Self {
        Self::new()
    }
}

impl PinLevels {
    /// All buttons start unwired
    pub const fn new() -> Self {
        Self {
            levels: [const { AtomicU8::new(NOT_CONNECTED) }; BUTTON_COUNT],
        }
    }

    pub fn set(&self, id: ButtonId, level: PinLevel) {
        let raw = match level {
            PinLevel::Low => LOW,
            PinLevel::High => HIGH,
        };
        self.levels[id.index()].store(raw, Ordering::Release);
    }
}

impl ButtonPins for PinLevels {
    fn level(&self, id: ButtonId) -> Option<PinLevel> {
        match self.levels[id.index()].load(Ordering::Acquire) {
            LOW => Some(PinLevel::Low),
            HIGH => Some(PinLevel::High),
            _ => None,
        }
    }
}

/// One physical button pin feeding the mirror
pub struct ButtonInput<'a, P> {
    id: ButtonId,
    pin: P,
    levels: &'a PinLevels,
}

impl<'a, P: InputPin + Wait> ButtonInput<'a, P> {
    /// Take the pin and publish its current level
    pub fn new(id: ButtonId, pin: P, levels: &'a PinLevels) -> Result<Self, P::Error> {
        let mut input = Self { id, pin, levels };
        input.sample()?;
        Ok(input)
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// Read the pin and update the mirror
    pub fn sample(&mut self) -> Result<PinLevel, P::Error> {
        let level = if InputPin::is_low(&mut self.pin)? {
            PinLevel::Low
        } else {
            PinLevel::High
        };
        self.levels.set(self.id, level);
        Ok(level)
    }

    /// Wait for the next edge and return the new level
    pub async fn wait_for_edge(&mut self) -> Result<PinLevel, P::Error> {
        self.pin.wait_for_any_edge().await?;
        self.sample()
    }

    /// Re-read the pin without an edge
    ///
    /// Returns the new level if it differs from the mirror.
    pub fn refresh(&mut self) -> Result<Option<PinLevel>, P::Error> {
        let before = self.levels.level(self.id);
        let level = self.sample()?;
        Ok((before != Some(level)).then_some(level))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embedded_hal::digital::ErrorType;
    use pixelix_core::config::DEBOUNCE_WINDOW_MS;
    use pixelix_core::input::{ButtonState, Debouncer};
    use std::vec::Vec;

    /// Pin that toggles on every edge wait
    struct TogglingPin {
        low: bool,
    }

    impl ErrorType for TogglingPin {
        type Error = Infallible;
    }

    impl InputPin for TogglingPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.low)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(self.low)
        }
    }

    impl Wait for TogglingPin {
        async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
            self.low = false;
            Ok(())
        }

        async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
            self.low = true;
            Ok(())
        }

        async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
            self.low = false;
            Ok(())
        }

        async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
            self.low = true;
            Ok(())
        }

        async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
            self.low = !self.low;
            Ok(())
        }
    }

    /// Pin whose level is set from outside, edges only when asked to
    struct ExternalPin<'a> {
        low: &'a Cell<bool>,
    }

    impl ErrorType for ExternalPin<'_> {
        type Error = Infallible;
    }

    impl InputPin for ExternalPin<'_> {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.low.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(self.low.get())
        }
    }

    impl Wait for ExternalPin<'_> {
        async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_unwired_buttons() {
        let levels = PinLevels::new();
        for id in ButtonId::ALL {
            assert_eq!(levels.level(id), None);
        }
    }

    #[test]
    fn test_input_publishes_levels() {
        let levels = PinLevels::new();
        let mut input = ButtonInput::new(ButtonId::Left, TogglingPin { low: false }, &levels).unwrap();
        assert_eq!(levels.level(ButtonId::Left), Some(PinLevel::High));
        assert_eq!(levels.level(ButtonId::Ok), None);

        let level = block_on(input.wait_for_edge()).unwrap();
        assert_eq!(level, PinLevel::Low);
        assert_eq!(levels.level(ButtonId::Left), Some(PinLevel::Low));

        block_on(input.wait_for_edge()).unwrap();
        assert_eq!(levels.level(ButtonId::Left), Some(PinLevel::High));
    }

    #[test]
    fn test_refresh_catches_missed_edge() {
        let pin_low = Cell::new(false);
        let levels = PinLevels::new();
        let mut input = ButtonInput::new(ButtonId::Ok, ExternalPin { low: &pin_low }, &levels).unwrap();

        // Press seen through an edge
        pin_low.set(true);
        assert_eq!(block_on(input.wait_for_edge()).unwrap(), PinLevel::Low);

        // Release while nobody waited: the mirror is stale until refreshed
        pin_low.set(false);
        assert_eq!(levels.level(ButtonId::Ok), Some(PinLevel::Low));
        assert_eq!(input.refresh().unwrap(), Some(PinLevel::High));
        assert_eq!(levels.level(ButtonId::Ok), Some(PinLevel::High));

        // Nothing changed since
        assert_eq!(input.refresh().unwrap(), None);
    }

    #[test]
    fn test_debouncer_commits_refreshed_level() {
        let pin_low = Cell::new(false);
        let levels = PinLevels::new();
        let mut input = ButtonInput::new(ButtonId::Ok, ExternalPin { low: &pin_low }, &levels).unwrap();
        let mut debouncer = Debouncer::new(&levels, DEBOUNCE_WINDOW_MS, 0);
        let mut states = Vec::new();
        let mut observer = |id: ButtonId, state: ButtonState| states.push((id, state));

        debouncer.poll(DEBOUNCE_WINDOW_MS, &levels, &mut observer);

        pin_low.set(true);
        block_on(input.wait_for_edge()).unwrap();
        debouncer.notify_change(ButtonId::Ok, 200);

        // Bounce back to released without a delivered edge
        pin_low.set(false);
        if input.refresh().unwrap().is_some() {
            debouncer.notify_change(ButtonId::Ok, 220);
        }
        debouncer.poll(400, &levels, &mut observer);

        assert_eq!(debouncer.state(ButtonId::Ok), ButtonState::Released);
        assert_eq!(states, [(ButtonId::Ok, ButtonState::Released)]);
    }
}
