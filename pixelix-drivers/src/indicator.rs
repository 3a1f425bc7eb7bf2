//! Status indicator LED
//!
//! Drives the single LED used for blink codes. The LED can be wired
//! active-high (default) or active-low.

use embedded_hal::digital::OutputPin;
use pixelix_core::traits::Indicator;

pub struct LedIndicator<P> {
    pin: P,
    /// If true, LED ON = pin LOW
    inverted: bool,
    on: bool,
}

impl<P: OutputPin> LedIndicator<P> {
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut led = Self {
            pin,
            inverted,
            on: false,
        };
        led.set(false);
        led
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl<P: OutputPin> Indicator for LedIndicator<P> {
    fn set(&mut self, on: bool) {
        self.on = on;
        let result = if on != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Indicator pin write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    struct MockPin {
        high: bool,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn test_active_high_led() {
        let mut led = LedIndicator::new(MockPin { high: true }, false);
        assert!(!led.pin.high);

        led.set(true);
        assert!(led.is_on());
        assert!(led.pin.high);
    }

    #[test]
    fn test_active_low_led() {
        let mut led = LedIndicator::new(MockPin { high: false }, true);
        // Off means the pin idles high
        assert!(led.pin.high);

        led.set(true);
        assert!(!led.pin.high);
        led.set(false);
        assert!(led.pin.high);
    }
}
