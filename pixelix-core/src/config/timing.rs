//! Timing and sizing policy
//!
//! These are policy values, not invariants. Everything that depends on
//! them reads them from here so a board can be retuned in one place.

/// Matrix width in pixels
pub const MATRIX_WIDTH: usize = 32;

/// Matrix height in pixels
pub const MATRIX_HEIGHT: usize = 8;

/// Number of display slots
pub const MAX_SLOTS: usize = 8;

/// Scheduler tick period (frame update)
pub const UPDATE_PERIOD_MS: u32 = 20;

/// Period of the providers' `process()` hook
pub const PROCESS_PERIOD_MS: u32 = 100;

/// Main loop period (lifecycle + button handling)
pub const LOOP_PERIOD_MS: u32 = 40;

/// Global default slot duration
pub const DEFAULT_SLOT_DURATION_MS: u32 = 30_000;

/// Slot duration that never expires (externally controlled slots)
pub const INFINITE_DURATION_MS: u32 = u32::MAX;

/// Upper bound of the fade progress counter
pub const FADE_MAX: u8 = 255;

/// Fade progress added per scheduler tick
pub const FADE_STEP: u8 = 15;

/// Button debounce window
pub const DEBOUNCE_WINDOW_MS: u32 = 100;

/// Capacity of the pin-change queue between edge tasks and the debouncer
pub const BUTTON_QUEUE_SIZE: usize = 10;

/// A press shorter than this counts as a trigger, longer is a hold
pub const SHORT_PULSE_THRESHOLD_MS: u32 = 400;

/// Repeat period of the hold gesture while a button stays pressed
pub const HOLD_REPEAT_MS: u32 = 100;

/// Brightness change per button action
pub const BRIGHTNESS_DELTA: u8 = 10;

/// Lowest brightness the manager will drive (about 10 %)
pub const MIN_BRIGHTNESS: u8 = 25;

/// Highest brightness the manager will drive
pub const MAX_BRIGHTNESS: u8 = 255;

/// Splash duration in the Init state
pub const SHOW_LOGO_DURATION_MS: u32 = 2_000;

/// Delay between connection attempts
pub const RETRY_DELAY_MS: u32 = 30_000;

/// Delay between the restart message and the reboot
pub const RESTART_DELAY_MS: u32 = 100;

/// Duration of a transient status message
pub const STATUS_MESSAGE_DURATION_MS: u32 = 4_000;

/// Indicator on-time of one error pulse
pub const BLINK_ON_MS: u32 = 200;

/// Indicator off-time between pulses of one group
pub const BLINK_SHORT_OFF_MS: u32 = 200;

/// Indicator off-time between pulse groups
pub const BLINK_LONG_OFF_MS: u32 = 1_000;

/// Minimum length of an access point passphrase (WPA2)
pub const AP_PASSPHRASE_MIN_LEN: usize = 8;
