//! Button actions
//!
//! Maps gestures to display actions for the supported button layouts and
//! executes them against the display manager.

use super::button::ButtonId;
use super::handler::Gesture;
use crate::config::BRIGHTNESS_DELTA;
use crate::scheduler::DisplayManager;
use crate::traits::ContentProvider;

/// Action triggered by a button gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    NextSlot,
    PreviousSlot,
    ToggleDisplay,
    NextFadeEffect,
    /// Needs the network, handled by the caller
    ShowIpAddress,
    IncreaseBrightness,
    DecreaseBrightness,
    /// Ramp brightness up and down while held
    SweepBrightness,
    /// Switch the display off and sleep, handled by the caller
    PowerOff,
    /// Reboot the device, handled by the caller
    Restart,
}

/// Physical button layout of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonLayout {
    /// Only the `Ok` button
    OneButton,
    /// `Left` and `Right` buttons
    TwoButtons,
}

impl ButtonLayout {
    /// Action for a gesture, `None` if the gesture is unassigned
    pub fn action(self, id: ButtonId, gesture: Gesture) -> Option<ButtonAction> {
        use ButtonAction::*;
        use Gesture::*;

        match (self, id, gesture) {
            (ButtonLayout::OneButton, ButtonId::Ok, Triggered(1)) => Some(NextSlot),
            (ButtonLayout::OneButton, ButtonId::Ok, Triggered(2)) => Some(NextFadeEffect),
            (ButtonLayout::OneButton, ButtonId::Ok, Triggered(4)) => Some(PowerOff),
            (ButtonLayout::OneButton, ButtonId::Ok, Triggered(5)) => Some(ShowIpAddress),
            (ButtonLayout::OneButton, ButtonId::Ok, Triggered(6)) => Some(Restart),
            (ButtonLayout::OneButton, ButtonId::Ok, Held) => Some(SweepBrightness),

            (ButtonLayout::TwoButtons, ButtonId::Left, Triggered(1)) => Some(PreviousSlot),
            (ButtonLayout::TwoButtons, ButtonId::Left, Triggered(2)) => Some(ToggleDisplay),
            (ButtonLayout::TwoButtons, ButtonId::Left, Triggered(4)) => Some(PowerOff),
            (ButtonLayout::TwoButtons, ButtonId::Left, Triggered(5)) => Some(Restart),
            (ButtonLayout::TwoButtons, ButtonId::Left, Held) => Some(IncreaseBrightness),
            (ButtonLayout::TwoButtons, ButtonId::Right, Triggered(1)) => Some(NextSlot),
            (ButtonLayout::TwoButtons, ButtonId::Right, Triggered(2)) => Some(NextFadeEffect),
            (ButtonLayout::TwoButtons, ButtonId::Right, Triggered(3)) => Some(ShowIpAddress),
            (ButtonLayout::TwoButtons, ButtonId::Right, Held) => Some(DecreaseBrightness),

            _ => None,
        }
    }
}

/// Executes button actions, remembers the sweep direction
#[derive(Debug, Clone, Default)]
pub struct ButtonActions {
    sweep_up: bool,
}

impl ButtonActions {
    pub const fn new() -> Self {
        Self { sweep_up: false }
    }

    /// Execute an action
    ///
    /// Returns false for actions the display manager cannot handle on its
    /// own (`ShowIpAddress`, `PowerOff`, `Restart`).
    pub fn execute<P: ContentProvider, const N: usize>(
        &mut self,
        action: ButtonAction,
        dm: &mut DisplayManager<P, N>,
    ) -> bool {
        match action {
            ButtonAction::NextSlot => {
                // A system message being shown is skipped first
                if !dm.skip_active_content() {
                    dm.activate_next_slot();
                }
            }
            ButtonAction::PreviousSlot => {
                if !dm.skip_active_content() {
                    dm.activate_previous_slot();
                }
            }
            ButtonAction::ToggleDisplay => {
                if dm.is_display_on() {
                    dm.display_off();
                } else {
                    dm.display_on();
                }
            }
            ButtonAction::NextFadeEffect => dm.activate_next_fade_effect(),
            ButtonAction::ShowIpAddress | ButtonAction::PowerOff | ButtonAction::Restart => {
                return false
            }
            ButtonAction::IncreaseBrightness => self.step_brightness(dm, true),
            ButtonAction::DecreaseBrightness => self.step_brightness(dm, false),
            ButtonAction::SweepBrightness => self.step_brightness(dm, self.sweep_up),
        }
        true
    }

    fn step_brightness<P: ContentProvider, const N: usize>(
        &mut self,
        dm: &mut DisplayManager<P, N>,
        up: bool,
    ) {
        let before = dm.brightness();
        let target = if up {
            before.saturating_add(BRIGHTNESS_DELTA)
        } else {
            before.saturating_sub(BRIGHTNESS_DELTA)
        };
        dm.set_brightness(target);

        // Reverse the sweep at either end of the range
        if dm.brightness() == before || dm.brightness() != target {
            self.sweep_up = !up;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_button_layout() {
        let layout = ButtonLayout::OneButton;
        assert_eq!(
            layout.action(ButtonId::Ok, Gesture::Triggered(1)),
            Some(ButtonAction::NextSlot)
        );
        assert_eq!(
            layout.action(ButtonId::Ok, Gesture::Triggered(2)),
            Some(ButtonAction::NextFadeEffect)
        );
        assert_eq!(layout.action(ButtonId::Ok, Gesture::Triggered(3)), None);
        assert_eq!(
            layout.action(ButtonId::Ok, Gesture::Triggered(5)),
            Some(ButtonAction::ShowIpAddress)
        );
        assert_eq!(
            layout.action(ButtonId::Ok, Gesture::Triggered(4)),
            Some(ButtonAction::PowerOff)
        );
        assert_eq!(
            layout.action(ButtonId::Ok, Gesture::Triggered(6)),
            Some(ButtonAction::Restart)
        );
        assert_eq!(
            layout.action(ButtonId::Ok, Gesture::Held),
            Some(ButtonAction::SweepBrightness)
        );
        assert_eq!(layout.action(ButtonId::Left, Gesture::Triggered(1)), None);
    }

    #[test]
    fn test_two_button_layout() {
        let layout = ButtonLayout::TwoButtons;
        assert_eq!(
            layout.action(ButtonId::Left, Gesture::Triggered(1)),
            Some(ButtonAction::PreviousSlot)
        );
        assert_eq!(
            layout.action(ButtonId::Left, Gesture::Triggered(2)),
            Some(ButtonAction::ToggleDisplay)
        );
        assert_eq!(
            layout.action(ButtonId::Right, Gesture::Triggered(3)),
            Some(ButtonAction::ShowIpAddress)
        );
        assert_eq!(
            layout.action(ButtonId::Right, Gesture::Held),
            Some(ButtonAction::DecreaseBrightness)
        );
        assert_eq!(
            layout.action(ButtonId::Left, Gesture::Held),
            Some(ButtonAction::IncreaseBrightness)
        );
        assert_eq!(
            layout.action(ButtonId::Left, Gesture::Triggered(4)),
            Some(ButtonAction::PowerOff)
        );
        assert_eq!(
            layout.action(ButtonId::Left, Gesture::Triggered(5)),
            Some(ButtonAction::Restart)
        );
        assert_eq!(layout.action(ButtonId::Ok, Gesture::Triggered(1)), None);
    }

    #[test]
    fn test_next_slot_prefers_skipping_content() {
        use crate::scheduler::mock::MockProvider;

        let mut dm: DisplayManager<MockProvider, 4> = DisplayManager::new();
        let mut first = MockProvider::new(1);
        first.skips = 1;
        dm.install(first, Some(0)).unwrap();
        dm.install(MockProvider::new(2), Some(1)).unwrap();

        let mut now = 0;
        while now < 1000 {
            dm.tick(now);
            now += 20;
        }
        assert_eq!(dm.active_slot(), Some(0));

        let mut actions = ButtonActions::new();
        assert!(actions.execute(ButtonAction::NextSlot, &mut dm));
        assert_eq!(dm.provider_in_slot(0).unwrap().skips, 0);

        assert!(actions.execute(ButtonAction::NextSlot, &mut dm));
        while now < 2000 {
            dm.tick(now);
            now += 20;
        }
        assert_eq!(dm.active_slot(), Some(1));
    }

    #[test]
    fn test_toggle_display() {
        use crate::scheduler::mock::MockProvider;

        let mut dm: DisplayManager<MockProvider, 2> = DisplayManager::new();
        let mut actions = ButtonActions::new();
        actions.execute(ButtonAction::ToggleDisplay, &mut dm);
        assert!(!dm.is_display_on());
        actions.execute(ButtonAction::ToggleDisplay, &mut dm);
        assert!(dm.is_display_on());
        assert!(!actions.execute(ButtonAction::ShowIpAddress, &mut dm));
    }

    #[test]
    fn test_power_actions_left_to_caller() {
        use crate::scheduler::mock::MockProvider;

        let mut dm: DisplayManager<MockProvider, 2> = DisplayManager::new();
        let mut actions = ButtonActions::new();
        assert!(!actions.execute(ButtonAction::PowerOff, &mut dm));
        assert!(!actions.execute(ButtonAction::Restart, &mut dm));
        assert!(dm.is_display_on());
    }

    #[test]
    fn test_brightness_sweep_reverses() {
        use crate::config::MIN_BRIGHTNESS;
        use crate::scheduler::mock::MockProvider;

        let mut dm: DisplayManager<MockProvider, 2> = DisplayManager::new();
        let mut actions = ButtonActions::new();
        dm.set_brightness(35);

        actions.execute(ButtonAction::SweepBrightness, &mut dm);
        assert_eq!(dm.brightness(), MIN_BRIGHTNESS);
        actions.execute(ButtonAction::SweepBrightness, &mut dm);
        assert_eq!(dm.brightness(), MIN_BRIGHTNESS);
        actions.execute(ButtonAction::SweepBrightness, &mut dm);
        assert_eq!(dm.brightness(), MIN_BRIGHTNESS + BRIGHTNESS_DELTA);

        dm.set_brightness(30);
        actions.execute(ButtonAction::DecreaseBrightness, &mut dm);
        assert_eq!(dm.brightness(), MIN_BRIGHTNESS);
    }
}
