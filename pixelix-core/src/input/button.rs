//! Button identifiers and states

/// Number of physical buttons the firmware knows about
pub const BUTTON_COUNT: usize = 3;

/// Physical button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    /// Main button, also the boot-mode button
    Ok,
    Left,
    Right,
}

impl ButtonId {
    pub const ALL: [ButtonId; BUTTON_COUNT] = [ButtonId::Ok, ButtonId::Left, ButtonId::Right];

    pub fn index(self) -> usize {
        match self {
            ButtonId::Ok => 0,
            ButtonId::Left => 1,
            ButtonId::Right => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Debounced button state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    /// No pin wired, never changes
    NotConnected,
    /// Not yet stable after power-up
    Unknown,
    Released,
    Pressed,
}

/// Raw electrical pin level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    /// Buttons are active low
    pub fn to_state(self) -> ButtonState {
        match self {
            PinLevel::Low => ButtonState::Pressed,
            PinLevel::High => ButtonState::Released,
        }
    }
}

/// Debounced state change with its timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    pub id: ButtonId,
    pub state: ButtonState,
    pub timestamp_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_low() {
        assert_eq!(PinLevel::Low.to_state(), ButtonState::Pressed);
        assert_eq!(PinLevel::High.to_state(), ButtonState::Released);
    }

    #[test]
    fn test_index_round_trip() {
        for id in ButtonId::ALL {
            assert_eq!(ButtonId::from_index(id.index()), Some(id));
        }
        assert_eq!(ButtonId::from_index(BUTTON_COUNT), None);
    }
}
