//! Lifecycle state definition
//!
//! Exactly one state is active. Everything the main loop does is a function
//! of the current state and the events its hooks produce.

use super::events::Event;

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    /// Logo shown, boot button sampled
    Init,
    /// Station connection in progress
    Connecting,
    /// Own access point for configuration
    AccessPoint,
    /// Station link up
    Connected,
    /// Fault detected; terminal
    Error(Fault),
    /// Display off, sleeping until a wake source fires
    Off,
    /// Reboot pending
    Restart,
}

/// Low-level faults
///
/// The numeric code is the number of indicator pulses per blink group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Fault after the display came up, blinks continuously
    Runtime,
    Unknown,
    /// I2C bus initialization failed
    TwoWire,
    /// Boot button not wired
    NoUserButton,
    BadFilesystem,
    DisplayManager,
    SystemMessage,
    UpdateManager,
    /// A network service could not be started
    Service,
}

impl Fault {
    pub fn code(self) -> u8 {
        match self {
            Fault::Runtime => 0,
            Fault::Unknown => 1,
            Fault::TwoWire => 2,
            Fault::NoUserButton => 3,
            Fault::BadFilesystem => 4,
            Fault::DisplayManager => 5,
            Fault::SystemMessage => 6,
            Fault::UpdateManager => 7,
            Fault::Service => 8,
        }
    }

    /// Pulses per group, 0 = continuous
    pub fn blink_count(self) -> u8 {
        self.code()
    }

    pub fn description(self) -> &'static str {
        match self {
            Fault::Runtime => "Runtime error",
            Fault::Unknown => "Unknown error",
            Fault::TwoWire => "I2C error",
            Fault::NoUserButton => "No user button",
            Fault::BadFilesystem => "Bad filesystem",
            Fault::DisplayManager => "Display error",
            Fault::SystemMessage => "System message error",
            Fault::UpdateManager => "Update error",
            Fault::Service => "Service error",
        }
    }
}

impl SystemState {
    /// Button gestures are executed as actions in this state
    ///
    /// Init samples the raw boot button, Error and Off ignore buttons.
    pub fn accepts_button_actions(&self) -> bool {
        matches!(
            self,
            SystemState::Connecting | SystemState::Connected | SystemState::AccessPoint
        )
    }

    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use SystemState::*;

        match (self, event) {
            // Error absorbs everything
            (Error(fault), _) => Error(fault),
            (_, FaultDetected(fault)) => Error(fault),

            // Init transitions
            (Init, BootButtonReleased) => Connecting,
            (Init, BootButtonPressed) => AccessPoint,

            // Connecting transitions
            (Connecting, ConnectionEstablished) => Connected,
            (Connecting, NoCredentials) => AccessPoint,

            // Connected transitions
            (Connected, ConnectionLost) => Connecting,
            (Connected | AccessPoint, PowerOffRequested) => Off,
            (Connected | AccessPoint, RestartRequested) => Restart,

            // Off transitions
            (Off, WakeUp) => Restart,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_actions_per_state() {
        assert!(SystemState::Connecting.accepts_button_actions());
        assert!(SystemState::Connected.accepts_button_actions());
        assert!(SystemState::AccessPoint.accepts_button_actions());
        assert!(!SystemState::Init.accepts_button_actions());
        assert!(!SystemState::Off.accepts_button_actions());
        assert!(!SystemState::Restart.accepts_button_actions());
        assert!(!SystemState::Error(Fault::Service).accepts_button_actions());
    }

    #[test]
    fn test_boot_paths() {
        assert_eq!(
            SystemState::Init.transition(Event::BootButtonReleased),
            SystemState::Connecting
        );
        assert_eq!(
            SystemState::Init.transition(Event::BootButtonPressed),
            SystemState::AccessPoint
        );
    }

    #[test]
    fn test_connection_flow() {
        let connecting = SystemState::Connecting;
        let connected = connecting.transition(Event::ConnectionEstablished);
        assert_eq!(connected, SystemState::Connected);

        let reconnecting = connected.transition(Event::ConnectionLost);
        assert_eq!(reconnecting, SystemState::Connecting);

        assert_eq!(
            connecting.transition(Event::NoCredentials),
            SystemState::AccessPoint
        );
    }

    #[test]
    fn test_fault_from_any_state() {
        let states = [
            SystemState::Init,
            SystemState::Connecting,
            SystemState::AccessPoint,
            SystemState::Connected,
            SystemState::Off,
            SystemState::Restart,
        ];

        for state in states {
            let next = state.transition(Event::FaultDetected(Fault::Service));
            assert_eq!(next, SystemState::Error(Fault::Service));
        }
    }

    #[test]
    fn test_error_is_terminal() {
        let error = SystemState::Error(Fault::BadFilesystem);
        assert_eq!(error.transition(Event::RestartRequested), error);
        assert_eq!(error.transition(Event::WakeUp), error);
        assert_eq!(error.transition(Event::FaultDetected(Fault::Runtime)), error);
    }

    #[test]
    fn test_power_and_restart() {
        for state in [SystemState::Connected, SystemState::AccessPoint] {
            assert_eq!(state.transition(Event::PowerOffRequested), SystemState::Off);
            assert_eq!(state.transition(Event::RestartRequested), SystemState::Restart);
        }
        assert_eq!(SystemState::Off.transition(Event::WakeUp), SystemState::Restart);

        // Requests are not honored while still setting up
        assert_eq!(
            SystemState::Connecting.transition(Event::PowerOffRequested),
            SystemState::Connecting
        );
        assert_eq!(SystemState::Init.transition(Event::RestartRequested), SystemState::Init);
    }

    #[test]
    fn test_fault_codes() {
        assert_eq!(Fault::Runtime.blink_count(), 0);
        assert_eq!(Fault::Unknown.code(), 1);
        assert_eq!(Fault::NoUserButton.code(), 3);
        assert_eq!(Fault::Service.code(), 8);
    }
}
