//! # Input Event Model
//!
//! Device-independent representation of gamepad input transitions.
//!
//! The joystick backend (evdev, see [`super::joystick`]) translates raw kernel
//! events into these variants. Everything downstream of this module only
//! ever sees
//! [`InputEvent`] values, so the event-delivery layer stays swappable.
//!
//! ## Hat directions
//!
//! Hat positions are reported as an SDL-style direction bitmask so that a
//! diagonal press is a single value rather than two axis readings:
//!
//! | Bit | Direction |
//! |-----|-----------|
//! | 1   | Up        |
//! | 2   | Right     |
//! | 4   | Down      |
//! | 8   | Left      |
//!
//! `0` means centered.

/// Hat direction bit: up.
pub const HAT_UP: u8 = 1;
/// Hat direction bit: right.
pub const HAT_RIGHT: u8 = 2;
/// Hat direction bit: down.
pub const HAT_DOWN: u8 = 4;
/// Hat direction bit: left.
pub const HAT_LEFT: u8 = 8;
/// Hat centered (no direction pressed).
pub const HAT_CENTERED: u8 = 0;

/// The kind of physical control an event originates from.
///
/// Used by the calibration session to filter events: a step waiting for a
/// button binding must not consume an axis wiggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Digital button press/release.
    Button,
    /// Analog axis movement.
    Axis,
    /// Hat (d-pad) direction change.
    Hat,
}

/// A single input transition delivered by the event source.
///
/// Axis values are rescaled by the backend to the signed full-scale range
/// (±32767) regardless of what the kernel reports for the device, so the
/// normalization constants hold for every controller model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// An analog axis moved. `value` is in ±32767.
    AxisChanged { axis: u8, value: i16 },
    /// A button was pressed or released.
    ButtonChanged { button: u8, pressed: bool },
    /// A hat changed direction. `direction` is the SDL-style bitmask above.
    HatChanged { hat: u8, direction: u8 },
    /// The device was (re)attached. Informational only.
    Connected,
    /// The device was detached. Informational only.
    Disconnected,
}

impl InputEvent {
    /// Returns the physical-control kind of this event, if it has one.
    ///
    /// Device add/remove notifications carry no control identity and
    /// return `None`.
    #[must_use]
    pub fn kind(&self) -> Option<InputKind> {
        match self {
            InputEvent::AxisChanged { .. } => Some(InputKind::Axis),
            InputEvent::ButtonChanged { .. } => Some(InputKind::Button),
            InputEvent::HatChanged { .. } => Some(InputKind::Hat),
            InputEvent::Connected | InputEvent::Disconnected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_axis() {
        let event = InputEvent::AxisChanged { axis: 0, value: 1000 };
        assert_eq!(event.kind(), Some(InputKind::Axis));
    }

    #[test]
    fn test_kind_button() {
        let event = InputEvent::ButtonChanged { button: 2, pressed: true };
        assert_eq!(event.kind(), Some(InputKind::Button));
    }

    #[test]
    fn test_kind_hat() {
        let event = InputEvent::HatChanged { hat: 0, direction: HAT_UP };
        assert_eq!(event.kind(), Some(InputKind::Hat));
    }

    #[test]
    fn test_kind_device_events() {
        assert_eq!(InputEvent::Connected.kind(), None);
        assert_eq!(InputEvent::Disconnected.kind(), None);
    }

    #[test]
    fn test_hat_direction_bits_disjoint() {
        // Each direction must occupy its own bit so diagonals compose
        assert_eq!(HAT_UP & HAT_RIGHT, 0);
        assert_eq!(HAT_RIGHT & HAT_DOWN, 0);
        assert_eq!(HAT_DOWN & HAT_LEFT, 0);
        assert_eq!(HAT_LEFT & HAT_UP, 0);
        assert_eq!(HAT_CENTERED, 0);
    }
}
