//! # Stick State Module
//!
//! Holds the latest raw readings of the two analog sticks.
//!
//! The readings live inside the control loop with a single-writer
//! discipline: the event-dispatch side writes, the periodic tick reads.
//! Last write wins, no merging.

/// Raw reading of one two-axis stick, in the signed device range (±32767).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickReading {
    /// Horizontal deflection. Negative = left, positive = right.
    pub x: f64,
    /// Vertical deflection. Negative = up/forward, positive = down/backward.
    pub y: f64,
}

impl StickReading {
    /// A centered stick.
    #[must_use]
    pub fn centered() -> Self {
        Self::default()
    }

    /// Updates the x axis only if the value actually changed.
    ///
    /// Returns `true` if the reading was modified. The guard avoids redundant
    /// writes when the device re-reports an unchanged position; downstream
    /// normalization is idempotent, so this is an optimization rather than a
    /// correctness requirement.
    pub fn set_x(&mut self, value: f64) -> bool {
        if self.x != value {
            self.x = value;
            true
        } else {
            false
        }
    }

    /// Updates the y axis only if the value actually changed.
    ///
    /// Returns `true` if the reading was modified.
    pub fn set_y(&mut self, value: f64) -> bool {
        if self.y != value {
            self.y = value;
            true
        } else {
            false
        }
    }
}

/// The pair of stick readings the control loop ticks against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickState {
    /// Left stick: translation (forward/backward, left/right).
    pub left: StickReading,
    /// Right stick: altitude and yaw.
    pub right: StickReading,
}

impl StickState {
    /// Both sticks centered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_centered() {
        let state = StickState::new();
        assert_eq!(state.left, StickReading::centered());
        assert_eq!(state.right, StickReading::centered());
        assert_eq!(state.left.x, 0.0);
        assert_eq!(state.left.y, 0.0);
    }

    #[test]
    fn test_set_x_changes_value() {
        let mut reading = StickReading::centered();
        assert!(reading.set_x(12000.0));
        assert_eq!(reading.x, 12000.0);
    }

    #[test]
    fn test_set_x_no_op_on_same_value() {
        let mut reading = StickReading::centered();
        reading.set_x(12000.0);
        assert!(!reading.set_x(12000.0));
        assert_eq!(reading.x, 12000.0);
    }

    #[test]
    fn test_set_y_independent_of_x() {
        let mut reading = StickReading::centered();
        reading.set_x(5000.0);
        assert!(reading.set_y(-7000.0));
        assert_eq!(reading.x, 5000.0);
        assert_eq!(reading.y, -7000.0);
    }

    #[test]
    fn test_last_write_wins() {
        let mut reading = StickReading::centered();
        reading.set_y(100.0);
        reading.set_y(-200.0);
        reading.set_y(300.0);
        assert_eq!(reading.y, 300.0);
    }
}
