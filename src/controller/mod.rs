//! # Controller Module
//!
//! Gamepad input handling for the pilot.
//!
//! This module handles:
//! - Joystick detection and connection via evdev
//! - Translating kernel input events into logical gamepad events
//! - Normalizing raw axis deflection into command intensity
//! - Stick-state bookkeeping for the control loop
//! - Button/axis binding tables and interactive calibration

pub mod bindings;
pub mod calibration;
pub mod events;
pub mod joystick;
pub mod normalize;
pub mod stick;
