//! # Flight Module
//!
//! Drone command dispatch and the fixed-rate control loop.
//!
//! This module handles:
//! - The actuator trait the drone backend implements
//! - Translating stick state into motion commands every tick
//! - Edge-triggered discrete actions (take off, land, stop, recording)

pub mod actuator;
pub mod control_loop;
