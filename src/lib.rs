//! # Bebop Pilot Library
//!
//! Fly a Parrot Bebop class drone with an ordinary gamepad.
//!
//! This library provides the core functionality for translating analog stick
//! and button input into drone commands: axis normalization, button/axis
//! binding tables, interactive calibration, and the fixed-rate control loop.

pub mod args;
pub mod config;
pub mod controller;
pub mod error;
pub mod flight;
pub mod video;
