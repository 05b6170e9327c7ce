//! # Joystick Source Module
//!
//! Gamepad detection, connection, and event delivery via the Linux evdev
//! interface.
//!
//! Unlike a single-model backend, this module does not assume any particular
//! controller: it scans `/dev/input/event*` for the first device advertising
//! gamepad buttons (or opens an explicitly configured path) and translates
//! raw kernel events into the crate's [`InputEvent`] model. Which control
//! means what is decided later by the binding table, not here.
//!
//! ## Identifier mapping
//!
//! - Buttons: evdev gamepad key codes are shifted down to small SDL-style
//!   ids (`BTN_SOUTH` → 0, `BTN_EAST` → 1, ...). Calibration discovers these
//!   ids, so the exact numbering only has to be stable, not universal.
//! - Axes: the evdev axis code is used directly (`ABS_X` → 0, `ABS_Y` → 1).
//!   Values are rescaled from the device's reported range to ±32767 so the
//!   normalization constants hold for every controller.
//! - Hats: `ABS_HAT0X`/`ABS_HAT0Y` pairs are composed into a single
//!   direction bitmask per hat (see [`crate::controller::events`]).

use evdev::{AbsoluteAxisType, Device, Key};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::controller::events::{
    InputEvent, HAT_DOWN, HAT_LEFT, HAT_RIGHT, HAT_UP,
};
use crate::error::{PilotError, Result};

/// Full-scale magnitude axis values are rescaled to.
const AXIS_FULL_SCALE: i32 = 32767;

/// First evdev code of the gamepad button block (BTN_SOUTH).
const BTN_GAMEPAD_BASE: u16 = 0x130;

/// First evdev code of the joystick button block (BTN_JOYSTICK).
const BTN_JOYSTICK_BASE: u16 = 0x120;

/// First evdev axis code of the hat block (ABS_HAT0X).
const ABS_HAT_BASE: u16 = 0x10;

/// Last evdev axis code of the hat block (ABS_HAT3Y).
const ABS_HAT_LAST: u16 = 0x17;

/// Translates raw evdev events into [`InputEvent`]s.
///
/// Holds the per-axis value ranges (for rescaling) and the current hat axis
/// positions (for composing direction bitmasks). Kept separate from the
/// device handle so translation is testable without hardware.
#[derive(Debug, Default)]
pub struct EventTranslator {
    /// Reported (min, max) per absolute axis code.
    abs_ranges: HashMap<u16, (i32, i32)>,
    /// Current (x, y) position per hat index.
    hats: HashMap<u8, (i32, i32)>,
}

impl EventTranslator {
    /// Creates a translator with no known axis ranges.
    ///
    /// Axes without a registered range pass values through clamped to i16.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the reported value range for one absolute axis.
    pub fn set_axis_range(&mut self, code: u16, min: i32, max: i32) {
        if min < max {
            self.abs_ranges.insert(code, (min, max));
        }
    }

    /// Translates one raw evdev event. Returns `None` for event types the
    /// core does not consume (sync reports, misc, force feedback).
    pub fn translate(&mut self, event: &evdev::InputEvent) -> Option<InputEvent> {
        match event.kind() {
            evdev::InputEventKind::AbsAxis(axis) => self.translate_abs(axis, event.value()),
            evdev::InputEventKind::Key(key) => self.translate_key(key, event.value() != 0),
            _ => None,
        }
    }

    fn translate_abs(&mut self, axis: AbsoluteAxisType, value: i32) -> Option<InputEvent> {
        let code = axis.0;
        if (ABS_HAT_BASE..=ABS_HAT_LAST).contains(&code) {
            return Some(self.translate_hat(code, value));
        }
        Some(InputEvent::AxisChanged {
            axis: code as u8,
            value: self.rescale(code, value),
        })
    }

    /// Folds a hat axis change into the composed direction bitmask.
    fn translate_hat(&mut self, code: u16, value: i32) -> InputEvent {
        let hat = ((code - ABS_HAT_BASE) / 2) as u8;
        let is_y = (code - ABS_HAT_BASE) % 2 == 1;

        let entry = self.hats.entry(hat).or_insert((0, 0));
        if is_y {
            entry.1 = value;
        } else {
            entry.0 = value;
        }

        let mut direction = 0u8;
        if entry.0 < 0 {
            direction |= HAT_LEFT;
        } else if entry.0 > 0 {
            direction |= HAT_RIGHT;
        }
        if entry.1 < 0 {
            direction |= HAT_UP;
        } else if entry.1 > 0 {
            direction |= HAT_DOWN;
        }

        InputEvent::HatChanged { hat, direction }
    }

    fn translate_key(&self, key: Key, pressed: bool) -> Option<InputEvent> {
        let code = key.code();
        let button = if code >= BTN_GAMEPAD_BASE {
            code - BTN_GAMEPAD_BASE
        } else if code >= BTN_JOYSTICK_BASE {
            code - BTN_JOYSTICK_BASE
        } else {
            // Keyboard keys and mouse buttons are not gamepad controls
            return None;
        };
        if button > u8::MAX as u16 {
            return None;
        }
        Some(InputEvent::ButtonChanged {
            button: button as u8,
            pressed,
        })
    }

    /// Rescales a raw axis value into ±32767 using the device-reported range.
    fn rescale(&self, code: u16, value: i32) -> i16 {
        match self.abs_ranges.get(&code) {
            Some(&(min, max)) => {
                let span = (max - min) as f64;
                let ratio = (value - min) as f64 / span;
                let scaled = ratio * (2.0 * AXIS_FULL_SCALE as f64) - AXIS_FULL_SCALE as f64;
                scaled.round().clamp(-(AXIS_FULL_SCALE as f64), AXIS_FULL_SCALE as f64) as i16
            }
            None => value.clamp(-AXIS_FULL_SCALE, AXIS_FULL_SCALE) as i16,
        }
    }
}

/// Gamepad handle: an open evdev device plus its event translator.
pub struct Joystick {
    device: Device,
    translator: EventTranslator,
    device_path: String,
    guid: String,
}

impl std::fmt::Debug for Joystick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Joystick")
            .field("device_path", &self.device_path)
            .field("guid", &self.guid)
            .finish_non_exhaustive()
    }
}

impl Joystick {
    /// Detects and opens the first available gamepad.
    ///
    /// Scans `/dev/input/event*` (sorted, for deterministic selection) and
    /// picks the first device that advertises gamepad or joystick buttons.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound` if no gamepad is attached
    /// - `Controller` on permission or I/O errors while scanning
    pub fn open_first() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(PilotError::Controller(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| PilotError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PilotError::Controller(format!("Failed to read directory entry: {}", e)))?;
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();
            let Some(filename) = path.file_name() else {
                continue;
            };
            if !filename.to_string_lossy().starts_with("event") {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    if Self::looks_like_gamepad(&device) {
                        return Self::from_device(device, path.to_string_lossy().into_owned());
                    }
                    debug!("Skipping non-gamepad input device {}", path.display());
                }
                Err(e) => {
                    // Permission denied or the device vanished; keep scanning
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(PilotError::ControllerNotFound)
    }

    /// Opens a gamepad at an explicit device path.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the path cannot be opened.
    pub fn open_path(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| PilotError::Controller(format!("Failed to open {}: {}", path, e)))?;
        Self::from_device(device, path.to_string())
    }

    /// Opens either the configured path or the first detected gamepad.
    pub fn open(configured_path: &str) -> Result<Self> {
        if configured_path.is_empty() {
            Self::open_first()
        } else {
            Self::open_path(configured_path)
        }
    }

    fn from_device(device: Device, device_path: String) -> Result<Self> {
        let id = device.input_id();
        let guid = format!(
            "{:04x}{:04x}{:04x}{:04x}",
            id.bus_type().0,
            id.vendor(),
            id.product(),
            id.version()
        );

        let mut translator = EventTranslator::new();
        if let Ok(abs) = device.get_abs_state() {
            // get_abs_state is indexed by axis code
            for (code, info) in abs.iter().enumerate() {
                if info.minimum < info.maximum {
                    translator.set_axis_range(code as u16, info.minimum, info.maximum);
                }
            }
        }

        info!(
            "Opened gamepad '{}' at {} (guid {})",
            device.name().unwrap_or("unknown"),
            device_path,
            guid
        );

        Ok(Self {
            device,
            translator,
            device_path,
            guid,
        })
    }

    fn looks_like_gamepad(device: &Device) -> bool {
        device.supported_keys().map_or(false, |keys| {
            keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER)
        })
    }

    /// The `/dev/input/eventX` path this gamepad was opened from.
    #[must_use]
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Synthetic device GUID (bus/vendor/product/version), recorded into
    /// calibration output.
    #[must_use]
    pub fn guid(&self) -> String {
        self.guid.clone()
    }

    /// Human-readable device name, if the kernel reports one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Moves the gamepad onto a blocking task that pumps translated events
    /// into `tx` until the channel closes or the device disappears.
    ///
    /// On a read error (unplugged controller) a final
    /// [`InputEvent::Disconnected`] is delivered and the pump ends; the
    /// consumer decides whether that is fatal.
    pub fn spawn_event_pump(
        mut self,
        tx: mpsc::Sender<InputEvent>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            if tx.blocking_send(InputEvent::Connected).is_err() {
                return;
            }
            loop {
                let events = match self.device.fetch_events() {
                    Ok(events) => events.collect::<Vec<_>>(),
                    Err(e) => {
                        warn!("Gamepad read failed ({}); stopping event pump", e);
                        let _ = tx.blocking_send(InputEvent::Disconnected);
                        return;
                    }
                };
                for raw in events {
                    if let Some(event) = self.translator.translate(&raw) {
                        if tx.blocking_send(event).is_err() {
                            // Consumer gone; shut the pump down quietly
                            return;
                        }
                    }
                }
            }
        })
    }
}
