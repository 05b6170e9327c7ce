//! # Action Binding Module
//!
//! Maps logical drone actions to physical controller inputs.
//!
//! The drone exposes a fixed set of commands ([`LogicalAction`]); which
//! button, axis, or hat triggers each one depends on the controller model in
//! use. The [`ActionBindingTable`] is that indirection layer: it ships with
//! defaults for a reference PS3-style layout, can be partially overridden
//! from a persisted JSON file, and is rebuilt wholesale by a completed
//! calibration session.
//!
//! ## Reference layout
//!
//! | Action | Input |
//! |--------|-------|
//! | Land | button 0 (cross) |
//! | RecordToggle | button 1 (circle) |
//! | Stop | button 2 (triangle) |
//! | TakeOff | button 3 (square) |
//! | MoveLeftRight | axis 0 (left stick X) |
//! | MoveForwardBackward | axis 1 (left stick Y) |
//! | Rotate | axis 2 (right stick X) |
//! | MoveUpDown | axis 3 (right stick Y) |
//!
//! ## Persisted format
//!
//! ```json
//! {
//!   "name": "ps3",
//!   "guid": "030000004c0500006802000011010000",
//!   "axis": [ { "name": "move_left_right", "id": 0 } ],
//!   "buttons": [ { "name": "take_off", "id": 3 } ],
//!   "hats": [ { "hat": 0, "name": "record_toggle", "id": 1 } ]
//! }
//! ```
//!
//! A file only overrides the actions it names; everything else keeps the
//! reference default. Binding one physical input to two actions is rejected
//! outright, since the dispatch order would otherwise silently decide which action
//! fires.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::controller::events::{InputEvent, InputKind};
use crate::error::{PilotError, Result};

/// A logical drone action, independent of the physical control bound to it.
///
/// Closed set, fixed by the actuator's capability surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalAction {
    /// Toggle video recording on/off.
    RecordToggle,
    /// Engage hull protection, then ascend.
    TakeOff,
    /// Emergency stop.
    Stop,
    /// Land.
    Land,
    /// Lateral translation (left stick X).
    MoveLeftRight,
    /// Longitudinal translation (left stick Y).
    MoveForwardBackward,
    /// Yaw (right stick X).
    Rotate,
    /// Altitude (right stick Y).
    MoveUpDown,
}

impl LogicalAction {
    /// All actions, in the order the calibration session walks them.
    pub const ALL: [LogicalAction; 8] = [
        LogicalAction::RecordToggle,
        LogicalAction::TakeOff,
        LogicalAction::Stop,
        LogicalAction::Land,
        LogicalAction::MoveLeftRight,
        LogicalAction::MoveForwardBackward,
        LogicalAction::Rotate,
        LogicalAction::MoveUpDown,
    ];

    /// Stable name used in the persisted binding file.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            LogicalAction::RecordToggle => "record_toggle",
            LogicalAction::TakeOff => "take_off",
            LogicalAction::Stop => "stop",
            LogicalAction::Land => "land",
            LogicalAction::MoveLeftRight => "move_left_right",
            LogicalAction::MoveForwardBackward => "move_forward_backward",
            LogicalAction::Rotate => "rotate",
            LogicalAction::MoveUpDown => "move_up_down",
        }
    }

    /// Parses a persisted action name. Returns `None` for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// The kind of physical input this action expects.
    ///
    /// Discrete commands bind to buttons; continuous motion binds to axes.
    /// The calibration session only advances on an event of this kind.
    #[must_use]
    pub fn expected_kind(&self) -> InputKind {
        match self {
            LogicalAction::RecordToggle
            | LogicalAction::TakeOff
            | LogicalAction::Stop
            | LogicalAction::Land => InputKind::Button,
            LogicalAction::MoveLeftRight
            | LogicalAction::MoveForwardBackward
            | LogicalAction::Rotate
            | LogicalAction::MoveUpDown => InputKind::Axis,
        }
    }
}

impl std::fmt::Display for LogicalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete device-reported input identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalInput {
    /// A digital button, by device-reported id.
    Button(u8),
    /// An analog axis, by device-reported id.
    Axis(u8),
    /// A hat position: hat index plus direction bitmask.
    Hat { hat: u8, direction: u8 },
}

impl PhysicalInput {
    /// The kind of this input.
    #[must_use]
    pub fn kind(&self) -> InputKind {
        match self {
            PhysicalInput::Button(_) => InputKind::Button,
            PhysicalInput::Axis(_) => InputKind::Axis,
            PhysicalInput::Hat { .. } => InputKind::Hat,
        }
    }
}

/// One named binding entry in the persisted file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct BindingEntry {
    name: String,
    id: u8,
}

/// One hat binding entry: hat index, action name, direction bitmask.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct HatEntry {
    hat: u8,
    name: String,
    id: u8,
}

/// On-disk JSON shape of a binding table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct BindingFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    guid: String,
    #[serde(default)]
    axis: Vec<BindingEntry>,
    #[serde(default)]
    buttons: Vec<BindingEntry>,
    #[serde(default)]
    hats: Vec<HatEntry>,
}

/// Mapping from logical actions to physical inputs.
///
/// Immutable during flight; rebuilt wholesale by a calibration session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBindingTable {
    /// Human-readable controller layout name (e.g. "ps3").
    name: String,
    /// Device GUID, recorded at calibration time. May be empty.
    guid: String,
    map: HashMap<LogicalAction, PhysicalInput>,
}

impl Default for ActionBindingTable {
    fn default() -> Self {
        Self::reference_defaults()
    }
}

impl ActionBindingTable {
    /// An empty table with no bindings. Used by the calibration session,
    /// which fills it one action at a time.
    #[must_use]
    pub fn empty(name: impl Into<String>, guid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guid: guid.into(),
            map: HashMap::new(),
        }
    }

    /// Compiled-in defaults for the reference PS3-style layout.
    #[must_use]
    pub fn reference_defaults() -> Self {
        let mut table = Self::empty("ps3", "");
        // Infallible: the reference layout has no duplicate inputs.
        let defaults = [
            (LogicalAction::Land, PhysicalInput::Button(0)),
            (LogicalAction::RecordToggle, PhysicalInput::Button(1)),
            (LogicalAction::Stop, PhysicalInput::Button(2)),
            (LogicalAction::TakeOff, PhysicalInput::Button(3)),
            (LogicalAction::MoveLeftRight, PhysicalInput::Axis(0)),
            (LogicalAction::MoveForwardBackward, PhysicalInput::Axis(1)),
            (LogicalAction::Rotate, PhysicalInput::Axis(2)),
            (LogicalAction::MoveUpDown, PhysicalInput::Axis(3)),
        ];
        for (action, input) in defaults {
            table.map.insert(action, input);
        }
        table
    }

    /// Layout name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device GUID recorded with this table, if any.
    #[must_use]
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Number of bound actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no actions are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The input bound to `action`, if any.
    #[must_use]
    pub fn input_for(&self, action: LogicalAction) -> Option<PhysicalInput> {
        self.map.get(&action).copied()
    }

    /// Binds `action` to `input`, replacing any previous binding of `action`.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Binding`] if `input` is already bound to a
    /// different action. Two actions sharing one input would make dispatch
    /// depend on lookup order.
    pub fn bind(&mut self, action: LogicalAction, input: PhysicalInput) -> Result<()> {
        if let Some((&other, _)) = self
            .map
            .iter()
            .find(|(&a, &i)| i == input && a != action)
        {
            return Err(PilotError::Binding(format!(
                "{:?} is already bound to '{}', cannot also bind '{}'",
                input, other, action
            )));
        }
        self.map.insert(action, input);
        Ok(())
    }

    /// Resolves a physical input to its bound logical action.
    #[must_use]
    pub fn resolve(&self, input: &PhysicalInput) -> Option<LogicalAction> {
        self.map
            .iter()
            .find(|(_, bound)| *bound == input)
            .map(|(&action, _)| action)
    }

    /// Resolves a discrete input event to a logical action.
    ///
    /// Only press transitions resolve: button releases and hat returns to
    /// center yield `None`, which keeps dispatch edge-triggered. Axis events
    /// resolve regardless of value; the control loop needs them to route
    /// every sample to the right stick field.
    #[must_use]
    pub fn resolve_event(&self, event: &InputEvent) -> Option<LogicalAction> {
        let input = match *event {
            InputEvent::ButtonChanged { button, pressed } => {
                if !pressed {
                    return None;
                }
                PhysicalInput::Button(button)
            }
            InputEvent::AxisChanged { axis, .. } => PhysicalInput::Axis(axis),
            InputEvent::HatChanged { hat, direction } => {
                if direction == 0 {
                    return None;
                }
                PhysicalInput::Hat { hat, direction }
            }
            InputEvent::Connected | InputEvent::Disconnected => return None,
        };
        self.resolve(&input)
    }

    /// Loads a table from a JSON binding file, applying it as a per-action
    /// override on top of the reference defaults.
    ///
    /// Actions absent from the file keep their default binding; unknown
    /// action names in the file are an error (a typo would otherwise
    /// silently drop a binding).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, names
    /// an unknown action, or produces a duplicate physical binding.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)?;
        let file: BindingFile = serde_json::from_str(&contents)?;
        debug!(
            "Loaded binding file '{}' ({} buttons, {} axes, {} hats)",
            file.name,
            file.buttons.len(),
            file.axis.len(),
            file.hats.len()
        );
        Self::from_file(file)
    }

    fn from_file(file: BindingFile) -> Result<Self> {
        let mut table = Self::reference_defaults();
        if !file.name.is_empty() {
            table.name = file.name;
        }
        table.guid = file.guid;

        // Drop the defaults of every action the file names before binding,
        // so a file that swaps two default inputs does not trip the
        // duplicate check halfway through.
        for entry in file.buttons.iter().chain(&file.axis) {
            table.map.remove(&Self::parse_action(&entry.name)?);
        }
        for entry in &file.hats {
            table.map.remove(&Self::parse_action(&entry.name)?);
        }

        for entry in &file.buttons {
            let action = Self::parse_action(&entry.name)?;
            table.bind(action, PhysicalInput::Button(entry.id))?;
        }
        for entry in &file.axis {
            let action = Self::parse_action(&entry.name)?;
            table.bind(action, PhysicalInput::Axis(entry.id))?;
        }
        for entry in &file.hats {
            let action = Self::parse_action(&entry.name)?;
            table.bind(
                action,
                PhysicalInput::Hat {
                    hat: entry.hat,
                    direction: entry.id,
                },
            )?;
        }
        Ok(table)
    }

    fn parse_action(name: &str) -> Result<LogicalAction> {
        LogicalAction::from_name(name)
            .ok_or_else(|| PilotError::Binding(format!("unknown action '{}'", name)))
    }

    /// Saves the table as a JSON binding file.
    ///
    /// Entries are written in [`LogicalAction::ALL`] order so the output is
    /// deterministic and diffs cleanly.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = BindingFile {
            name: self.name.clone(),
            guid: self.guid.clone(),
            ..BindingFile::default()
        };
        for action in LogicalAction::ALL {
            let Some(input) = self.map.get(&action) else {
                continue;
            };
            match *input {
                PhysicalInput::Button(id) => file.buttons.push(BindingEntry {
                    name: action.name().to_string(),
                    id,
                }),
                PhysicalInput::Axis(id) => file.axis.push(BindingEntry {
                    name: action.name().to_string(),
                    id,
                }),
                PhysicalInput::Hat { hat, direction } => file.hats.push(HatEntry {
                    hat,
                    name: action.name().to_string(),
                    id: direction,
                }),
            }
        }
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    // ==================== LogicalAction Tests ====================

    #[test]
    fn test_action_names_round_trip() {
        for action in LogicalAction::ALL {
            assert_eq!(LogicalAction::from_name(action.name()), Some(action));
        }
    }

    #[test]
    fn test_unknown_action_name() {
        assert_eq!(LogicalAction::from_name("barrel_roll"), None);
    }

    #[test]
    fn test_expected_kinds() {
        assert_eq!(LogicalAction::TakeOff.expected_kind(), InputKind::Button);
        assert_eq!(LogicalAction::Land.expected_kind(), InputKind::Button);
        assert_eq!(LogicalAction::Rotate.expected_kind(), InputKind::Axis);
        assert_eq!(LogicalAction::MoveUpDown.expected_kind(), InputKind::Axis);
    }

    // ==================== Default Table Tests ====================

    #[test]
    fn test_reference_defaults_cover_all_actions() {
        let table = ActionBindingTable::reference_defaults();
        assert_eq!(table.len(), LogicalAction::ALL.len());
        for action in LogicalAction::ALL {
            assert!(table.input_for(action).is_some(), "{} unbound", action);
        }
    }

    #[test]
    fn test_reference_defaults_layout() {
        let table = ActionBindingTable::reference_defaults();
        assert_eq!(table.name(), "ps3");
        assert_eq!(
            table.input_for(LogicalAction::TakeOff),
            Some(PhysicalInput::Button(3))
        );
        assert_eq!(
            table.input_for(LogicalAction::MoveForwardBackward),
            Some(PhysicalInput::Axis(1))
        );
    }

    // ==================== Bind / Resolve Tests ====================

    #[test]
    fn test_bind_and_resolve() {
        let mut table = ActionBindingTable::empty("test", "");
        table
            .bind(LogicalAction::TakeOff, PhysicalInput::Button(7))
            .unwrap();
        assert_eq!(
            table.resolve(&PhysicalInput::Button(7)),
            Some(LogicalAction::TakeOff)
        );
        assert_eq!(table.resolve(&PhysicalInput::Button(8)), None);
    }

    #[test]
    fn test_rebind_same_action_allowed() {
        let mut table = ActionBindingTable::reference_defaults();
        table
            .bind(LogicalAction::Land, PhysicalInput::Button(9))
            .unwrap();
        assert_eq!(
            table.input_for(LogicalAction::Land),
            Some(PhysicalInput::Button(9))
        );
        // The old input no longer resolves
        assert_eq!(table.resolve(&PhysicalInput::Button(0)), None);
    }

    #[test]
    fn test_duplicate_input_rejected() {
        let mut table = ActionBindingTable::reference_defaults();
        // Button 0 is already Land
        let result = table.bind(LogicalAction::Stop, PhysicalInput::Button(0));
        assert!(result.is_err());
        // Table unchanged
        assert_eq!(
            table.input_for(LogicalAction::Stop),
            Some(PhysicalInput::Button(2))
        );
    }

    #[test]
    fn test_rebinding_input_to_same_action_is_idempotent() {
        let mut table = ActionBindingTable::reference_defaults();
        table
            .bind(LogicalAction::Land, PhysicalInput::Button(0))
            .unwrap();
        assert_eq!(
            table.input_for(LogicalAction::Land),
            Some(PhysicalInput::Button(0))
        );
    }

    #[test]
    fn test_hat_binding_resolution() {
        let mut table = ActionBindingTable::empty("test", "");
        let input = PhysicalInput::Hat { hat: 0, direction: 1 };
        table.bind(LogicalAction::RecordToggle, input).unwrap();
        assert_eq!(table.resolve(&input), Some(LogicalAction::RecordToggle));
        // Same hat, different direction: no match
        assert_eq!(
            table.resolve(&PhysicalInput::Hat { hat: 0, direction: 4 }),
            None
        );
    }

    // ==================== Event Resolution Tests ====================

    #[test]
    fn test_resolve_event_button_press_only() {
        let table = ActionBindingTable::reference_defaults();
        let press = InputEvent::ButtonChanged { button: 3, pressed: true };
        let release = InputEvent::ButtonChanged { button: 3, pressed: false };
        assert_eq!(table.resolve_event(&press), Some(LogicalAction::TakeOff));
        assert_eq!(table.resolve_event(&release), None);
    }

    #[test]
    fn test_resolve_event_axis() {
        let table = ActionBindingTable::reference_defaults();
        let event = InputEvent::AxisChanged { axis: 2, value: 15000 };
        assert_eq!(table.resolve_event(&event), Some(LogicalAction::Rotate));
    }

    #[test]
    fn test_resolve_event_hat_center_ignored() {
        let mut table = ActionBindingTable::empty("test", "");
        table
            .bind(
                LogicalAction::Stop,
                PhysicalInput::Hat { hat: 0, direction: 2 },
            )
            .unwrap();
        let press = InputEvent::HatChanged { hat: 0, direction: 2 };
        let center = InputEvent::HatChanged { hat: 0, direction: 0 };
        assert_eq!(table.resolve_event(&press), Some(LogicalAction::Stop));
        assert_eq!(table.resolve_event(&center), None);
    }

    #[test]
    fn test_resolve_event_device_events_ignored() {
        let table = ActionBindingTable::reference_defaults();
        assert_eq!(table.resolve_event(&InputEvent::Connected), None);
        assert_eq!(table.resolve_event(&InputEvent::Disconnected), None);
    }

    // ==================== Persistence Tests ====================

    #[test]
    fn test_save_load_round_trip() {
        let mut table = ActionBindingTable::empty("xbox", "abcd1234");
        table
            .bind(LogicalAction::TakeOff, PhysicalInput::Button(7))
            .unwrap();
        table
            .bind(LogicalAction::Land, PhysicalInput::Button(6))
            .unwrap();
        table
            .bind(LogicalAction::Stop, PhysicalInput::Button(8))
            .unwrap();
        table
            .bind(
                LogicalAction::RecordToggle,
                PhysicalInput::Hat { hat: 0, direction: 1 },
            )
            .unwrap();
        table
            .bind(LogicalAction::MoveLeftRight, PhysicalInput::Axis(0))
            .unwrap();
        table
            .bind(LogicalAction::MoveForwardBackward, PhysicalInput::Axis(1))
            .unwrap();
        table
            .bind(LogicalAction::Rotate, PhysicalInput::Axis(3))
            .unwrap();
        table
            .bind(LogicalAction::MoveUpDown, PhysicalInput::Axis(4))
            .unwrap();

        let file = NamedTempFile::new().unwrap();
        table.save(file.path()).unwrap();
        let loaded = ActionBindingTable::load(file.path()).unwrap();

        assert_eq!(loaded.name(), "xbox");
        assert_eq!(loaded.guid(), "abcd1234");
        for action in LogicalAction::ALL {
            assert_eq!(
                loaded.input_for(action),
                table.input_for(action),
                "binding for {} did not survive the round trip",
                action
            );
        }
    }

    #[test]
    fn test_load_partial_override() {
        let json = r#"{
            "name": "custom",
            "guid": "ffff",
            "buttons": [ { "name": "take_off", "id": 11 } ],
            "axis": [],
            "hats": []
        }"#;
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), json).unwrap();

        let table = ActionBindingTable::load(file.path()).unwrap();
        // Overridden action
        assert_eq!(
            table.input_for(LogicalAction::TakeOff),
            Some(PhysicalInput::Button(11))
        );
        // Untouched actions keep their defaults
        assert_eq!(
            table.input_for(LogicalAction::Land),
            Some(PhysicalInput::Button(0))
        );
        assert_eq!(
            table.input_for(LogicalAction::Rotate),
            Some(PhysicalInput::Axis(2))
        );
        assert_eq!(table.name(), "custom");
    }

    #[test]
    fn test_load_unknown_action_rejected() {
        let json = r#"{ "buttons": [ { "name": "warp_drive", "id": 1 } ] }"#;
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), json).unwrap();
        assert!(ActionBindingTable::load(file.path()).is_err());
    }

    #[test]
    fn test_load_duplicate_binding_rejected() {
        // Both actions claim button 5
        let json = r#"{
            "buttons": [
                { "name": "take_off", "id": 5 },
                { "name": "land", "id": 5 }
            ]
        }"#;
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), json).unwrap();
        assert!(ActionBindingTable::load(file.path()).is_err());
    }

    #[test]
    fn test_load_swapped_defaults_accepted() {
        // Swapping two default axes must not trip the duplicate check
        let json = r#"{
            "axis": [
                { "name": "move_left_right", "id": 1 },
                { "name": "move_forward_backward", "id": 0 }
            ]
        }"#;
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), json).unwrap();

        let table = ActionBindingTable::load(file.path()).unwrap();
        assert_eq!(
            table.input_for(LogicalAction::MoveLeftRight),
            Some(PhysicalInput::Axis(1))
        );
        assert_eq!(
            table.input_for(LogicalAction::MoveForwardBackward),
            Some(PhysicalInput::Axis(0))
        );
    }

    #[test]
    fn test_load_invalid_json_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not json at all").unwrap();
        assert!(ActionBindingTable::load(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file_rejected() {
        let result = ActionBindingTable::load("/nonexistent/bindings.json");
        assert!(result.is_err());
    }
}
