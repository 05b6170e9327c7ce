//! # Calibration Module
//!
//! Interactive discovery of a controller's button/axis/hat identifiers.
//!
//! A [`CalibrationSession`] walks an ordered list of logical actions. For each
//! action it waits for the next input event of the expected kind (a button
//! action only advances on a button event, an axis action only on an axis
//! event) and records the observed physical identifier as the binding. Events
//! of the wrong kind are discarded, not buffered. When the last action is
//! bound the session is complete and yields a full [`ActionBindingTable`]
//! ready to persist.
//!
//! The state machine itself is synchronous and takes events through
//! [`CalibrationSession::feed`], so it is unit-testable without a controller
//! attached. [`run_session`] wraps it for interactive use: it prompts on
//! stdout, pulls events from a channel, and aborts with an error if a step
//! sees no matching input within a timeout. A session must never hang
//! forever on a disconnected controller.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::controller::bindings::{ActionBindingTable, LogicalAction, PhysicalInput};
use crate::controller::events::{InputEvent, InputKind};
use crate::error::{PilotError, Result};

/// Where a calibration session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the physical input to bind to this action.
    AwaitingAction(LogicalAction),
    /// Every required action is bound.
    Complete,
}

/// Button-by-button discovery state machine.
///
/// There is exactly one live state at a time; each accepted event advances
/// the session by one action.
#[derive(Debug)]
pub struct CalibrationSession {
    pending: VecDeque<LogicalAction>,
    table: ActionBindingTable,
}

impl CalibrationSession {
    /// Starts a session over the full required action list
    /// ([`LogicalAction::ALL`]).
    #[must_use]
    pub fn new(name: impl Into<String>, guid: impl Into<String>) -> Self {
        Self::with_actions(name, guid, &LogicalAction::ALL)
    }

    /// Starts a session over a custom ordered action list.
    #[must_use]
    pub fn with_actions(
        name: impl Into<String>,
        guid: impl Into<String>,
        actions: &[LogicalAction],
    ) -> Self {
        Self {
            pending: actions.iter().copied().collect(),
            table: ActionBindingTable::empty(name, guid),
        }
    }

    /// Current state: the action being waited on, or `Complete`.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.pending.front() {
            Some(&action) => SessionState::AwaitingAction(action),
            None => SessionState::Complete,
        }
    }

    /// Number of actions still waiting for a binding.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Feeds one input event into the session.
    ///
    /// If the event matches the expected kind of the current pending action,
    /// the observed identifier is bound and the session advances. Wrong-kind
    /// events, button releases, hat returns-to-center, and inputs already
    /// bound to an earlier action all leave the state unchanged.
    pub fn feed(&mut self, event: &InputEvent) -> SessionState {
        let Some(&current) = self.pending.front() else {
            return SessionState::Complete;
        };

        if event.kind() != Some(current.expected_kind()) {
            return self.state();
        }

        let Some(input) = Self::capture(event) else {
            return self.state();
        };

        match self.table.bind(current, input) {
            Ok(()) => {
                info!("Bound '{}' to {:?}", current, input);
                self.pending.pop_front();
            }
            Err(e) => {
                // Same input pressed twice in a row; keep waiting.
                warn!("Ignoring input for '{}': {}", current, e);
            }
        }
        self.state()
    }

    /// Extracts the bindable physical identifier from an event.
    ///
    /// Only press-side transitions identify a control.
    fn capture(event: &InputEvent) -> Option<PhysicalInput> {
        match *event {
            InputEvent::ButtonChanged { button, pressed: true } => {
                Some(PhysicalInput::Button(button))
            }
            InputEvent::AxisChanged { axis, .. } => Some(PhysicalInput::Axis(axis)),
            InputEvent::HatChanged { hat, direction } if direction != 0 => {
                Some(PhysicalInput::Hat { hat, direction })
            }
            _ => None,
        }
    }

    /// Consumes the session and returns the completed table.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Binding`] if actions are still pending.
    pub fn finish(self) -> Result<ActionBindingTable> {
        if !self.pending.is_empty() {
            return Err(PilotError::Binding(format!(
                "calibration incomplete: {} actions still pending",
                self.pending.len()
            )));
        }
        Ok(self.table)
    }
}

/// Human prompt for one calibration step.
fn prompt_for(action: LogicalAction) -> String {
    match action.expected_kind() {
        InputKind::Button => format!("Press the button for '{}':", action),
        InputKind::Axis => format!("Move the stick axis for '{}':", action),
        InputKind::Hat => format!("Press the hat direction for '{}':", action),
    }
}

/// Runs a calibration session interactively against an event channel.
///
/// Prompts for each pending action on stdout and feeds incoming events to the
/// state machine. Each step must observe a matching input within
/// `step_timeout` of its prompt; the deadline is fixed per step, so a stream
/// of wrong-kind noise events cannot postpone it.
///
/// # Errors
///
/// - [`PilotError::CalibrationTimeout`] if a step sees no matching input in time
/// - [`PilotError::CalibrationDisconnected`] if the event source closes
pub async fn run_session(
    mut session: CalibrationSession,
    events: &mut mpsc::Receiver<InputEvent>,
    step_timeout: Duration,
) -> Result<ActionBindingTable> {
    while let SessionState::AwaitingAction(action) = session.state() {
        println!("{}", prompt_for(action));
        let deadline = Instant::now() + step_timeout;

        loop {
            let event = match timeout_at(deadline, events.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(PilotError::CalibrationDisconnected),
                Err(_) => {
                    return Err(PilotError::CalibrationTimeout(action.name().to_string()))
                }
            };

            if event == InputEvent::Disconnected {
                return Err(PilotError::CalibrationDisconnected);
            }

            if session.feed(&event) != SessionState::AwaitingAction(action) {
                break;
            }
        }
    }

    info!("Calibration complete, all actions bound");
    session.finish()
}
