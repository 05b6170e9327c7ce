//! # Control Loop Module
//!
//! The fixed-rate heart of the pilot: translates stick state into motion
//! commands every tick, and dispatches discrete button/hat presses to drone
//! actions through the binding table.
//!
//! ## Tick semantics
//!
//! Every [`TICK_PERIOD_MS`] milliseconds, each stick axis issues exactly one
//! actuator call. The centered branch actively sends a zero-intensity command
//! (`forward(0)`, `up(0)`, ...) rather than staying silent: releasing a
//! stick must deliver an explicit stop signal to the drone instead of relying
//! on the actuator to idle by itself.
//!
//! The dead-band thresholds are asymmetric on purpose: 10 units for
//! translation and altitude, 20 for yaw, where one unit is 1000 raw counts
//! on the ±32767 axis scale. Yaw is easy to brush by accident while pushing
//! the stick vertically, so it gets twice the band.
//!
//! ## Event semantics
//!
//! Discrete actions are edge-triggered: a button fires once on its press
//! transition, never on release or while held. Axis events route raw values
//! into the stick state and take effect on the next tick.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::controller::bindings::{ActionBindingTable, LogicalAction};
use crate::controller::events::InputEvent;
use crate::controller::normalize::{normalize, FULL_SCALE};
use crate::controller::stick::StickState;
use crate::error::Result;
use crate::flight::actuator::DroneActuator;

/// Control tick period in milliseconds.
pub const TICK_PERIOD_MS: u64 = 10;

/// Raw axis counts per dead-band unit.
pub const DEAD_BAND_UNIT: f64 = 1000.0;

/// Dead-band for translation and altitude axes, in raw counts (10 units).
pub const TRANSLATION_THRESHOLD: f64 = 10.0 * DEAD_BAND_UNIT;

/// Dead-band for the yaw axis, in raw counts (20 units). Wider than
/// translation by design.
pub const YAW_THRESHOLD: f64 = 20.0 * DEAD_BAND_UNIT;

/// Owns the actuator, the stick state, and the recording flag, and drives
/// them from the tick timer and the input-event stream.
///
/// All mutable flight state lives here with a single-writer discipline:
/// [`handle_event`](ControlLoop::handle_event) writes stick coordinates,
/// [`tick`](ControlLoop::tick) only reads them.
#[derive(Debug)]
pub struct ControlLoop<A: DroneActuator> {
    actuator: A,
    bindings: ActionBindingTable,
    sticks: StickState,
    recording: bool,
    translation_threshold: f64,
    yaw_threshold: f64,
}

impl<A: DroneActuator> ControlLoop<A> {
    /// Creates a control loop with centered sticks and recording off.
    #[must_use]
    pub fn new(actuator: A, bindings: ActionBindingTable) -> Self {
        Self {
            actuator,
            bindings,
            sticks: StickState::new(),
            recording: false,
            translation_threshold: TRANSLATION_THRESHOLD,
            yaw_threshold: YAW_THRESHOLD,
        }
    }

    /// Overrides the raw dead-band thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, translation: f64, yaw: f64) -> Self {
        self.translation_threshold = translation;
        self.yaw_threshold = yaw;
        self
    }

    /// Whether the recording flag is currently set.
    #[must_use]
    pub fn recording(&self) -> bool {
        self.recording
    }

    /// Current stick state (for inspection; the tick reads this).
    #[must_use]
    pub fn sticks(&self) -> &StickState {
        &self.sticks
    }

    /// Processes one input event.
    ///
    /// Axis events update the stick state; button and hat press transitions
    /// dispatch their bound discrete action immediately.
    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::AxisChanged { value, .. } => {
                let Some(action) = self.bindings.resolve_event(event) else {
                    return;
                };
                self.route_axis(action, f64::from(value));
            }
            InputEvent::ButtonChanged { .. } | InputEvent::HatChanged { .. } => {
                let Some(action) = self.bindings.resolve_event(event) else {
                    return;
                };
                self.dispatch(action);
            }
            InputEvent::Connected => info!("Gamepad connected"),
            InputEvent::Disconnected => warn!("Gamepad disconnected"),
        }
    }

    /// Routes a motion-axis sample into the owning stick field.
    fn route_axis(&mut self, action: LogicalAction, value: f64) {
        match action {
            LogicalAction::MoveLeftRight => {
                self.sticks.left.set_x(value);
            }
            LogicalAction::MoveForwardBackward => {
                self.sticks.left.set_y(value);
            }
            LogicalAction::Rotate => {
                self.sticks.right.set_x(value);
            }
            LogicalAction::MoveUpDown => {
                self.sticks.right.set_y(value);
            }
            other => {
                // A discrete action bound to an axis would fire on every
                // sample; refuse to level-trigger it.
                debug!("Ignoring axis sample bound to discrete action '{}'", other);
            }
        }
    }

    /// Dispatches a discrete action, edge-triggered on the press transition.
    fn dispatch(&mut self, action: LogicalAction) {
        match action {
            LogicalAction::RecordToggle => {
                // The flag flips regardless of whether the command lands;
                // the next press must issue the opposite command.
                let result = if self.recording {
                    self.actuator.stop_recording()
                } else {
                    self.actuator.start_recording()
                };
                self.recording = !self.recording;
                log_command("record toggle", result);
                info!("Recording {}", if self.recording { "on" } else { "off" });
            }
            LogicalAction::TakeOff => {
                log_command("hull protection", self.actuator.hull_protection(true));
                log_command("take off", self.actuator.take_off());
                info!("Take off");
            }
            LogicalAction::Stop => {
                log_command("stop", self.actuator.stop());
                info!("Emergency stop");
            }
            LogicalAction::Land => {
                log_command("land", self.actuator.land());
                info!("Land");
            }
            other => {
                debug!("Ignoring press bound to motion action '{}'", other);
            }
        }
    }

    /// One control tick: exactly one actuator call per stick axis.
    pub fn tick(&mut self) {
        self.tick_left_stick();
        self.tick_right_stick();
    }

    /// Left stick: longitudinal and lateral translation.
    fn tick_left_stick(&mut self) {
        let pair = self.sticks.left;

        if pair.y < -self.translation_threshold {
            log_command("forward", self.actuator.forward(normalize(pair.y, FULL_SCALE)));
        } else if pair.y > self.translation_threshold {
            log_command("backward", self.actuator.backward(normalize(pair.y, FULL_SCALE)));
        } else {
            log_command("forward", self.actuator.forward(0));
        }

        if pair.x > self.translation_threshold {
            log_command("right", self.actuator.right(normalize(pair.x, FULL_SCALE)));
        } else if pair.x < -self.translation_threshold {
            log_command("left", self.actuator.left(normalize(pair.x, FULL_SCALE)));
        } else {
            log_command("right", self.actuator.right(0));
        }
    }

    /// Right stick: altitude and yaw.
    fn tick_right_stick(&mut self) {
        let pair = self.sticks.right;

        if pair.y < -self.translation_threshold {
            log_command("up", self.actuator.up(normalize(pair.y, FULL_SCALE)));
        } else if pair.y > self.translation_threshold {
            log_command("down", self.actuator.down(normalize(pair.y, FULL_SCALE)));
        } else {
            log_command("up", self.actuator.up(0));
        }

        if pair.x > self.yaw_threshold {
            log_command("clockwise", self.actuator.clockwise(normalize(pair.x, FULL_SCALE)));
        } else if pair.x < -self.yaw_threshold {
            log_command(
                "counter-clockwise",
                self.actuator.counter_clockwise(normalize(pair.x, FULL_SCALE)),
            );
        } else {
            log_command("clockwise", self.actuator.clockwise(0));
        }
    }

    /// Drives the loop until shutdown is signalled.
    ///
    /// Ticks at `tick_period` independently of input arrival. The input
    /// channel closing is logged but not fatal; the drone keeps receiving
    /// explicit stick commands until shutdown.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<InputEvent>,
        mut shutdown: watch::Receiver<bool>,
        tick_period: Duration,
    ) {
        let mut ticker = interval(tick_period);
        let mut events_open = true;

        info!(
            "Control loop started (tick period {:?}, {} bound actions)",
            tick_period,
            self.bindings.len()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }

                maybe_event = events.recv(), if events_open => {
                    match maybe_event {
                        Some(event) => self.handle_event(&event),
                        None => {
                            warn!("Input event stream closed");
                            events_open = false;
                        }
                    }
                }

                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Control loop shutting down");
                        break;
                    }
                }
            }
        }
    }
}

/// Logs a failed actuator command without stopping the scheduler.
fn log_command(what: &str, result: Result<()>) {
    if let Err(e) = result {
        error!("Drone command '{}' failed: {}", what, e);
    }
}
