//! # Drone Actuator Module
//!
//! The command surface of the drone, as the control loop sees it.
//!
//! Motion commands carry a bounded intensity (0-100) already produced by the
//! normalization stage; discrete commands are fire-and-forget. The transport
//! behind the trait (Bebop Wi-Fi link, simulator, test double) is deliberately
//! opaque: a failed command is reported through the `Result` and the caller
//! decides whether to care. The tick scheduler never stops because one
//! command was lost.

#[cfg(test)]
use mockall::automock;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::Result;

/// Drone command surface.
///
/// `intensity` is always 0-100. One tick of the control loop issues exactly
/// one motion call per axis, including explicit zero-intensity calls when a
/// stick is centered, so implementations must treat `forward(0)` as an
/// explicit stop signal rather than a no-op to skip.
#[cfg_attr(test, automock)]
pub trait DroneActuator: Send {
    /// Pitch forward at the given intensity.
    fn forward(&mut self, intensity: u8) -> Result<()>;
    /// Pitch backward at the given intensity.
    fn backward(&mut self, intensity: u8) -> Result<()>;
    /// Roll left at the given intensity.
    fn left(&mut self, intensity: u8) -> Result<()>;
    /// Roll right at the given intensity.
    fn right(&mut self, intensity: u8) -> Result<()>;
    /// Ascend at the given intensity.
    fn up(&mut self, intensity: u8) -> Result<()>;
    /// Descend at the given intensity.
    fn down(&mut self, intensity: u8) -> Result<()>;
    /// Yaw clockwise at the given intensity.
    fn clockwise(&mut self, intensity: u8) -> Result<()>;
    /// Yaw counter-clockwise at the given intensity.
    fn counter_clockwise(&mut self, intensity: u8) -> Result<()>;

    /// Ascend to hover.
    fn take_off(&mut self) -> Result<()>;
    /// Land at the current position.
    fn land(&mut self) -> Result<()>;
    /// Emergency stop: cut motion immediately.
    fn stop(&mut self) -> Result<()>;

    /// Start onboard video recording.
    fn start_recording(&mut self) -> Result<()>;
    /// Stop onboard video recording.
    fn stop_recording(&mut self) -> Result<()>;
    /// Enable or disable the hull protection flight envelope.
    fn hull_protection(&mut self, enabled: bool) -> Result<()>;

    /// Hands the actuator the channel the video relay reads from.
    ///
    /// Backends with a camera feed push their frame bytes into `sink`;
    /// backends without one hold it so the relay sees an open but idle
    /// stream.
    fn video_sink(&mut self, sink: mpsc::Sender<Bytes>) -> Result<()>;
}

/// Actuator that logs every command instead of flying anything.
///
/// Used by the binary when no drone link is configured, and handy for
/// verifying binding files and stick feel on the ground.
#[derive(Debug, Default)]
pub struct DryRunActuator {
    commands_issued: u64,
    video_sink: Option<mpsc::Sender<Bytes>>,
}

impl DryRunActuator {
    /// Creates a dry-run actuator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands issued so far.
    #[must_use]
    pub fn commands_issued(&self) -> u64 {
        self.commands_issued
    }

    fn log(&mut self, command: &str) -> Result<()> {
        self.commands_issued += 1;
        info!(target: "dry_run", "{}", command);
        Ok(())
    }
}

impl DroneActuator for DryRunActuator {
    fn forward(&mut self, intensity: u8) -> Result<()> {
        self.log(&format!("forward({})", intensity))
    }

    fn backward(&mut self, intensity: u8) -> Result<()> {
        self.log(&format!("backward({})", intensity))
    }

    fn left(&mut self, intensity: u8) -> Result<()> {
        self.log(&format!("left({})", intensity))
    }

    fn right(&mut self, intensity: u8) -> Result<()> {
        self.log(&format!("right({})", intensity))
    }

    fn up(&mut self, intensity: u8) -> Result<()> {
        self.log(&format!("up({})", intensity))
    }

    fn down(&mut self, intensity: u8) -> Result<()> {
        self.log(&format!("down({})", intensity))
    }

    fn clockwise(&mut self, intensity: u8) -> Result<()> {
        self.log(&format!("clockwise({})", intensity))
    }

    fn counter_clockwise(&mut self, intensity: u8) -> Result<()> {
        self.log(&format!("counter_clockwise({})", intensity))
    }

    fn take_off(&mut self) -> Result<()> {
        self.log("take_off()")
    }

    fn land(&mut self) -> Result<()> {
        self.log("land()")
    }

    fn stop(&mut self) -> Result<()> {
        self.log("stop()")
    }

    fn start_recording(&mut self) -> Result<()> {
        self.log("start_recording()")
    }

    fn stop_recording(&mut self) -> Result<()> {
        self.log("stop_recording()")
    }

    fn hull_protection(&mut self, enabled: bool) -> Result<()> {
        self.log(&format!("hull_protection({})", enabled))
    }

    fn video_sink(&mut self, sink: mpsc::Sender<Bytes>) -> Result<()> {
        // Held so the relay's channel stays open; a dry run produces no
        // frames.
        self.video_sink = Some(sink);
        info!(target: "dry_run", "video_sink(attached)");
        Ok(())
    }
}
