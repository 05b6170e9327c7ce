//! # Video Module
//!
//! Relays the drone's H.264 video feed into an ffmpeg child process.
//!
//! The drone pushes raw video frames at us; ffmpeg handles demuxing and
//! forwarding to the streaming endpoint. We pipe frames into its stdin
//! (`-i pipe:0`) and let it push the result to the configured URL.
//!
//! Frame delivery is best-effort. A write failure ends the relay task with a
//! single warning; the drone keeps flying without a stream, and the flight
//! side is never stalled or aborted by the video path.

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{PilotError, Result};

/// Default endpoint the transcoded stream is pushed to.
pub const DEFAULT_OUTPUT_URL: &str = "http://localhost:8090/bebop.ffm";

/// Running ffmpeg child plus the relay task feeding it.
pub struct VideoRelay {
    child: Child,
    relay: JoinHandle<()>,
}

impl VideoRelay {
    /// Spawns ffmpeg and the frame-relay task.
    ///
    /// Returns an error if the ffmpeg binary cannot be started; after that,
    /// delivery problems only degrade the stream, they never propagate.
    pub fn spawn(
        ffmpeg_path: &str,
        output_url: &str,
        frames: mpsc::Receiver<Bytes>,
    ) -> Result<Self> {
        let mut child = Command::new(ffmpeg_path)
            .arg("-i")
            .arg("pipe:0")
            .arg(output_url)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PilotError::Video(format!("failed to spawn {}: {}", ffmpeg_path, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PilotError::Video("ffmpeg stdin not captured".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr));
        }

        info!("Video relay started: {} -> {}", ffmpeg_path, output_url);
        let relay = tokio::spawn(relay_frames(stdin, frames));

        Ok(Self { child, relay })
    }

    /// Stops the relay and reaps the ffmpeg child.
    pub async fn shutdown(mut self) {
        self.relay.abort();
        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill ffmpeg: {}", e);
        }
        let _ = self.child.wait().await;
        info!("Video relay stopped");
    }
}

/// Feeds frames into ffmpeg's stdin until the channel closes or a write
/// fails. ffmpeg going away mid-flight is survivable; the relay ends and the
/// drone keeps flying without a stream.
async fn relay_frames(mut stdin: ChildStdin, mut frames: mpsc::Receiver<Bytes>) {
    while let Some(frame) = frames.recv().await {
        if let Err(e) = stdin.write_all(&frame).await {
            warn!(
                "Video sink write failed ({} byte frame): {}; stopping relay",
                frame.len(),
                e
            );
            return;
        }
    }
    debug!("Video frame channel closed");
}

/// Logs ffmpeg's stderr chatter at debug level so it lands in our log file
/// instead of the terminal.
async fn drain_stderr(stderr: tokio::process::ChildStderr) {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "ffmpeg", "{}", line);
    }
}
