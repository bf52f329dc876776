//! Audio transcoding subprocess.
//!
//! Spawns `ffmpeg` against a fetchable stream URL and exposes its stdout
//! as the consumable PCM stream handed to the output sink. The reconnect
//! options cover transient network interruptions on the source side.

use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};

use crate::error::ActivationError;
use crate::source::MediaStream;

/// Output format handed to the sink: 48 kHz stereo s16le PCM.
pub const PCM_SAMPLE_RATE: u32 = 48_000;
pub const PCM_CHANNELS: u32 = 2;
/// Bytes per second of the transcoded stream.
pub const PCM_BYTES_PER_SEC: u64 = (PCM_SAMPLE_RATE * PCM_CHANNELS * 2) as u64;

/// Transcoder invocation settings.
#[derive(Clone, Debug)]
pub struct TranscodeConfig {
    /// Path to the ffmpeg binary.
    pub ffmpeg_bin: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
        }
    }
}

/// PCM stream backed by a running ffmpeg child process.
pub struct TranscodeStream {
    child: Child,
    stdout: ChildStdout,
}

impl TranscodeStream {
    /// Spawn ffmpeg against a stream URL.
    pub fn spawn(config: &TranscodeConfig, stream_url: &str) -> Result<Self, ActivationError> {
        let rate = PCM_SAMPLE_RATE.to_string();
        let channels = PCM_CHANNELS.to_string();
        let mut child = Command::new(&config.ffmpeg_bin)
            .args([
                "-nostdin",
                "-reconnect",
                "1",
                "-reconnect_streamed",
                "1",
                "-reconnect_delay_max",
                "5",
            ])
            .args(["-i", stream_url])
            .args(["-vn", "-f", "s16le"])
            .args(["-ar", &rate, "-ac", &channels])
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ActivationError::new(format!("spawn {}: {err}", config.ffmpeg_bin)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ActivationError::new("transcoder stdout unavailable"))?;
        Ok(Self { child, stdout })
    }
}

impl AsyncRead for TranscodeStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

impl MediaStream for TranscodeStream {
    fn release(&mut self) {
        // start_kill never blocks; kill_on_drop covers any remaining path.
        if let Err(err) = self.child.start_kill() {
            tracing::debug!(error = %err, "transcoder already exited");
        }
    }
}
