//! Default output sink: paced stream drain.
//!
//! Stands in for an external voice transport. One worker task per session
//! consumes the active track's PCM stream at real-time byte rate, honors
//! pause/resume/stop, fires the completion signal exactly once per play,
//! and releases the audio handle when playback ends.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, oneshot};

use playback_session::transcode::PCM_BYTES_PER_SEC;
use playback_session::{AudioSource, OutputSink, PlaybackEnded, SinkError};

use crate::session_manager::SinkConnector;

/// Chunk cadence for the drain loop.
const CHUNK_MS: u64 = 20;
const CHUNK_BYTES: usize = (PCM_BYTES_PER_SEC as usize / 1000) * CHUNK_MS as usize;

enum SinkCommand {
    Play {
        source: AudioSource,
        done: oneshot::Sender<PlaybackEnded>,
    },
    Pause,
    Resume,
    Stop,
    Disconnect,
}

/// Connector producing one paced-drain sink per session.
pub struct LocalSinkConnector;

impl SinkConnector for LocalSinkConnector {
    fn connect(&self, session_key: &str) -> Result<Arc<dyn OutputSink>, SinkError> {
        Ok(Arc::new(LocalDrainSink::spawn(session_key.to_string())))
    }
}

/// Command-channel handle to a drain worker task.
pub struct LocalDrainSink {
    cmd_tx: mpsc::UnboundedSender<SinkCommand>,
    playing: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
}

impl LocalDrainSink {
    /// Start the worker task and return its handle.
    pub fn spawn(session_key: String) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let playing = Arc::new(AtomicBool::new(false));
        let paused = Arc::new(AtomicBool::new(false));
        let connected = Arc::new(AtomicBool::new(true));
        tokio::spawn(drain_worker(
            session_key,
            cmd_rx,
            playing.clone(),
            paused.clone(),
            connected.clone(),
        ));
        Self {
            cmd_tx,
            playing,
            paused,
            connected,
        }
    }

    fn send(&self, cmd: SinkCommand) -> Result<(), SinkError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(SinkError::NotConnected);
        }
        self.cmd_tx.send(cmd).map_err(|_| SinkError::Closed)
    }
}

impl OutputSink for LocalDrainSink {
    fn play(
        &self,
        source: AudioSource,
        on_complete: oneshot::Sender<PlaybackEnded>,
    ) -> Result<(), SinkError> {
        self.send(SinkCommand::Play {
            source,
            done: on_complete,
        })
    }

    fn pause(&self) -> Result<(), SinkError> {
        self.send(SinkCommand::Pause)
    }

    fn resume(&self) -> Result<(), SinkError> {
        self.send(SinkCommand::Resume)
    }

    fn stop(&self) -> Result<(), SinkError> {
        self.send(SinkCommand::Stop)
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn disconnect(&self) {
        let _ = self.send(SinkCommand::Disconnect);
        self.connected.store(false, Ordering::Relaxed);
    }
}

struct ActivePlayback {
    source: AudioSource,
    done: oneshot::Sender<PlaybackEnded>,
}

enum Step {
    Cmd(Option<SinkCommand>),
    Drained(bool),
}

/// Command loop for one session's sink.
async fn drain_worker(
    session_key: String,
    mut cmd_rx: mpsc::UnboundedReceiver<SinkCommand>,
    playing: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
) {
    let mut current: Option<ActivePlayback> = None;
    let mut buf = vec![0u8; CHUNK_BYTES];
    loop {
        let step = match current.as_mut() {
            Some(play) if !paused.load(Ordering::Relaxed) => {
                tokio::select! {
                    cmd = cmd_rx.recv() => Step::Cmd(cmd),
                    ended = drain_chunk(play, &mut buf) => Step::Drained(ended),
                }
            }
            _ => Step::Cmd(cmd_rx.recv().await),
        };
        match step {
            Step::Drained(false) => continue,
            Step::Drained(true) => {
                if let Some(play) = current.take() {
                    let _ = play.done.send(PlaybackEnded::Finished);
                }
                playing.store(false, Ordering::Relaxed);
                tracing::debug!(session = %session_key, "stream drained to end");
            }
            Step::Cmd(None) => break,
            Step::Cmd(Some(cmd)) => match cmd {
                SinkCommand::Play { source, done } => {
                    if let Some(prev) = current.take() {
                        let _ = prev.done.send(PlaybackEnded::Stopped);
                    }
                    current = Some(ActivePlayback { source, done });
                    playing.store(true, Ordering::Relaxed);
                    paused.store(false, Ordering::Relaxed);
                }
                SinkCommand::Pause => paused.store(true, Ordering::Relaxed),
                SinkCommand::Resume => paused.store(false, Ordering::Relaxed),
                SinkCommand::Stop => {
                    if let Some(play) = current.take() {
                        let _ = play.done.send(PlaybackEnded::Stopped);
                    }
                    playing.store(false, Ordering::Relaxed);
                    paused.store(false, Ordering::Relaxed);
                }
                SinkCommand::Disconnect => break,
            },
        }
    }
    // Dropping `current` releases any live source.
    connected.store(false, Ordering::Relaxed);
    playing.store(false, Ordering::Relaxed);
    tracing::debug!(session = %session_key, "sink worker stopped");
}

/// Read one chunk and sleep its real-time duration. Returns true at EOF
/// or on a read error.
async fn drain_chunk(play: &mut ActivePlayback, buf: &mut [u8]) -> bool {
    let Some(stream) = play.source.stream_mut() else {
        return true;
    };
    match stream.read(buf).await {
        Ok(0) => true,
        Ok(_) => {
            tokio::time::sleep(Duration::from_millis(CHUNK_MS)).await;
            false
        }
        Err(err) => {
            tracing::debug!(error = %err, "stream read failed");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::pin::Pin;
    use std::sync::atomic::AtomicUsize;
    use std::task::{Context, Poll};

    use tokio::io::{AsyncRead, ReadBuf};

    use playback_session::MediaStream;

    use super::*;

    struct TestStream {
        data: Cursor<Vec<u8>>,
        releases: Arc<AtomicUsize>,
    }

    impl AsyncRead for TestStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.data).poll_read(cx, buf)
        }
    }

    impl MediaStream for TestStream {
        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn source_of(bytes: usize, releases: &Arc<AtomicUsize>) -> AudioSource {
        AudioSource::new(
            Box::new(TestStream {
                data: Cursor::new(vec![0u8; bytes]),
                releases: releases.clone(),
            }),
            1.0,
        )
    }

    #[tokio::test]
    async fn short_stream_finishes_naturally() {
        let sink = LocalDrainSink::spawn("test".to_string());
        let releases = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = oneshot::channel();

        sink.play(source_of(CHUNK_BYTES, &releases), done_tx).unwrap();

        let ended = tokio::time::timeout(Duration::from_secs(2), done_rx)
            .await
            .expect("drain timed out")
            .unwrap();
        assert_eq!(ended, PlaybackEnded::Finished);
        // Worker dropped the source after completion.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(!sink.is_playing());
    }

    #[tokio::test]
    async fn stop_fires_the_completion_signal_once() {
        let sink = LocalDrainSink::spawn("test".to_string());
        let releases = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = oneshot::channel();

        // Large enough that it cannot finish before the stop lands.
        sink.play(source_of(CHUNK_BYTES * 500, &releases), done_tx)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sink.is_playing());

        sink.stop().unwrap();
        let ended = tokio::time::timeout(Duration::from_secs(2), done_rx)
            .await
            .expect("stop timed out")
            .unwrap();
        assert_eq!(ended, PlaybackEnded::Stopped);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pause_suspends_the_drain_until_resume() {
        let sink = LocalDrainSink::spawn("test".to_string());
        let releases = Arc::new(AtomicUsize::new(0));
        let (done_tx, mut done_rx) = oneshot::channel();

        sink.play(source_of(CHUNK_BYTES * 4, &releases), done_tx).unwrap();
        sink.pause().unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(sink.is_paused());
        assert!(
            done_rx.try_recv().is_err(),
            "a paused stream must not finish"
        );

        sink.resume().unwrap();
        let ended = tokio::time::timeout(Duration::from_secs(2), done_rx)
            .await
            .expect("resume timed out")
            .unwrap();
        assert_eq!(ended, PlaybackEnded::Finished);
    }

    #[tokio::test]
    async fn disconnect_stops_accepting_commands() {
        let sink = LocalDrainSink::spawn("test".to_string());
        sink.disconnect();
        assert!(!sink.is_connected());
        let (done_tx, _done_rx) = oneshot::channel();
        let releases = Arc::new(AtomicUsize::new(0));
        assert_eq!(
            sink.play(source_of(16, &releases), done_tx),
            Err(SinkError::NotConnected)
        );
    }
}
