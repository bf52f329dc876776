//! Session queue and playback loop.
//!
//! One [`SessionQueue`] per session: it owns the pending queue, the played
//! history, loop mode, volume, and progress bookkeeping, and runs the
//! long-lived playback loop task that feeds the output sink one track at a
//! time. Control operations mutate state synchronously under a single
//! per-session lock and never wait on the loop; the loop observes that
//! state and drives the sink.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ControlError, PreconditionError, ResolutionError};
use crate::events::{SessionEvent, SessionEvents};
use crate::list::TrackList;
use crate::resolver::MediaResolver;
use crate::sink::{OutputSink, PlaybackEnded};
use crate::track::{Track, TrackInfo, format_duration};

/// Loop behavior applied at track selection time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Play each track once.
    #[default]
    Off,
    /// Recycle the played history once the pending queue empties.
    Queue,
    /// Repeat the current head indefinitely.
    Track,
}

/// Descriptor returned for each track added by an enqueue.
#[derive(Clone, Debug)]
pub struct Enqueued {
    pub track: TrackInfo,
    /// True when the track was pre-activated at enqueue time.
    pub active: bool,
}

/// Snapshot of the current track and its progress.
#[derive(Clone, Debug)]
pub struct NowPlaying {
    pub track: TrackInfo,
    pub elapsed: Duration,
    pub paused: bool,
}

impl NowPlaying {
    /// `elapsed / total` rendering, e.g. `0:01:23 / 0:03:45`.
    pub fn progress_text(&self) -> String {
        format!(
            "{} / {}",
            format_duration(self.elapsed.as_secs()),
            self.track.duration_text()
        )
    }
}

/// One page of the pending queue.
#[derive(Clone, Debug)]
pub struct QueuePage {
    pub page: usize,
    /// Total pending tracks across all pages.
    pub total: usize,
    pub items: Vec<TrackInfo>,
}

#[derive(Default)]
struct QueueState {
    pending: TrackList,
    history: TrackList,
    loop_mode: LoopMode,
    volume: f32,
    now_playing: Option<TrackInfo>,
    /// Set while the progress clock is running; `None` when paused or idle.
    started_at: Option<Instant>,
    /// Accumulated play time excluding the current running stretch.
    progress: Duration,
    paused: bool,
}

impl QueueState {
    fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => self.progress + started.elapsed(),
            None => self.progress,
        }
    }

    /// Take the next track according to loop mode, or `None` when the loop
    /// has to wait for an enqueue.
    fn try_select(&mut self) -> Option<Track> {
        match self.loop_mode {
            LoopMode::Track => {
                let head_active = matches!(self.pending.peek_head(), Some(Track::Active(..)));
                let info = self.pending.peek_head().map(|t| t.info().clone())?;
                if head_active {
                    // Take the live source; the metadata stays at the head
                    // so the same track keeps being served.
                    self.pending.replace_head(Track::Queued(info))
                } else {
                    Some(Track::Queued(info))
                }
            }
            LoopMode::Queue => {
                if self.pending.is_empty() && !self.history.is_empty() {
                    self.pending = std::mem::take(&mut self.history);
                }
                self.pending.pop_front()
            }
            LoopMode::Off => self.pending.pop_front(),
        }
    }

    /// Metadata of whatever would play next, without consuming it.
    fn peek_next(&self) -> Option<&TrackInfo> {
        match self.loop_mode {
            LoopMode::Queue if self.pending.is_empty() => {
                self.history.peek_head().map(Track::info)
            }
            _ => self.pending.peek_head().map(Track::info),
        }
    }

    /// Would a newly added track be up next?
    fn has_empty_next(&self) -> bool {
        self.peek_next().is_none()
            || (self.loop_mode == LoopMode::Queue && self.pending.is_empty())
    }
}

/// Per-session playback scheduler.
pub struct SessionQueue {
    state: Mutex<QueueState>,
    /// Wakes the playback loop when tracks are appended.
    enqueued: Notify,
    resolver: Arc<dyn MediaResolver>,
    sink: Arc<dyn OutputSink>,
    events: SessionEvents,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionQueue {
    /// Create a session queue and start its playback loop task.
    pub fn spawn(
        resolver: Arc<dyn MediaResolver>,
        sink: Arc<dyn OutputSink>,
        volume: f32,
    ) -> Arc<Self> {
        let queue = Arc::new(Self {
            state: Mutex::new(QueueState {
                volume,
                ..QueueState::default()
            }),
            enqueued: Notify::new(),
            resolver,
            sink,
            events: SessionEvents::new(),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        });
        let task = tokio::spawn(player_loop(queue.clone()));
        *queue.task.lock().unwrap() = Some(task);
        queue
    }

    /// Subscribe to this session's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Resolve a reference and append the resulting tracks.
    ///
    /// When nothing would play next, the first resolved track is activated
    /// eagerly so playback starts without a second resolution round-trip.
    /// Eager activation failure degrades to a queued track; the loop
    /// retries inline and skips with a notice if it fails again.
    pub async fn enqueue(
        &self,
        reference: &str,
        requested_by: &str,
    ) -> Result<Vec<Enqueued>, ResolutionError> {
        let mut tracks = self.resolver.resolve(reference).await?;
        if tracks.is_empty() {
            return Err(ResolutionError::new("reference resolved to no tracks"));
        }
        for track in &mut tracks {
            track.requested_by = requested_by.to_string();
        }

        let empty_next = self.state.lock().unwrap().has_empty_next();
        let mut first_source = None;
        if empty_next {
            match self.resolver.activate(&tracks[0]).await {
                Ok(source) => first_source = Some(source),
                Err(err) => {
                    tracing::warn!(
                        title = %tracks[0].title,
                        error = %err,
                        "eager activation failed; queuing without a source"
                    );
                }
            }
        }

        let mut descriptors = Vec::with_capacity(tracks.len());
        {
            let mut state = self.state.lock().unwrap();
            for track in tracks {
                match first_source.take() {
                    Some(source) => {
                        descriptors.push(Enqueued {
                            track: track.clone(),
                            active: true,
                        });
                        state.pending.push_back(Track::Active(track, source));
                    }
                    None => {
                        descriptors.push(Enqueued {
                            track: track.clone(),
                            active: false,
                        });
                        state.pending.push_back(Track::Queued(track));
                    }
                }
            }
        }
        self.enqueued.notify_one();
        Ok(descriptors)
    }

    /// Pause playback and bank the elapsed time so far.
    pub fn pause(&self) -> Result<(), ControlError> {
        let mut state = self.state.lock().unwrap();
        if state.now_playing.is_none() {
            return Err(PreconditionError::NothingPlaying.into());
        }
        if state.paused {
            return Err(PreconditionError::AlreadyPaused.into());
        }
        self.sink.pause()?;
        if let Some(started) = state.started_at.take() {
            state.progress += started.elapsed();
        }
        state.paused = true;
        Ok(())
    }

    /// Resume a paused track; the progress clock restarts now.
    pub fn resume(&self) -> Result<(), ControlError> {
        let mut state = self.state.lock().unwrap();
        if state.now_playing.is_none() {
            return Err(PreconditionError::NothingPlaying.into());
        }
        if !state.paused {
            return Err(PreconditionError::NotPaused.into());
        }
        self.sink.resume()?;
        state.started_at = Some(Instant::now());
        state.paused = false;
        Ok(())
    }

    /// Force-stop the current track; the loop advances as if it finished.
    pub fn skip(&self) -> Result<(), ControlError> {
        {
            let state = self.state.lock().unwrap();
            if state.now_playing.is_none() {
                return Err(PreconditionError::NothingPlaying.into());
            }
        }
        self.sink.stop()?;
        Ok(())
    }

    /// Shuffle the pending queue in place.
    pub fn shuffle(&self) -> Result<(), PreconditionError> {
        let mut state = self.state.lock().unwrap();
        if state.pending.is_empty() {
            return Err(PreconditionError::EmptyQueue);
        }
        state.pending.shuffle();
        Ok(())
    }

    /// Set the loop mode; takes effect at the next selection.
    pub fn set_loop_mode(&self, mode: LoopMode) {
        self.state.lock().unwrap().loop_mode = mode;
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.state.lock().unwrap().loop_mode
    }

    /// Store the volume applied to the next activated track.
    ///
    /// The currently playing track keeps its effective volume.
    pub fn set_volume(&self, volume: f32) -> Result<(), PreconditionError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PreconditionError::VolumeOutOfRange);
        }
        self.state.lock().unwrap().volume = volume;
        Ok(())
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().unwrap().volume
    }

    /// Current track and elapsed progress, if something is playing.
    pub fn now_playing(&self) -> Option<NowPlaying> {
        let state = self.state.lock().unwrap();
        let track = state.now_playing.clone()?;
        Some(NowPlaying {
            track,
            elapsed: state.elapsed(),
            paused: state.paused,
        })
    }

    /// Elapsed play time of the current track.
    pub fn progress(&self) -> Option<Duration> {
        let state = self.state.lock().unwrap();
        state.now_playing.as_ref()?;
        Some(state.elapsed())
    }

    /// One page of the pending queue.
    pub fn queue_page(&self, page: usize, page_size: usize) -> QueuePage {
        let state = self.state.lock().unwrap();
        let items = state
            .pending
            .iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .map(|track| track.info().clone())
            .collect();
        QueuePage {
            page,
            total: state.pending.len(),
            items,
        }
    }

    /// Number of pending tracks.
    pub fn queue_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// Stop the loop task, release any live audio handle, and drop the
    /// sink connection.
    pub async fn teardown(&self) {
        self.cancel.cancel();
        if let Err(err) = self.sink.stop() {
            tracing::debug!(error = %err, "sink stop during teardown failed");
        }
        self.sink.disconnect();
        let task = self.task.lock().unwrap().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                if err.is_panic() {
                    tracing::error!(error = %err, "playback loop panicked");
                }
            }
        }
    }

    /// Wait until a track is selectable and take it per the loop mode.
    async fn next_selected(&self) -> Track {
        loop {
            let notified = self.enqueued.notified();
            if let Some(track) = self.state.lock().unwrap().try_select() {
                return track;
            }
            notified.await;
        }
    }

    /// Resolve-ahead: if the upcoming pending head is still queued,
    /// activate it and install the live version in its place, hiding the
    /// next transition's resolution latency.
    ///
    /// The early-opened stream can go stale if the queue is reordered
    /// before it plays (accepted trade-off). The install only happens if
    /// the head is still the track that was peeked, so a concurrent
    /// shuffle or dequeue cannot have its head silently overwritten.
    async fn preactivate_next(&self) {
        let target = {
            let state = self.state.lock().unwrap();
            match state.pending.peek_head() {
                Some(Track::Queued(info)) => Some(info.clone()),
                _ => None,
            }
        };
        let Some(info) = target else { return };
        match self.resolver.activate(&info).await {
            Ok(source) => {
                let mut state = self.state.lock().unwrap();
                let still_head = matches!(
                    state.pending.peek_head(),
                    Some(head) if head.info().id == info.id && !head.is_active()
                );
                if still_head {
                    tracing::debug!(title = %info.title, "resolve-ahead installed next track");
                    state.pending.replace_head(Track::Active(info, source));
                } else {
                    tracing::debug!(
                        title = %info.title,
                        "queue changed during resolve-ahead; discarding early stream"
                    );
                }
            }
            Err(err) => {
                tracing::debug!(
                    title = %info.title,
                    error = %err,
                    "resolve-ahead failed; activation will be retried inline"
                );
            }
        }
    }
}

/// Long-lived playback loop: select the next track, activate it if still
/// queued, hand it to the sink, wait for completion, file it into history.
/// Runs until the session is torn down; an empty queue just parks the
/// loop at selection.
async fn player_loop(queue: Arc<SessionQueue>) {
    loop {
        let selected = tokio::select! {
            _ = queue.cancel.cancelled() => break,
            track = queue.next_selected() => track,
        };
        let info = selected.info().clone();

        // Activate inline when resolve-ahead has not covered this track.
        let source = match selected {
            Track::Active(_, source) => Some(source),
            Track::Queued(_) => {
                let activation = tokio::select! {
                    _ = queue.cancel.cancelled() => break,
                    res = queue.resolver.activate(&info) => res,
                };
                match activation {
                    Ok(source) => Some(source),
                    Err(err) => {
                        tracing::warn!(
                            title = %info.title,
                            error = %err,
                            "activation failed; skipping track"
                        );
                        queue.events.track_failed(info.clone(), err.to_string());
                        None
                    }
                }
            }
        };
        let Some(mut source) = source else { continue };

        source.set_volume(queue.state.lock().unwrap().volume);
        let (done_tx, done_rx) = oneshot::channel();
        if let Err(err) = queue.sink.play(source, done_tx) {
            tracing::warn!(title = %info.title, error = %err, "output sink rejected playback");
            queue.events.sink_failed(info.clone(), err.to_string());
            continue;
        }

        {
            let mut state = queue.state.lock().unwrap();
            state.now_playing = Some(info.clone());
            state.started_at = Some(Instant::now());
            state.progress = Duration::ZERO;
            state.paused = false;
        }
        queue.events.track_started(info.clone());
        tracing::info!(title = %info.title, "now playing");

        // Resolve-ahead for the track after this one.
        tokio::select! {
            _ = queue.cancel.cancelled() => {}
            _ = queue.preactivate_next() => {}
        }

        let ended = tokio::select! {
            _ = queue.cancel.cancelled() => break,
            ended = done_rx => ended,
        };
        let ended = match ended {
            Ok(ended) => ended,
            Err(_) => {
                tracing::warn!(title = %info.title, "sink dropped the completion signal");
                PlaybackEnded::Stopped
            }
        };
        tracing::debug!(title = %info.title, ?ended, "track finished");

        {
            let mut state = queue.state.lock().unwrap();
            state.now_playing = None;
            state.started_at = None;
            state.progress = Duration::ZERO;
            state.paused = false;
            state.history.push_back(Track::Queued(info.clone()));
        }
        queue.events.track_finished(info);
    }
    tracing::debug!("playback loop stopped");
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    use async_trait::async_trait;
    use tokio::io::{AsyncRead, ReadBuf};
    use uuid::Uuid;

    use super::*;
    use crate::error::{ActivationError, SinkError};
    use crate::source::{AudioSource, MediaStream};

    fn test_info(title: &str) -> TrackInfo {
        TrackInfo {
            id: Uuid::new_v4(),
            title: title.to_string(),
            page_url: format!("https://example.com/{title}"),
            duration_secs: Some(180),
            thumbnail: None,
            requested_by: String::new(),
        }
    }

    /// Stream double that hits EOF immediately and counts releases.
    struct TestStream {
        releases: Arc<AtomicUsize>,
    }

    impl AsyncRead for TestStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    impl MediaStream for TestStream {
        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct TestResolver {
        references: Mutex<HashMap<String, Vec<TrackInfo>>>,
        failing: Mutex<HashSet<String>>,
        activations: Mutex<Vec<String>>,
        releases: Arc<AtomicUsize>,
    }

    impl TestResolver {
        fn with_reference(reference: &str, titles: &[&str]) -> Arc<Self> {
            let resolver = Self::default();
            resolver.references.lock().unwrap().insert(
                reference.to_string(),
                titles.iter().map(|t| test_info(t)).collect(),
            );
            Arc::new(resolver)
        }

        fn fail_activation(&self, title: &str) {
            self.failing.lock().unwrap().insert(title.to_string());
        }

        fn activations(&self) -> Vec<String> {
            self.activations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MediaResolver for TestResolver {
        async fn resolve(&self, reference: &str) -> Result<Vec<TrackInfo>, ResolutionError> {
            self.references
                .lock()
                .unwrap()
                .get(reference)
                .cloned()
                .ok_or_else(|| ResolutionError::new("unknown reference"))
        }

        async fn activate(&self, track: &TrackInfo) -> Result<AudioSource, ActivationError> {
            self.activations.lock().unwrap().push(track.title.clone());
            if self.failing.lock().unwrap().contains(&track.title) {
                return Err(ActivationError::new("stream unavailable"));
            }
            Ok(AudioSource::new(
                Box::new(TestStream {
                    releases: self.releases.clone(),
                }),
                1.0,
            ))
        }
    }

    #[derive(Default)]
    struct SinkInner {
        current: Option<(AudioSource, oneshot::Sender<PlaybackEnded>)>,
        volumes: Vec<f32>,
        paused: bool,
    }

    /// Sink double that holds the in-flight source until told to finish.
    struct TestSink {
        inner: Mutex<SinkInner>,
        connected: AtomicBool,
    }

    impl TestSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: Mutex::new(SinkInner::default()),
                connected: AtomicBool::new(true),
            })
        }

        /// Finish the in-flight track as if the stream ended naturally.
        fn complete_current(&self) -> bool {
            let mut inner = self.inner.lock().unwrap();
            match inner.current.take() {
                Some((source, done)) => {
                    drop(source);
                    let _ = done.send(PlaybackEnded::Finished);
                    true
                }
                None => false,
            }
        }

        fn volumes(&self) -> Vec<f32> {
            self.inner.lock().unwrap().volumes.clone()
        }
    }

    impl OutputSink for TestSink {
        fn play(
            &self,
            source: AudioSource,
            on_complete: oneshot::Sender<PlaybackEnded>,
        ) -> Result<(), SinkError> {
            let mut inner = self.inner.lock().unwrap();
            inner.volumes.push(source.volume());
            inner.paused = false;
            inner.current = Some((source, on_complete));
            Ok(())
        }

        fn pause(&self) -> Result<(), SinkError> {
            self.inner.lock().unwrap().paused = true;
            Ok(())
        }

        fn resume(&self) -> Result<(), SinkError> {
            self.inner.lock().unwrap().paused = false;
            Ok(())
        }

        fn stop(&self) -> Result<(), SinkError> {
            let mut inner = self.inner.lock().unwrap();
            if let Some((source, done)) = inner.current.take() {
                drop(source);
                let _ = done.send(PlaybackEnded::Stopped);
            }
            Ok(())
        }

        fn is_playing(&self) -> bool {
            self.inner.lock().unwrap().current.is_some()
        }

        fn is_paused(&self) -> bool {
            self.inner.lock().unwrap().paused
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn disconnect(&self) {
            self.connected.store(false, Ordering::SeqCst);
            self.inner.lock().unwrap().current = None;
        }
    }

    async fn recv_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("event channel closed")
    }

    async fn wait_started(rx: &mut broadcast::Receiver<SessionEvent>) -> TrackInfo {
        loop {
            if let SessionEvent::TrackStarted { track } = recv_event(rx).await {
                return track;
            }
        }
    }

    fn history_titles(queue: &SessionQueue) -> Vec<String> {
        queue
            .state
            .lock()
            .unwrap()
            .history
            .iter()
            .map(|t| t.info().title.clone())
            .collect()
    }

    #[test]
    fn loop_track_mode_selects_the_same_track_repeatedly() {
        let mut state = QueueState {
            loop_mode: LoopMode::Track,
            ..QueueState::default()
        };
        state.pending.push_back(Track::Queued(test_info("x")));
        let id = state.pending.peek_head().unwrap().info().id;

        for _ in 0..3 {
            let selected = state.try_select().expect("head should be selectable");
            assert_eq!(selected.info().id, id);
        }
        assert_eq!(state.pending.len(), 1, "loop-track never dequeues the head");
    }

    #[test]
    fn loop_queue_mode_recycles_history_once_pending_empties() {
        let mut state = QueueState {
            loop_mode: LoopMode::Queue,
            ..QueueState::default()
        };
        state.history.push_back(Track::Queued(test_info("x")));
        state.history.push_back(Track::Queued(test_info("y")));

        let selected = state.try_select().expect("history should be recycled");

        assert_eq!(selected.info().title, "x", "oldest history item plays first");
        assert!(state.history.is_empty(), "history is drained by the swap");
        assert_eq!(state.pending.len(), 1);
        assert_eq!(state.pending.peek_head().unwrap().info().title, "y");
    }

    #[test]
    fn selection_consumes_pending_in_insertion_order() {
        let mut state = QueueState::default();
        for title in ["a", "b", "c"] {
            state.pending.push_back(Track::Queued(test_info(title)));
        }
        assert_eq!(state.try_select().unwrap().info().title, "a");
        assert_eq!(state.try_select().unwrap().info().title, "b");
        assert_eq!(state.try_select().unwrap().info().title, "c");
        assert!(state.try_select().is_none());
    }

    #[tokio::test]
    async fn enqueue_preactivates_only_the_first_of_a_playlist() {
        let resolver = TestResolver::with_reference("playlist", &["a", "b", "c"]);
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver.clone(), sink.clone(), 0.5);
        let mut events = queue.subscribe();

        let added = queue.enqueue("playlist", "tester").await.unwrap();

        assert_eq!(added.len(), 3);
        assert!(added[0].active, "first track gets its stream opened");
        assert!(!added[1].active);
        assert!(!added[2].active);
        assert!(added.iter().all(|e| e.track.requested_by == "tester"));

        let started = wait_started(&mut events).await;
        assert_eq!(started.title, "a");
        let page = queue.queue_page(0, 10);
        assert_eq!(
            page.items.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            ["b", "c"],
            "remaining tracks stay queued in insertion order"
        );
        queue.teardown().await;
    }

    #[tokio::test]
    async fn activation_failure_skips_to_the_next_track() {
        let resolver = TestResolver::with_reference("playlist", &["a", "b"]);
        resolver.fail_activation("a");
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver.clone(), sink.clone(), 0.5);
        let mut events = queue.subscribe();

        queue.enqueue("playlist", "tester").await.unwrap();

        let failed = loop {
            if let SessionEvent::TrackFailed { track, .. } = recv_event(&mut events).await {
                break track;
            }
        };
        assert_eq!(failed.title, "a");

        let started = wait_started(&mut events).await;
        assert_eq!(started.title, "b");

        sink.complete_current();
        loop {
            if let SessionEvent::TrackFinished { track } = recv_event(&mut events).await {
                assert_eq!(track.title, "b");
                break;
            }
        }
        assert_eq!(
            history_titles(&queue),
            ["b"],
            "a failed track is never filed as played"
        );
        queue.teardown().await;
    }

    #[tokio::test]
    async fn volume_applies_to_the_next_track_not_the_current_one() {
        let resolver = TestResolver::with_reference("playlist", &["a", "b"]);
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver.clone(), sink.clone(), 0.5);
        let mut events = queue.subscribe();

        queue.enqueue("playlist", "tester").await.unwrap();
        wait_started(&mut events).await;

        queue.set_volume(0.2).unwrap();
        assert_eq!(sink.volumes(), [0.5], "in-flight track keeps its volume");

        sink.complete_current();
        let started = wait_started(&mut events).await;
        assert_eq!(started.title, "b");
        assert_eq!(sink.volumes(), [0.5, 0.2]);
        queue.teardown().await;
    }

    #[tokio::test]
    async fn pause_and_resume_do_not_lose_or_double_count_progress() {
        let resolver = TestResolver::with_reference("song", &["a"]);
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver.clone(), sink.clone(), 0.5);
        let mut events = queue.subscribe();

        queue.enqueue("song", "tester").await.unwrap();
        wait_started(&mut events).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        queue.pause().unwrap();
        let at_pause = queue.progress().unwrap();
        assert!(at_pause >= Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            queue.progress().unwrap(),
            at_pause,
            "progress is frozen while paused"
        );
        assert!(queue.now_playing().unwrap().paused);

        queue.resume().unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let after_resume = queue.progress().unwrap();
        assert!(after_resume >= at_pause + Duration::from_millis(100));
        assert!(after_resume < at_pause + Duration::from_secs(1));
        queue.teardown().await;
    }

    #[tokio::test]
    async fn skip_force_stops_and_advances() {
        let resolver = TestResolver::with_reference("playlist", &["a", "b"]);
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver.clone(), sink.clone(), 0.5);
        let mut events = queue.subscribe();

        queue.enqueue("playlist", "tester").await.unwrap();
        assert_eq!(wait_started(&mut events).await.title, "a");

        queue.skip().unwrap();

        assert_eq!(wait_started(&mut events).await.title, "b");
        assert_eq!(history_titles(&queue), ["a"]);
        queue.teardown().await;
    }

    #[tokio::test]
    async fn loop_queue_replays_the_whole_queue_in_order() {
        let resolver = TestResolver::with_reference("playlist", &["x", "y"]);
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver.clone(), sink.clone(), 0.5);
        let mut events = queue.subscribe();
        queue.set_loop_mode(LoopMode::Queue);

        queue.enqueue("playlist", "tester").await.unwrap();

        assert_eq!(wait_started(&mut events).await.title, "x");
        sink.complete_current();
        assert_eq!(wait_started(&mut events).await.title, "y");
        sink.complete_current();
        assert_eq!(
            wait_started(&mut events).await.title,
            "x",
            "third pass begins again at the front"
        );
        queue.teardown().await;
    }

    #[tokio::test]
    async fn loop_track_replays_the_head_with_a_fresh_activation() {
        let resolver = TestResolver::with_reference("song", &["x"]);
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver.clone(), sink.clone(), 0.5);
        let mut events = queue.subscribe();
        queue.set_loop_mode(LoopMode::Track);

        queue.enqueue("song", "tester").await.unwrap();

        assert_eq!(wait_started(&mut events).await.title, "x");
        sink.complete_current();
        assert_eq!(wait_started(&mut events).await.title, "x");
        assert_eq!(queue.queue_len(), 1, "the head is never dequeued");
        assert!(
            resolver.activations().len() >= 2,
            "each replay consumes a freshly activated stream"
        );
        queue.teardown().await;
    }

    #[tokio::test]
    async fn teardown_releases_the_active_source_exactly_once() {
        let resolver = TestResolver::with_reference("song", &["a"]);
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver.clone(), sink.clone(), 0.5);
        let mut events = queue.subscribe();

        queue.enqueue("song", "tester").await.unwrap();
        wait_started(&mut events).await;
        assert_eq!(resolver.releases.load(Ordering::SeqCst), 0);

        queue.teardown().await;

        assert_eq!(resolver.releases.load(Ordering::SeqCst), 1);
        assert!(!sink.is_connected());
    }

    #[tokio::test]
    async fn control_preconditions_are_rejected_synchronously() {
        let resolver = TestResolver::with_reference("song", &["a"]);
        let sink = TestSink::new();
        let queue = SessionQueue::spawn(resolver, sink, 0.5);

        assert_eq!(
            queue.pause(),
            Err(ControlError::Precondition(PreconditionError::NothingPlaying))
        );
        assert_eq!(
            queue.skip(),
            Err(ControlError::Precondition(PreconditionError::NothingPlaying))
        );
        assert_eq!(queue.shuffle(), Err(PreconditionError::EmptyQueue));
        assert_eq!(queue.set_volume(1.5), Err(PreconditionError::VolumeOutOfRange));
        assert_eq!(queue.set_volume(-0.1), Err(PreconditionError::VolumeOutOfRange));
        queue.teardown().await;
    }
}
