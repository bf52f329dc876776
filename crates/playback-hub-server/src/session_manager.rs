//! Explicit per-session scheduler registry.
//!
//! Owns one [`SessionQueue`] per session key with create-on-demand and
//! explicit teardown. Sessions live only in memory; a process restart
//! loses them all.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use playback_session::{
    MediaResolver, OutputSink, SessionEvent, SessionQueue, SinkError,
};

/// Creates the output sink a new session plays through.
pub trait SinkConnector: Send + Sync {
    /// Open a sink connection for the given session key.
    fn connect(&self, session_key: &str) -> Result<Arc<dyn OutputSink>, SinkError>;
}

pub struct SessionManager {
    resolver: Arc<dyn MediaResolver>,
    connector: Arc<dyn SinkConnector>,
    default_volume: f32,
    sessions: Mutex<HashMap<String, Arc<SessionQueue>>>,
}

impl SessionManager {
    pub fn new(
        resolver: Arc<dyn MediaResolver>,
        connector: Arc<dyn SinkConnector>,
        default_volume: f32,
    ) -> Self {
        Self {
            resolver,
            connector,
            default_volume,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch an existing session.
    pub fn get(&self, key: &str) -> Option<Arc<SessionQueue>> {
        self.sessions.lock().unwrap().get(key).cloned()
    }

    /// Fetch or create the session for a key, starting its playback loop.
    pub fn get_or_create(&self, key: &str) -> Result<Arc<SessionQueue>, SinkError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get(key) {
            return Ok(session.clone());
        }
        let sink = self.connector.connect(key)?;
        let session = SessionQueue::spawn(self.resolver.clone(), sink, self.default_volume);
        spawn_event_logger(key.to_string(), session.subscribe());
        sessions.insert(key.to_string(), session.clone());
        tracing::info!(session = %key, "created session");
        Ok(session)
    }

    /// Snapshot of all live sessions as `(key, session)` pairs.
    pub fn list(&self) -> Vec<(String, Arc<SessionQueue>)> {
        let mut sessions: Vec<_> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .map(|(key, session)| (key.clone(), session.clone()))
            .collect();
        sessions.sort_by(|a, b| a.0.cmp(&b.0));
        sessions
    }

    /// Tear down and remove one session.
    ///
    /// Returns `false` when no session exists for the key.
    pub async fn teardown(&self, key: &str) -> bool {
        let session = self.sessions.lock().unwrap().remove(key);
        match session {
            Some(session) => {
                session.teardown().await;
                tracing::info!(session = %key, "session torn down");
                true
            }
            None => false,
        }
    }

    /// Tear down every session (process shutdown).
    pub async fn teardown_all(&self) {
        let sessions: Vec<_> = self.sessions.lock().unwrap().drain().collect();
        for (key, session) in sessions {
            session.teardown().await;
            tracing::info!(session = %key, "session torn down");
        }
    }
}

/// Relay the session's notification stream into the log.
fn spawn_event_logger(key: String, mut events: broadcast::Receiver<SessionEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::TrackStarted { track }) => {
                    tracing::info!(session = %key, title = %track.title, "now playing");
                }
                Ok(SessionEvent::TrackFinished { track }) => {
                    tracing::debug!(session = %key, title = %track.title, "track finished");
                }
                Ok(SessionEvent::TrackFailed { track, reason }) => {
                    tracing::warn!(
                        session = %key,
                        title = %track.title,
                        reason = %reason,
                        "track skipped"
                    );
                }
                Ok(SessionEvent::SinkFailed { track, reason }) => {
                    tracing::warn!(
                        session = %key,
                        title = %track.title,
                        reason = %reason,
                        "sink rejected playback"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use super::*;
    use playback_session::{
        ActivationError, AudioSource, PlaybackEnded, ResolutionError, TrackInfo,
    };

    struct NoopResolver;

    #[async_trait]
    impl MediaResolver for NoopResolver {
        async fn resolve(&self, _reference: &str) -> Result<Vec<TrackInfo>, ResolutionError> {
            Err(ResolutionError::new("unsupported"))
        }

        async fn activate(&self, _track: &TrackInfo) -> Result<AudioSource, ActivationError> {
            Err(ActivationError::new("unsupported"))
        }
    }

    struct NoopSink;

    impl OutputSink for NoopSink {
        fn play(
            &self,
            _source: AudioSource,
            _on_complete: oneshot::Sender<PlaybackEnded>,
        ) -> Result<(), SinkError> {
            Ok(())
        }

        fn pause(&self) -> Result<(), SinkError> {
            Ok(())
        }

        fn resume(&self) -> Result<(), SinkError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), SinkError> {
            Ok(())
        }

        fn is_playing(&self) -> bool {
            false
        }

        fn is_paused(&self) -> bool {
            false
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn disconnect(&self) {}
    }

    struct NoopConnector;

    impl SinkConnector for NoopConnector {
        fn connect(&self, _session_key: &str) -> Result<Arc<dyn OutputSink>, SinkError> {
            Ok(Arc::new(NoopSink))
        }
    }

    fn make_manager() -> SessionManager {
        SessionManager::new(Arc::new(NoopResolver), Arc::new(NoopConnector), 0.5)
    }

    #[tokio::test]
    async fn get_or_create_reuses_the_same_session() {
        let manager = make_manager();
        let first = manager.get_or_create("room-1").unwrap();
        let second = manager.get_or_create("room-1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.list().len(), 1);
        manager.teardown_all().await;
    }

    #[tokio::test]
    async fn sessions_are_independent_per_key() {
        let manager = make_manager();
        let first = manager.get_or_create("room-1").unwrap();
        let second = manager.get_or_create("room-2").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(manager.list().len(), 2);
        manager.teardown_all().await;
    }

    #[tokio::test]
    async fn teardown_removes_the_session() {
        let manager = make_manager();
        manager.get_or_create("room-1").unwrap();
        assert!(manager.teardown("room-1").await);
        assert!(manager.get("room-1").is_none());
        assert!(!manager.teardown("room-1").await);
    }
}
