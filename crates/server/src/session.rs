//! Session management
//!
//! A session owns one conversation. Idle sessions expire after the configured
//! TTL and are swept by a background task.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use fir_assist_agent::FirConversation;

use crate::ServerError;

pub struct Session {
    pub id: String,
    pub conversation: Arc<FirConversation>,
    pub created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl Session {
    pub fn new(conversation: FirConversation) -> Self {
        Self {
            id: conversation.id().to_string(),
            conversation: Arc::new(conversation),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }
}

pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(max_sessions, Duration::from_secs(3600), Duration::from_secs(300))
    }

    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    /// Periodically drop expired sessions until the returned sender sends `true`
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Removed expired sessions"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Register a new conversation
    pub fn insert(&self, conversation: FirConversation) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);
            if sessions.len() >= self.max_sessions {
                return Err(ServerError::SessionLimit);
            }
        }

        let session = Arc::new(Session::new(conversation));
        sessions.insert(session.id.clone(), session.clone());
        tracing::info!(session_id = %session.id, "Created session");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session; returns whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Drop expired sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let before = sessions.len();
        let timeout = self.session_timeout;
        sessions.retain(|id, session| {
            let keep = !session.is_expired(timeout);
            if !keep {
                tracing::debug!(session_id = %id, "Session expired");
            }
            keep
        });
        before - sessions.len()
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fir_assist_agent::ConversationConfig;
    use fir_assist_config::DomainConfig;

    fn conversation() -> FirConversation {
        FirConversation::new(
            Arc::new(DomainConfig::reference()),
            None,
            ConversationConfig::default(),
        )
    }

    #[test]
    fn test_insert_get_remove() {
        let manager = SessionManager::new(10);
        let session = manager.insert(conversation()).unwrap();
        let id = session.id.clone();

        assert_eq!(manager.get(&id).unwrap().id, id);
        assert_eq!(manager.list(), vec![id.clone()]);
        assert!(manager.remove(&id));
        assert!(!manager.remove(&id));
        assert!(manager.get(&id).is_none());
    }

    #[test]
    fn test_session_limit() {
        let manager = SessionManager::new(1);
        manager.insert(conversation()).unwrap();
        assert!(matches!(
            manager.insert(conversation()),
            Err(ServerError::SessionLimit)
        ));
    }

    #[test]
    fn test_expired_sessions_make_room() {
        let manager = SessionManager::with_config(1, Duration::ZERO, Duration::from_secs(60));
        manager.insert(conversation()).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(manager.insert(conversation()).is_ok());
        assert_eq!(manager.count(), 1);
    }
}
