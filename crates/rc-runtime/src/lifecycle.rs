use std::collections::BTreeSet;

use crate::cache::ArtifactCache;

pub const SESSION_SUBSCRIBER: &str = "runcode";

pub trait SessionEvents {
    fn subscribe_session_end(&mut self, subscriber: &str);
    fn unsubscribe_session_end(&mut self, subscriber: &str);
}

#[derive(Debug, Default)]
pub struct SessionBus {
    subscribers: BTreeSet<String>,
}

impl SessionBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self, subscriber: &str) -> bool {
        self.subscribers.contains(subscriber)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = &str> {
        self.subscribers.iter().map(String::as_str)
    }
}

impl SessionEvents for SessionBus {
    fn subscribe_session_end(&mut self, subscriber: &str) {
        self.subscribers.insert(subscriber.to_string());
    }

    fn unsubscribe_session_end(&mut self, subscriber: &str) {
        self.subscribers.remove(subscriber);
    }
}

#[derive(Debug, Default)]
pub struct SessionContext {
    pub(crate) cache: ArtifactCache,
}

impl SessionContext {
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    session: Option<SessionContext>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn activate(&mut self, events: &mut dyn SessionEvents) -> &mut SessionContext {
        self.session.get_or_insert_with(|| {
            events.subscribe_session_end(SESSION_SUBSCRIBER);
            tracing::info!("runcode session started");
            SessionContext::default()
        })
    }

    pub fn end_session(&mut self, events: &mut dyn SessionEvents) {
        if let Some(session) = self.session.take() {
            tracing::info!(
                artifacts = session.cache.len(),
                "runcode session ended, discarding compiled artifacts"
            );
        }
        events.unsubscribe_session_end(SESSION_SUBSCRIBER);
    }
}
