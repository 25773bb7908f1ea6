//! Session registry
//!
//! `session id -> user id` for the live connections of this instance, plus
//! the reverse `user id -> sessions` index so disconnects never scan. Only
//! the presence tracker mutates it; every connection task reads it
//! concurrently, hence the `DashMap`s.
//!
//! Locks are always taken session map first, then the user index.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, String>,
    by_user: DashMap<String, HashSet<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a session to its user, replacing any previous mapping of that session
    pub fn register(&self, session_id: &str, user_id: &str) {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let previous = entry.insert(user_id.to_string());
                if previous != user_id {
                    self.detach(&previous, session_id);
                }
                self.attach(user_id, session_id);
            }
            Entry::Vacant(entry) => {
                entry.insert(user_id.to_string());
                self.attach(user_id, session_id);
            }
        }
    }

    /// Remove a session, returning the user it belonged to
    pub fn remove(&self, session_id: &str) -> Option<String> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(entry) => {
                self.detach(entry.get(), session_id);
                Some(entry.remove())
            }
            Entry::Vacant(_) => None,
        }
    }

    pub fn user_of(&self, session_id: &str) -> Option<String> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    /// Whether any session of `user_id` is still registered
    pub fn has_sessions(&self, user_id: &str) -> bool {
        self.session_count(user_id) > 0
    }

    pub fn session_count(&self, user_id: &str) -> usize {
        self.by_user.get(user_id).map_or(0, |sessions| sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn attach(&self, user_id: &str, session_id: &str) {
        self.by_user
            .entry(user_id.to_string())
            .or_default()
            .insert(session_id.to_string());
    }

    fn detach(&self, user_id: &str, session_id: &str) {
        if let Entry::Occupied(mut entry) = self.by_user.entry(user_id.to_string()) {
            entry.get_mut().remove(session_id);
            if entry.get().is_empty() {
                entry.remove();
            }
        }
    }
}
