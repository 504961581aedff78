use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{authenticate, Session};
use crate::model::User;
use crate::observability;
use crate::persistence::Persistence;

use super::Engine;

impl<P: Persistence> Engine<P> {
    /// Start a session for the matching user. A failed attempt leaves any
    /// existing session in place.
    pub fn login(&mut self, login: &str, password: &str) -> Option<&User> {
        let Some(user) = authenticate(&self.store.users, login, password) else {
            warn!("failed login for {login:?}");
            metrics::counter!(observability::LOGIN_FAILURES_TOTAL).increment(1);
            return None;
        };
        info!("user {} logged in", user.login);
        self.session = Some(Session { user_id: user.id, started_at: Utc::now() });
        Some(user)
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!("user {} logged out", session.user_id);
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().and_then(|s| self.store.user(&s.user_id))
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user().is_some_and(User::is_admin)
    }
}
