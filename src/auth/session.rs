use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::RngCore;

use crate::types::UserId;

pub const SESSION_COOKIE: &str = "cryptobank_session";

const TOKEN_LEN: usize = 32;

/// In-memory session tokens with a fixed time-to-live. Expired entries are
/// dropped on access and by the periodic sweeper in the daemon loop.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
}

struct Session {
    user_id: UserId,
    expires_at: Instant,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Open a session for the user and return its token.
    pub fn create(&self, user_id: UserId) -> String {
        let mut bytes = [0u8; TOKEN_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        let session = Session {
            user_id,
            expires_at: Instant::now() + self.ttl,
        };
        self.inner.lock().unwrap().insert(token.clone(), session);
        token
    }

    /// Resolve a token to its user, dropping it if it has expired.
    pub fn resolve(&self, token: &str) -> Option<UserId> {
        let mut sessions = self.inner.lock().unwrap();
        match sessions.get(token) {
            Some(session) if session.expires_at > Instant::now() => Some(session.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.inner.lock().unwrap().remove(token).is_some()
    }

    /// Drop all expired sessions, returning how many were removed.
    pub fn prune(&self) -> usize {
        let mut sessions = self.inner.lock().unwrap();
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }
}
