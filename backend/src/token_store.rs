//! Opaque session token storage
//!
//! Sessions are opaque random tokens mapped to a principal. The store is a
//! trait so the HTTP layer never depends on a particular backing; the default
//! in-memory implementation suits a single-process deployment, and a
//! Redis-backed one can be dropped in without touching handlers.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Who a session token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// Manager account (users table)
    Manager { user_id: Uuid },
    /// Shop worker authenticated via invite code
    Worker { worker_id: Uuid, shop_id: Uuid },
}

#[derive(Debug, Clone)]
struct Session {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

/// Session token storage seam
pub trait TokenStore: Send + Sync {
    /// Store a token for a principal with the given lifetime in seconds
    fn put(&self, token: &str, principal: Principal, ttl_seconds: i64);

    /// Look up a token; expired tokens resolve to `None`
    fn get(&self, token: &str) -> Option<Principal>;

    /// Invalidate a token (logout)
    fn delete(&self, token: &str);
}

/// In-memory token store
///
/// Expired sessions are dropped lazily on lookup.
#[derive(Default)]
pub struct InMemoryTokenStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn put(&self, token: &str, principal: Principal, ttl_seconds: i64) {
        let session = Session {
            principal,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        };
        self.sessions
            .write()
            .expect("token store lock poisoned")
            .insert(token.to_string(), session);
    }

    fn get(&self, token: &str) -> Option<Principal> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().expect("token store lock poisoned");
            match sessions.get(token) {
                Some(session) if session.expires_at > now => return Some(session.principal),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it under the write lock
        self.sessions
            .write()
            .expect("token store lock poisoned")
            .remove(token);
        None
    }

    fn delete(&self, token: &str) {
        self.sessions
            .write()
            .expect("token store lock poisoned")
            .remove(token);
    }
}

/// Generate a new opaque session token
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}
