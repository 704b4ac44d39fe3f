use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use serde::Serialize;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "crypto_reports_session";

/// Everything remembered about one browser session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    pub authenticated: bool,
    /// IANA zone the client reported, if any.
    pub timezone: Option<String>,
}

/// In-memory session registry keyed by opaque cookie id.
///
/// Every record carries an idle stamp, refreshed on each access; a record
/// idle past the TTL no longer resolves, and stale records are swept each
/// time a new session is minted, so cookie-less churn cannot grow the map.
/// Logout removes the whole record, so every per-session flag disappears in
/// one step rather than being cleared field by field.
pub struct SessionStore {
    idle_ttl: Duration,
    sessions: Mutex<HashMap<String, (Session, Instant)>>,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            idle_ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a fresh anonymous session and return its id.
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().unwrap();
        let now = Instant::now();
        sessions.retain(|_, (_, seen)| now.duration_since(*seen) < self.idle_ttl);
        sessions.insert(id.clone(), (Session::default(), now));
        id
    }

    /// Fetch a live session, refreshing its idle stamp.  Expired records are
    /// dropped and report a miss.
    pub fn get(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(id) {
            Some((_, seen)) if seen.elapsed() >= self.idle_ttl => {
                sessions.remove(id);
                None
            }
            Some((session, seen)) => {
                *seen = Instant::now();
                Some(session.clone())
            }
            None => None,
        }
    }

    /// Mutate a live session in place.  Returns false when the id is unknown
    /// or expired.
    pub fn update<F: FnOnce(&mut Session)>(&self, id: &str, f: F) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(id) {
            Some((_, seen)) if seen.elapsed() >= self.idle_ttl => {
                sessions.remove(id);
                false
            }
            Some((session, seen)) => {
                *seen = Instant::now();
                f(session);
                true
            }
            None => false,
        }
    }

    /// Drop a session wholesale.
    pub fn remove(&self, id: &str) {
        self.sessions.lock().unwrap().remove(id);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pull the session id out of the request's `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// `Set-Cookie` value installing a session id.
pub fn set_cookie_value(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value expiring the session cookie.
pub fn clear_cookie_value() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
