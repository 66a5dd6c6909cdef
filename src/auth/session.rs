//! Server-side sessions keyed by a random id carried in the `sid` cookie.
//!
//! The cookie value is `<id>.<tag>`, where the tag is an HMAC-SHA256 of the id
//! under the session secret, so forged ids are rejected before lookup.

use super::AuthError;
use hmac::{Hmac, Mac};
use rustc_hash::FxHashMap;
use sha2::Sha256;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;

pub const SESSION_COOKIE: &str = "sid";

pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 3600);
const STATE_TTL: Duration = Duration::from_secs(600);

type HmacSha256 = Hmac<Sha256>;

struct Session {
    user_id: i64,
    created: Instant,
}

pub struct SessionStore {
    mac: HmacSha256,
    sessions: RwLock<FxHashMap<String, Session>>,
    /// OAuth `state` values handed out and not yet used.
    pending: RwLock<FxHashMap<String, Instant>>,
    max_age: Duration,
}

impl SessionStore {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let mac = HmacSha256::new_from_slice(secret.as_ref())
            .map_err(|e| AuthError::Config(format!("invalid session secret: {}", e)))?;
        Ok(Self {
            mac,
            sessions: RwLock::new(FxHashMap::default()),
            pending: RwLock::new(FxHashMap::default()),
            max_age: DEFAULT_SESSION_MAX_AGE,
        })
    }

    /// Sessions older than `max_age` are rejected and dropped.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    fn tag(&self, id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Starts a session and returns the cookie value for it.
    pub fn create(&self, user_id: i64) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let cookie = format!("{}.{}", id, self.tag(&id));
        let now = Instant::now();

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, s| now.duration_since(s.created) < self.max_age);
        sessions.insert(
            id,
            Session {
                user_id,
                created: now,
            },
        );
        cookie
    }

    fn verified_id<'a>(&self, cookie: &'a str) -> Option<&'a str> {
        let (id, tag) = cookie.split_once('.')?;
        let expected = self.tag(id);
        let matches = tag.len() == expected.len()
            && bool::from(tag.as_bytes().ct_eq(expected.as_bytes()));
        matches.then_some(id)
    }

    pub fn resolve(&self, cookie: &str) -> Option<i64> {
        let id = self.verified_id(cookie)?;
        let user_id = {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            let session = sessions.get(id)?;
            (session.created.elapsed() < self.max_age).then_some(session.user_id)
        };
        if user_id.is_none() {
            self.sessions
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(id);
        }
        user_id
    }

    pub fn remove(&self, cookie: &str) {
        if let Some(id) = self.verified_id(cookie) {
            self.sessions
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(id);
        }
    }

    /// Issues a fresh OAuth `state` value.
    pub fn issue_state(&self) -> String {
        let state = uuid::Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut pending = self.pending.write().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|_, issued| now.duration_since(*issued) < STATE_TTL);
        pending.insert(state.clone(), now);
        state
    }

    /// Consumes a `state` value; each one is accepted once, within its TTL.
    pub fn take_state(&self, state: &str) -> bool {
        let issued = self
            .pending
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(state);
        matches!(issued, Some(at) if at.elapsed() < STATE_TTL)
    }
}

/// Extracts one cookie from a `Cookie:` header value.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

pub fn session_cookie(value: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, value
    )
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new("secret").unwrap()
    }

    fn held(store: &SessionStore) -> usize {
        store.sessions.read().unwrap().len()
    }

    #[test]
    fn test_session_roundtrip_and_logout() {
        let store = store();
        let cookie = store.create(7);
        assert_eq!(store.resolve(&cookie), Some(7));

        store.remove(&cookie);
        assert_eq!(store.resolve(&cookie), None);
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let store = store();
        let cookie = store.create(7);
        let (id, tag) = cookie.split_once('.').unwrap();

        assert_eq!(tag.len(), 64);
        assert_eq!(store.resolve(id), None);
        assert_eq!(store.resolve(&format!("{}.{}", id, "0".repeat(64))), None);
        assert_eq!(store.resolve(&format!("{}.{}", id, &tag[..10])), None);

        // Same id signed with another secret.
        let other = SessionStore::new("other").unwrap();
        assert_eq!(other.resolve(&cookie), None);
    }

    #[test]
    fn test_sessions_expire_after_max_age() {
        let store = store().with_max_age(Duration::from_millis(50));
        let cookie = store.create(7);
        assert_eq!(store.resolve(&cookie), Some(7));

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(store.resolve(&cookie), None);
        assert_eq!(held(&store), 0);
    }

    #[test]
    fn test_expired_sessions_are_pruned_on_login() {
        let store = store().with_max_age(Duration::from_millis(20));
        for user_id in 0..1_000 {
            store.create(user_id);
        }
        std::thread::sleep(Duration::from_millis(40));

        let cookie = store.create(1);
        assert_eq!(held(&store), 1);
        assert_eq!(store.resolve(&cookie), Some(1));
    }

    #[test]
    fn test_state_is_single_use() {
        let store = store();
        let state = store.issue_state();
        assert!(store.take_state(&state));
        assert!(!store.take_state(&state));
        assert!(!store.take_state("never-issued"));
    }

    #[test]
    fn test_cookie_value() {
        let header = "theme=dark; sid=abc.def; other=1";
        assert_eq!(cookie_value(header, "sid"), Some("abc.def"));
        assert_eq!(cookie_value(header, "missing"), None);
    }
}
