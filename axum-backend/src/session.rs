use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::error::AppError;
use crate::history::ConversionRecord;
use crate::settings::ConversionSettings;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "cad_session";

/// Per-login wizard state: upload -> configure -> convert -> results
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub user: String,
    /// Stored name under the uploads directory
    pub uploaded_file: Option<String>,
    pub original_filename: Option<String>,
    pub settings: Option<ConversionSettings>,
    pub conversion_result: Option<ConversionRecord>,
}

impl SessionData {
    fn for_user(user: &str) -> Self {
        Self {
            user: user.to_string(),
            ..Self::default()
        }
    }
}

struct SessionEntry {
    data: SessionData,
    last_seen: Instant,
}

/// Sessions idle for longer than `idle_timeout` are dropped
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts a session and sweeps out idle ones
    pub fn create(&self, user: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.write();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.idle_timeout);
        sessions.insert(
            id,
            SessionEntry {
                data: SessionData::for_user(user),
                last_seen: now,
            },
        );
        id
    }

    /// Live session data; refreshes the idle clock
    pub fn get(&self, id: &Uuid) -> Option<SessionData> {
        let now = Instant::now();
        let mut sessions = self.write();
        let entry = sessions.get_mut(id)?;
        if now.duration_since(entry.last_seen) > self.idle_timeout {
            sessions.remove(id);
            return None;
        }
        entry.last_seen = now;
        Some(entry.data.clone())
    }

    /// Apply `f` to the session; false if it no longer exists
    pub fn update<F>(&self, id: &Uuid, f: F) -> bool
    where
        F: FnOnce(&mut SessionData),
    {
        match self.write().get_mut(id) {
            Some(entry) => {
                f(&mut entry.data);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &Uuid) -> Option<SessionData> {
        self.write().remove(id).map(|entry| entry.data)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn session_cookie(id: &Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Session id from the `Cookie` header(s), if present and well formed
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Extractor for routes that require login
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: Uuid,
    pub data: SessionData,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let id = session_id_from_headers(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let data = state.sessions.get(&id).ok_or(AppError::Unauthenticated)?;
        Ok(Self { id, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_create_get_update_remove() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create("admin");
        assert_eq!(store.get(&id).unwrap().user, "admin");

        assert!(store.update(&id, |data| data.uploaded_file = Some("a.png".to_string())));
        assert_eq!(store.get(&id).unwrap().uploaded_file.as_deref(), Some("a.png"));

        assert!(store.remove(&id).is_some());
        assert!(store.get(&id).is_none());
        assert!(!store.update(&id, |_| {}));
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::new(Duration::from_millis(5));
        let stale = store.create("admin");
        std::thread::sleep(Duration::from_millis(30));

        assert!(store.get(&stale).is_none());
        assert!(store.is_empty());

        let first = store.create("admin");
        std::thread::sleep(Duration::from_millis(30));
        let second = store.create("admin");
        assert_eq!(store.len(), 1);
        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
    }

    #[test]
    fn test_repeated_logins_do_not_pile_up_once_idle() {
        let store = SessionStore::new(Duration::ZERO);
        for _ in 0..50 {
            store.create("admin");
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cookie_parsing() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}; other=1", SESSION_COOKIE, id)).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_cookie_missing_or_garbage() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("cad_session=not-a-uuid"));
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn test_cookie_strings() {
        let id = Uuid::nil();
        assert_eq!(
            session_cookie(&id),
            "cad_session=00000000-0000-0000-0000-000000000000; Path=/; HttpOnly; SameSite=Lax"
        );
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }
}
