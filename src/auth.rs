use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::session::{self, SessionStore};

/// Decides whether a username/password pair is valid.  The hub ships a flat
/// file verifier; tests substitute their own.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Verifier backed by a flat JSON file of `{"user": "password"}` pairs.
///
/// The file is read on every attempt, so edits apply to the next login with
/// no restart.  A missing or malformed file means no credential is valid.
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialVerifier for FileCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("credential file {} unreadable: {e}", self.path.display());
                return false;
            }
        };
        let creds: HashMap<String, String> = match serde_json::from_str(&raw) {
            Ok(creds) => creds,
            Err(e) => {
                tracing::warn!("credential file {} malformed: {e}", self.path.display());
                return false;
            }
        };
        match creds.get(username) {
            Some(expected) => constant_time_eq(expected.as_bytes(), password.as_bytes()),
            None => false,
        }
    }
}

/// Extension type injected into every request so the middleware can reach
/// the session store.
#[derive(Clone)]
pub struct GateContext {
    pub sessions: Arc<SessionStore>,
    /// False when no credential file is configured; the gate then passes
    /// everything through untouched.
    pub enabled: bool,
}

/// Axum middleware: require an authenticated session for API routes when the
/// login gate is configured.
///
/// The static frontend and the login/session endpoints stay reachable so a
/// logged-out browser can render the login form at all.
pub async fn require_session(request: Request, next: Next) -> Response {
    let gate = request.extensions().get::<GateContext>().cloned();

    // No gate context or gate disabled ⇒ allow all.
    let Some(gate) = gate else {
        return next.run(request).await;
    };
    if !gate.enabled {
        return next.run(request).await;
    }

    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let authenticated = session::session_id_from_headers(request.headers())
        .and_then(|id| gate.sessions.get(&id))
        .map(|s| s.authenticated)
        .unwrap_or(false);

    if authenticated {
        return next.run(request).await;
    }

    let body = json!({"error": "unauthorized"});
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

fn is_public(path: &str) -> bool {
    matches!(
        path,
        "/health" | "/api/login" | "/api/session" | "/api/session/timezone"
    ) || !path.starts_with("/api")
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    struct TempCreds {
        path: PathBuf,
    }

    impl TempCreds {
        fn write(contents: &str) -> Self {
            let path =
                std::env::temp_dir().join(format!("hub-creds-{}.json", uuid::Uuid::new_v4()));
            fs::write(&path, contents).unwrap();
            Self { path }
        }
    }

    impl Drop for TempCreds {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.path);
        }
    }

    #[test]
    fn exact_match_only() {
        let creds = TempCreds::write(r#"{"alice": "s3cret", "bob": "hunter2"}"#);
        let verifier = FileCredentials::new(creds.path.clone());

        assert!(verifier.verify("alice", "s3cret"));
        assert!(verifier.verify("bob", "hunter2"));
        assert!(!verifier.verify("alice", "S3CRET"));
        assert!(!verifier.verify("alice", "s3cret "));
        assert!(!verifier.verify("mallory", "s3cret"));
        assert!(!verifier.verify("", ""));
    }

    #[test]
    fn missing_or_malformed_file_rejects_everyone() {
        let verifier = FileCredentials::new(Path::new("/no/such/credentials.json").to_path_buf());
        assert!(!verifier.verify("alice", "s3cret"));

        let broken = TempCreds::write("not json at all");
        let verifier = FileCredentials::new(broken.path.clone());
        assert!(!verifier.verify("alice", "s3cret"));
    }

    #[test]
    fn file_edits_apply_to_the_next_attempt() {
        let creds = TempCreds::write(r#"{"alice": "old-pass"}"#);
        let verifier = FileCredentials::new(creds.path.clone());

        assert!(verifier.verify("alice", "old-pass"));
        assert!(!verifier.verify("alice", "new-pass"));

        fs::write(&creds.path, r#"{"alice": "new-pass"}"#).unwrap();
        assert!(verifier.verify("alice", "new-pass"));
        assert!(!verifier.verify("alice", "old-pass"));
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn public_paths() {
        assert!(is_public("/health"));
        assert!(is_public("/api/login"));
        assert!(is_public("/api/session"));
        assert!(is_public("/api/session/timezone"));
        assert!(is_public("/"));
        assert!(is_public("/app.js"));
        assert!(!is_public("/api/report"));
        assert!(!is_public("/api/speech/start"));
    }
}
