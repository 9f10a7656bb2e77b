//! Session authentication middleware.
//!
//! Every request passes through [`session_middleware`], which resolves the
//! caller's session token (bearer header or cookie) to a [`CurrentUser`]
//! request extension. Handlers that require a login call [`require_user`];
//! the one optional-auth endpoint reads the extension directly.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::middleware::Next;
use axum::response::Response;
use grove_core::config::SessionConfig;
use grove_store::models::UserRow;
use sha2::{Digest, Sha256};
use tracing::Instrument;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Create a trace ID from a client-provided value.
    /// The value is sanitized: truncated to MAX_TRACE_ID_LEN characters and
    /// non-printable characters removed.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated request extension: the resolved user plus the session row
/// that authenticated them (logout deletes that row).
#[derive(Clone, Debug)]
pub struct CurrentUser {
    /// The logged-in user.
    pub user: UserRow,
    /// Id of the session row backing this login.
    pub session_id: i64,
}

/// Generate an opaque session token using cryptographically secure RNG.
pub fn mint_session_token() -> String {
    use base64::Engine;
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a session token for storage lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Extract bearer token from Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(&v[7..])
            } else {
                None
            }
        })
}

/// Extract the session token from the configured cookie.
/// A request may carry several Cookie headers; all are checked.
fn extract_cookie_token<'a>(req: &'a Request, cookie_name: &str) -> Option<&'a str> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == cookie_name).then_some(value)
        })
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Build the Set-Cookie value carrying a freshly minted session token.
pub fn session_cookie(config: &SessionConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={token}; Path=/; HttpOnly; SameSite=Lax",
        config.cookie_name
    );
    if let Some(ttl_secs) = config.ttl_secs {
        cookie.push_str(&format!("; Max-Age={ttl_secs}"));
    }
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that clears the session cookie.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session middleware: resolves the session token to a user and sets up
/// trace context.
///
/// An invalid, expired, or absent token leaves the request unauthenticated
/// rather than failing it; handlers decide whether a login is required. A
/// session pointing at a deleted user is removed on sight.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = extract_or_generate_trace_id(&req);
    let trace_id_str = trace_id.0.clone();
    req.extensions_mut().insert(trace_id);

    // Bearer header wins over the cookie when both are present.
    let token = extract_bearer_token(&req)
        .or_else(|| extract_cookie_token(&req, &state.config.session.cookie_name))
        .map(str::to_owned);

    if let Some(token) = token {
        let token_hash = hash_token(&token);
        let now = time::OffsetDateTime::now_utc();

        if let Some(session) = state
            .store
            .get_session_by_token_hash(&token_hash, now)
            .await?
        {
            match state.store.get_user(session.user_id).await? {
                Some(user) => {
                    req.extensions_mut().insert(CurrentUser {
                        user,
                        session_id: session.id,
                    });
                }
                None => {
                    // The user behind this session is gone; drop the session
                    // so the token stops resolving.
                    tracing::debug!(
                        session_id = session.id,
                        user_id = session.user_id,
                        "session references a deleted user, removing"
                    );
                    if let Err(e) = state.store.delete_session(session.id).await {
                        tracing::warn!(
                            session_id = session.id,
                            error = %e,
                            "failed to remove dangling session"
                        );
                    }
                }
            }
        }
    }

    let response = next
        .run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await;

    Ok(response)
}

/// Require a logged-in user.
pub fn require_user(req: &Request) -> ApiResult<&CurrentUser> {
    req.extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
}

/// Get the optional logged-in user.
pub fn get_user(req: &Request) -> Option<&CurrentUser> {
    req.extensions().get::<CurrentUser>()
}

/// Get the trace ID from request extensions.
pub fn get_trace_id(req: &Request) -> Option<&TraceId> {
    req.extensions().get::<TraceId>()
}

// Note: hex is a simple utility, we'll inline it
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}
