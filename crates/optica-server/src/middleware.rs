use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use optica_catalog::Actor;
use optica_core::{ApiKey, AppConfig, DEFAULT_API_ACTOR};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Clone)]
struct KeyDigest {
    actor: String,
    digest: [u8; 32],
}

/// Bearer-token auth. Only salted SHA-256 digests of the configured tokens
/// are kept in memory.
#[derive(Clone)]
pub struct AuthState {
    salt: Arc<str>,
    keys: Arc<Vec<KeyDigest>>,
    pub enabled: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("keys", &self.keys.len())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl AuthState {
    #[must_use]
    pub fn new(salt: &str, keys: &[ApiKey]) -> Self {
        let keys = keys
            .iter()
            .map(|key| KeyDigest {
                actor: key.actor.clone(),
                digest: token_digest(salt, &key.token),
            })
            .collect();
        Self {
            salt: Arc::from(salt),
            keys: Arc::new(keys),
            enabled: true,
        }
    }

    /// Builds auth from `OPTICA_API_KEYS`.
    ///
    /// In development, empty keys disable auth for local iteration.
    /// In non-development envs, empty keys fail startup.
    ///
    /// # Errors
    ///
    /// Fails outside development when no API keys are configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        if config.api_keys.is_empty() {
            if config.is_development() {
                tracing::warn!(
                    "OPTICA_API_KEYS not set; bearer auth disabled in development environment"
                );
                let mut state = Self::new(&config.api_key_hash_salt, &[]);
                state.enabled = false;
                return Ok(state);
            }

            anyhow::bail!(
                "OPTICA_API_KEYS is required outside development; provide comma-separated actor:token entries"
            );
        }

        Ok(Self::new(&config.api_key_hash_salt, &config.api_keys))
    }

    /// Resolves a token to the actor it was issued to. Every configured key
    /// is compared so the time taken does not depend on which one matches.
    fn authenticate(&self, token: &str) -> Option<Actor> {
        let presented = token_digest(&self.salt, token);
        let mut found = None;
        for key in self.keys.iter() {
            if bool::from(key.digest[..].ct_eq(&presented[..])) && found.is_none() {
                found = Some(Actor::new(key.actor.clone()));
            }
        }
        found
    }
}

fn token_digest(salt: &str, token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }
}

/// Rejects in the shared API error envelope, echoing the request's id.
fn reject(req: &Request, code: &'static str, message: &'static str) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| Uuid::new_v4().to_string(), |id| id.0.clone());
    ApiError::new(request_id, code, message).into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth. On success the matching
/// [`Actor`] is inserted into request extensions.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut().insert(Actor::new(DEFAULT_API_ACTOR));
        return next.run(req).await;
    }

    let actor = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .and_then(|token| auth.authenticate(token));

    match actor {
        Some(actor) => {
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        None => reject(&req, "unauthorized", "missing or invalid bearer token"),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(&req, "rate_limited", "rate limit exceeded");
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
