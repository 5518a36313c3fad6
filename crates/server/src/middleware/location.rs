//! Location middleware: viewer identity and resolved-location cache fill.
//!
//! On every request through this layer:
//!
//! 1. The viewer identity is derived - the authenticated user id from the
//!    session when present, otherwise the anonymous token from the viewer
//!    cookie (minted on first sight).
//! 2. The location store is checked for that viewer. Presence in the cache
//!    is what decides whether to resolve; the cookie is only an identity
//!    carrier, never a "location already resolved" marker.
//! 3. On a miss, the client IP is resolved to a city (or the default-city
//!    fallback) and cached with the default lookup radius.
//! 4. The viewer identity is inserted as a request extension for handlers,
//!    and the anonymous cookie is (re)issued on the response when it was
//!    minted or resolution ran.
//!
//! Geo-IP failures never surface here; they arrive from the resolver
//! already folded into the fallback city. Database failures propagate as
//! 500s rather than being treated as a cache miss forever.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use rand::RngCore;
use std::fmt::Write as _;
use std::net::SocketAddr;
use tower_sessions::Session;

use crate::config::LocationConfig;
use crate::db::{CityRepository, RepositoryError};
use crate::error::AppError;
use crate::geoip::IpLocator;
use crate::location::{CityDirectory, LocationResolver, LocationStore, ResolvedLocation};
use crate::models::ViewerId;
use crate::state::AppState;

use super::session::current_user_id;

/// Bytes of entropy in an anonymous viewer token (hex-encoded to 12 chars).
const VIEWER_TOKEN_BYTES: usize = 6;

/// Derive the viewer, fill the location cache, and tag the response cookie.
///
/// # Errors
///
/// Returns `AppError::Database` when the city catalog or log table is
/// unreachable during resolution.
pub async fn resolve_location(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let config = &state.config().location;

    let cookie_token = cookie_value(request.headers(), &config.viewer_cookie_name);
    let minted = cookie_token.is_none();
    let token = cookie_token.unwrap_or_else(mint_viewer_token);

    let viewer = match current_user_id(&session).await {
        Some(user_id) => ViewerId::User(user_id),
        None => ViewerId::Anonymous(token.clone()),
    };

    let ip = client_ip(request.headers(), request.extensions().get::<ConnectInfo<SocketAddr>>());
    let resolved = fill_location(
        state.locations(),
        state.geoip(),
        CityRepository::new(state.pool()),
        &viewer,
        &ip,
        config,
    )
    .await?;

    sentry::configure_scope(|scope| {
        scope.set_tag("viewer", viewer.to_string());
    });

    request.extensions_mut().insert(viewer.clone());

    let mut response = next.run(request).await;

    if let ViewerId::Anonymous(token) = &viewer
        && (minted || resolved)
        && let Ok(value) = HeaderValue::from_str(&viewer_cookie(
            config,
            token,
            state.config().is_secure(),
        ))
    {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    Ok(response)
}

/// Fill the location store for `viewer` unless it already has a live entry.
///
/// Returns whether resolution actually ran; a warm cache skips the geo-IP
/// lookup entirely.
///
/// # Errors
///
/// Returns `RepositoryError` when the city catalog or log table is
/// unreachable.
async fn fill_location<G, D>(
    store: &LocationStore,
    geoip: &G,
    directory: D,
    viewer: &ViewerId,
    ip: &str,
    config: &LocationConfig,
) -> Result<bool, RepositoryError>
where
    G: IpLocator,
    D: CityDirectory,
{
    if store.get(viewer).await.is_some() {
        return Ok(false);
    }

    let resolver = LocationResolver::new(geoip, directory, &config.default_city_slug);
    let (city, is_undefined) = resolver.resolve(ip).await?;

    tracing::debug!(
        viewer = %viewer,
        city = %city.slug,
        is_undefined,
        "resolved viewer location"
    );

    store
        .set(
            viewer,
            ResolvedLocation {
                city: Some(city),
                lookup_radius: config.default_lookup_radius,
                is_undefined,
            },
        )
        .await;

    Ok(true)
}

/// Extract a cookie value from the request headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Mint a random anonymous viewer token (12 lowercase hex chars).
fn mint_viewer_token() -> String {
    let mut bytes = [0u8; VIEWER_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(12), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Best-effort client IP: first `X-Forwarded-For` hop, else peer address.
fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(|ip| ip.trim().to_string())
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_default()
}

/// Build the anonymous viewer `Set-Cookie` value. Max-age equals the
/// location cache TTL so the two expire together.
fn viewer_cookie(config: &LocationConfig, token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        config.viewer_cookie_name,
        config.ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &config.cookie_domain {
        let _ = write!(cookie, "; Domain={domain}");
    }
    cookie
}
