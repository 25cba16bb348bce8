//! Master server protocol handler: heartbeat, ping, shutdown, query.

use std::net::{IpAddr, SocketAddr};

use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::api::dto::{MasterParams, MasterRequest};
use crate::app_state::AppState;
use crate::domain::ServerId;
use crate::error::MasterError;

/// Path used by deployed game servers and clients.
pub const LEGACY_PATH: &str = "/ufo/masterserver.php";

/// `GET /ufo/masterserver.php` — Run one registry operation.
///
/// The caller's identity is its source address plus `port`. Every
/// recognized operation answers with the directory as it stands after the
/// operation: the live server count, then one `<host> <port>` line per
/// server.
///
/// # Errors
///
/// Returns [`MasterError::MalformedQuery`] for an undecodable query string
/// (such as a repeated key), [`MasterError::MalformedIdentity`] for an
/// invalid `port`,
/// [`MasterError::UnknownOperation`] when no selector is present, and the
/// store errors of [`crate::service::RegistryService::execute`].
#[utoipa::path(
    get,
    path = "/ufo/masterserver.php",
    tag = "Master server",
    summary = "Register, refresh, withdraw or list game servers",
    description = "Exactly one selector key (`heartbeat`, `ping`, `shutdown`, `query`) names the operation; its value is ignored. The response is plain text: the number of live servers followed by one `<host> <port>` line each.",
    params(MasterParams),
    responses(
        (status = 200, description = "Server directory after the operation, or `Invalid command`", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid port or undecodable query string", body = String, content_type = "text/plain"),
        (status = 503, description = "Record store unavailable or busy", body = String, content_type = "text/plain"),
    )
)]
pub async fn masterserver_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    params: Result<Query<MasterParams>, QueryRejection>,
) -> Result<impl IntoResponse, MasterError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!(%peer, error = %rejection.body_text(), "undecodable master server query");
        MasterError::MalformedQuery(rejection.body_text())
    })?;
    let request = MasterRequest::from_params(&params, state.default_port).inspect_err(|err| {
        tracing::debug!(%peer, error = %err, "rejected master server request");
    })?;

    let ip = caller_ip(peer, &headers, state.trust_forwarded_for);
    let caller = ServerId::from_ip(ip, request.port);

    let snapshot = state
        .registry
        .execute(request.operation, &caller)
        .await
        .inspect_err(|err| {
            if err.is_store_failure() {
                tracing::error!(op = %request.operation, %caller, error = %err, "registry operation failed");
            } else {
                tracing::warn!(op = %request.operation, %caller, error = %err, "registry operation rejected");
            }
        })?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        snapshot.render_directory(),
    ))
}

/// Resolves the caller address, honouring `X-Forwarded-For` when trusted.
fn caller_ip(peer: SocketAddr, headers: &HeaderMap, trust_forwarded_for: bool) -> IpAddr {
    if trust_forwarded_for
        && let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }
    peer.ip()
}

/// Master server routes: the legacy script path and a short alias.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(LEGACY_PATH, get(masterserver_handler))
        .route("/masterserver", get(masterserver_handler))
}
