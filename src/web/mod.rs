#[cfg(feature = "embedded-assets")]
pub mod assets;
pub mod state;
pub mod ws;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::web::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new().route("/ws", any(ws::ws_handler));

    #[cfg(feature = "embedded-assets")]
    let router = router.fallback(assets::serve);
    // Built without assets there is nothing to serve plain requests with.
    #[cfg(not(feature = "embedded-assets"))]
    let router = router.fallback(|| async { StatusCode::NOT_FOUND });

    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_digest_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Gate every request when auth is configured: pass through on a valid
/// Digest response, otherwise 401 with a fresh challenge.
async fn require_digest_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(gate) = &state.auth else {
        return next.run(request).await;
    };

    let authorized = {
        let header_value = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let uri = request
            .uri()
            .path_and_query()
            .map_or("/", |pq| pq.as_str());
        gate.authorize(request.method().as_str(), uri, header_value)
    };

    if authorized {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, gate.challenge())],
            "authorization required",
        )
            .into_response()
    }
}
