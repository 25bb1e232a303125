use axum::{
    body::Body,
    extract::{Path as AxumPath, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use maud::html;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::assets::ENTRY_DOCUMENT;
use crate::handlers::{self, client_addr};
use crate::state::SharedState;

pub const INFO_PATH: &str = "/api/info";

/// Builds the full route table.
///
/// Layers, outermost first: panic recovery, request tracing, the `/api/info`
/// access log. The API routes additionally carry the no-cache headers.
pub fn app(state: SharedState) -> Router {
    let no_cache = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ));

    let api = Router::new()
        .route("/info", get(handlers::get_info))
        .route("/download", get(handlers::download))
        .layer(no_cache);

    let routes = Router::new()
        .route("/", get(index_handler))
        .route("/static/*path", get(static_handler))
        .nest("/api", api);

    with_middleware(routes).with_state(state)
}

/// Wraps `router` in the access log, request tracing and panic recovery.
fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    router
        .layer(middleware::from_fn(access_log))
        .layer(trace_layer)
        .layer(CatchPanicLayer::new())
}

/// Logs each info lookup. Downloads log themselves.
async fn access_log(request: Request, next: Next) -> Response {
    if request.uri().path() == INFO_PATH {
        info!(client = %client_addr(&request), "session established");
    }
    next.run(request).await
}

/// Serves the single-page entry document from the embedded tree.
async fn index_handler(State(state): State<SharedState>) -> Response {
    match state.assets.get_file(ENTRY_DOCUMENT) {
        Some(file) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            Body::from(Bytes::from_static(file.contents())),
        )
            .into_response(),
        None => {
            error!(asset = ENTRY_DOCUMENT, "entry document missing from embedded assets");
            error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error: index.html not found",
            )
        }
    }
}

/// Serves the embedded asset tree verbatim under `/static`.
async fn static_handler(
    State(state): State<SharedState>,
    AxumPath(path): AxumPath<String>,
) -> Response {
    let Some(file) = state.assets.get_file(&path) else {
        return error_page(StatusCode::NOT_FOUND, "Asset not found.");
    };

    let mime_type = mime_guess::from_path(&path).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime_type.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    (
        [(header::CONTENT_TYPE, content_type)],
        Body::from(Bytes::from_static(file.contents())),
    )
        .into_response()
}

/// Small HTML error page for the browser-facing routes.
fn error_page(status_code: StatusCode, message: &str) -> Response {
    let markup = html! {
        div style="padding: 10px; border: 1px solid red; color: red; margin: 10px;" {
            h2 { "Error" }
            p { (message) }
        }
    };
    (status_code, markup).into_response()
}
