//! Static pages
//!
//! The demo page and the embeddable search widget are compiled into the
//! binary so the service has no runtime asset directory to locate.

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

const DEMO_HTML: &str = include_str!("../../static/demo.html");
const WIDGET_HTML: &str = include_str!("../../static/widget.html");
const WIDGET_EMBED_JS: &str = include_str!("../../static/widget-embed.js");

pub fn router() -> Router {
    Router::new()
        .route("/demo", get(serve_demo))
        // Served as HTML so it can be loaded in an iframe
        .route("/widget.js", get(serve_widget))
        .route("/widget-embed.js", get(serve_widget_embed))
}

async fn serve_demo() -> Html<&'static str> {
    Html(DEMO_HTML)
}

async fn serve_widget() -> Html<&'static str> {
    Html(WIDGET_HTML)
}

async fn serve_widget_embed() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        WIDGET_EMBED_JS,
    )
        .into_response()
}
