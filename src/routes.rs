// src/routes.rs

use std::path::Path;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{assistant, auth, document, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Nests every endpoint under `/api`.
/// * Serves the frontend from `static_dir` for everything else, falling back
///   to `index.html`.
/// * Applies global middleware (Trace, CORS, upload size limit).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = [
        format!("http://localhost:{}", state.config.port),
        format!("http://127.0.0.1:{}", state.config.port),
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/whoami", get(auth::whoami));

    let document_routes = Router::new()
        .route("/summarize", post(document::summarize))
        .route("/prescription", post(document::prescription))
        .route("/chat-image", post(document::chat_image));

    let assistant_routes = Router::new()
        .route("/translate", post(assistant::translate))
        .route("/chat", post(assistant::chat))
        .route("/define", post(assistant::define))
        .route("/make_quiz", post(quiz::make_quiz));

    let static_dir = Path::new(&state.config.static_dir);
    let frontend = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let api = Router::new()
        .merge(auth_routes)
        .merge(document_routes)
        .merge(assistant_routes);

    Router::new()
        .nest("/api", api)
        .fallback_service(frontend)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .with_state(state)
}
