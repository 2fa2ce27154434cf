use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; connect-src 'self'"),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // CORS configuration for the user-facing endpoints
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/quiz", quiz_routes())
        .nest("/api/v1/wordle", wordle_routes())
        .nest("/api/v1/users", user_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn quiz_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", get(handlers::quiz::get_by_date))
        .route("/today", post(handlers::quiz::ensure_today))
}

fn wordle_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", get(handlers::wordle::get_word_of_the_day))
        .route("/today", post(handlers::wordle::ensure_today))
}

fn user_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/", post(handlers::users::create_user))
        .route("/{username}/statistics", get(handlers::users::get_statistics))
        .route("/{username}/quiz", get(handlers::quiz::get_or_create_session))
        .route("/{username}/quiz/options", put(handlers::quiz::update_options))
        .route("/{username}/quiz/submit", post(handlers::quiz::submit))
        .route(
            "/{username}/wordle",
            get(handlers::wordle::get_or_create_session),
        )
        .route(
            "/{username}/wordle/guesses",
            put(handlers::wordle::update_guesses),
        )
        .route("/{username}/wordle/submit", post(handlers::wordle::submit))
}
