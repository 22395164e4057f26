// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{auth, exams, questions, results, subjects},
    state::AppState,
};

/// Service banner, doubles as a liveness probe.
async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "CBE Backend API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, subjects, questions, exams, results).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (database pool + config).
///
/// Role checks live in the extractor guards (`crate::guards`), not in router
/// layers, because several paths mix public reads with admin writes.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login));

    let subject_routes = Router::new()
        .route(
            "/",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .route(
            "/{id}",
            get(subjects::get_subject)
                .put(subjects::update_subject)
                .delete(subjects::delete_subject),
        );

    // GET and POST address the path parameter as a subject ID, PUT and
    // DELETE as a question ID, matching the original API shape.
    let question_routes = Router::new().route(
        "/{id}",
        get(questions::list_questions)
            .post(questions::add_question)
            .put(questions::update_question)
            .delete(questions::delete_question),
    );

    let exam_routes = Router::new()
        .route("/start/{subject_id}", post(exams::start_exam))
        .route("/submit", post(exams::submit_exam));

    let result_routes = Router::new()
        .route("/", get(results::list_all_results))
        .route("/me", get(results::my_results))
        .route("/{id}", get(results::get_result));

    Router::new()
        .route("/", get(root))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/subjects", subject_routes)
        // `nest` does not match the bare trailing-slash form of the
        // collection path, so register it explicitly per the spec.
        .route(
            "/api/v1/subjects/",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .nest("/api/v1/questions", question_routes)
        .nest("/api/v1/exams", exam_routes)
        .nest("/api/v1/results", result_routes)
        .route("/api/v1/results/", get(results::list_all_results))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
