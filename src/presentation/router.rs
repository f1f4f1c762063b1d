use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::domain::PromptFamily;
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::extractors::Session;
use crate::presentation::handlers::{
    MAX_UPLOAD_BYTES, admin_download_word_handler, create_user_handler,
    delete_transcription_handler, delete_user_handler, download_by_job_handler,
    download_user_text_handler, download_word_handler, health_handler,
    list_all_transcriptions_handler, list_own_transcriptions_handler, list_users_handler,
    login_handler, logout_handler, logs_handler, process_handler, prompts, session_handler,
    stats_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/session", get(session_handler))
        .route(
            "/api/admin/users",
            get(list_users_handler)
                .post(create_user_handler)
                .delete(delete_user_handler),
        )
        .route(
            "/api/admin/transcriptions",
            get(list_all_transcriptions_handler).delete(delete_transcription_handler),
        )
        .route("/api/admin/stats", get(stats_handler))
        .route("/api/admin/logs", get(logs_handler))
        .route(
            "/api/admin/download/word/{user}/{filename}",
            get(admin_download_word_handler),
        )
        .route(
            "/api/process",
            post(process_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/transcriptions", get(list_own_transcriptions_handler))
        .route("/api/download/word/{filename}", get(download_word_handler))
        .route(
            "/api/download/txt/{user}/{id}/{filename}",
            get(download_user_text_handler),
        )
        .route(
            "/api/download/{file_type}/{id}",
            get(download_by_job_handler),
        );

    for family in PromptFamily::ALL {
        router = router
            .route(
                &format!("/api{}", family.collection_path()),
                get(
                    move |State(state): State<AppState>, Session(session): Session| {
                        prompts::list_prompts(state, session, family)
                    },
                )
                .post(
                    move |State(state): State<AppState>, Session(session): Session, body: Bytes| {
                        prompts::create_prompt(state, session, family, body)
                    },
                ),
            )
            .route(
                &format!("/api{}", family.active_setting_path()),
                get(
                    move |State(state): State<AppState>, Session(session): Session| {
                        prompts::active_prompt(state, session, family)
                    },
                )
                .post(
                    move |State(state): State<AppState>, Session(session): Session, body: Bytes| {
                        prompts::set_active_prompt(state, session, family, body)
                    },
                ),
            );
    }

    router
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
