use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod error;
pub mod guard;
pub mod handler;
pub mod memory;
pub mod model;
pub mod provider;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    let public_routes = Router::new()
        .route("/providers", get(handler::list_providers));

    let protected_routes = Router::new()
        .route("/projects/{id}/jobs", post(handler::submit_job).get(handler::list_jobs))
        .route("/projects/{id}/music", post(handler::generate_music))
        .route("/projects/{id}/stems", post(handler::separate_stems))
        .route("/projects/{id}/videos", post(handler::generate_video))
        .route("/projects/{id}/publications", post(handler::publish))
        .route("/jobs/{id}", get(handler::poll_job))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware
        ));

    public_routes.merge(protected_routes)
}
