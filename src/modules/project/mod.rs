use axum::Router;
use axum::routing::get;
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    Router::new()
        .route("/", get(handler::list_projects).post(handler::create_project))
        .route(
            "/{id}",
            get(handler::get_project)
                .put(handler::update_project)
                .delete(handler::delete_project),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware
        ))
}
