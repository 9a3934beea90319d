use axum::Router;
use axum::routing::{get, put};
use crate::state::AppState;
use axum::middleware;

pub mod dto;
pub mod handler;
pub mod model;
pub mod refresh;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    Router::new()
        .route("/", get(handler::list_integrations))
        .route(
            "/{platform}",
            put(handler::connect_integration).delete(handler::disconnect_integration),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware
        ))
}
