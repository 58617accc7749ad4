//! API route table
//!
//! - /health - liveness plus current mode
//! - /snapshot - full session snapshot for the render layer
//! - /selection - replace, toggle or clear the monitored set
//! - /clock/toggle, /reset - playback control
//! - /cost, /sensor - operator inputs

use axum::routing::{delete, get, post};
use axum::Router;

use super::handlers::{self, ApiState};

pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/snapshot", get(handlers::snapshot))
        .route("/selection", post(handlers::select))
        .route("/selection", delete(handlers::clear_selection))
        .route("/selection/toggle", post(handlers::toggle_entity))
        .route("/clock/toggle", post(handlers::toggle_clock))
        .route("/reset", post(handlers::reset))
        .route("/cost", post(handlers::update_cost))
        .route("/sensor", post(handlers::update_sensor))
        .with_state(state)
}
