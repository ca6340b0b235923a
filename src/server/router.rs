//! HTTP routing.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{controller, fallback::middleware::unit_of_work, model::app::AppState};

/// Builds the application's HTTP router.
///
/// Every route runs inside the unit-of-work middleware, so messages enqueued by a request are
/// counted and considered for a fallback drain when it completes.
///
/// # Registered Endpoints
/// - `POST /api/messages/{queue}` - Enqueue a message
/// - `GET /api/queues/{queue}` - Pending messages and worker liveness
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/messages/{queue}",
            post(controller::message::enqueue_message),
        )
        .route("/api/queues/{queue}", get(controller::queue::get_queue_status))
        .layer(middleware::from_fn_with_state(
            state.scheduler.clone(),
            unit_of_work,
        ))
        .with_state(state)
}
