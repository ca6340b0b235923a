use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{
    model::api::QueueStatusDto,
    server::{error::Error, model::app::AppState, model::message::validate_queue_name},
};

/// Pending message count and worker liveness of a queue
///
/// # Responses
/// - 200 OK - `QueueStatusDto`
/// - 400 Bad Request - Invalid queue name
/// - 500 Internal Server Error - Queue storage failure
pub async fn get_queue_status(
    State(state): State<AppState>,
    Path(queue): Path<String>,
) -> Result<impl IntoResponse, Error> {
    validate_queue_name(&queue)?;

    let pending = state.bus.queue().len(&queue).await?;
    let worker_alive = state.scheduler.liveness().is_alive(&queue).await;

    Ok(Json(QueueStatusDto {
        queue,
        pending,
        worker_alive,
    }))
}
