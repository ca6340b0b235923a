use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    model::api::{EnqueueMessageDto, EnqueuedMessageDto},
    server::{
        error::{worker::WorkerError, Error},
        fallback::MessageCounter,
        model::{app::AppState, message::Message},
    },
};

/// Longest accepted delivery delay (30 days)
pub const MAX_DELAY_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Enqueue a message
///
/// Counts towards the request's unit of work, so if no worker is alive for the queue the
/// fallback drains it once the request completes.
///
/// # Responses
/// - 202 Accepted - `EnqueuedMessageDto`
/// - 400 Bad Request - Invalid queue name, unknown message kind or delay too long
/// - 500 Internal Server Error - Queue storage failure
pub async fn enqueue_message(
    State(state): State<AppState>,
    Path(queue): Path<String>,
    Extension(counter): Extension<MessageCounter>,
    Json(body): Json<EnqueueMessageDto>,
) -> Result<impl IntoResponse, Error> {
    if !state.handlers.contains(&body.kind) {
        return Err(WorkerError::UnknownMessageKind(body.kind).into());
    }

    let mut message = Message::new(body.kind, body.payload);
    if let Some(seconds) = body.delay_seconds.filter(|d| *d > 0) {
        if seconds > MAX_DELAY_SECONDS {
            return Err(WorkerError::InvalidDelay {
                seconds,
                max: MAX_DELAY_SECONDS,
            }
            .into());
        }
        message = message.with_delay(chrono::Duration::seconds(seconds as i64));
    }

    state.bus.dispatch(Some(&counter), &queue, &message).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueuedMessageDto {
            id: message.id,
            queue,
        }),
    ))
}
