//! HTTP integration: one request is one unit of work.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::server::fallback::{FallbackHook, FallbackScheduler};

/// Axum middleware marking the boundaries of a unit of work.
///
/// Puts a fresh [`MessageCounter`](super::MessageCounter) into the request extensions for the
/// enqueue path, runs the handler, then hands the counter to the scheduler. Depending on the
/// configured [`FallbackHook`] the decision runs before the response is returned or in a
/// background task once it has been.
pub async fn unit_of_work(
    State(scheduler): State<Arc<FallbackScheduler>>,
    mut request: Request,
    next: Next,
) -> Response {
    let counter = scheduler.begin_unit_of_work();
    request.extensions_mut().insert(counter.clone());

    let response = next.run(request).await;

    match scheduler.config().hook {
        FallbackHook::Response => {
            scheduler.on_unit_of_work_end(&counter).await;
        }
        FallbackHook::Terminate => {
            tokio::spawn(async move {
                scheduler.on_unit_of_work_end(&counter).await;
            });
        }
    }

    response
}
