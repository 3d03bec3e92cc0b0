//! Server-Sent Events stream of prediction activity.
//!
//! Dashboards subscribe once and receive every scored prediction,
//! batch completion, and system notification, tagged with a named SSE
//! event type so clients can `addEventListener` per kind.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_core::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::{AppEvent, SharedState};

/// GET /api/events
pub async fn sse_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    // A subscriber that falls behind the broadcast buffer yields a
    // lag error item; skip it and keep streaming the live events.
    let stream = BroadcastStream::new(rx).filter_map(|item| {
        let event = item.ok()?;
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event(event_kind(&event)).data(data)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    )
}

fn event_kind(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::PredictionScored { .. } => "prediction",
        AppEvent::BatchCompleted { .. } => "batch",
        AppEvent::Notification { .. } => "notification",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kinds_are_stable() {
        // client-side listeners key on these names
        assert_eq!(
            event_kind(&AppEvent::PredictionScored {
                patient_id: "p1".into(),
                risk_level: "HIGH".into(),
                probability: 0.71,
            }),
            "prediction"
        );
        assert_eq!(
            event_kind(&AppEvent::BatchCompleted { total: 3, failed: 1 }),
            "batch"
        );
        assert_eq!(
            event_kind(&AppEvent::Notification {
                level: "info".into(),
                message: "model reloaded".into(),
            }),
            "notification"
        );
    }
}
