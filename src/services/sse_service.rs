use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::{
        session::SessionSnapshot,
        sse::{Handshake, ServerEvent},
    },
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the session event stream.
///
/// The handshake is built from the same locked read as the subscription so a
/// client never misses a transition between the two.
pub async fn subscribe(state: &SharedState) -> (broadcast::Receiver<ServerEvent>, ServerEvent) {
    let degraded = !state.questions().provider_available();
    state
        .read_session(|session| {
            let receiver = state.sse().subscribe();
            let handshake = Handshake {
                stream: "session".into(),
                message: "subscribed to session events".into(),
                degraded,
                session: SessionSnapshot::from(session),
            };
            let event = ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake)
                .unwrap_or_else(|err| {
                    warn!(error = %err, "failed to serialize SSE handshake");
                    ServerEvent {
                        event: Some(EVENT_HANDSHAKE.to_string()),
                        data: "{}".into(),
                    }
                });
            (receiver, event)
        })
        .await
}

/// Convert a broadcast receiver into an SSE response, sending `first` before
/// forwarding events until the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    first: ServerEvent,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(to_event(first))).await.is_err() {
            return;
        }
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Skip lagged messages but keep the stream alive.
                            debug!(skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }
        info!("SSE stream disconnected");
    });

    // when the client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}
