//! Per-connection read/write loop.
//!
//! The socket is split in two: a writer task drains the connection's
//! outbound queue into the sink, while the reader loop feeds each text
//! frame to the [`Dispatcher`] in arrival order. When the reader stops
//! the channel is unbound and the writer is shut down.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::{ChannelId, OutboundFrame};
use crate::service::Dispatcher;

/// Runs a single WebSocket connection until the client goes away.
pub async fn run_connection(socket: WebSocket, dispatcher: Dispatcher) {
    let (ws_tx, mut ws_rx) = socket.split();
    let (channel, outbox) = dispatcher.connect().await;
    let writer = tokio::spawn(writer_task(channel, ws_tx, outbox));

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => dispatcher.handle_text(channel, text.as_str()).await,
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => dispatcher.handle_text(channel, text).await,
                Err(_) => tracing::debug!(%channel, "ignoring non-utf8 binary frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(%channel, error = %err, "ws read error");
                break;
            }
        }
    }

    dispatcher.disconnect(channel).await;
    writer.abort();
    tracing::debug!(%channel, "ws connection closed");
}

/// Forwards queued frames to the socket until either side closes.
async fn writer_task(
    channel: ChannelId,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<OutboundFrame>,
) {
    while let Some(frame) = outbox.recv().await {
        if ws_tx.send(Message::text(frame.to_json())).await.is_err() {
            tracing::debug!(%channel, "ws write failed, stopping writer");
            break;
        }
    }
    let _ = ws_tx.close().await;
}
