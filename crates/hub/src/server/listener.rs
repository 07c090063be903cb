//! Listener — accept loop and per-connection frame handling.
//!
//! Each connection gets a reader loop and a writer task over newline
//! delimited JSON frames. Malformed frames (bad JSON, missing or unknown
//! `type`) are discarded silently; they are never echoed to the sender and
//! never injected into the event stream.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info};
use wire::ClientMessage;

use crate::state::SharedState;

/// Accept connections until the listener task is dropped.
pub async fn run(listener: TcpListener, state: SharedState) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let state = Arc::clone(&state);
                tokio::spawn(handle_connection(stream, peer, state));
            }
            Err(e) => {
                error!("TCP accept error: {}", e);
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: SharedState) {
    let framed = Framed::new(stream, LinesCodec::new());
    let (mut sink, mut frames) = framed.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let session = state.sessions.register(out_tx);
    info!(session_id = session.id, peer = %peer, "probe connected");

    // Writer task: drains the session's outbound channel (config
    // broadcasts) into the socket.
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(frame).await.is_err() {
                return;
            }
        }
    });

    while let Some(result) = frames.next().await {
        match result {
            Ok(line) => match serde_json::from_str::<ClientMessage>(&line) {
                Ok(msg) => state.handle_message(&session, msg),
                Err(e) => {
                    debug!(session_id = session.id, "discarding malformed frame: {}", e);
                }
            },
            Err(e) => {
                debug!(session_id = session.id, "socket error: {}", e);
                break;
            }
        }
    }

    // The session is gone; its stored events are retained.
    state.sessions.remove(session.id);
    writer.abort();
    info!(session_id = session.id, "probe disconnected");
}
