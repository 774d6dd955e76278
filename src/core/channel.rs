//! Transport channel: the one persistent WebSocket to the device.
//!
//! A single spawned task owns the connection for the whole process life.
//! On any loss it retries after a fixed delay, forever — no backoff growth,
//! no retry cap, no explicit cancellation beyond process shutdown. The UI
//! only ever sees lifecycle events and decoded inbound messages, in arrival
//! order, on the same event channel as everything else.
//!
//! Send policy while disconnected: **silent drop**. Anything queued while
//! the socket is down is discarded before the next connect, never replayed —
//! a stale `menuClick` fired into a device that just rebooted is worse than
//! a lost one.

use crate::core::config::RECONNECT_DELAY;
use crate::core::protocol::{ClientMessage, ServerMessage};
use crate::core::session::AppEvent;
use crate::utils::sos::SignalOfStop;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle, mirrored into the UI status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closed,
}

impl LinkState {
    pub fn label(&self) -> &'static str {
        match self {
            LinkState::Connecting => "connecting",
            LinkState::Open => "online",
            LinkState::Closed => "offline",
        }
    }
}

/// What the channel task reports to the UI loop.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Connecting,
    Opened,
    Closed,
    Inbound(ServerMessage),
}

/// Cheap cloneable handle for sending on the channel.
#[derive(Clone)]
pub struct Channel {
    outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl Channel {
    /// Queue a message for the socket. Dropped silently if the channel task
    /// is gone or the socket is down by the time it would be written.
    pub fn send(&self, msg: ClientMessage) {
        if self.outbound.send(msg).is_err() {
            debug!("channel task gone, outbound message dropped");
        }
    }
}

/// Spawn the channel task and return its send handle.
pub fn spawn(url: String, events: mpsc::UnboundedSender<AppEvent>, sos: SignalOfStop) -> Channel {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_loop(url, rx, events, sos));
    Channel { outbound: tx }
}

async fn run_loop(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
    events: mpsc::UnboundedSender<AppEvent>,
    sos: SignalOfStop,
) {
    loop {
        if sos.cancelled() {
            return;
        }

        let dropped = drop_pending(&mut outbound);
        if dropped > 0 {
            debug!(dropped, "discarded outbound messages queued while disconnected");
        }

        let _ = events.send(AppEvent::Link(ChannelEvent::Connecting));
        match connect_async(url.as_str()).await {
            Ok((ws, _)) => {
                info!(%url, "display channel open");
                let _ = events.send(AppEvent::Link(ChannelEvent::Opened));
                drive(ws, &mut outbound, &events, &sos).await;
                let _ = events.send(AppEvent::Link(ChannelEvent::Closed));
                if sos.cancelled() {
                    return;
                }
                info!("display channel lost, retrying");
            }
            Err(err) => {
                debug!(%err, "connect failed, retrying");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            _ = sos.wait() => return,
        }
    }
}

/// Pump one live socket until it dies or shutdown is signalled.
async fn drive(
    ws: WsStream,
    outbound: &mut mpsc::UnboundedReceiver<ClientMessage>,
    events: &mpsc::UnboundedSender<AppEvent>,
    sos: &SignalOfStop,
) {
    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            queued = outbound.recv() => {
                let Some(msg) = queued else { return };
                match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if sink.send(WsMessage::Text(json)).await.is_err() {
                            return;
                        }
                    }
                    Err(err) => warn!(%err, "unserializable outbound message dropped"),
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => {
                                let _ = events.send(AppEvent::Link(ChannelEvent::Inbound(msg)));
                            }
                            Err(err) => warn!(%err, "undecodable inbound message skipped"),
                        }
                    }
                    // Pings are answered by the library on the next write;
                    // binary frames are not part of this protocol.
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(%err, "socket error");
                        return;
                    }
                    None => return,
                }
            }
            _ = sos.wait() => {
                let _ = sink.close().await;
                return;
            }
        }
    }
}

/// Drain and discard everything queued on the outbound side.
fn drop_pending(outbound: &mut mpsc::UnboundedReceiver<ClientMessage>) -> usize {
    let mut dropped = 0;
    while outbound.try_recv().is_ok() {
        dropped += 1;
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_pending_discards_everything_queued() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        for i in 0..3 {
            tx.send(ClientMessage::InputChange {
                placeholder: "x".to_string(),
                value: i.to_string(),
            })
            .unwrap();
        }
        assert_eq!(drop_pending(&mut rx), 3);
        assert_eq!(drop_pending(&mut rx), 0);
    }

    #[test]
    fn link_state_labels() {
        assert_eq!(LinkState::Connecting.label(), "connecting");
        assert_eq!(LinkState::Open.label(), "online");
        assert_eq!(LinkState::Closed.label(), "offline");
    }
}
