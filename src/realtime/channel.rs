use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use super::frame::{
    self, Packet, SocketPacket, EVENT_GAME_UPDATE, EVENT_JOIN_GAME, EVENT_LEAVE_GAME,
};
use super::transport::{Connector, Transport};
use crate::domain::{Game, GameId};

const LOG_TARGET: &str = "seat_trap::realtime::channel";

/// Owned realtime subscription to one game's update stream.
///
/// Opening spawns a task that connects, announces `joinGame` once the server
/// confirms the connection and forwards every `gameUpdate` snapshot, in arrival
/// order, to the single receiver returned by [`SessionChannel::open`].
///
/// Whichever way the handle goes away ([`close`](Self::close) or drop), the task
/// announces `leaveGame` and then releases the connection.
pub struct SessionChannel {
    game_id: GameId,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionChannel {
    pub fn open(
        connector: Arc<dyn Connector>,
        game_id: impl Into<GameId>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Game>) {
        let game_id = game_id.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stop = CancellationToken::new();

        let span = tracing::info_span!("session_channel", game_id = %game_id);
        let task = tokio::spawn(
            run_channel(connector, game_id.clone(), tx, stop.clone()).instrument(span),
        );

        info!(target: LOG_TARGET, game_id = %game_id, "session channel opened");
        (
            Self {
                game_id,
                stop,
                task: Some(task),
            },
            rx,
        )
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Still connected or connecting.
    pub fn is_open(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Announce departure and release the connection; returns once both are done.
    pub async fn close(mut self) {
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(target: LOG_TARGET, game_id = %self.game_id, error = %err, "session channel task failed");
            }
        }
        info!(target: LOG_TARGET, game_id = %self.game_id, "session channel closed");
    }
}

impl Drop for SessionChannel {
    fn drop(&mut self) {
        // the task still runs its leave/teardown sequence after cancellation
        self.stop.cancel();
    }
}

impl std::fmt::Debug for SessionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionChannel")
            .field("game_id", &self.game_id)
            .field("open", &self.is_open())
            .finish()
    }
}

async fn run_channel(
    connector: Arc<dyn Connector>,
    game_id: GameId,
    tx: mpsc::Sender<Game>,
    stop: CancellationToken,
) {
    let connected = tokio::select! {
        _ = stop.cancelled() => {
            debug!(target: LOG_TARGET, "closed before connecting");
            return;
        }
        connected = connector.connect() => connected,
    };

    let mut transport = match connected {
        Ok(transport) => transport,
        Err(err) => {
            warn!(target: LOG_TARGET, error = %err, "failed to connect to realtime service");
            return;
        }
    };

    if let Err(err) = transport.send(frame::encode_connect()).await {
        warn!(target: LOG_TARGET, error = %err, "failed to request namespace connect");
    } else {
        pump(transport.as_mut(), &game_id, &tx, &stop).await;
    }

    teardown(transport.as_mut(), &game_id).await;
}

async fn pump(
    transport: &mut dyn Transport,
    game_id: &str,
    tx: &mpsc::Sender<Game>,
    stop: &CancellationToken,
) {
    let mut joined = false;

    loop {
        let incoming = tokio::select! {
            _ = stop.cancelled() => {
                debug!(target: LOG_TARGET, "close requested");
                return;
            }
            incoming = transport.recv() => incoming,
        };

        let text = match incoming {
            Some(Ok(text)) => text,
            Some(Err(err)) => {
                warn!(target: LOG_TARGET, error = %err, "realtime transport failed");
                return;
            }
            None => {
                debug!(target: LOG_TARGET, "realtime stream ended");
                return;
            }
        };

        let packet = match frame::decode(&text) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(target: LOG_TARGET, error = %err, "ignoring undecodable packet");
                continue;
            }
        };

        match packet {
            Packet::Open(handshake) => {
                debug!(target: LOG_TARGET, %handshake, "engine.io handshake received");
            }
            Packet::Ping(payload) => {
                if let Err(err) = transport.send(frame::encode_pong(&payload)).await {
                    warn!(target: LOG_TARGET, error = %err, "pong send failed");
                    return;
                }
            }
            Packet::Close => {
                debug!(target: LOG_TARGET, "engine.io close received");
                return;
            }
            Packet::Message(SocketPacket::Connect(_)) => {
                if joined {
                    continue;
                }
                let join = frame::encode_event(EVENT_JOIN_GAME, &[json!(game_id)]);
                if let Err(err) = transport.send(join).await {
                    warn!(target: LOG_TARGET, error = %err, "failed to send join");
                    return;
                }
                joined = true;
                info!(target: LOG_TARGET, %game_id, "joined game update stream");
            }
            Packet::Message(SocketPacket::Event { name, args }) => {
                if name != EVENT_GAME_UPDATE {
                    debug!(target: LOG_TARGET, event = %name, "ignoring realtime event");
                    continue;
                }
                let Some(game) = decode_snapshot(args) else {
                    continue;
                };
                // a full buffer must not hold up teardown
                tokio::select! {
                    _ = stop.cancelled() => {
                        debug!(target: LOG_TARGET, "close requested while delivering a push");
                        return;
                    }
                    sent = tx.send(game) => {
                        if sent.is_err() {
                            debug!(target: LOG_TARGET, "push receiver dropped");
                            return;
                        }
                    }
                }
            }
            Packet::Message(SocketPacket::ConnectError(reason)) => {
                warn!(target: LOG_TARGET, ?reason, "realtime connection rejected");
                return;
            }
            Packet::Message(SocketPacket::Disconnect) => {
                debug!(target: LOG_TARGET, "server disconnected the socket");
                return;
            }
            Packet::Pong(_) | Packet::Upgrade | Packet::Noop | Packet::Message(SocketPacket::Ack) => {}
        }
    }
}

fn decode_snapshot(args: Vec<Value>) -> Option<Game> {
    let Some(payload) = args.into_iter().next() else {
        warn!(target: LOG_TARGET, "gameUpdate without payload");
        return None;
    };
    match serde_json::from_value::<Game>(payload) {
        Ok(game) => Some(game),
        Err(err) => {
            warn!(target: LOG_TARGET, error = %err, "dropping undecodable game snapshot");
            None
        }
    }
}

async fn teardown(transport: &mut dyn Transport, game_id: &str) {
    let leave = frame::encode_event(EVENT_LEAVE_GAME, &[json!(game_id)]);
    if let Err(err) = transport.send(leave).await {
        debug!(target: LOG_TARGET, error = %err, "leave not delivered");
    }
    if let Err(err) = transport.send(frame::encode_disconnect()).await {
        debug!(target: LOG_TARGET, error = %err, "disconnect not delivered");
    }
    if let Err(err) = transport.close().await {
        debug!(target: LOG_TARGET, error = %err, "transport close failed");
    }
    info!(target: LOG_TARGET, %game_id, "left game update stream");
}
