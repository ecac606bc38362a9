//! Engine.IO v4 / Socket.IO v5 text framing.
//!
//! Only the subset the game service uses is understood: the default namespace,
//! text events and the ping/pong keepalive. Binary attachments are rejected.

use serde_json::Value;

pub const EVENT_JOIN_GAME: &str = "joinGame";
pub const EVENT_LEAVE_GAME: &str = "leaveGame";
pub const EVENT_GAME_UPDATE: &str = "gameUpdate";

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Server handshake (`0{sid, pingInterval, ...}`).
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, args: Vec<Value> },
    Ack,
    ConnectError(Option<Value>),
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("empty packet")]
    Empty,
    #[error("unknown engine.io packet type `{0}`")]
    UnknownPacketType(char),
    #[error("unsupported socket.io packet type `{0}`")]
    UnsupportedSocketType(char),
    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("event packet without a name")]
    MissingEventName,
}

pub fn decode(text: &str) -> Result<Packet, FrameError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let body = chars.as_str();

    match kind {
        '0' => serde_json::from_str(body)
            .map(Packet::Open)
            .map_err(|source| FrameError::Payload {
                kind: "open",
                source,
            }),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping(body.to_string())),
        '3' => Ok(Packet::Pong(body.to_string())),
        '4' => decode_socket(body).map(Packet::Message),
        '5' => Ok(Packet::Upgrade),
        '6' => Ok(Packet::Noop),
        other => Err(FrameError::UnknownPacketType(other)),
    }
}

fn decode_socket(body: &str) -> Result<SocketPacket, FrameError> {
    let mut chars = body.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let mut rest = chars.as_str();

    // `/namespace,` prefix; only the default namespace is joined
    if rest.starts_with('/') {
        rest = rest.split_once(',').map(|(_, tail)| tail).unwrap_or("");
    }
    // ack id
    let data_start = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let data = &rest[data_start..];

    match kind {
        '0' => optional_json(data, "connect").map(SocketPacket::Connect),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let mut args: Vec<Value> =
                serde_json::from_str(data).map_err(|source| FrameError::Payload {
                    kind: "event",
                    source,
                })?;
            if args.is_empty() {
                return Err(FrameError::MissingEventName);
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                _ => return Err(FrameError::MissingEventName),
            };
            Ok(SocketPacket::Event { name, args })
        }
        '3' => Ok(SocketPacket::Ack),
        '4' => optional_json(data, "connect error").map(SocketPacket::ConnectError),
        other => Err(FrameError::UnsupportedSocketType(other)),
    }
}

fn optional_json(data: &str, kind: &'static str) -> Result<Option<Value>, FrameError> {
    if data.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(data)
        .map(Some)
        .map_err(|source| FrameError::Payload { kind, source })
}

pub fn encode_connect() -> String {
    "40".to_string()
}

pub fn encode_disconnect() -> String {
    "41".to_string()
}

pub fn encode_pong(payload: &str) -> String {
    format!("3{payload}")
}

pub fn encode_event(name: &str, args: &[Value]) -> String {
    let mut frame = Vec::with_capacity(args.len() + 1);
    frame.push(Value::String(name.to_string()));
    frame.extend(args.iter().cloned());
    format!("42{}", Value::Array(frame))
}
