//! Common test utilities: snapshot builders and in-memory stand-ins for the
//! game service's HTTP and realtime surfaces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use crate::api::{
    CreateGameRequest, GameApi, JoinGameRequest, Operation, RequestError, SeatRequest,
};
use crate::domain::{default_seats, Game, GameScore, GameStatus, SeatNumber, Trap, User};
use crate::realtime::frame::{self, EVENT_GAME_UPDATE};
use crate::realtime::transport::{Connector, Transport, TransportError};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Builds complete snapshots; both players start with an empty score line.
pub struct GameBuilder {
    game: Game,
}

impl GameBuilder {
    pub fn new(id: &str, player1: &str, player2: &str) -> Self {
        let user = |id: &str| User {
            id: id.to_string(),
            name: format!("{id}-name"),
        };
        let line = |id: &str| GameScore {
            id: format!("score-{id}"),
            player_id: id.to_string(),
            score: 0,
            failures: 0,
            is_resetted: false,
        };
        Self {
            game: Game {
                id: id.to_string(),
                player1: user(player1),
                player2: user(player2),
                status: GameStatus::InProgress,
                current_turn: player1.to_string(),
                available_seats: default_seats(),
                winner: None,
                scores: vec![line(player1), line(player2)],
                trap: None,
            },
        }
    }

    pub fn status(mut self, status: GameStatus) -> Self {
        self.game.status = status;
        self
    }

    pub fn turn(mut self, player: &str) -> Self {
        self.game.current_turn = player.to_string();
        self
    }

    pub fn seats(mut self, seats: &[SeatNumber]) -> Self {
        self.game.available_seats = seats.to_vec();
        self
    }

    pub fn winner(mut self, winner: User) -> Self {
        self.game.winner = Some(winner);
        self
    }

    pub fn trap(mut self, seat_number: SeatNumber) -> Self {
        self.game.trap = Some(Trap { seat_number });
        self
    }

    pub fn score(mut self, player: &str, score: i64, failures: u32) -> Self {
        if let Some(line) = self.line_mut(player) {
            line.score = score;
            line.failures = failures;
        }
        self
    }

    pub fn reset(mut self, player: &str, is_resetted: bool) -> Self {
        if let Some(line) = self.line_mut(player) {
            line.is_resetted = is_resetted;
        }
        self
    }

    pub fn without_scores(mut self) -> Self {
        self.game.scores.clear();
        self
    }

    pub fn build(self) -> Game {
        self.game
    }

    fn line_mut(&mut self, player: &str) -> Option<&mut GameScore> {
        self.game.scores.iter_mut().find(|s| s.player_id == player)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Create(CreateGameRequest),
    Join(String, JoinGameRequest),
    Fetch(String),
    PlaceTrap(String, SeatRequest),
    SelectSeat(String, SeatRequest),
}

/// Scripted [`GameApi`]. Every call is recorded, failing ones included.
#[derive(Default)]
pub struct MockGameApi {
    games: Mutex<HashMap<String, Game>>,
    failures: Mutex<HashMap<Operation, RequestError>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl MockGameApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(self, game: Game) -> Self {
        self.set_game(game);
        self
    }

    pub fn set_game(&self, game: Game) {
        self.games.lock().unwrap().insert(game.id.clone(), game);
    }

    /// Make every call of `operation` fail with a transport error until [`Self::recover`].
    pub fn fail(&self, operation: Operation) {
        self.failures.lock().unwrap().insert(
            operation,
            RequestError::transport(operation, "connection reset by peer"),
        );
    }

    pub fn recover(&self, operation: Operation) {
        self.failures.lock().unwrap().remove(&operation);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall, operation: Operation) -> Result<(), RequestError> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(&operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn lookup(&self, operation: Operation, game_id: &str) -> Result<Game, RequestError> {
        self.games
            .lock()
            .unwrap()
            .get(game_id)
            .cloned()
            .ok_or_else(|| RequestError::Status {
                operation,
                status: reqwest::StatusCode::NOT_FOUND,
                body: format!("game {game_id} not found"),
            })
    }
}

#[async_trait::async_trait]
impl GameApi for MockGameApi {
    async fn create_game(&self, request: CreateGameRequest) -> Result<Game, RequestError> {
        self.record(ApiCall::Create(request.clone()), Operation::CreateGame)?;
        let game = GameBuilder::new("created", &request.player1_id, "cpu")
            .status(GameStatus::Waiting)
            .seats(&request.available_seats)
            .build();
        self.set_game(game.clone());
        Ok(game)
    }

    async fn join_game(&self, game_id: &str, request: JoinGameRequest) -> Result<(), RequestError> {
        self.record(ApiCall::Join(game_id.to_string(), request), Operation::JoinGame)
    }

    async fn fetch_game(&self, game_id: &str) -> Result<Game, RequestError> {
        self.record(ApiCall::Fetch(game_id.to_string()), Operation::FetchGame)?;
        self.lookup(Operation::FetchGame, game_id)
    }

    async fn place_trap(&self, game_id: &str, request: SeatRequest) -> Result<(), RequestError> {
        self.record(
            ApiCall::PlaceTrap(game_id.to_string(), request),
            Operation::PlaceTrap,
        )
    }

    async fn select_seat(&self, game_id: &str, request: SeatRequest) -> Result<(), RequestError> {
        self.record(
            ApiCall::SelectSeat(game_id.to_string(), request),
            Operation::SelectSeat,
        )
    }
}

/// Server side of an in-memory realtime link.
pub struct MockServer {
    to_client: mpsc::UnboundedSender<Option<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl MockServer {
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.to_client.send(Some(text.into()));
    }

    /// Engine.IO open followed by the Socket.IO connect acknowledgement.
    pub fn handshake(&self) {
        self.push(r#"0{"sid":"mock","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#);
        self.push(r#"40{"sid":"mock-socket"}"#);
    }

    pub fn push_game(&self, game: &Game) {
        self.push(frame::encode_event(EVENT_GAME_UPDATE, &[json!(game)]));
    }

    /// Close the link from the server side.
    pub fn hang_up(&self) {
        let _ = self.to_client.send(None);
    }

    pub async fn next_sent(&mut self) -> Option<String> {
        tokio::time::timeout(RECV_TIMEOUT, self.from_client.recv())
            .await
            .ok()
            .flatten()
    }

    /// Everything the client sends until it drops its end of the link.
    pub async fn drain_sent(&mut self) -> Vec<String> {
        let mut sent = Vec::new();
        while let Some(text) = self.next_sent().await {
            sent.push(text);
        }
        sent
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockTransport {
    inbound: mpsc::UnboundedReceiver<Option<String>>,
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Io("transport closed".into()));
        }
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Io("server gone".into()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        match self.inbound.recv().await {
            Some(Some(text)) => Some(Ok(text)),
            Some(None) | None => None,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

enum ConnectBehavior {
    Ready(Mutex<Option<MockTransport>>),
    Refuse,
    Hang,
}

pub struct MockConnector {
    behavior: ConnectBehavior,
}

impl MockConnector {
    pub fn linked() -> (Arc<Self>, MockServer) {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let transport = MockTransport {
            inbound,
            outbound,
            closed: Arc::clone(&closed),
        };
        let connector = Self {
            behavior: ConnectBehavior::Ready(Mutex::new(Some(transport))),
        };
        let server = MockServer {
            to_client,
            from_client,
            closed,
        };
        (Arc::new(connector), server)
    }

    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            behavior: ConnectBehavior::Refuse,
        })
    }

    /// Never finishes connecting.
    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            behavior: ConnectBehavior::Hang,
        })
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        match &self.behavior {
            ConnectBehavior::Ready(slot) => {
                let transport = slot.lock().unwrap().take();
                match transport {
                    Some(transport) => Ok(Box::new(transport)),
                    None => Err(TransportError::Connect {
                        url: "mock://".into(),
                        reason: "mock transport already used".into(),
                    }),
                }
            }
            ConnectBehavior::Refuse => Err(TransportError::Connect {
                url: "mock://".into(),
                reason: "connection refused".into(),
            }),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }
}
