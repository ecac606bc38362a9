//! One mounted game: realtime channel, state store, derivations and moves.
//!
//! [`GameSession`] is the only place snapshots are applied. Every applied
//! snapshot, whether pulled or pushed, goes through the store's replace and
//! then through the trap detector, and the caller gets a [`SessionUpdate`]
//! carrying the fresh classification.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::api::{HttpGameApi, RequestError, SharedGameApi};
use crate::config::ClientConfig;
use crate::dispatch::{ActionDispatcher, DispatchError};
use crate::domain::{Game, GameId, PlayerId, SeatNumber};
use crate::engine::{
    classify, scoreboard, seat_layout, LegalAction, Scoreboard, SeatPosition, TrapCue,
    TrapEdgeDetector, TurnView,
};
use crate::realtime::{Connector, SessionChannel, WebSocketConnector};
use crate::store::{Shared, StateStore};

const LOG_TARGET: &str = "seat_trap::session";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateSource {
    Fetch,
    Push,
}

/// Result of applying one snapshot.
#[derive(Clone, Debug)]
pub struct SessionUpdate {
    pub game: Shared<Game>,
    pub turn: TurnView,
    /// Set only on the snapshot where the local player's reset flag rose.
    pub trap_sprung: bool,
    pub source: UpdateSource,
}

pub struct GameSession {
    game_id: GameId,
    player_id: PlayerId,
    api: SharedGameApi,
    channel: Option<SessionChannel>,
    pushes: mpsc::Receiver<Game>,
    store: StateStore,
    detector: TrapEdgeDetector,
    cue: TrapCue,
    dispatcher: ActionDispatcher,
    last_error: Option<RequestError>,
}

impl GameSession {
    /// Start listening for `game_id` on behalf of `player_id`.
    ///
    /// The channel connects in the background; call [`initialize`](Self::initialize)
    /// for the first snapshot and [`next_update`](Self::next_update) for pushes.
    pub fn open(
        api: SharedGameApi,
        connector: Arc<dyn Connector>,
        game_id: impl Into<GameId>,
        player_id: impl Into<PlayerId>,
        push_capacity: usize,
        trap_cue_duration: Duration,
    ) -> Self {
        let game_id = game_id.into();
        let player_id = player_id.into();
        let (channel, pushes) = SessionChannel::open(connector, game_id.clone(), push_capacity);
        let dispatcher = ActionDispatcher::new(Arc::clone(&api), game_id.clone(), player_id.clone());

        info!(target: LOG_TARGET, %game_id, %player_id, "game session opened");
        Self {
            game_id,
            player_id,
            api,
            channel: Some(channel),
            pushes,
            store: StateStore::new(),
            detector: TrapEdgeDetector::new(),
            cue: TrapCue::new(trap_cue_duration),
            dispatcher,
            last_error: None,
        }
    }

    /// Open a session against the HTTP and websocket endpoints in `cfg`.
    pub fn connect(
        cfg: &ClientConfig,
        game_id: impl Into<GameId>,
        player_id: impl Into<PlayerId>,
    ) -> Result<Self> {
        let api: SharedGameApi = Arc::new(HttpGameApi::from_config(cfg)?);
        let connector = Arc::new(WebSocketConnector::new(
            cfg.realtime_url.clone(),
            cfg.handshake_timeout,
        ));
        Ok(Self::open(
            api,
            connector,
            game_id,
            player_id,
            cfg.push_capacity,
            cfg.trap_cue_duration,
        ))
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Initial pull. On failure the store keeps whatever it held.
    pub async fn initialize(&mut self) -> Result<SessionUpdate, RequestError> {
        match self.store.initialize(self.api.as_ref(), &self.game_id).await {
            Ok(game) => {
                self.last_error = None;
                let update = self.derive(game, UpdateSource::Fetch);
                info!(
                    target: LOG_TARGET,
                    game_id = %self.game_id,
                    status = ?update.game.status,
                    "game session initialized"
                );
                Ok(update)
            }
            Err(err) => {
                warn!(target: LOG_TARGET, game_id = %self.game_id, error = %err, "initial fetch failed");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Wait for the next pushed snapshot and apply it.
    ///
    /// Returns `None` once the channel is gone for good. Cancel safe: dropping
    /// the future before it resolves loses nothing.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let game = self.pushes.recv().await?;
        let game = self.store.replace(game);
        Some(self.derive(game, UpdateSource::Push))
    }

    fn derive(&mut self, game: Shared<Game>, source: UpdateSource) -> SessionUpdate {
        let trap_sprung = self.detector.observe(&game, &self.player_id);
        if trap_sprung {
            self.cue.trigger(Instant::now());
            info!(target: LOG_TARGET, game_id = %self.game_id, "trap sprung on local player");
        }
        let turn = classify(&game, &self.player_id);
        SessionUpdate {
            game,
            turn,
            trap_sprung,
            source,
        }
    }

    pub fn game(&self) -> Option<Shared<Game>> {
        self.store.current()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Shared<Game>>> {
        self.store.subscribe()
    }

    pub fn turn_view(&self) -> Option<TurnView> {
        self.store
            .current()
            .map(|game| classify(&game, &self.player_id))
    }

    pub fn scoreboard(&self) -> Option<Scoreboard> {
        self.store
            .current()
            .map(|game| scoreboard(&game, &self.player_id))
    }

    /// Empty until the first snapshot arrives.
    pub fn layout(&self, radius: f64) -> Vec<SeatPosition> {
        self.store
            .current()
            .map(|game| seat_layout(&game.available_seats, radius))
            .unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<&RequestError> {
        self.last_error.as_ref()
    }

    pub fn trap_cue_active(&self) -> bool {
        self.cue.is_active(Instant::now())
    }

    pub fn trap_cue_remaining(&self) -> Option<Duration> {
        self.cue.remaining(Instant::now())
    }

    /// Realtime channel still connected or connecting.
    pub fn is_connected(&self) -> bool {
        self.channel.as_ref().is_some_and(SessionChannel::is_open)
    }

    pub async fn place_trap(&mut self, seat: SeatNumber) -> Result<(), DispatchError> {
        let game = self.require_game(LegalAction::PlaceTrap)?;
        let result = self.dispatcher.place_trap(&game, seat).await;
        self.record(result)
    }

    pub async fn select_seat(&mut self, seat: SeatNumber) -> Result<(), DispatchError> {
        let game = self.require_game(LegalAction::SelectSeat)?;
        let result = self.dispatcher.select_seat(&game, seat).await;
        self.record(result)
    }

    fn require_game(&self, attempted: LegalAction) -> Result<Shared<Game>, DispatchError> {
        self.store.current().ok_or(DispatchError::IllegalAction {
            attempted,
            legal: LegalAction::None,
        })
    }

    // suppressed actions leave the error slot alone; only sent requests settle it
    fn record(&mut self, result: Result<(), DispatchError>) -> Result<(), DispatchError> {
        match &result {
            Ok(()) => self.last_error = None,
            Err(DispatchError::RequestFailed(err)) => self.last_error = Some(err.clone()),
            Err(_) => {}
        }
        result
    }

    /// Leave the game and release the connection before returning.
    pub async fn close(mut self) {
        // unblock a channel task waiting on buffer space
        self.pushes.close();
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        info!(target: LOG_TARGET, game_id = %self.game_id, "game session closed");
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("game_id", &self.game_id)
            .field("player_id", &self.player_id)
            .field("revision", &self.store.revision())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
