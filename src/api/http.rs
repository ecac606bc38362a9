use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{RequestBuilder, Response};
use tracing::{debug, warn};
use url::Url;

use super::{CreateGameRequest, GameApi, JoinGameRequest, Operation, RequestError, SeatRequest};
use crate::config::ClientConfig;
use crate::domain::Game;

const LOG_TARGET: &str = "seat_trap::api::http";

/// `reqwest` client for the game service's JSON endpoints.
#[derive(Clone, Debug)]
pub struct HttpGameApi {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpGameApi {
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("game service url {base_url} cannot be used as a base"));
        }
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client for game service")?;
        Ok(Self { base_url, http })
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self> {
        Self::new(cfg.api_url.clone(), cfg.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, operation: Operation, segments: &[&str]) -> Result<Url, RequestError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RequestError::InvalidEndpoint {
                operation,
                reason: format!("{} cannot be a base", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, operation: Operation, request: RequestBuilder) -> Result<Response, RequestError> {
        let res = request
            .send()
            .await
            .map_err(|err| RequestError::transport(operation, err))?;
        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|_| "<unavailable body>".to_string());
            warn!(target: LOG_TARGET, %operation, %status, %body, "game service rejected request");
            return Err(RequestError::Status {
                operation,
                status,
                body,
            });
        }
        debug!(target: LOG_TARGET, %operation, %status, "game service request succeeded");
        Ok(res)
    }

    async fn decode_game(operation: Operation, res: Response) -> Result<Game, RequestError> {
        let bytes = res
            .bytes()
            .await
            .map_err(|err| RequestError::transport(operation, err))?;
        serde_json::from_slice(&bytes).map_err(|err| RequestError::Decode {
            operation,
            reason: err.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl GameApi for HttpGameApi {
    async fn create_game(&self, request: CreateGameRequest) -> Result<Game, RequestError> {
        let operation = Operation::CreateGame;
        let url = self.endpoint(operation, &["games"])?;
        let res = self.send(operation, self.http.post(url).json(&request)).await?;
        Self::decode_game(operation, res).await
    }

    async fn join_game(&self, game_id: &str, request: JoinGameRequest) -> Result<(), RequestError> {
        let operation = Operation::JoinGame;
        let url = self.endpoint(operation, &["games", game_id, "join"])?;
        self.send(operation, self.http.post(url).json(&request)).await?;
        Ok(())
    }

    async fn fetch_game(&self, game_id: &str) -> Result<Game, RequestError> {
        let operation = Operation::FetchGame;
        let url = self.endpoint(operation, &["games", game_id])?;
        let res = self.send(operation, self.http.get(url)).await?;
        Self::decode_game(operation, res).await
    }

    async fn place_trap(&self, game_id: &str, request: SeatRequest) -> Result<(), RequestError> {
        let operation = Operation::PlaceTrap;
        let url = self.endpoint(operation, &["games", game_id, "trap"])?;
        self.send(operation, self.http.post(url).json(&request)).await?;
        Ok(())
    }

    async fn select_seat(&self, game_id: &str, request: SeatRequest) -> Result<(), RequestError> {
        let operation = Operation::SelectSeat;
        let url = self.endpoint(operation, &["games", game_id, "select"])?;
        self.send(operation, self.http.post(url).json(&request)).await?;
        Ok(())
    }
}
