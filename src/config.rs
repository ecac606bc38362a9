use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::engine::DEFAULT_TRAP_CUE_DURATION;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const SOCKET_IO_PATH: &str = "/socket.io/";
pub const SOCKET_IO_QUERY: &str = "EIO=4&transport=websocket";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub realtime_url: Url,
    pub request_timeout: Duration,
    pub handshake_timeout: Duration,
    pub push_capacity: usize,
    pub trap_cue_duration: Duration,
}

impl ClientConfig {
    pub fn new(api_url: Url) -> Result<Self> {
        let realtime_url = derive_realtime_url(&api_url)?;
        Ok(Self {
            api_url,
            realtime_url,
            request_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(10),
            push_capacity: 64,
            trap_cue_duration: DEFAULT_TRAP_CUE_DURATION,
        })
    }

    pub fn parse(api_url: &str) -> Result<Self> {
        let url = Url::parse(api_url).with_context(|| format!("invalid game service url {api_url}"))?;
        Self::new(url)
    }

    #[must_use]
    pub fn with_realtime_url(mut self, realtime_url: Url) -> Self {
        self.realtime_url = realtime_url;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_push_capacity(mut self, capacity: usize) -> Self {
        self.push_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_trap_cue_duration(mut self, duration: Duration) -> Self {
        self.trap_cue_duration = duration;
        self
    }
}

/// Map the service's HTTP base onto its Socket.IO websocket endpoint.
pub fn derive_realtime_url(api_url: &Url) -> Result<Url> {
    let mut base = api_url.clone();
    let target_scheme = match base.scheme() {
        "https" => "wss".to_string(),
        "http" => "ws".to_string(),
        other => other.to_string(),
    };
    base.set_path(SOCKET_IO_PATH);
    base.set_query(Some(SOCKET_IO_QUERY));
    base.set_fragment(None);
    base.set_scheme(target_scheme.as_str())
        .map_err(|_| anyhow!("failed to convert game service url scheme for {api_url}"))?;
    Ok(base)
}
