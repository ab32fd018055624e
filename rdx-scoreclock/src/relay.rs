//! Mirrors game clock state to a paired scoreboard.
//!
//! Only games flagged as mirrored use the relay. Every push is spawned and
//! forgotten; a failed push is logged and otherwise ignored.

use crate::config::RelayConfig;
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Fire-and-forget push of state to a paired scoreboard.
pub trait Relay: Send + Sync {
    /// Pushes the current game clock value.
    fn push_game_clock(&self, seconds: i32);

    /// Tells the paired scoreboard that a new game was loaded.
    fn push_new_game(&self);
}

/// A relay that goes nowhere, for unpaired scoreboards.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRelay;

impl Relay for NoRelay {
    fn push_game_clock(&self, _seconds: i32) {}

    fn push_new_game(&self) {}
}

/// POSTs values as plain text to the paired scoreboard's consumer endpoint.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRelay {
    pub const TIME_PATH: &'static str = "/time";
    pub const NEW_GAME_PATH: &'static str = "/game";

    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build relay HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Spawns the POST on the current runtime. Must be called from within a
    /// tokio runtime.
    fn post(&self, path: &'static str, value: i32) {
        let client = self.client.clone();
        let url = self.url_for(path);
        tokio::spawn(async move {
            let result = client
                .post(&url)
                .body(value.to_string())
                .send()
                .await
                .and_then(|response| response.error_for_status());
            match result {
                Ok(_) => debug!("Relayed {} to {}", value, url),
                Err(e) => warn!("Relay to {} failed: {}", url, e),
            }
        });
    }
}

impl Relay for HttpRelay {
    fn push_game_clock(&self, seconds: i32) {
        self.post(Self::TIME_PATH, seconds);
    }

    fn push_new_game(&self) {
        self.post(Self::NEW_GAME_PATH, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        let relay = HttpRelay::new(&RelayConfig {
            enabled: true,
            base_url: "http://10.0.1.82:8080/api/broadcast/consumer/".to_string(),
            timeout_ms: 100,
        })
        .unwrap();
        assert_eq!(
            relay.url_for(HttpRelay::TIME_PATH),
            "http://10.0.1.82:8080/api/broadcast/consumer/time"
        );
    }

    #[tokio::test]
    async fn unreachable_peer_is_swallowed() {
        let relay = HttpRelay::new(&RelayConfig {
            enabled: true,
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 100,
        })
        .unwrap();
        relay.push_game_clock(42);
        relay.push_new_game();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}
