use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::error::ClientError;
use crate::types::{parse_games_ndjson, GameExport, UserProfile};

pub const DEFAULT_BASE_URL: &str = "https://lichess.org";

/// Options for the game export endpoint.
#[derive(Debug, Clone)]
pub struct GameQuery {
    pub max: usize,
    /// Include server-side evaluations (`analysis` array)
    pub evals: bool,
    pub opening: bool,
    /// Only games that have (or have not) been analysed by Lichess
    pub analysed: Option<bool>,
    pub rated: Option<bool>,
    /// Epoch milliseconds; only games played after this time
    pub since: Option<i64>,
}

impl Default for GameQuery {
    fn default() -> Self {
        Self {
            max: 30,
            evals: true,
            opening: true,
            analysed: None,
            rated: None,
            since: None,
        }
    }
}

impl GameQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("max", self.max.to_string()),
            ("moves", "true".to_string()),
            ("evals", self.evals.to_string()),
            ("opening", self.opening.to_string()),
            ("clocks", "false".to_string()),
            ("sort", "dateDesc".to_string()),
        ];
        if let Some(analysed) = self.analysed {
            params.push(("analysed", analysed.to_string()));
        }
        if let Some(rated) = self.rated {
            params.push(("rated", rated.to_string()));
        }
        if let Some(since_ms) = self.since {
            params.push(("since", since_ms.to_string()));
        }
        params
    }
}

/// Bearer-token client for the Lichess REST API. Requests are issued one at
/// a time with a fixed pause in front of each, as Lichess asks of API users.
pub struct LichessClient {
    client: Client,
    base_url: String,
    token: String,
    request_delay: Duration,
}

impl LichessClient {
    pub fn new(token: &str) -> Result<Self, ClientError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("lichess-mistakes/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            request_delay: Duration::from_secs(1),
        })
    }

    /// Override the pause before each request.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    async fn send(&self, request: RequestBuilder, username: &str) -> Result<Response, ClientError> {
        // Rate limit
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let resp = self.authorized(request).send().await?;
        let url = resp.url().to_string();
        debug!(%url, status = resp.status().as_u16(), "Lichess response");

        match resp.status() {
            s if s.is_success() => Ok(resp),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ClientError::UserNotFound(username.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited),
            s => Err(ClientError::Status {
                status: s.as_u16(),
                url,
            }),
        }
    }

    /// Fetch a user's public profile.
    pub async fn fetch_user(&self, username: &str) -> Result<UserProfile, ClientError> {
        let url = format!("{}/api/user/{}", self.base_url, username);
        let resp = self.send(self.client.get(&url), username).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(format!("user profile: {e}")))
    }

    /// Fetch a user's most recent games, newest first. Lines of the export
    /// that cannot be decoded come back in [`GameExport::rejected`].
    pub async fn fetch_user_games(
        &self,
        username: &str,
        query: &GameQuery,
    ) -> Result<GameExport, ClientError> {
        let url = format!("{}/api/games/user/{}", self.base_url, username);
        let request = self
            .client
            .get(&url)
            .query(&query.params())
            .header("Accept", "application/x-ndjson");

        let resp = self.send(request, username).await?;
        let text = resp.text().await?;
        let export = parse_games_ndjson(&text);
        debug!(
            username,
            count = export.games.len(),
            rejected = export.rejected.len(),
            "Fetched games"
        );
        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = GameQuery {
            analysed: Some(true),
            since: Some(1_700_000_000_000),
            ..Default::default()
        };
        let params = query.params();
        assert!(params.contains(&("max", "30".to_string())));
        assert!(params.contains(&("evals", "true".to_string())));
        assert!(params.contains(&("analysed", "true".to_string())));
        assert!(params.contains(&("since", "1700000000000".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "rated"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = LichessClient::with_base_url("tok", "http://localhost:9000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
