//! REST client for the game server. Every mutating call authenticates with
//! the bearer token handed out by `create_player`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{FigureDiscardRequest, GameInfo, MovementRequest, PlayerCredentials};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status; `detail` is the
    /// explanation from its error body.
    #[error("server rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Response shape of the join/quit/start/turn/movement/figure calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub game: Option<GameInfo>,
}

pub struct ApiClient {
    base: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    /// `base` is the endpoint root, e.g. `http://localhost:8000`.
    pub fn new(base: &str) -> ApiClient {
        ApiClient {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            token: None,
        }
    }

    /// Installs the token of a stored session, so a client can resume
    /// without registering a new player.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    /// Registers a player and remembers the returned token for all
    /// subsequent calls.
    pub async fn create_player(&mut self, name: &str) -> Result<PlayerCredentials, ApiError> {
        let body = serde_json::json!({ "name": name });
        let creds: PlayerCredentials = self.post("/players", &body).await?;
        self.token = Some(creds.token.clone());
        Ok(creds)
    }

    pub async fn create_game(
        &self,
        name: &str,
        player_amount: u8,
    ) -> Result<GameInfo, ApiError> {
        let body = serde_json::json!({ "name": name, "player_amount": player_amount });
        self.post("/games/", &body).await
    }

    pub async fn list_games(&self) -> Result<Vec<GameInfo>, ApiError> {
        let req = self.http.get(format!("{}/games/", self.base));
        Self::handle(self.authed(req).send().await?).await
    }

    pub async fn join_game(&self, game_id: i64) -> Result<ActionResponse, ApiError> {
        self.put_empty(&format!("/games/{game_id}/join")).await
    }

    pub async fn quit_game(&self, game_id: i64) -> Result<ActionResponse, ApiError> {
        self.put_empty(&format!("/games/{game_id}/quit")).await
    }

    pub async fn start_game(&self, game_id: i64) -> Result<ActionResponse, ApiError> {
        self.put_empty(&format!("/games/{game_id}/start")).await
    }

    pub async fn finish_turn(&self, game_id: i64) -> Result<ActionResponse, ApiError> {
        self.put_empty(&format!("/games/{game_id}/finish-turn")).await
    }

    /// Submits one partial movement (two tiles plus the movement card).
    /// Rejection means the local optimistic swap must be undone.
    pub async fn add_movement(
        &self,
        game_id: i64,
        movement: &MovementRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.put(&format!("/games/{game_id}/movement/add"), movement)
            .await
    }

    /// Cancels the most recent partial movement of the current turn.
    pub async fn cancel_movement(&self, game_id: i64) -> Result<ActionResponse, ApiError> {
        self.put_empty(&format!("/games/{game_id}/movement/back"))
            .await
    }

    pub async fn discard_figure(
        &self,
        game_id: i64,
        figure: &FigureDiscardRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.put(&format!("/games/{game_id}/figure/discard"), figure)
            .await
    }

    pub async fn block_figure(
        &self,
        game_id: i64,
        figure: &FigureDiscardRequest,
    ) -> Result<ActionResponse, ApiError> {
        self.put(&format!("/games/{game_id}/figure/block"), figure)
            .await
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.http.post(format!("{}{}", self.base, path)).json(body);
        Self::handle(self.authed(req).send().await?).await
    }

    async fn put<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.http.put(format!("{}{}", self.base, path)).json(body);
        Self::handle(self.authed(req).send().await?).await
    }

    async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.http.put(format!("{}{}", self.base, path));
        Self::handle(self.authed(req).send().await?).await
    }

    async fn handle<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .json::<ErrorBody>()
                .await
                .map(|b| detail_text(b.detail))
                .unwrap_or_else(|_| status.to_string());
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(resp.json().await?)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// FastAPI error details are usually strings but can be structured
/// (validation errors); render either as one line.
fn detail_text(detail: serde_json::Value) -> String {
    match detail {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
