//! Session-scoped key-value store: auth token, player id, and the cached
//! board / figure snapshots that survive a game-socket reconnect.

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::game::{Color, FigureInBoard};

const KEY_TOKEN: &str = "token";
const KEY_PLAYER_ID: &str = "id";
const KEY_BOARD: &str = "board";
const KEY_FIGURES: &str = "figures";

/// String-keyed store with JSON-encoded values, so that swapping the backing
/// map for a real persistence layer stays a local change.
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    values: HashMap<String, String>,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore::default()
    }

    pub fn set_auth_token(&mut self, token: &str) {
        self.values.insert(KEY_TOKEN.to_string(), token.to_string());
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.values.get(KEY_TOKEN).map(String::as_str)
    }

    pub fn set_player_id(&mut self, id: i64) {
        self.values.insert(KEY_PLAYER_ID.to_string(), id.to_string());
    }

    pub fn player_id(&self) -> Option<i64> {
        self.values.get(KEY_PLAYER_ID)?.parse().ok()
    }

    pub fn set_board(&mut self, board: &[Vec<Color>]) -> Result<()> {
        let json = serde_json::to_string(board).context("encoding board snapshot")?;
        self.values.insert(KEY_BOARD.to_string(), json);
        Ok(())
    }

    pub fn board(&self) -> Option<Vec<Vec<Color>>> {
        let json = self.values.get(KEY_BOARD)?;
        serde_json::from_str(json).ok()
    }

    pub fn set_figures(&mut self, figures: &[FigureInBoard]) -> Result<()> {
        let json = serde_json::to_string(figures).context("encoding figures snapshot")?;
        self.values.insert(KEY_FIGURES.to_string(), json);
        Ok(())
    }

    pub fn figures(&self) -> Vec<FigureInBoard> {
        self.values
            .get(KEY_FIGURES)
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
