pub mod api;
pub mod game;
pub mod game_manager;
pub mod lobby;
pub mod name;
pub mod storage;

use serde::{Deserialize, Serialize};

use crate::game::{Color, Coord, FigureInBoard, FigureType, MovementType};

/// Lifecycle of a game as the server reports it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum GameStatus {
    #[serde(rename = "waiting")]
    Waiting,
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "in game")]
    InGame,
    #[serde(rename = "finished")]
    Finished,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MovementCard {
    pub movement_type: MovementType,
    pub associated_player: i64,
    pub in_hand: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FigureCard {
    #[serde(rename = "type")]
    pub kind: game::FigureKind,
    pub associated_player: i64,
    pub blocked: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PlayerInGame {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub movement_cards: Vec<MovementCard>,
    #[serde(default)]
    pub figure_cards: Vec<FigureCard>,
    #[serde(default)]
    pub blocked: bool,
}

/// One game as the lobby and game sockets describe it. `player_turn` indexes
/// into `players`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: i64,
    pub name: String,
    pub player_amount: u8,
    pub status: GameStatus,
    pub host_id: i64,
    pub player_turn: usize,
    #[serde(default)]
    pub players: Vec<PlayerInGame>,
    pub forbidden_color: Color,
}

impl GameInfo {
    /// The player whose turn it currently is, if the index is in range.
    pub fn current_player(&self) -> Option<&PlayerInGame> {
        self.players.get(self.player_turn)
    }
}

/// Response to creating a player: identity plus the bearer token every other
/// call authenticates with.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PlayerCredentials {
    pub id: i64,
    pub name: String,
    pub token: String,
    #[serde(default)]
    pub game_id: Option<i64>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub color_distribution: Vec<Vec<Color>>,
}

/// Body of `PUT /games/{id}/movement/add`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MovementRequest {
    pub movement_card: MovementCard,
    pub piece_1_coordinates: Coord,
    pub piece_2_coordinates: Coord,
}

/// Body of `PUT /games/{id}/figure/discard` and `/figure/block`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FigureDiscardRequest {
    pub figure_card: FigureType,
    pub associated_player: i64,
    pub figure_board: FigureType,
    pub clicked_x: u8,
    pub clicked_y: u8,
}

/// Wire form of every server push: a `type` tag, a human-readable `message`,
/// and a tag-dependent `payload`. An envelope without a tag is a plain game
/// update (the server broadcasts those untagged).
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    payload: serde_json::Value,
}

/// A decoded server push. Lobby sockets only ever produce the game-list
/// variants, game sockets the rest; both share the envelope shape.
#[derive(Clone, PartialEq, Debug)]
pub enum ServerEvent {
    InitialGameList(Vec<GameInfo>),
    GameAdded(GameInfo),
    GameUpdated(GameInfo),
    GameDeleted(GameInfo),
    Board(BoardSnapshot),
    Figures(Vec<FigureInBoard>),
    PartialMoves(Vec<Coord>),
    PlayerConnected(GameInfo),
    PlayerDisconnected(GameInfo),
    GameStarted(GameInfo),
    TurnFinished(GameInfo),
    GameWon { player_id: i64 },
    /// Untagged envelope: replace the whole game state.
    GameState(GameInfo),
}

#[derive(Clone, PartialEq, Debug)]
pub struct ServerMessage {
    pub event: ServerEvent,
    /// Log line for the UI; empty strings are dropped at decode time.
    pub message: Option<String>,
}

/// The event vocabulary is closed and server-defined, so an unknown tag is a
/// protocol mismatch, not something to paper over with a default.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown server event type {0:?}")]
    UnknownEventType(String),
    #[error("malformed server event: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct WinnerPayload {
    player_id: i64,
}

pub fn decode_server_message(text: &str) -> Result<ServerMessage, DecodeError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let payload = envelope.payload;

    let event = match envelope.kind.as_deref() {
        Some("initial game list") => ServerEvent::InitialGameList(serde_json::from_value(payload)?),
        Some("game added") => ServerEvent::GameAdded(serde_json::from_value(payload)?),
        Some("game updated") => ServerEvent::GameUpdated(serde_json::from_value(payload)?),
        Some("game deleted") => ServerEvent::GameDeleted(serde_json::from_value(payload)?),
        Some("board") => ServerEvent::Board(serde_json::from_value(payload)?),
        Some("figures") => ServerEvent::Figures(serde_json::from_value(payload)?),
        Some("partial_moves") => ServerEvent::PartialMoves(serde_json::from_value(payload)?),
        Some("player connected") => ServerEvent::PlayerConnected(serde_json::from_value(payload)?),
        Some("player disconnected") => {
            ServerEvent::PlayerDisconnected(serde_json::from_value(payload)?)
        }
        Some("game started") => ServerEvent::GameStarted(serde_json::from_value(payload)?),
        Some("finish turn") => ServerEvent::TurnFinished(serde_json::from_value(payload)?),
        Some("game won") => {
            let winner: WinnerPayload = serde_json::from_value(payload)?;
            ServerEvent::GameWon {
                player_id: winner.player_id,
            }
        }
        Some(other) => return Err(DecodeError::UnknownEventType(other.to_string())),
        None => ServerEvent::GameState(serde_json::from_value(payload)?),
    };

    Ok(ServerMessage {
        event,
        message: envelope.message.filter(|m| !m.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_json() -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "name": "partida",
            "player_amount": 4,
            "status": "waiting",
            "host_id": 3,
            "player_turn": 0,
            "players": [
                {
                    "id": 3,
                    "name": "ana",
                    "movement_cards": [
                        {"movement_type": "mov05", "associated_player": 3, "in_hand": true}
                    ],
                    "figure_cards": [
                        {"type": ["fige02", "easy"], "associated_player": 3, "blocked": false}
                    ],
                    "blocked": false
                }
            ],
            "forbidden_color": "none"
        })
    }

    #[test]
    fn decodes_tagged_game_event() {
        let text = serde_json::json!({
            "type": "game started",
            "message": "Turno de ana",
            "payload": game_json(),
        })
        .to_string();

        let msg = decode_server_message(&text).unwrap();
        assert_eq!(msg.message.as_deref(), Some("Turno de ana"));
        match msg.event {
            ServerEvent::GameStarted(game) => {
                assert_eq!(game.id, 7);
                assert_eq!(game.status, GameStatus::Waiting);
                let cards = &game.players[0].movement_cards;
                assert_eq!(cards[0].movement_type, MovementType::Mov05);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn decodes_untagged_envelope_as_game_state() {
        let text = serde_json::json!({"payload": game_json()}).to_string();

        let msg = decode_server_message(&text).unwrap();
        assert!(msg.message.is_none());
        assert!(matches!(msg.event, ServerEvent::GameState(_)));
    }

    #[test]
    fn decodes_board_event() {
        let row: Vec<&str> = vec!["red", "blue", "yellow", "green", "red", "blue"];
        let text = serde_json::json!({
            "type": "board",
            "message": "",
            "payload": {"color_distribution": vec![row.clone(); 6]},
        })
        .to_string();

        let msg = decode_server_message(&text).unwrap();
        // Empty message strings are dropped.
        assert!(msg.message.is_none());
        match msg.event {
            ServerEvent::Board(snapshot) => {
                assert_eq!(snapshot.color_distribution.len(), 6);
                assert_eq!(snapshot.color_distribution[0][1], Color::Blue);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn decodes_figures_and_partial_moves() {
        let text = serde_json::json!({
            "type": "figures",
            "message": "",
            "payload": [
                {"fig": ["fig01", "difficult"], "tiles": [{"x": 1, "y": 2}, {"x": 1, "y": 3}]}
            ],
        })
        .to_string();

        match decode_server_message(&text).unwrap().event {
            ServerEvent::Figures(figures) => {
                assert_eq!(figures[0].fig.0, FigureType::Fig01);
                assert_eq!(figures[0].tiles[1], Coord::new(1, 3));
            }
            other => panic!("unexpected event {other:?}"),
        }

        let text = serde_json::json!({
            "type": "partial_moves",
            "message": "",
            "payload": [{"x": 0, "y": 5}],
        })
        .to_string();

        match decode_server_message(&text).unwrap().event {
            ServerEvent::PartialMoves(tiles) => assert_eq!(tiles, vec![Coord::new(0, 5)]),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_a_decode_error() {
        let text = serde_json::json!({
            "type": "confetti",
            "message": "",
            "payload": {},
        })
        .to_string();

        match decode_server_message(&text) {
            Err(DecodeError::UnknownEventType(tag)) => assert_eq!(tag, "confetti"),
            other => panic!("expected unknown-tag error, got {other:?}"),
        }
    }

    #[test]
    fn movement_request_serializes_like_the_server_expects() {
        let req = MovementRequest {
            movement_card: MovementCard {
                movement_type: MovementType::Mov02,
                associated_player: 9,
                in_hand: true,
            },
            piece_1_coordinates: Coord::new(2, 2),
            piece_2_coordinates: Coord::new(2, 4),
        };

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["movement_card"]["movement_type"], "mov02");
        assert_eq!(value["piece_1_coordinates"]["x"], 2);
        assert_eq!(value["piece_2_coordinates"]["y"], 4);
    }
}
