pub mod selection;
pub mod ws_client;

use std::collections::BTreeSet;

use anyhow::{Context, Result};

use tokio::sync::mpsc;

use crate::api::{ApiClient, ApiError};
use crate::game::{self, Board, Coord, FigureInBoard};
use crate::game_manager::selection::{ClickOutcome, Selection};
use crate::game_manager::ws_client::{ConnState, WsEvent};
use crate::storage::SessionStore;
use crate::{
    FigureCard, FigureDiscardRequest, GameInfo, GameStatus, MovementCard, MovementRequest,
    ServerEvent, ServerMessage,
};

/// Input from whatever renders the game: tile clicks, card focus changes and
/// the button-zone actions.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    TileClick(Coord),
    FocusMovementCard(MovementCard),
    FocusFigureCard { card: FigureCard, owner: i64 },
    ClearFocus,
    StartGame,
    FinishTurn,
    CancelMovement,
    QuitGame,
}

/// Message that the GameManager sends to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum GameManagerToUI {
    Conn(ConnState),
    GameUpdated(Box<GameInfo>),
    BoardUpdated(Board),
    /// Tiles covered by server-detected figures, for highlighting.
    FigureHighlights(Vec<Coord>),
    /// Tiles touched by partial movements of the current turn.
    PartialMoveHighlights(Vec<Coord>),
    /// Reachable tiles for the current selection; empty clears the
    /// highlight.
    PossibleMoves(BTreeSet<Coord>),
    /// Log line for the game feed / toasts.
    Message(String),
    GameWon { player_id: i64 },
}

/// Client-side session for one game: applies server-pushed events to local
/// state, owns the tile selection, and turns player intent into REST calls.
/// All game rules stay server-side; rejections just undo optimistic state.
pub struct GameManager {
    game_id: i64,
    player_id: i64,

    api: ApiClient,
    store: SessionStore,

    game: Option<GameInfo>,
    board: Board,
    history: Vec<Board>,
    figures: Vec<FigureInBoard>,
    selection: Selection,

    from_ws: mpsc::Receiver<WsEvent>,
    from_ui: mpsc::Receiver<UiCommand>,
    to_ui: mpsc::Sender<GameManagerToUI>,
}

impl GameManager {
    pub fn new(
        game_id: i64,
        player_id: i64,
        api: ApiClient,
        store: SessionStore,
        from_ws: mpsc::Receiver<WsEvent>,
        from_ui: mpsc::Receiver<UiCommand>,
        to_ui: mpsc::Sender<GameManagerToUI>,
    ) -> GameManager {
        GameManager {
            game_id,
            player_id,
            api,
            store,
            game: None,
            board: Board::new(),
            history: Vec::new(),
            figures: Vec::new(),
            selection: Selection::new(),
            from_ws,
            from_ui,
            to_ui,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                Some(ev) = self.from_ws.recv() => {
                    self.handle_ws_event(ev).await?;
                }

                Some(cmd) = self.from_ui.recv() => {
                    self.handle_ui_command(cmd).await?;
                }

                else => return Ok(()),
            }
        }
    }

    pub async fn handle_ws_event(&mut self, ev: WsEvent) -> Result<()> {
        match ev {
            WsEvent::State(state) => {
                self.to_ui
                    .send(GameManagerToUI::Conn(state))
                    .await
                    .context("updating UI")?;
                Ok(())
            }
            WsEvent::Message(msg) => self.handle_server_msg(msg).await,
        }
    }

    pub async fn handle_server_msg(&mut self, msg: ServerMessage) -> Result<()> {
        if let Some(line) = msg.message {
            self.send_ui(GameManagerToUI::Message(line)).await?;
        }

        match msg.event {
            ServerEvent::Board(snapshot) => {
                self.board = Board::from_snapshot(&snapshot.color_distribution);
                self.store.set_board(&snapshot.color_distribution)?;
                self.send_ui(GameManagerToUI::BoardUpdated(self.board.clone()))
                    .await?;
            }
            ServerEvent::Figures(figures) => {
                let tiles: Vec<Coord> = figures
                    .iter()
                    .flat_map(|f| f.tiles.iter().copied())
                    .collect();
                self.store.set_figures(&figures)?;
                self.figures = figures;
                self.send_ui(GameManagerToUI::FigureHighlights(tiles)).await?;
            }
            ServerEvent::PartialMoves(tiles) => {
                self.send_ui(GameManagerToUI::PartialMoveHighlights(tiles))
                    .await?;
            }
            ServerEvent::GameWon { player_id } => {
                self.send_ui(GameManagerToUI::GameWon { player_id }).await?;
            }
            ServerEvent::GameState(game)
            | ServerEvent::PlayerConnected(game)
            | ServerEvent::PlayerDisconnected(game)
            | ServerEvent::GameStarted(game)
            | ServerEvent::TurnFinished(game) => {
                self.apply_game_update(game).await?;
            }
            // Lobby traffic; a game socket never carries these.
            ServerEvent::InitialGameList(_)
            | ServerEvent::GameAdded(_)
            | ServerEvent::GameUpdated(_)
            | ServerEvent::GameDeleted(_) => {}
        }

        Ok(())
    }

    async fn apply_game_update(&mut self, game: GameInfo) -> Result<()> {
        // A reconnect mid-game starts from an empty local board; fall back to
        // the cached snapshot until the next board broadcast.
        if game.status == GameStatus::InGame && self.board.is_empty() {
            if let Some(snapshot) = self.store.board() {
                self.board = Board::from_snapshot(&snapshot);
                self.figures = self.store.figures();
                self.send_ui(GameManagerToUI::BoardUpdated(self.board.clone()))
                    .await?;
            }
        }

        self.game = Some(game.clone());
        self.send_ui(GameManagerToUI::GameUpdated(Box::new(game)))
            .await?;
        Ok(())
    }

    pub async fn handle_ui_command(&mut self, cmd: UiCommand) -> Result<()> {
        match cmd {
            UiCommand::TileClick(coord) => self.handle_tile_click(coord).await,
            UiCommand::FocusMovementCard(card) => {
                self.selection.toggle_movement_focus(card);
                self.send_possible_moves().await
            }
            UiCommand::FocusFigureCard { card, owner } => {
                self.selection.toggle_figure_focus(card, owner);
                self.send_possible_moves().await
            }
            UiCommand::ClearFocus => {
                self.selection.clear();
                self.send_possible_moves().await
            }
            UiCommand::StartGame => {
                let res = self.api.start_game(self.game_id).await;
                self.report_action(res).await
            }
            UiCommand::FinishTurn => {
                self.selection.clear();
                self.send_possible_moves().await?;
                let res = self.api.finish_turn(self.game_id).await;
                self.report_action(res).await
            }
            UiCommand::CancelMovement => {
                // The server recomputes and rebroadcasts the partial board.
                let res = self.api.cancel_movement(self.game_id).await;
                self.report_action(res).await
            }
            UiCommand::QuitGame => {
                let res = self.api.quit_game(self.game_id).await;
                self.report_action(res).await
            }
        }
    }

    async fn handle_tile_click(&mut self, coord: Coord) -> Result<()> {
        // Clicks only count mid-game, on the player's own turn.
        let my_turn = self
            .game
            .as_ref()
            .filter(|g| g.status == GameStatus::InGame)
            .and_then(|g| g.current_player())
            .map(|p| p.id == self.player_id)
            .unwrap_or(false);
        if !my_turn {
            return Ok(());
        }

        match self.selection.tile_click(coord) {
            ClickOutcome::NoFocus => {
                self.send_ui(GameManagerToUI::Message(
                    "select a movement or figure card first".to_string(),
                ))
                .await
            }
            ClickOutcome::Selected | ClickOutcome::Cleared => self.send_possible_moves().await,
            ClickOutcome::PairReady {
                first,
                second,
                card,
            } => self.submit_movement(first, second, card).await,
            ClickOutcome::FigureAction { at, card, owner } => {
                self.submit_figure_action(at, card, owner).await
            }
        }
    }

    /// Applies the swap locally right away and submits it; a rejection rolls
    /// the board back and surfaces the server's reason.
    async fn submit_movement(
        &mut self,
        first: Coord,
        second: Coord,
        card: MovementCard,
    ) -> Result<()> {
        self.history.push(self.board.clone());
        self.board.swap(first, second);
        self.send_ui(GameManagerToUI::BoardUpdated(self.board.clone()))
            .await?;

        let req = MovementRequest {
            movement_card: card,
            piece_1_coordinates: first,
            piece_2_coordinates: second,
        };

        match self.api.add_movement(self.game_id, &req).await {
            Ok(resp) => {
                if let Some(line) = resp.message {
                    self.send_ui(GameManagerToUI::Message(line)).await?;
                }
            }
            Err(err) => {
                if let Some(prev) = self.history.pop() {
                    self.board = prev;
                }
                self.send_ui(GameManagerToUI::BoardUpdated(self.board.clone()))
                    .await?;
                self.send_ui(GameManagerToUI::Message(user_facing(err)))
                    .await?;
            }
        }

        self.selection.clear();
        self.send_possible_moves().await
    }

    async fn submit_figure_action(
        &mut self,
        at: Coord,
        card: FigureCard,
        owner: i64,
    ) -> Result<()> {
        let Some(figure) = game::figure_at(at, &self.figures) else {
            return self
                .send_ui(GameManagerToUI::Message(
                    "there is no figure at the selected tile".to_string(),
                ))
                .await;
        };

        let req = FigureDiscardRequest {
            figure_card: card.kind.0,
            associated_player: owner,
            figure_board: figure,
            clicked_x: at.row,
            clicked_y: at.col,
        };

        // Own card: claim (discard) the figure. Opponent's card: block it.
        let res = if owner == self.player_id {
            self.api.discard_figure(self.game_id, &req).await
        } else {
            self.api.block_figure(self.game_id, &req).await
        };

        self.report_action(res).await
    }

    async fn report_action(&mut self, res: Result<crate::api::ActionResponse, ApiError>) -> Result<()> {
        match res {
            Ok(resp) => {
                if let Some(line) = resp.message {
                    self.send_ui(GameManagerToUI::Message(line)).await?;
                }
            }
            Err(err) => {
                self.send_ui(GameManagerToUI::Message(user_facing(err)))
                    .await?;
            }
        }
        Ok(())
    }

    async fn send_possible_moves(&mut self) -> Result<()> {
        self.send_ui(GameManagerToUI::PossibleMoves(
            self.selection.possible_moves().clone(),
        ))
        .await
    }

    async fn send_ui(&mut self, msg: GameManagerToUI) -> Result<()> {
        self.to_ui.send(msg).await.context("updating UI")
    }
}

fn user_facing(err: ApiError) -> String {
    match err {
        ApiError::Rejected { detail, .. } => detail,
        other => other.to_string(),
    }
}
