//! Joinable-game list, kept in sync from lobby socket events.

use crate::{GameInfo, GameStatus, ServerEvent};

/// The lobby's view of joinable games, newest first. The server pushes the
/// initial list on connect and deltas afterwards; everything else about a
/// game is owned server-side.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GameList {
    games: Vec<GameInfo>,
}

impl GameList {
    pub fn new() -> GameList {
        GameList::default()
    }

    pub fn games(&self) -> &[GameInfo] {
        &self.games
    }

    /// Applies one lobby event. Non-lobby events (game-socket traffic) are
    /// ignored, so a single event stream can be fed through unchanged.
    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::InitialGameList(games) => {
                self.games = games.clone();
            }
            ServerEvent::GameAdded(game) => {
                if !self.games.iter().any(|g| g.id == game.id) {
                    self.games.insert(0, game.clone());
                }
            }
            ServerEvent::GameUpdated(game) => self.update(game),
            ServerEvent::GameDeleted(game) => {
                self.games.retain(|g| g.id != game.id);
            }
            _ => {}
        }
    }

    fn update(&mut self, game: &GameInfo) {
        // Games that can no longer be joined drop off the list.
        if matches!(
            game.status,
            GameStatus::Full | GameStatus::InGame | GameStatus::Finished
        ) {
            self.games.retain(|g| g.id != game.id);
            return;
        }

        match self.games.iter_mut().find(|g| g.id == game.id) {
            Some(existing) => *existing = game.clone(),
            None => self.games.insert(0, game.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Color;

    fn game(id: i64, status: GameStatus) -> GameInfo {
        GameInfo {
            id,
            name: format!("game-{id}"),
            player_amount: 4,
            status,
            host_id: 1,
            player_turn: 0,
            players: vec![],
            forbidden_color: Color::None,
        }
    }

    #[test]
    fn initial_list_replaces_everything() {
        let mut list = GameList::new();
        list.apply(&ServerEvent::GameAdded(game(9, GameStatus::Waiting)));
        list.apply(&ServerEvent::InitialGameList(vec![
            game(1, GameStatus::Waiting),
            game(2, GameStatus::Waiting),
        ]));

        let ids: Vec<i64> = list.games().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn added_games_prepend_without_duplicates() {
        let mut list = GameList::new();
        list.apply(&ServerEvent::GameAdded(game(1, GameStatus::Waiting)));
        list.apply(&ServerEvent::GameAdded(game(2, GameStatus::Waiting)));
        list.apply(&ServerEvent::GameAdded(game(1, GameStatus::Waiting)));

        let ids: Vec<i64> = list.games().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn update_edits_in_place_or_prepends() {
        let mut list = GameList::new();
        list.apply(&ServerEvent::GameAdded(game(1, GameStatus::Waiting)));

        let mut renamed = game(1, GameStatus::Waiting);
        renamed.name = "renamed".to_string();
        list.apply(&ServerEvent::GameUpdated(renamed));
        assert_eq!(list.games()[0].name, "renamed");

        // An update for a game we never saw still lands on the list.
        list.apply(&ServerEvent::GameUpdated(game(5, GameStatus::Waiting)));
        assert_eq!(list.games()[0].id, 5);
    }

    #[test]
    fn unjoinable_games_drop_off() {
        let mut list = GameList::new();
        list.apply(&ServerEvent::GameAdded(game(1, GameStatus::Waiting)));
        list.apply(&ServerEvent::GameAdded(game(2, GameStatus::Waiting)));

        list.apply(&ServerEvent::GameUpdated(game(1, GameStatus::InGame)));
        list.apply(&ServerEvent::GameUpdated(game(2, GameStatus::Full)));
        assert!(list.games().is_empty());

        // A full game that never made the list stays off it.
        list.apply(&ServerEvent::GameUpdated(game(3, GameStatus::Finished)));
        assert!(list.games().is_empty());
    }

    #[test]
    fn deleted_games_are_removed() {
        let mut list = GameList::new();
        list.apply(&ServerEvent::GameAdded(game(1, GameStatus::Waiting)));
        list.apply(&ServerEvent::GameDeleted(game(1, GameStatus::Waiting)));
        assert!(list.games().is_empty());
    }

    #[test]
    fn game_socket_events_are_ignored() {
        let mut list = GameList::new();
        list.apply(&ServerEvent::GameWon { player_id: 4 });
        assert!(list.games().is_empty());
    }
}
