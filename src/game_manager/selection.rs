use std::collections::BTreeSet;

use crate::game::{self, Coord};
use crate::{FigureCard, MovementCard};

/// Which card the player currently has focused. At most one card is focused
/// at a time, across both hands.
#[derive(Debug, Clone, PartialEq)]
pub enum Focus {
    Movement(MovementCard),
    /// A figure card; `owner` decides between discarding (own card) and
    /// blocking (opponent's card).
    Figure { card: FigureCard, owner: i64 },
}

/// What a tile click amounts to, given the current selection and focus.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// No card focused; the user has to pick one first.
    NoFocus,
    /// The clicked tile was already selected; everything was cleared.
    Cleared,
    /// First tile anchored; possible moves are now exposed.
    Selected,
    /// Two tiles chosen with a movement card: ready to submit.
    PairReady {
        first: Coord,
        second: Coord,
        card: MovementCard,
    },
    /// A figure-card focus resolves on the first click.
    FigureAction { at: Coord, card: FigureCard, owner: i64 },
}

/// Tracks the selected tile(s) and the focused card, and decides when the
/// possible-move calculator runs: only on a click with zero tiles selected
/// and a movement card focused.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selection {
    focus: Option<Focus>,
    tiles: Vec<Coord>,
    possible_moves: BTreeSet<Coord>,
}

impl Selection {
    pub fn new() -> Selection {
        Selection::default()
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn selected(&self) -> &[Coord] {
        &self.tiles
    }

    /// Reachable tiles highlighted for the anchored selection. Empty while
    /// nothing is anchored.
    pub fn possible_moves(&self) -> &BTreeSet<Coord> {
        &self.possible_moves
    }

    /// Focusing the already-focused card clears the focus. Switching focus
    /// always drops any in-progress selection.
    pub fn toggle_movement_focus(&mut self, card: MovementCard) {
        let same = matches!(&self.focus, Some(Focus::Movement(c)) if *c == card);
        self.clear();
        if !same {
            self.focus = Some(Focus::Movement(card));
        }
    }

    pub fn toggle_figure_focus(&mut self, card: FigureCard, owner: i64) {
        let same = matches!(
            &self.focus,
            Some(Focus::Figure { card: c, owner: o }) if *c == card && *o == owner
        );
        self.clear();
        if !same {
            self.focus = Some(Focus::Figure { card, owner });
        }
    }

    pub fn tile_click(&mut self, coord: Coord) -> ClickOutcome {
        let focus = match &self.focus {
            None => return ClickOutcome::NoFocus,
            Some(focus) => focus.clone(),
        };

        match focus {
            Focus::Figure { card, owner } => ClickOutcome::FigureAction {
                at: coord,
                card,
                owner,
            },
            Focus::Movement(card) => {
                if self.tiles.contains(&coord) {
                    self.tiles.clear();
                    self.possible_moves.clear();
                    return ClickOutcome::Cleared;
                }

                if self.tiles.is_empty() {
                    self.possible_moves = game::possible_moves(coord, card.movement_type);
                    self.tiles.push(coord);
                    return ClickOutcome::Selected;
                }

                let first = self.tiles[0];
                self.tiles.push(coord);
                ClickOutcome::PairReady {
                    first,
                    second: coord,
                    card,
                }
            }
        }
    }

    /// Drops selection, highlights and focus, e.g. after a movement was
    /// submitted or the turn ended.
    pub fn clear(&mut self) {
        self.focus = None;
        self.tiles.clear();
        self.possible_moves.clear();
    }
}
