use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Boards are always 6x6; the server never sends anything else.
pub const BOARD_SIZE: usize = 6;

/// Tile color as the server reports it. `None` is a real wire value (the
/// "forbidden color" of a game starts out as none).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Yellow,
    Green,
    None,
}

/// A board coordinate. On the wire the row travels as `x` and the column as
/// `y`, which is what the server expects back in movement payloads.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Coord {
    #[serde(rename = "x")]
    pub row: u8,
    #[serde(rename = "y")]
    pub col: u8,
}

impl Coord {
    pub fn new(row: u8, col: u8) -> Coord {
        Coord { row, col }
    }
}

/// A relative displacement from an origin tile, before rotation. Not bounded
/// to the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Offset {
    pub d_row: i8,
    pub d_col: i8,
}

impl Offset {
    pub const fn new(d_row: i8, d_col: i8) -> Offset {
        Offset { d_row, d_col }
    }

    /// The four 90-degree rotations of this offset around the origin, in
    /// fixed order: identity, 90, 180, 270. Integer arithmetic only; applying
    /// the sequence twice gets back to the original offset.
    pub fn rotations(self) -> [Offset; 4] {
        let Offset { d_row: d, d_col: c } = self;
        [
            Offset::new(d, c),
            Offset::new(-c, d),
            Offset::new(-d, -c),
            Offset::new(c, -d),
        ]
    }
}

/// The seven movement card patterns. The vocabulary is closed and
/// server-defined; parsing is the only place an unknown tag can show up.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum MovementType {
    #[serde(rename = "mov01")]
    Mov01,
    #[serde(rename = "mov02")]
    Mov02,
    #[serde(rename = "mov03")]
    Mov03,
    #[serde(rename = "mov04")]
    Mov04,
    #[serde(rename = "mov05")]
    Mov05,
    #[serde(rename = "mov06")]
    Mov06,
    #[serde(rename = "mov07")]
    Mov07,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown movement type {0:?}")]
pub struct UnknownMovementType(pub String);

impl MovementType {
    /// Canonical seed offsets for this movement type. Always non-empty; six
    /// of the seven types have a single seed, and the slice keeps the door
    /// open for multi-offset types.
    pub fn offsets(self) -> &'static [Offset] {
        // Struct literals, so the arms promote to 'static tables.
        match self {
            MovementType::Mov01 => &[Offset { d_row: 2, d_col: 2 }],
            MovementType::Mov02 => &[Offset { d_row: 0, d_col: 2 }],
            MovementType::Mov03 => &[Offset { d_row: 0, d_col: 1 }],
            MovementType::Mov04 => &[Offset { d_row: 1, d_col: 1 }],
            MovementType::Mov05 => &[Offset { d_row: -2, d_col: 1 }],
            MovementType::Mov06 => &[Offset { d_row: -2, d_col: -1 }],
            MovementType::Mov07 => &[Offset { d_row: 0, d_col: 4 }],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::Mov01 => "mov01",
            MovementType::Mov02 => "mov02",
            MovementType::Mov03 => "mov03",
            MovementType::Mov04 => "mov04",
            MovementType::Mov05 => "mov05",
            MovementType::Mov06 => "mov06",
            MovementType::Mov07 => "mov07",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = UnknownMovementType;

    fn from_str(s: &str) -> Result<MovementType, UnknownMovementType> {
        match s {
            "mov01" => Ok(MovementType::Mov01),
            "mov02" => Ok(MovementType::Mov02),
            "mov03" => Ok(MovementType::Mov03),
            "mov04" => Ok(MovementType::Mov04),
            "mov05" => Ok(MovementType::Mov05),
            "mov06" => Ok(MovementType::Mov06),
            "mov07" => Ok(MovementType::Mov07),
            other => Err(UnknownMovementType(other.to_string())),
        }
    }
}

/// All tiles reachable from `origin` under `movement`: each canonical offset
/// is expanded to its four rotations, added to the origin, clipped to the
/// board, and de-duplicated.
///
/// The origin itself is not validated; an off-board origin just yields a
/// smaller (possibly empty) set, which is a normal outcome, not an error.
pub fn possible_moves(origin: Coord, movement: MovementType) -> BTreeSet<Coord> {
    let mut moves = BTreeSet::new();

    for offset in movement.offsets() {
        for rot in offset.rotations() {
            let row = origin.row as i16 + rot.d_row as i16;
            let col = origin.col as i16 + rot.d_col as i16;

            if row >= 0 && row < BOARD_SIZE as i16 && col >= 0 && col < BOARD_SIZE as i16 {
                moves.insert(Coord::new(row as u8, col as u8));
            }
        }
    }

    moves
}

/// Local copy of the board. The server owns the authoritative one; this is
/// only ever overwritten from `color_distribution` snapshots, plus optimistic
/// local swaps that the server may later reject.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    tiles: [[Color; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Board {
        Board {
            tiles: [[Color::None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Builds a board from the wire's row-major color distribution. Rows or
    /// columns beyond 6 are ignored; missing ones stay `None`.
    pub fn from_snapshot(rows: &[Vec<Color>]) -> Board {
        let mut board = Board::new();
        for (r, row) in rows.iter().take(BOARD_SIZE).enumerate() {
            for (c, color) in row.iter().take(BOARD_SIZE).enumerate() {
                board.tiles[r][c] = *color;
            }
        }
        board
    }

    pub fn snapshot(&self) -> Vec<Vec<Color>> {
        self.tiles.iter().map(|row| row.to_vec()).collect()
    }

    pub fn get(&self, coord: Coord) -> Option<Color> {
        self.tiles
            .get(coord.row as usize)
            .and_then(|row| row.get(coord.col as usize))
            .copied()
    }

    /// Swaps the colors of two tiles in place. Off-board coordinates are a
    /// no-op; the server re-sends the whole board anyway.
    pub fn swap(&mut self, a: Coord, b: Coord) {
        let (Some(ca), Some(cb)) = (self.get(a), self.get(b)) else {
            return;
        };
        self.tiles[a.row as usize][a.col as usize] = cb;
        self.tiles[b.row as usize][b.col as usize] = ca;
    }

    /// True when every tile is `None`, i.e. no board snapshot has arrived
    /// yet on this connection.
    pub fn is_empty(&self) -> bool {
        self.tiles
            .iter()
            .all(|row| row.iter().all(|c| *c == Color::None))
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}

/// Figure card / figure-in-board identifiers. Detection happens server-side;
/// the client only ever looks these up.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FigureType {
    #[serde(rename = "fig01")]
    Fig01,
    #[serde(rename = "fig02")]
    Fig02,
    #[serde(rename = "fig03")]
    Fig03,
    #[serde(rename = "fig04")]
    Fig04,
    #[serde(rename = "fig05")]
    Fig05,
    #[serde(rename = "fig06")]
    Fig06,
    #[serde(rename = "fig07")]
    Fig07,
    #[serde(rename = "fig08")]
    Fig08,
    #[serde(rename = "fig09")]
    Fig09,
    #[serde(rename = "fig10")]
    Fig10,
    #[serde(rename = "fig11")]
    Fig11,
    #[serde(rename = "fig12")]
    Fig12,
    #[serde(rename = "fig13")]
    Fig13,
    #[serde(rename = "fig14")]
    Fig14,
    #[serde(rename = "fig15")]
    Fig15,
    #[serde(rename = "fig16")]
    Fig16,
    #[serde(rename = "fig17")]
    Fig17,
    #[serde(rename = "fig18")]
    Fig18,
    #[serde(rename = "fige01")]
    Fige01,
    #[serde(rename = "fige02")]
    Fige02,
    #[serde(rename = "fige03")]
    Fige03,
    #[serde(rename = "fige04")]
    Fige04,
    #[serde(rename = "fige05")]
    Fige05,
    #[serde(rename = "fige06")]
    Fige06,
    #[serde(rename = "fige07")]
    Fige07,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Difficult,
}

impl FigureType {
    pub fn difficulty(self) -> Difficulty {
        match self {
            FigureType::Fige01
            | FigureType::Fige02
            | FigureType::Fige03
            | FigureType::Fige04
            | FigureType::Fige05
            | FigureType::Fige06
            | FigureType::Fige07 => Difficulty::Easy,
            _ => Difficulty::Difficult,
        }
    }
}

/// The server encodes figure kinds as a `[code, difficulty]` pair.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FigureKind(pub FigureType, pub Difficulty);

/// One figure the server detected on the board, with the tiles it covers.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FigureInBoard {
    pub fig: FigureKind,
    pub tiles: Vec<Coord>,
}

/// Finds the figure covering `coord`, if any, among the server-announced
/// figures.
pub fn figure_at(coord: Coord, figures: &[FigureInBoard]) -> Option<FigureType> {
    for figure in figures {
        if figure.tiles.iter().any(|t| *t == coord) {
            return Some(figure.fig.0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [MovementType; 7] = [
        MovementType::Mov01,
        MovementType::Mov02,
        MovementType::Mov03,
        MovementType::Mov04,
        MovementType::Mov05,
        MovementType::Mov06,
        MovementType::Mov07,
    ];

    fn coords(pairs: &[(u8, u8)]) -> BTreeSet<Coord> {
        pairs.iter().map(|&(r, c)| Coord::new(r, c)).collect()
    }

    #[test]
    fn mov01_from_center() {
        assert_eq!(
            possible_moves(Coord::new(2, 2), MovementType::Mov01),
            coords(&[(4, 0), (0, 4), (0, 0), (4, 4)]),
        );
    }

    #[test]
    fn mov02_from_center() {
        assert_eq!(
            possible_moves(Coord::new(2, 2), MovementType::Mov02),
            coords(&[(0, 2), (4, 2), (2, 0), (2, 4)]),
        );
    }

    #[test]
    fn mov03_from_center() {
        assert_eq!(
            possible_moves(Coord::new(2, 2), MovementType::Mov03),
            coords(&[(1, 2), (2, 1), (2, 3), (3, 2)]),
        );
    }

    #[test]
    fn mov04_from_center() {
        assert_eq!(
            possible_moves(Coord::new(2, 2), MovementType::Mov04),
            coords(&[(1, 1), (1, 3), (3, 1), (3, 3)]),
        );
    }

    #[test]
    fn mov07_from_corner_clips_off_board() {
        // Two of the four rotations of (0, 4) land off-board from (0, 0).
        assert_eq!(
            possible_moves(Coord::new(0, 0), MovementType::Mov07),
            coords(&[(0, 4), (4, 0)]),
        );
    }

    #[test]
    fn all_results_stay_on_board() {
        for movement in ALL_TYPES {
            for row in 0..BOARD_SIZE as u8 {
                for col in 0..BOARD_SIZE as u8 {
                    let moves = possible_moves(Coord::new(row, col), movement);
                    assert!(moves.len() <= 4, "{movement} from ({row},{col})");
                    for m in moves {
                        assert!(
                            (m.row as usize) < BOARD_SIZE && (m.col as usize) < BOARD_SIZE,
                            "{movement} from ({row},{col}) reached ({},{})",
                            m.row,
                            m.col,
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn calculation_is_deterministic() {
        for movement in ALL_TYPES {
            let a = possible_moves(Coord::new(3, 1), movement);
            let b = possible_moves(Coord::new(3, 1), movement);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn rotations_close_after_full_turn() {
        // Rotating the four rotations once more must reproduce the original
        // offset among the 16 results (360-degree closure).
        for movement in ALL_TYPES {
            for &offset in movement.offsets() {
                let twice: Vec<Offset> = offset
                    .rotations()
                    .iter()
                    .flat_map(|o| o.rotations())
                    .collect();
                assert!(twice.contains(&offset), "{movement}");
            }
        }
    }

    #[test]
    fn offset_table_is_static_and_canonical() {
        // The table must hand out 'static slices with exactly the canonical
        // seed per type.
        let table: [(MovementType, Offset); 7] = [
            (MovementType::Mov01, Offset::new(2, 2)),
            (MovementType::Mov02, Offset::new(0, 2)),
            (MovementType::Mov03, Offset::new(0, 1)),
            (MovementType::Mov04, Offset::new(1, 1)),
            (MovementType::Mov05, Offset::new(-2, 1)),
            (MovementType::Mov06, Offset::new(-2, -1)),
            (MovementType::Mov07, Offset::new(0, 4)),
        ];

        for (movement, seed) in table {
            let offsets: &'static [Offset] = movement.offsets();
            assert_eq!(offsets, &[seed], "{movement}");
        }
    }

    #[test]
    fn rotation_order_is_fixed() {
        let rots = Offset::new(-2, 1).rotations();
        assert_eq!(
            rots,
            [
                Offset::new(-2, 1),
                Offset::new(-1, -2),
                Offset::new(2, -1),
                Offset::new(1, 2),
            ]
        );
    }

    #[test]
    fn clipping_near_edges() {
        // One step from two edges, mov03 keeps only the in-board neighbors.
        let moves = possible_moves(Coord::new(0, 0), MovementType::Mov03);
        assert_eq!(moves, coords(&[(0, 1), (1, 0)]));
    }

    #[test]
    fn unknown_movement_tag_is_an_error() {
        let err = "mov99".parse::<MovementType>().unwrap_err();
        assert_eq!(err, UnknownMovementType("mov99".to_string()));
    }

    #[test]
    fn movement_tags_round_trip() {
        for movement in ALL_TYPES {
            assert_eq!(movement.as_str().parse::<MovementType>(), Ok(movement));
            let json = serde_json::to_string(&movement).unwrap();
            assert_eq!(json, format!("\"{movement}\""));
        }
    }

    #[test]
    fn board_swap_and_snapshot() {
        let mut rows = vec![vec![Color::Red; BOARD_SIZE]; BOARD_SIZE];
        rows[1][2] = Color::Blue;
        rows[4][4] = Color::Green;

        let mut board = Board::from_snapshot(&rows);
        assert!(!board.is_empty());

        board.swap(Coord::new(1, 2), Coord::new(4, 4));
        assert_eq!(board.get(Coord::new(1, 2)), Some(Color::Green));
        assert_eq!(board.get(Coord::new(4, 4)), Some(Color::Blue));

        let restored = Board::from_snapshot(&rows);
        assert_eq!(restored.get(Coord::new(1, 2)), Some(Color::Blue));
    }

    #[test]
    fn figure_lookup_by_tile() {
        let figures = vec![FigureInBoard {
            fig: FigureKind(FigureType::Fig05, Difficulty::Difficult),
            tiles: vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(1, 1)],
        }];

        assert_eq!(
            figure_at(Coord::new(0, 1), &figures),
            Some(FigureType::Fig05)
        );
        assert_eq!(figure_at(Coord::new(5, 5), &figures), None);
    }
}
