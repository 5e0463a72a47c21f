use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: u8 = 8;

/// A board cell, addressed by zero-based row and column.
///
/// On the wire a coordinate is a two element array `[row, col]`. Decoding rejects anything
/// that falls outside the board.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "[u8; 2]", into = "[u8; 2]")]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Coord { row, col })
        } else {
            None
        }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    /// Every cell in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord { row, col }))
    }
}

impl TryFrom<[u8; 2]> for Coord {
    type Error = String;

    fn try_from([row, col]: [u8; 2]) -> Result<Self, Self::Error> {
        Coord::new(row, col).ok_or_else(|| format!("coordinate ({row}, {col}) is off the board"))
    }
}

impl From<Coord> for [u8; 2] {
    fn from(coord: Coord) -> Self {
        [coord.row, coord.col]
    }
}

// Column letter followed by the one-based row number, e.g. (2, 1) is B3
impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", char::from(b'A' + self.col), self.row + 1)
    }
}

impl FromStr for Coord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let (Some(letter), Some(digit), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("'{s}' is not a cell like B3"));
        };
        let letter = letter.to_ascii_uppercase();
        let (Some(col), Some(row)) = (
            ('A'..='H').position(|c| c == letter),
            ('1'..='8').position(|c| c == digit),
        ) else {
            return Err(format!("'{s}' is not on the board (A1-H8)"));
        };
        // Both positions are below BOARD_SIZE
        Ok(Coord {
            row: row as u8,
            col: col as u8,
        })
    }
}

/// One half-move: a piece travelling from one cell to another.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ply {
    pub from: Coord,
    pub to: Coord,
}

impl Ply {
    pub fn new(from: Coord, to: Coord) -> Self {
        Ply { from, to }
    }
}

impl fmt::Display for Ply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    // The human side
    #[serde(rename = "🔵")]
    Blue,
    // The engine's side
    #[serde(rename = "🔴")]
    Red,
}

impl Side {
    pub fn glyph(&self) -> &'static str {
        match self {
            Side::Blue => "🔵",
            Side::Red => "🔴",
        }
    }

    fn from_glyph(glyph: &str) -> Option<Self> {
        match glyph {
            "🔵" => Some(Side::Blue),
            "🔴" => Some(Side::Red),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    #[serde(rename = ".")]
    Empty,
    #[serde(rename = "🔵")]
    BlueMan,
    #[serde(rename = "💙")]
    BlueKing,
    #[serde(rename = "🔴")]
    RedMan,
    #[serde(rename = "\u{2764}\u{fe0f}")]
    RedKing,
}

impl Cell {
    pub fn glyph(&self) -> &'static str {
        match self {
            Cell::Empty => ".",
            Cell::BlueMan => "🔵",
            Cell::BlueKing => "💙",
            Cell::RedMan => "🔴",
            Cell::RedKing => "\u{2764}\u{fe0f}",
        }
    }
}

/// Row-major 8x8 snapshot of the engine's board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board([[Cell; BOARD_SIZE as usize]; BOARD_SIZE as usize]);

impl Board {
    pub fn empty() -> Self {
        Board([[Cell::Empty; BOARD_SIZE as usize]; BOARD_SIZE as usize])
    }

    /// Opening position: red men on the dark squares of rows 1-3, blue men on rows 6-8.
    pub fn initial() -> Self {
        let mut board = Board::empty();
        for coord in Coord::all() {
            if (coord.row + coord.col) % 2 == 0 {
                continue;
            }
            match coord.row {
                0..=2 => board.set(coord, Cell::RedMan),
                5..=7 => board.set(coord, Cell::BlueMan),
                _ => {}
            }
        }
        board
    }

    pub fn cell(&self, coord: Coord) -> Cell {
        self.0[coord.row as usize][coord.col as usize]
    }

    pub fn set(&mut self, coord: Coord, cell: Cell) {
        self.0[coord.row as usize][coord.col as usize] = cell;
    }
}

/// Game result as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Winner {
    #[default]
    None,
    Draw,
    Side(Side),
}

impl Winner {
    pub fn is_over(&self) -> bool {
        !matches!(self, Winner::None)
    }
}

// Wire form: null, "draw", or the winning side's glyph
impl Serialize for Winner {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Winner::None => serializer.serialize_none(),
            Winner::Draw => serializer.serialize_str("draw"),
            Winner::Side(side) => serializer.serialize_str(side.glyph()),
        }
    }
}

impl<'de> Deserialize<'de> for Winner {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(Winner::None);
        };
        if s == "draw" {
            return Ok(Winner::Draw);
        }
        Side::from_glyph(&s)
            .map(Winner::Side)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown winner marker {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn notation_covers_every_cell_once() {
        let names: std::collections::HashSet<String> =
            Coord::all().map(|coord| coord.to_string()).collect();
        assert_eq!(names.len(), 64);
        for name in &names {
            let (letter, number) = name.split_at(1);
            assert!(("A"..="H").contains(&letter), "bad column in {name}");
            assert!(("1"..="8").contains(&number), "bad row in {name}");
            assert_eq!(name.parse::<Coord>().unwrap().to_string(), *name);
        }
    }

    #[test]
    fn ply_notation() {
        let ply = Ply::new(Coord::new(2, 1).unwrap(), Coord::new(3, 2).unwrap());
        assert_eq!(ply.to_string(), "B3 → C4");
    }

    #[test]
    fn parse_cell_names() {
        assert_eq!("b3".parse::<Coord>(), Ok(Coord::new(2, 1).unwrap()));
        assert_eq!(" H8 ".parse::<Coord>(), Ok(Coord::new(7, 7).unwrap()));
        assert!("I1".parse::<Coord>().is_err());
        assert!("A9".parse::<Coord>().is_err());
        assert!("A10".parse::<Coord>().is_err());
        assert!("".parse::<Coord>().is_err());
    }

    #[test]
    fn coord_wire_format() {
        let coord: Coord = serde_json::from_value(json!([3, 4])).unwrap();
        assert_eq!(coord, Coord::new(3, 4).unwrap());
        assert_eq!(serde_json::to_value(coord).unwrap(), json!([3, 4]));
        assert!(serde_json::from_value::<Coord>(json!([8, 0])).is_err());
    }

    #[test]
    fn decode_initial_board() {
        let mut rows = vec![];
        for row in 0..8 {
            let cells: Vec<&str> = (0..8)
                .map(|col| match ((row + col) % 2, row) {
                    (1, 0..=2) => "🔴",
                    (1, 5..=7) => "🔵",
                    _ => ".",
                })
                .collect();
            rows.push(cells);
        }
        let board: Board = serde_json::from_value(json!(rows)).unwrap();
        assert_eq!(board, Board::initial());
        assert_eq!(board.cell(Coord::new(0, 1).unwrap()), Cell::RedMan);
        assert_eq!(board.cell(Coord::new(5, 0).unwrap()), Cell::BlueMan);
    }

    #[test]
    fn reject_short_board() {
        let rows = vec![vec!["."; 8]; 7];
        assert!(serde_json::from_value::<Board>(json!(rows)).is_err());
    }

    #[test]
    fn decode_kings() {
        let mut rows = vec![vec!["."; 8]; 8];
        rows[0][0] = "💙";
        rows[7][7] = "\u{2764}\u{fe0f}";
        let board: Board = serde_json::from_value(json!(rows)).unwrap();
        assert_eq!(board.cell(Coord::new(0, 0).unwrap()), Cell::BlueKing);
        assert_eq!(board.cell(Coord::new(7, 7).unwrap()), Cell::RedKing);
    }

    #[test]
    fn winner_wire_format() {
        assert_eq!(serde_json::from_value::<Winner>(json!(null)).unwrap(), Winner::None);
        assert_eq!(serde_json::from_value::<Winner>(json!("draw")).unwrap(), Winner::Draw);
        assert_eq!(
            serde_json::from_value::<Winner>(json!("🔴")).unwrap(),
            Winner::Side(Side::Red)
        );
        assert!(serde_json::from_value::<Winner>(json!("purple")).is_err());
        assert_eq!(serde_json::to_value(Winner::Side(Side::Blue)).unwrap(), json!("🔵"));
        assert_eq!(serde_json::to_value(Winner::None).unwrap(), json!(null));
    }
}
