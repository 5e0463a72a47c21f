use std::fmt;

use common::model::game::Coord;

/// A line typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // One or more cell clicks, in order
    Click(Vec<Coord>),
    New,
    Reset,
    Name(String),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    MissingName,
    Unknown(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "type a cell like B3, or 'help'"),
            CommandError::MissingName => write!(f, "usage: name <your name>"),
            CommandError::Unknown(reason) => write!(f, "{} (try 'help')", reason),
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
Commands:
  B3        select a cell (first your piece, then where it goes)
  B3 C4     select both cells at once
  new       start a new game
  reset     restart the current game
  name NAME set your name (before the first move)
  show      redraw the board
  quit      leave";

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "" => Err(CommandError::Empty),
        "new" => Ok(Command::New),
        "reset" => Ok(Command::Reset),
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "name" if rest.is_empty() => Err(CommandError::MissingName),
        "name" => Ok(Command::Name(rest.to_owned())),
        _ => line
            .split_whitespace()
            .map(|cell| cell.parse::<Coord>())
            .collect::<Result<Vec<_>, _>>()
            .map(Command::Click)
            .map_err(CommandError::Unknown),
    }
}

/// Answer to "continue your previous game?". Anything but a clear yes starts fresh.
pub fn parse_confirmation(line: &str) -> bool {
    matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes" | "ok" | "continue"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(row: u8, col: u8) -> Coord {
        Coord::new(row, col).unwrap()
    }

    #[test]
    fn cells_become_clicks() {
        assert_eq!(parse("b3"), Ok(Command::Click(vec![at(2, 1)])));
        assert_eq!(
            parse("  B3   c4 "),
            Ok(Command::Click(vec![at(2, 1), at(3, 2)]))
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(parse("NEW"), Ok(Command::New));
        assert_eq!(parse("reset"), Ok(Command::Reset));
        assert_eq!(parse("quit"), Ok(Command::Quit));
        assert_eq!(parse("name  Alice Smith "), Ok(Command::Name("Alice Smith".to_owned())));
        assert_eq!(parse("name"), Err(CommandError::MissingName));
    }

    #[test]
    fn garbage_is_reported() {
        assert_eq!(parse(""), Err(CommandError::Empty));
        assert!(matches!(parse("Z9"), Err(CommandError::Unknown(_))));
        assert!(matches!(parse("B3 jump"), Err(CommandError::Unknown(_))));
    }

    #[test]
    fn confirmation_defaults_to_continue() {
        assert!(parse_confirmation(""));
        assert!(parse_confirmation(" Yes "));
        assert!(!parse_confirmation("n"));
        assert!(!parse_confirmation("new"));
    }
}
