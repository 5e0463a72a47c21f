use std::fmt::Write;

use common::model::game::{Cell, Coord, Side, Winner, BOARD_SIZE};

use crate::{
    controller::{Selection, SessionController},
    store::SessionStore,
};

/// Text rendering of the board, status and move list.
pub fn render<S: SessionStore>(controller: &SessionController<S>) -> String {
    let mut out = String::new();
    let name_state = if controller.started() { " (locked)" } else { "" };
    let _ = writeln!(out, "Your name: {}{}", controller.player_name(), name_state);

    if controller.loading() {
        out.push_str("Loading board…\n");
    } else if let Some(board) = controller.board() {
        out.push_str("   ");
        for col in 0..BOARD_SIZE {
            let _ = write!(out, "  {}  ", char::from(b'A' + col));
        }
        for coord in Coord::all() {
            if coord.col() == 0 {
                let _ = write!(out, "\n{:>2} ", coord.row() + 1);
            }
            out.push_str(&render_cell(controller, coord, board.cell(coord)));
        }
        out.push('\n');
    } else {
        out.push_str("Board not loaded.\n");
    }

    if !controller.message().is_empty() {
        let _ = writeln!(out, "\n{}", controller.message());
    }
    if let Some(banner) = winner_banner(controller.winner(), controller.player_name()) {
        let _ = writeln!(out, "{}", banner);
    }

    out.push_str("\nMoves\n");
    if controller.history().is_empty() {
        out.push_str("  No moves yet.\n");
    }
    for record in controller.history().entries() {
        let _ = writeln!(out, "  {}: {}", record.actor, record.notation);
    }
    out
}

fn render_cell<S: SessionStore>(
    controller: &SessionController<S>,
    coord: Coord,
    cell: Cell,
) -> String {
    let glyph = match cell {
        Cell::Empty => " ·",
        other => other.glyph(),
    };
    let selected = controller.selection() == Selection::AwaitingDestination(coord);
    let recent = controller.last_move() == Some(coord);
    match (selected, recent) {
        (true, _) => format!(" [{}]", glyph.trim()),
        (false, true) => format!(" ({})", glyph.trim()),
        _ => format!("  {} ", glyph.trim()),
    }
}

pub fn winner_banner(winner: Winner, player_name: &str) -> Option<String> {
    match winner {
        Winner::None => None,
        Winner::Draw => Some("🤝 Draw!".to_owned()),
        Winner::Side(Side::Red) => Some("🎉 AI wins!".to_owned()),
        Winner::Side(Side::Blue) => Some(format!("🎉 {} wins!", player_name)),
    }
}

#[cfg(test)]
mod tests {
    use common::model::{game::Board, messages::{SessionId, StartResponse}};

    use super::*;
    use crate::{
        controller::{Activation, Reply},
        store::MemoryStore,
    };

    #[test]
    fn banners() {
        assert_eq!(winner_banner(Winner::None, "Alice"), None);
        assert_eq!(winner_banner(Winner::Draw, "Alice").as_deref(), Some("🤝 Draw!"));
        assert_eq!(
            winner_banner(Winner::Side(Side::Red), "Alice").as_deref(),
            Some("🎉 AI wins!")
        );
        assert_eq!(
            winner_banner(Winner::Side(Side::Blue), "Alice").as_deref(),
            Some("🎉 Alice wins!")
        );
    }

    #[test]
    fn marks_selected_cell() {
        let mut controller = SessionController::load(MemoryStore::new());
        let Activation::Dispatch(dispatch) = controller.activate() else {
            panic!("Expected a fresh start");
        };
        let started = StartResponse {
            game_id: SessionId("game-1".to_owned()),
            board: Board::initial(),
            winner: Winner::None,
        };
        assert_eq!(controller.complete(dispatch, Ok(Reply::Started(started))), None);
        let origin = Coord::new(5, 0).unwrap();
        assert_eq!(controller.click(origin), None);

        let text = render(&controller);
        let rows: Vec<&str> = text.lines().filter(|line| line.starts_with(" 6 ")).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with(" 6  [🔵]"), "row was {:?}", rows[0]);
        assert_eq!(text.matches('[').count(), 1);
    }

    #[test]
    fn before_first_load() {
        let controller = SessionController::load(MemoryStore::new());
        let text = render(&controller);
        assert!(text.contains("Your name: Human\n"));
        assert!(text.contains("Board not loaded."));
        assert!(text.contains("No moves yet."));
    }
}
