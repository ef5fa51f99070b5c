//! Game tree model and the PGN visitor that builds it.

pub mod comment;
pub mod nag;
pub mod types;
pub mod visitor;

pub use types::{Drawables, Game, Headers, Line, MoveNode, NULL_MOVE_SAN};
pub use visitor::{GameVisitor, parse_game, read_next_game};
