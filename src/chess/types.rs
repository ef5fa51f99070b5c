use shakmaty::Color;
use smallvec::SmallVec;

/// Display SAN of a null move.
pub const NULL_MOVE_SAN: &str = "--";

/// Parsed game tree, read-only input to the renderers.
#[derive(Debug, Clone, Default)]
pub struct Game {
    pub headers: Headers,
    /// Comment in front of the first main-line move.
    pub comment: Option<String>,
    pub main_line: Line,
    /// Termination marker from the movetext, used when the `Result` tag is missing.
    pub outcome: Option<String>,
}

impl Game {
    pub fn result(&self) -> Option<&str> {
        self.headers.get("Result").or(self.outcome.as_deref())
    }

    /// Ply before the first main-line move, so the first move is at offset 1.
    pub fn start_ply(&self) -> u32 {
        self.main_line
            .first()
            .map(|first| first.ply.saturating_sub(1))
            .unwrap_or(0)
    }
}

/// Tag pairs in file order. The first occurrence of a tag wins and empty
/// values count as missing.
#[derive(Debug, Clone, Default)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn insert(&mut self, name: &str, value: &str) {
        if value.trim().is_empty() || self.get(name).is_some() {
            return;
        }
        self.0.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// An ordered sequence of moves: the main line or one variation.
#[derive(Debug, Clone, Default)]
pub struct Line {
    pub moves: Vec<MoveNode>,
}

impl Line {
    pub fn first(&self) -> Option<&MoveNode> {
        self.moves.first()
    }
}

#[derive(Debug, Clone)]
pub struct MoveNode {
    /// 1-based half-move index; odd plies are White's.
    pub ply: u32,
    pub color: Color,
    pub san: String,
    /// Position after the move.
    pub fen: String,
    pub from: String,
    pub to: String,
    pub comment_before: Option<String>,
    pub comment_after: Option<String>,
    pub nags: SmallVec<[u8; 4]>,
    pub drawables: Drawables,
    /// Alternatives to this move, not continuations after it.
    pub variations: Vec<Line>,
}

impl MoveNode {
    pub fn is_null(&self) -> bool {
        self.san == NULL_MOVE_SAN
    }

    pub fn move_number(&self) -> u32 {
        match self.color {
            Color::White => self.ply / 2 + 1,
            Color::Black => self.ply / 2,
        }
    }
}

/// Arrows and highlighted squares drawn on the position after a move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drawables {
    /// `Ge2e4`: color letter, origin, destination.
    pub arrows: Vec<String>,
    /// `Rd5`: color letter, square.
    pub fields: Vec<String>,
}

impl Drawables {
    pub fn extend(&mut self, other: Drawables) {
        self.arrows.extend(other.arrows);
        self.fields.extend(other.fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(ply: u32, color: Color) -> MoveNode {
        MoveNode {
            ply,
            color,
            san: "e4".to_string(),
            fen: String::new(),
            from: "e2".to_string(),
            to: "e4".to_string(),
            comment_before: None,
            comment_after: None,
            nags: SmallVec::new(),
            drawables: Drawables::default(),
            variations: Vec::new(),
        }
    }

    #[test]
    fn test_move_numbers_follow_ply_parity() {
        assert_eq!(node(1, Color::White).move_number(), 1);
        assert_eq!(node(2, Color::Black).move_number(), 1);
        assert_eq!(node(17, Color::White).move_number(), 9);
        assert_eq!(node(18, Color::Black).move_number(), 9);
    }

    #[test]
    fn test_headers_first_value_wins_and_empty_is_missing() {
        let mut headers = Headers::default();
        headers.insert("White", "Carlsen");
        headers.insert("White", "Nakamura");
        headers.insert("Black", "  ");

        assert_eq!(headers.get("White"), Some("Carlsen"));
        assert_eq!(headers.get("Black"), None);
    }

    #[test]
    fn test_result_falls_back_to_outcome() {
        let mut game = Game {
            outcome: Some("0-1".to_string()),
            ..Game::default()
        };
        assert_eq!(game.result(), Some("0-1"));

        game.headers.insert("Result", "1-0");
        assert_eq!(game.result(), Some("1-0"));
    }

    #[test]
    fn test_start_ply_of_empty_game_is_zero() {
        assert_eq!(Game::default().start_ply(), 0);
    }
}
