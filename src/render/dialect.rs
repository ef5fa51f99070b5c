use super::buffer::Block;
use crate::options::Orientation;
use std::path::Path;

/// Everything the title block needs, resolved from the game headers.
#[derive(Debug, Clone)]
pub struct TitleBlock<'a> {
    pub white: String,
    pub black: String,
    pub date: &'a str,
    pub annotator: Orientation,
    pub qr_image: Option<&'a Path>,
    /// `false` keeps the preamble but drops the rendered title.
    pub show_title: bool,
}

/// A board diagram of the position after a move.
#[derive(Debug, Clone)]
pub struct Diagram<'a> {
    pub fen: &'a str,
    pub flipped: bool,
    /// Origin and destination of the move; empty for null moves.
    pub highlight: Vec<&'a str>,
    pub arrows: &'a [String],
    pub fields: &'a [String],
}

/// Markup syntax for one target language.
///
/// The traversal in [`super::Renderer`] is shared; a dialect only spells
/// the pieces it is asked for.
pub trait Dialect {
    fn name(&self) -> &'static str;

    /// File extension of the produced document, without the dot.
    fn extension(&self) -> &'static str;

    /// Escapes free text (comments, player names).
    fn escape(&self, text: &str) -> String;

    /// SAN as it should appear in the document.
    fn move_text(&self, san: &str) -> String;

    fn bold(&self, text: &str) -> String;

    /// `12.` or `12...`, with the number bolded on the main line.
    fn move_number(&self, number: u32, dots: &str, bold: bool) -> String;

    fn move_space(&self) -> &'static str;

    /// Vertical space emitted before the main line resumes after an interruption.
    fn resume_spacing(&self) -> &'static str;

    fn open_block(&self, block: Block) -> &'static str;

    fn close_block(&self, block: Block) -> &'static str;

    /// A comment standing between main-line paragraphs.
    fn main_line_comment(&self, text: &str) -> String;

    fn diagram(&self, diagram: &Diagram<'_>) -> String;

    /// Whether open blocks must be closed around a diagram.
    fn diagram_leaves_blocks(&self) -> bool {
        false
    }

    /// Whether a QR file name is mandatory once cohort and id are given.
    fn requires_qr_file(&self) -> bool;

    fn preamble(&self, title: &TitleBlock<'_>) -> String;

    fn result_line(&self, result: &str) -> String;

    fn closing(&self) -> &'static str {
        ""
    }
}

/// Display color for a drawable color letter.
pub fn board_color(letter: char) -> Option<&'static str> {
    match letter {
        'Y' => Some("Dandelion"),
        'R' => Some("red"),
        'B' => Some("cyan"),
        'G' => Some("Green"),
        'O' => Some("orange"),
        'C' => Some("magenta"),
        _ => None,
    }
}

/// Splits color-prefixed codes (`Ge2e4`, `Rd5`) into groups per color letter,
/// in order of first appearance.
pub fn group_by_color(codes: &[String]) -> Vec<(char, Vec<&str>)> {
    let mut groups: Vec<(char, Vec<&str>)> = Vec::new();

    for code in codes {
        let mut chars = code.chars();
        let Some(color) = chars.next() else {
            continue;
        };
        let rest = chars.as_str();

        match groups.iter_mut().find(|(c, _)| *c == color) {
            Some((_, members)) => members.push(rest),
            None => groups.push((color, vec![rest])),
        }
    }

    groups
}

/// `"e2e4"` → `("e2", "e4")`.
pub fn split_arrow(squares: &str) -> Option<(&str, &str)> {
    if squares.len() != 4 || !squares.is_ascii() {
        return None;
    }
    Some(squares.split_at(2))
}
