//! Annotated game tree to markup.
//!
//! [`Renderer`] walks the game once and appends markup to a buffer; the
//! [`Dialect`] it is parameterized with decides the syntax.

pub mod buffer;
pub mod dialect;
pub mod latex;
pub mod typst;

use crate::chess::{Game, Line, MoveNode, parse_game};
use crate::error::{RenderError, Result};
use crate::options::{Orientation, RenderOptions};
use crate::qr::{game_url, write_qr_code};
use buffer::{Block, MarkupBuffer};
use shakmaty::Color;
use std::path::{Path, PathBuf};

pub use dialect::{Diagram, Dialect, TitleBlock};
pub use latex::Latex;
pub use typst::Typst;

/// Single-use renderer for one game.
///
/// `render` builds the document once and returns the cached markup on every
/// later call; the QR code file is written at most once.
pub struct Renderer<D: Dialect> {
    dialect: D,
    options: RenderOptions,
    game: Game,
    out: MarkupBuffer,
    qr_written: bool,
    markup: Option<String>,
}

impl<D: Dialect> Renderer<D> {
    /// Parses `options.pgn`.
    pub fn new(dialect: D, options: RenderOptions) -> Result<Self> {
        let game = parse_game(&options.pgn)?;
        Ok(Self::with_game(dialect, game, options))
    }

    /// Renders an already parsed game; `options.pgn` is ignored.
    pub fn with_game(dialect: D, game: Game, options: RenderOptions) -> Self {
        Self {
            dialect,
            options,
            game,
            out: MarkupBuffer::new(),
            qr_written: false,
            markup: None,
        }
    }

    pub fn render(&mut self) -> Result<&str> {
        if self.markup.is_none() {
            let markup = self.build()?;
            self.markup = Some(markup);
        }
        Ok(self.markup.as_deref().unwrap_or_default())
    }

    fn build(&mut self) -> Result<String> {
        tracing::debug!(
            dialect = self.dialect.name(),
            moves = self.game.main_line.moves.len(),
            "rendering game"
        );

        let qr_image = self.write_qr_code()?;
        self.make_title(qr_image.as_deref())?;

        let mut writer = LineWriter {
            dialect: &self.dialect,
            options: &self.options,
            start_ply: self.game.start_ply(),
            out: &mut self.out,
        };

        if !self.options.skip_comments
            && let Some(comment) = &self.game.comment
        {
            writer.comment(comment, 0);
        }
        writer.line(&self.game.main_line, 0);
        writer.result(self.game.result());
        writer.out.push_str(self.dialect.closing());

        Ok(std::mem::take(&mut self.out).into_string())
    }

    /// Writes the QR code when the options link the game online, returning
    /// the image path to embed.
    fn write_qr_code(&mut self) -> Result<Option<PathBuf>> {
        let requested = self.options.links_game()
            && (self.dialect.requires_qr_file() || self.options.qrcode_filename().is_some());
        if !requested {
            return Ok(None);
        }

        let (Some(cohort), Some(id), Some(path)) = (
            self.options.cohort(),
            self.options.id(),
            self.options.qrcode_filename(),
        ) else {
            let missing: Vec<&str> = [
                ("cohort", self.options.cohort().is_none()),
                ("id", self.options.id().is_none()),
                ("qrcodeFilename", self.options.qrcode_filename().is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(RenderError::MissingQrFields {
                missing: missing.join("/"),
            });
        };

        if !self.qr_written {
            write_qr_code(path, &game_url(cohort, id))?;
            self.qr_written = true;
        }
        Ok(Some(path.to_path_buf()))
    }

    /// Starts the document. Only valid on an empty buffer.
    fn make_title(&mut self, qr_image: Option<&Path>) -> Result<()> {
        if !self.out.is_empty() {
            return Err(RenderError::TitleAlreadyBuilt {
                len: self.out.len(),
            });
        }

        let headers = &self.game.headers;
        let title = TitleBlock {
            white: player(headers.get("White"), headers.get("WhiteElo")),
            black: player(headers.get("Black"), headers.get("BlackElo")),
            date: headers.get("Date").unwrap_or("Unknown Date"),
            annotator: self.options.orientation,
            qr_image,
            show_title: !self.options.skip_header,
        };

        let preamble = self.dialect.preamble(&title);
        self.out.push_str(&preamble);
        Ok(())
    }
}

/// `Name (Elo)`, `Name`, or `NN` for an unknown player.
fn player(name: Option<&str>, elo: Option<&str>) -> String {
    let name = name.unwrap_or("NN");
    match elo {
        Some(elo) => format!("{name} ({elo})"),
        None => name.to_string(),
    }
}

fn result_text(result: Option<&str>) -> Option<&'static str> {
    match result? {
        "1-0" => Some("1-0 White Wins"),
        "0-1" => Some("0-1 Black Wins"),
        "1/2-1/2" => Some("1/2-1/2 Draw"),
        _ => None,
    }
}

/// Recursive move-tree walk shared by every dialect.
struct LineWriter<'a, D: Dialect> {
    dialect: &'a D,
    options: &'a RenderOptions,
    start_ply: u32,
    out: &'a mut MarkupBuffer,
}

impl<D: Dialect> LineWriter<'_, D> {
    fn open_block(&mut self, block: Block) {
        self.out.push_str(self.dialect.open_block(block));
        self.out.enter(block);
    }

    fn close_block(&mut self) {
        if let Some(block) = self.out.leave() {
            self.out.push_str(self.dialect.close_block(block));
        }
    }

    /// Depth 0 is the main line, depth 1 a direct alternative to it; deeper
    /// variations are boxed.
    fn begin_line(&mut self, depth: usize) {
        self.out.push_str("\n\n");
        if depth > 1 {
            self.open_block(Block::Variation);
        }
    }

    fn end_line(&mut self, depth: usize) {
        if depth > 1 {
            self.close_block();
        }
    }

    fn pause_line(&mut self, depth: usize) {
        if depth == 0 {
            self.end_line(depth);
        }
    }

    fn resume_line(&mut self, depth: usize) {
        if depth == 0 {
            self.out.push_str(self.dialect.resume_spacing());
            self.begin_line(depth);
        }
    }

    fn comment(&mut self, text: &str, depth: usize) {
        if depth == 0 {
            let markup = self.dialect.main_line_comment(text);
            self.out.push_str(&markup);
            return;
        }

        self.out.push_str("\n");
        self.open_block(Block::Comment);
        let escaped = self.dialect.escape(text.trim());
        self.out.push_str(&escaped);
        self.close_block();
        self.out.push_str("\n");
    }

    fn line(&mut self, line: &Line, depth: usize) {
        self.begin_line(depth);

        let comments = !self.options.skip_comments;
        let variations = !self.options.skip_variations;
        let every = self.options.ply_between_diagrams.get();

        let mut force_move_number = true;
        for (index, node) in line.moves.iter().enumerate() {
            if self.options.skip_null_moves && node.is_null() {
                break;
            }

            if comments && let Some(comment) = &node.comment_before {
                self.pause_line(depth);
                self.comment(comment, depth);
                self.resume_line(depth);
                force_move_number = true;
            }

            self.move_number(node, depth, force_move_number);
            self.move_notation(node, depth, index + 1 < line.moves.len());
            force_move_number = false;

            let show_diagram = index > 0 && node.ply.saturating_sub(self.start_ply) % every == 0;
            let comment_after = node.comment_after.as_deref().filter(|_| comments);

            if comment_after.is_some()
                || (variations && !node.variations.is_empty())
                || show_diagram
            {
                self.pause_line(depth);
                force_move_number = true;
            }

            if show_diagram {
                self.diagram(node);
            }

            if let Some(comment) = comment_after {
                self.comment(comment, depth);
            }

            if variations {
                for variation in &node.variations {
                    self.line(variation, depth + 1);
                }
            }

            if force_move_number {
                self.resume_line(depth);
            }
        }

        self.end_line(depth);
    }

    /// White moves always carry their number, Black moves only after a break.
    fn move_number(&mut self, node: &MoveNode, depth: usize, show_black: bool) {
        let dots = match node.color {
            Color::White => ".",
            Color::Black if show_black => "...",
            Color::Black => return,
        };
        let markup = self
            .dialect
            .move_number(node.move_number(), dots, depth == 0);
        self.out.push_str(&markup);
    }

    fn move_notation(&mut self, node: &MoveNode, depth: usize, has_next: bool) {
        let mut run = self.dialect.move_text(&node.san);
        if !self.options.skip_nags {
            run.push_str(&crate::chess::nag::glyph_run(&node.nags));
        }

        if depth == 0 {
            run = self.dialect.bold(&run);
        }
        self.out.push_str(&run);

        if has_next || node.comment_after.is_some() {
            self.out.push_str(self.dialect.move_space());
            if node.color == Color::Black && node.comment_after.is_none() {
                self.out.push_str(self.dialect.move_space());
            }
        }
    }

    fn diagram(&mut self, node: &MoveNode) {
        let (arrows, fields): (&[String], &[String]) = if self.options.skip_drawables {
            (&[], &[])
        } else {
            (&node.drawables.arrows, &node.drawables.fields)
        };

        let diagram = Diagram {
            fen: &node.fen,
            flipped: self.options.orientation == Orientation::Black,
            highlight: [node.from.as_str(), node.to.as_str()]
                .into_iter()
                .filter(|square| !square.is_empty())
                .collect(),
            arrows,
            fields,
        };
        let markup = self.dialect.diagram(&diagram);

        if !self.dialect.diagram_leaves_blocks() {
            self.out.push_str(&markup);
            return;
        }

        let open = self.out.take_open();
        for block in open.iter().rev() {
            self.out.push_str(self.dialect.close_block(*block));
        }
        self.out.push_str(&markup);
        for block in open {
            self.open_block(block);
        }
    }

    fn result(&mut self, result: Option<&str>) {
        if let Some(text) = result_text(result) {
            let markup = self.dialect.result_line(text);
            self.out.push_str(&markup);
        }
    }
}

/// Renders `options.pgn` as a LaTeX document.
pub fn render_latex(options: RenderOptions) -> Result<String> {
    let mut renderer = Renderer::new(Latex, options)?;
    Ok(renderer.render()?.to_string())
}

/// Renders `options.pgn` as a Typst document.
pub fn render_typst(options: RenderOptions) -> Result<String> {
    let mut renderer = Renderer::new(Typst, options)?;
    Ok(renderer.render()?.to_string())
}
