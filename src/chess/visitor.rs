use super::comment::{ParsedComment, append_comment, parse_comment};
use super::types::{Drawables, Game, Headers, Line, MoveNode, NULL_MOVE_SAN};
use crate::error::{RenderError, Result};

use pgn_reader::{Nag, Outcome, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, File, FromSetup, Move, Position, Square,
};
use smallvec::SmallVec;
use std::io::Read;
use std::ops::ControlFlow;

/// Streaming PGN visitor (pgn-reader) that builds the full game tree.
///
/// Every SAN is replayed with shakmaty so each node knows the position after
/// it and the squares it moved between. Variations are parsed, not skipped:
/// the reader calls `begin_variation` right after the move the variation
/// replaces, so a new frame starts from the position before that move.
#[derive(Debug, Default)]
pub struct GameVisitor;

/// One line being collected, main line or variation.
struct Frame {
    moves: Vec<MoveNode>,
    position: Chess,
    before_last: Chess,
    next_ply: u32,
    pending_comment: Option<String>,
    pending_drawables: Drawables,
    after_variation: bool,
}

impl Frame {
    fn new(position: Chess, next_ply: u32) -> Self {
        Self {
            moves: Vec::new(),
            before_last: position.clone(),
            position,
            next_ply,
            pending_comment: None,
            pending_drawables: Drawables::default(),
            after_variation: false,
        }
    }

    /// Comments left dangling at the end of a line belong to its last move.
    fn finish(mut self) -> Line {
        if let Some(last) = self.moves.last_mut() {
            if let Some(text) = self.pending_comment.take() {
                append_comment(&mut last.comment_after, text);
            }
            last.drawables.extend(std::mem::take(&mut self.pending_drawables));
        }
        Line { moves: self.moves }
    }
}

pub struct TreeBuilder {
    headers: Headers,
    comment: Option<String>,
    outcome: Option<String>,
    frames: Vec<Frame>,
    /// Skipped variations whose closing `)` is still ahead.
    skipped: usize,
    /// Chunks of a comment too long for the reader's buffer.
    comment_bytes: Vec<u8>,
}

impl TreeBuilder {
    fn current(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn attach_comment(&mut self, parsed: ParsedComment) {
        let at_root = self.frames.len() == 1;
        let frame = self.current();

        if frame.moves.is_empty() && at_root {
            if let Some(text) = parsed.text {
                append_comment(&mut self.comment, text);
            }
            return;
        }

        if frame.moves.is_empty() || frame.after_variation {
            if let Some(text) = parsed.text {
                append_comment(&mut frame.pending_comment, text);
            }
            frame.pending_drawables.extend(parsed.drawables);
            return;
        }

        if let Some(last) = frame.moves.last_mut() {
            if let Some(text) = parsed.text {
                append_comment(&mut last.comment_after, text);
            }
            last.drawables.extend(parsed.drawables);
        }
    }

    fn close_variation(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let line = frame.finish();
        let parent = self.current();
        if let Some(last) = parent.moves.last_mut() {
            last.variations.push(line);
        }
        parent.after_variation = true;
    }

    fn play(&mut self, san_plus: SanPlus) -> Result<()> {
        let frame = self.current();
        let ply = frame.next_ply;
        let color = frame.position.turn();

        let (next, san, from, to) = if matches!(san_plus.san, San::Null) {
            let next = pass_turn(&frame.position)?;
            (next, NULL_MOVE_SAN.to_string(), String::new(), String::new())
        } else {
            let m = san_plus.san.to_move(&frame.position).map_err(|e| {
                RenderError::InvalidPgn(format!("illegal move '{san_plus}' at ply {ply}: {e}"))
            })?;
            let (from, to) = move_squares(&m);
            let mut next = frame.position.clone();
            next.play_unchecked(m);
            (next, san_plus.to_string(), from.to_string(), to.to_string())
        };

        let fen = Fen::from_position(&next, EnPassantMode::Legal).to_string();
        let before = std::mem::replace(&mut frame.position, next);
        frame.before_last = before;
        frame.next_ply += 1;
        frame.after_variation = false;

        frame.moves.push(MoveNode {
            ply,
            color,
            san,
            fen,
            from,
            to,
            comment_before: frame.pending_comment.take(),
            comment_after: None,
            nags: SmallVec::new(),
            drawables: std::mem::take(&mut frame.pending_drawables),
            variations: Vec::new(),
        });
        Ok(())
    }

    fn into_game(mut self) -> Game {
        while self.frames.len() > 1 {
            self.close_variation();
        }
        let main_line = self.frames.pop().map(Frame::finish).unwrap_or_default();

        Game {
            headers: self.headers,
            comment: self.comment,
            main_line,
            outcome: self.outcome,
        }
    }
}

/// Castling is reported with the king's destination square (`e1`-`g1`).
fn move_squares(m: &Move) -> (Square, Square) {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            (king, Square::from_coords(file, king.rank()))
        }
        _ => (m.from().unwrap_or(m.to()), m.to()),
    }
}

/// Position after a null move: same board, other side to move.
fn pass_turn(position: &Chess) -> Result<Chess> {
    let mut setup = position.to_setup(EnPassantMode::Legal);
    setup.turn = !setup.turn;
    setup.ep_square = None;
    if setup.turn == Color::White {
        setup.fullmoves = setup.fullmoves.saturating_add(1);
    }
    Chess::from_setup(setup, CastlingMode::Standard)
        .map_err(|e| RenderError::InvalidPgn(format!("null move not playable here: {e}")))
}

fn start_position(headers: &Headers) -> Result<(Chess, u32)> {
    let position = match headers.get("FEN") {
        Some(fen) => {
            let fen: Fen = fen
                .trim()
                .parse()
                .map_err(|e| RenderError::InvalidPgn(format!("FEN tag '{fen}': {e}")))?;
            let position: Chess = fen
                .into_position(CastlingMode::Standard)
                .map_err(|e| RenderError::InvalidPgn(format!("FEN tag position: {e}")))?;
            position
        }
        None => Chess::default(),
    };

    let fullmoves = position.fullmoves().get();
    let first_ply = 2 * (fullmoves - 1) + if position.turn().is_white() { 1 } else { 2 };
    Ok((position, first_ply))
}

impl Visitor for GameVisitor {
    type Tags = Headers;
    type Movetext = TreeBuilder;
    type Output = Result<Game>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Headers::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let key = String::from_utf8_lossy(key);
        let value = String::from_utf8_lossy(value.as_bytes());
        tags.insert(&key, &value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let (position, first_ply) = match start_position(&tags) {
            Ok(start) => start,
            Err(e) => return ControlFlow::Break(Err(e)),
        };

        ControlFlow::Continue(TreeBuilder {
            headers: tags,
            comment: None,
            outcome: None,
            frames: vec![Frame::new(position, first_ply)],
            skipped: 0,
            comment_bytes: Vec::new(),
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        match movetext.play(san) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => ControlFlow::Break(Err(e)),
        }
    }

    fn nag(&mut self, movetext: &mut Self::Movetext, nag: Nag) -> ControlFlow<Self::Output> {
        if let Some(last) = movetext.current().moves.last_mut() {
            last.nags.push(nag.0);
        }
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        movetext.comment_bytes.extend_from_slice(comment.as_bytes());
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        movetext.comment_bytes.extend_from_slice(comment.as_bytes());
        let bytes = std::mem::take(&mut movetext.comment_bytes);
        let raw = String::from_utf8_lossy(&bytes);
        movetext.attach_comment(parse_comment(&raw));
        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        let parent = movetext.current();
        let Some(replaced) = parent.moves.last() else {
            tracing::warn!("skipping variation without a move to replace");
            movetext.skipped += 1;
            return ControlFlow::Continue(Skip(true));
        };

        let frame = Frame::new(parent.before_last.clone(), replaced.ply);
        movetext.frames.push(frame);
        ControlFlow::Continue(Skip(false))
    }

    fn end_variation(&mut self, movetext: &mut Self::Movetext) -> ControlFlow<Self::Output> {
        // The reader still reports the end of a skipped variation.
        if movetext.skipped > 0 {
            movetext.skipped -= 1;
            return ControlFlow::Continue(());
        }
        movetext.close_variation();
        ControlFlow::Continue(())
    }

    fn outcome(
        &mut self,
        movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        movetext.outcome = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        Ok(movetext.into_game())
    }
}

/// Parses the first game of a PGN string.
pub fn parse_game(pgn: &str) -> Result<Game> {
    let mut reader = Reader::new(pgn.as_bytes());
    read_next_game(&mut reader)?
        .ok_or_else(|| RenderError::InvalidPgn("no game found".to_string()))
}

/// Reads the next game of a stream, `None` once the stream is exhausted.
pub fn read_next_game<R: Read>(reader: &mut Reader<R>) -> Result<Option<Game>> {
    let mut visitor = GameVisitor;
    match reader.read_game(&mut visitor) {
        Ok(Some(game)) => game.map(Some),
        Ok(None) => Ok(None),
        Err(e) => Err(RenderError::InvalidPgn(e.to_string())),
    }
}
