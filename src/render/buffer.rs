/// A nested markup block that must be closed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    /// Indented box around a variation at depth 2 or deeper.
    Variation,
    /// Indented box around a comment inside a variation.
    Comment,
}

/// Append-only markup output with a stack of open blocks.
///
/// The buffer only tracks which blocks are open; the dialect decides how
/// they are spelled.
#[derive(Debug, Default)]
pub struct MarkupBuffer {
    text: String,
    open: Vec<Block>,
}

impl MarkupBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub fn enter(&mut self, block: Block) {
        self.open.push(block);
    }

    /// Pops the innermost open block.
    pub fn leave(&mut self) -> Option<Block> {
        self.open.pop()
    }

    /// Takes every open block, outermost first.
    pub fn take_open(&mut self) -> Vec<Block> {
        std::mem::take(&mut self.open)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
