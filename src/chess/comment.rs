use super::types::Drawables;
use std::sync::LazyLock;

/// `[%cmd payload]` embedded in a PGN comment.
static COMMAND_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\[%(\w+)\s*([^\]]*)\]").expect("valid comment command regex")
});

static WHITESPACE_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("valid whitespace regex"));

/// Comment text with its command payloads removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedComment {
    pub text: Option<String>,
    pub drawables: Drawables,
}

/// Splits a raw PGN comment into readable text and drawables.
///
/// `[%cal Ge2e4,Rd8d1]` yields arrows, `[%csl Gd4]` yields highlighted squares.
/// Any other command (`%clk`, `%eval`, `%emt`, ...) is dropped, and the remaining
/// text is whitespace-normalized.
pub fn parse_comment(raw: &str) -> ParsedComment {
    let mut drawables = Drawables::default();

    for caps in COMMAND_RE.captures_iter(raw) {
        let payload = &caps[2];
        match &caps[1] {
            "cal" => drawables.arrows.extend(codes(payload, 5)),
            "csl" => drawables.fields.extend(codes(payload, 3)),
            _ => {}
        }
    }

    let stripped = COMMAND_RE.replace_all(raw, " ");
    let text = WHITESPACE_RE.replace_all(stripped.trim(), " ");

    ParsedComment {
        text: (!text.is_empty()).then(|| text.into_owned()),
        drawables,
    }
}

fn codes(payload: &str, len: usize) -> impl Iterator<Item = String> + '_ {
    payload
        .split(',')
        .map(str::trim)
        .filter(move |code| code.len() == len && code.is_ascii())
        .map(str::to_string)
}

/// Joins comments that land on the same slot.
pub(crate) fn append_comment(slot: &mut Option<String>, text: String) {
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(&text);
        }
        None => *slot = Some(text),
    }
}
