//! Numeric annotation glyphs.

use std::cmp::Ordering;

/// Glyph for a NAG code, `None` for codes without a printable glyph.
pub fn nag_label(code: u8) -> Option<&'static str> {
    let label = match code {
        1 => "!", // good move
        2 => "?", // mistake
        3 => "!!", // brilliant move
        4 => "??", // blunder
        5 => "!?", // interesting move
        6 => "?!", // dubious move
        7 => "□", // only move
        10..=12 => "=", // equal position
        13 => "∞", // unclear position
        14 => "⩲", // white is slightly better
        15 => "⩱", // black is slightly better
        16 => "±", // white is better
        17 => "∓", // black is better
        18 => "+−", // white is winning
        19 => "−+", // black is winning
        22 | 23 => "⨀", // zugzwang
        26 | 27 => "○", // space advantage
        32 | 33 => "⟳", // development advantage
        36 | 37 => "↑", // initiative
        40 | 41 => "→", // attack
        44 | 45 => "=∞", // compensation
        132 | 133 => "⇆", // counterplay
        138 | 139 => "⨁", // time pressure
        140 => "∆", // with the idea
        146 => "N", // novelty
        _ => return None,
    };
    Some(label)
}

/// Display order of glyphs: ascending code, so move quality (`$1`-`$7`)
/// precedes evaluations (`$10`-`$19`) and positional symbols.
pub fn compare_nags(lhs: &u8, rhs: &u8) -> Ordering {
    lhs.cmp(rhs)
}

/// Concatenated labels of the known glyphs in display order.
pub fn glyph_run(nags: &[u8]) -> String {
    let mut sorted = nags.to_vec();
    sorted.sort_by(compare_nags);

    sorted
        .into_iter()
        .filter_map(nag_label)
        .collect()
}
