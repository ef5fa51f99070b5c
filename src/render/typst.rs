use super::buffer::Block;
use super::dialect::{Diagram, Dialect, TitleBlock, split_arrow};
use std::fmt::Write;

/// Typst output using the `board-n-pieces` package.
#[derive(Debug, Clone, Copy, Default)]
pub struct Typst;

const STATIC_HEADER: &str = r#"
#import "@preview/board-n-pieces:0.5.0": *

#set page(
    margin: (x: 1.25cm, y: 1.5cm),
    columns: 2,
)

#set text(font: "New Computer Modern")

#set par(justify: true, spacing: 0.75em)

#let variation(doc) = [
    #grid(columns: (5%, 95%), [], [#doc])
]
"#;

impl Dialect for Typst {
    fn name(&self) -> &'static str {
        "typst"
    }

    fn extension(&self) -> &'static str {
        "typ"
    }

    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            let opens_comment = c == '/' && matches!(chars.peek(), Some('/' | '*'));
            if opens_comment
                || matches!(c, '\\' | '#' | '$' | '[' | ']' | '*' | '_' | '`' | '<' | '@')
            {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    fn move_text(&self, san: &str) -> String {
        san.replace('#', r"\#")
    }

    fn bold(&self, text: &str) -> String {
        format!("*{text}*")
    }

    fn move_number(&self, number: u32, dots: &str, bold: bool) -> String {
        if bold {
            format!("*{number}{dots}*")
        } else {
            format!("{number}{dots}")
        }
    }

    fn move_space(&self) -> &'static str {
        " "
    }

    fn resume_spacing(&self) -> &'static str {
        "#pad(top: 0.25em)[]"
    }

    fn open_block(&self, _block: Block) -> &'static str {
        "#variation[\n"
    }

    fn close_block(&self, _block: Block) -> &'static str {
        "]\n\n"
    }

    fn main_line_comment(&self, text: &str) -> String {
        format!(
            "\n\n#par(first-line-indent: 1em)[{}]\n\n",
            self.escape(text.trim())
        )
    }

    /// board-n-pieces draws arrows in a single color and has one marking
    /// color, so highlighted squares join the move's own marked squares.
    fn diagram(&self, diagram: &Diagram<'_>) -> String {
        let mut marked: Vec<&str> = diagram.highlight.clone();
        for square in diagram.fields.iter().filter_map(|field| field.get(1..)) {
            if !marked.contains(&square) {
                marked.push(square);
            }
        }

        let mut out = String::from("\n\n#align(center)[");
        let _ = write!(
            out,
            "#board(fen(\"{}\"),\
             display-numbers: true,\
             white-square-fill: rgb(\"#d4e0e5\"),\
             black-square-fill: rgb(\"#789ab0\"),\
             marking-color: rgb(\"#bdd687\"),\
             marked-white-square-background: rect(fill: rgb(\"#bbd585\")),\
             marked-black-square-background: rect(fill: rgb(\"#86ad68\")),\
             reverse: {},\
             marked-squares: \"{}\",",
            diagram.fen,
            diagram.flipped,
            marked.join(" ")
        );

        let arrows: Vec<String> = diagram
            .arrows
            .iter()
            .filter_map(|arrow| arrow.get(1..))
            .filter_map(split_arrow)
            .map(|(from, to)| format!("\"{from} {to}\""))
            .collect();
        if !arrows.is_empty() {
            let _ = write!(out, "arrows: ({}),", arrows.join(","));
        }

        out.push_str(")]\n\n");
        out
    }

    fn diagram_leaves_blocks(&self) -> bool {
        true
    }

    fn requires_qr_file(&self) -> bool {
        false
    }

    fn preamble(&self, title: &TitleBlock<'_>) -> String {
        let mut out = String::from(STATIC_HEADER);
        if !title.show_title {
            return out;
        }

        let _ = write!(
            out,
            "\n#place(top + center, scope: \"parent\", float: true, clearance: 2em)[\n\
             = {} - {}\n\
             == {}\n\
             === Notes by {}\n",
            self.escape(&title.white),
            self.escape(&title.black),
            self.escape(title.date),
            title.annotator
        );

        if let Some(qr) = title.qr_image {
            // Typst resolves images relative to the document, which sits next to the QR file.
            let image = qr
                .file_name()
                .map(|name| name.to_string_lossy())
                .unwrap_or_else(|| qr.to_string_lossy());
            let _ = write!(
                out,
                r#"#figure(
    image("{image}", width: 30%),
    caption: [View on ChessDojo.club],
    numbering: none,
    gap: 0em,
)
"#
            );
        }
        out.push(']');
        out
    }

    fn result_line(&self, result: &str) -> String {
        format!(
            "\n\n#pad(top: 2em)[#align(center)[{}]]\n",
            self.bold(result)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Orientation;
    use std::path::Path;

    #[test]
    fn test_escape_markup_characters() {
        assert_eq!(Typst.escape("#1 [draw] $5"), r"\#1 \[draw\] \$5");
        assert_eq!(Typst.escape("a_b*c"), r"a\_b\*c");
    }

    #[test]
    fn test_escape_comment_openers() {
        assert_eq!(Typst.escape("good // strong"), r"good \// strong");
        assert_eq!(Typst.escape("a /* b"), r"a \/\* b");
        assert_eq!(Typst.escape("1/2"), "1/2");
        assert_eq!(
            Typst.main_line_comment("good // strong"),
            "\n\n#par(first-line-indent: 1em)[good \\// strong]\n\n"
        );
    }

    #[test]
    fn test_move_text_escapes_mate() {
        assert_eq!(Typst.move_text("Qh7#"), r"Qh7\#");
    }

    #[test]
    fn test_diagram_merges_fields_into_marked_squares() {
        let arrows = vec!["Ge2e4".to_string(), "Rd7d5".to_string()];
        let fields = vec!["Yd4".to_string(), "Re4".to_string()];
        let diagram = Diagram {
            fen: "8/8/8/8/8/8/8/4K2k w - - 0 1",
            flipped: false,
            highlight: vec!["e2", "e4"],
            arrows: &arrows,
            fields: &fields,
        };

        let typ = Typst.diagram(&diagram);
        assert!(typ.contains(r#"fen("8/8/8/8/8/8/8/4K2k w - - 0 1")"#));
        assert!(typ.contains("reverse: false,"));
        assert!(typ.contains(r#"marked-squares: "e2 e4 d4","#));
        assert!(typ.contains(r#"arrows: ("e2 e4","d7 d5"),"#));
        assert!(typ.ends_with(")]\n\n"));
    }

    #[test]
    fn test_preamble_title_and_qr_image() {
        let qr = Path::new("/tmp/abc.png");
        let title = TitleBlock {
            white: "Alice [GM]".to_string(),
            black: "Bob".to_string(),
            date: "Unknown Date",
            annotator: Orientation::White,
            qr_image: Some(qr),
            show_title: true,
        };

        let typ = Typst.preamble(&title);
        assert!(typ.contains(r"= Alice \[GM\] - Bob"));
        assert!(typ.contains("== Unknown Date"));
        assert!(typ.contains("=== Notes by White"));
        assert!(typ.contains(r#"image("abc.png", width: 30%)"#));
        assert!(typ.ends_with(']'));
    }

    #[test]
    fn test_preamble_skip_header_keeps_setup() {
        let title = TitleBlock {
            white: "NN".to_string(),
            black: "NN".to_string(),
            date: "Unknown Date",
            annotator: Orientation::White,
            qr_image: None,
            show_title: false,
        };

        let typ = Typst.preamble(&title);
        assert!(typ.contains("#let variation(doc)"));
        assert!(!typ.contains("#place("));
    }
}
