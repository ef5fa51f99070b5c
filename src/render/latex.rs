use super::buffer::Block;
use super::dialect::{Diagram, Dialect, TitleBlock, board_color, group_by_color, split_arrow};
use std::fmt::Write;

/// LaTeX output for pdflatex with xskak, chessboard and the merida fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latex;

const STATIC_HEADER: &str = r#"\documentclass{article}
\usepackage{xskak}
\usepackage{multicol}
\usepackage[a4paper]{geometry}
\usepackage[skip=0pt]{parskip}
\usepackage{changepage}
\usepackage[autostyle, english = american]{csquotes}
\usepackage[dvipsnames]{xcolor}
\usepackage[LSF,T1]{fontenc}
\usepackage{graphicx}
\usepackage[skip=0pt]{caption}
\usepackage{titling}
\usepackage{etoolbox}
\AtBeginEnvironment{variationInterrupt}{\partopsep2pt}

\newenvironment{board}
 {\parskip=0em\par\nopagebreak\centering}
 {\parskip=1em\par\noindent\ignorespacesafterend}

\graphicspath{{./}}

\newcommand{\forceindent}{\leavevmode{\parindent=1em\indent}}

\newenvironment{variationInterrupt}
{
    \begin{adjustwidth}{.05\linewidth}{}
}
{
    \end{adjustwidth}
}

\definecolor{good}{HTML}{21c43a}
\definecolor{mistake}{HTML}{e69d00}
\definecolor{brilliant}{HTML}{22ac38}
\definecolor{blunder}{HTML}{df5353}
\definecolor{interesting}{HTML}{f075e1}
\definecolor{dubious}{HTML}{53b2ea}
\definecolor{eval}{HTML}{800080}
\MakeOuterQuote{"}

\geometry{left=1.25cm,right=1.25cm,top=1.5cm,bottom=1.5cm,columnsep=1.2cm}

\pdfmapfile{+chess.map}
\setchessboard{boardfontfamily=merida}
\setfigfontfamily{merida}

\pretitle{%
  \begin{center}
  \Huge\bfseries
}
\posttitle{%
  \end{center}%
}
\predate{%
    \begin{center}
    \Large
}
\postdate{%
    \end{center}%
}
\preauthor{%
  \begin{center}
    \huge \lineskip 0.75em%
}
\postauthor{%
  \end{center}%
}

"#;

const BOARD_STYLE: &str = r"\begin{multicols}{2}

\storechessboardstyle{diagram}{%
    pgfstyle=color,
    color=yellow!40,
    moversize=0.75em
}
\setchessboard{style=diagram}

";

impl Dialect for Latex {
    fn name(&self) -> &'static str {
        "latex"
    }

    fn extension(&self) -> &'static str {
        "tex"
    }

    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\\' => out.push_str(r"\textbackslash{}"),
                '~' => out.push_str(r"\textasciitilde{}"),
                '^' => out.push_str(r"\textasciicircum{}"),
                '#' | '$' | '%' | '&' | '_' | '{' | '}' => {
                    out.push('\\');
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
        out
    }

    /// Piece letters become figurines.
    fn move_text(&self, san: &str) -> String {
        let mut out = String::with_capacity(san.len() * 2);
        for c in san.chars() {
            match c {
                'K' | 'Q' | 'R' | 'B' | 'N' => {
                    let _ = write!(out, r"\figsymbol{{{c}}}");
                }
                '#' => out.push_str(r"\#"),
                _ => out.push(c),
            }
        }
        out
    }

    fn bold(&self, text: &str) -> String {
        format!(r"\textbf{{{text}}}")
    }

    fn move_number(&self, number: u32, dots: &str, bold: bool) -> String {
        if bold {
            format!(r"\textbf{{{number}}}{dots}")
        } else {
            format!("{number}{dots}")
        }
    }

    fn move_space(&self) -> &'static str {
        r"\space "
    }

    fn resume_spacing(&self) -> &'static str {
        r"\vspace{1em}"
    }

    fn open_block(&self, _block: Block) -> &'static str {
        "\\begin{variationInterrupt}\n"
    }

    fn close_block(&self, _block: Block) -> &'static str {
        "\n\\end{variationInterrupt}\n"
    }

    fn main_line_comment(&self, text: &str) -> String {
        format!("\n\n\\forceindent {}\n\n", self.escape(text.trim()))
    }

    fn diagram(&self, diagram: &Diagram<'_>) -> String {
        let mut out = String::from("\n\n\\begin{board}\\chessboard[");
        if diagram.flipped {
            out.push_str("inverse,");
        }
        let _ = write!(out, "setfen={}", diagram.fen);
        if !diagram.highlight.is_empty() {
            let _ = write!(out, ",colorbackfields={{{}}}", diagram.highlight.join(","));
        }

        for (letter, arrows) in group_by_color(diagram.arrows) {
            let Some(color) = board_color(letter) else {
                tracing::warn!(%letter, "skipping arrows with unknown color");
                continue;
            };
            let moves: Vec<String> = arrows
                .into_iter()
                .filter_map(split_arrow)
                .map(|(from, to)| format!("{from}-{to}"))
                .collect();
            let _ = write!(
                out,
                ",pgfstyle=straightmove,color={color},markmoves={{{}}}",
                moves.join(",")
            );
        }

        for (letter, squares) in group_by_color(diagram.fields) {
            let Some(color) = board_color(letter) else {
                tracing::warn!(%letter, "skipping squares with unknown color");
                continue;
            };
            let _ = write!(
                out,
                ",pgfstyle=circle,color={color},markfields={{{}}}",
                squares.join(",")
            );
        }

        out.push_str("]\\end{board}\n\n");
        out
    }

    fn requires_qr_file(&self) -> bool {
        true
    }

    fn preamble(&self, title: &TitleBlock<'_>) -> String {
        let mut out = String::from(STATIC_HEADER);

        if let Some(qr) = title.qr_image {
            let _ = write!(
                out,
                r"\renewcommand\maketitlehookd{{
\vspace{{-15pt}}
\begin{{figure}}[h]
\centering
\includegraphics[scale=0.5]{{{}}}
\caption*{{View on ChessDojo.club}}
\end{{figure}}
}}

",
                qr.display()
            );
        }

        let _ = write!(
            out,
            "\n\\title{{{} - {}}}\n\\author{{{}}}\n\\date{{Notes by {}}}",
            self.escape(&title.white),
            self.escape(&title.black),
            self.escape(title.date),
            title.annotator
        );

        out.push_str("\n\\begin{document}\n");
        if title.show_title {
            out.push_str("\\maketitle");
        }
        out.push('\n');
        out.push_str(BOARD_STYLE);
        out
    }

    fn result_line(&self, result: &str) -> String {
        format!("\n\\begin{{center}} {} \\end{{center}}\n", self.bold(result))
    }

    fn closing(&self) -> &'static str {
        "\n\\end{multicols}\n\\end{document}\n"
    }
}
