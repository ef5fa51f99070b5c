//! Annotated PGN games rendered as printable LaTeX or Typst documents.
//!
//! ```no_run
//! use pgn_typeset::{RenderOptions, render_typst};
//!
//! let options = RenderOptions::from_json(r#"{"pgn": "1. e4 e5 *"}"#)?;
//! let markup = render_typst(options)?;
//! # Ok::<(), pgn_typeset::RenderError>(())
//! ```

pub mod chess;
pub mod error;
pub mod input;
pub mod options;
pub mod qr;
pub mod render;

pub use chess::{Game, parse_game};
pub use error::{RenderError, Result};
pub use options::{Orientation, RenderOptions};
pub use render::{Dialect, Latex, Renderer, Typst, render_latex, render_typst};
