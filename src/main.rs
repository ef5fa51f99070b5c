use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use pgn_typeset::input::{self, Compression};
use pgn_typeset::{Dialect, Game, Latex, Orientation, RenderOptions, Renderer, Typst};
use std::fs;
use std::io::{self, Write};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PGN_TYPESET_LOG";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Latex,
    Typst,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Side {
    White,
    Black,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompressionArg {
    Zstd,
}

/// Render annotated PGN games as LaTeX or Typst documents.
#[derive(Debug, Parser)]
#[command(name = "pgn-typeset", version)]
struct Cli {
    /// PGN files or glob patterns. Without any, the request's `pgn` field is rendered.
    inputs: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Latex)]
    format: Format,

    /// JSON render request with camelCase option names.
    #[arg(long)]
    request: Option<PathBuf>,

    /// Directory for rendered documents. Defaults to each input's directory,
    /// or stdout when rendering a request.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Decompress every input regardless of its extension.
    #[arg(long, value_enum)]
    compression: Option<CompressionArg>,

    #[arg(long, value_enum)]
    orientation: Option<Side>,

    #[arg(long)]
    skip_comments: bool,

    #[arg(long)]
    skip_variations: bool,

    #[arg(long)]
    skip_null_moves: bool,

    #[arg(long)]
    skip_nags: bool,

    #[arg(long)]
    skip_drawables: bool,

    #[arg(long)]
    skip_header: bool,

    #[arg(long)]
    ply_between_diagrams: Option<NonZeroU32>,

    #[arg(long)]
    cohort: Option<String>,

    #[arg(long)]
    id: Option<String>,

    /// Where to write the QR code PNG linking the game online.
    #[arg(long)]
    qrcode: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> anyhow::Result<RenderOptions> {
        let mut options = match &self.request {
            Some(path) => {
                let payload = fs::read_to_string(path)
                    .with_context(|| format!("reading request '{}'", path.display()))?;
                RenderOptions::from_json(&payload)
                    .with_context(|| format!("parsing request '{}'", path.display()))?
            }
            None => RenderOptions::default(),
        };

        if let Some(side) = self.orientation {
            options.orientation = match side {
                Side::White => Orientation::White,
                Side::Black => Orientation::Black,
            };
        }
        options.skip_comments |= self.skip_comments;
        options.skip_variations |= self.skip_variations;
        options.skip_null_moves |= self.skip_null_moves;
        options.skip_nags |= self.skip_nags;
        options.skip_drawables |= self.skip_drawables;
        options.skip_header |= self.skip_header;
        if let Some(every) = self.ply_between_diagrams {
            options.ply_between_diagrams = every;
        }
        if self.cohort.is_some() {
            options.cohort.clone_from(&self.cohort);
        }
        if self.id.is_some() {
            options.id.clone_from(&self.id);
        }
        if self.qrcode.is_some() {
            options.qrcode_filename.clone_from(&self.qrcode);
        }

        Ok(options)
    }

    fn compression(&self) -> Compression {
        match self.compression {
            Some(CompressionArg::Zstd) => Compression::Zstd,
            None => Compression::Auto,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn render(format: Format, game: Game, options: RenderOptions) -> pgn_typeset::Result<String> {
    match format {
        Format::Latex => render_with(Latex, game, options),
        Format::Typst => render_with(Typst, game, options),
    }
}

fn render_with<D: Dialect>(
    dialect: D,
    game: Game,
    options: RenderOptions,
) -> pgn_typeset::Result<String> {
    let mut renderer = Renderer::with_game(dialect, game, options);
    Ok(renderer.render()?.to_owned())
}

fn extension(format: Format) -> &'static str {
    match format {
        Format::Latex => Latex.extension(),
        Format::Typst => Typst.extension(),
    }
}

/// `games.pgn.zst` → `games`.
fn document_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "game".to_string());
    let name = name.strip_suffix(".zst").unwrap_or(&name);
    name.strip_suffix(".pgn").unwrap_or(name).to_string()
}

fn document_path(dir: &Path, stem: &str, index: usize, total: usize, ext: &str) -> PathBuf {
    if total == 1 {
        dir.join(format!("{stem}.{ext}"))
    } else {
        dir.join(format!("{stem}-{index}.{ext}"))
    }
}

/// A game link (and its QR code) identifies one game, so it cannot be shared
/// by every game of a multi-game file.
fn check_game_link(options: &RenderOptions, games: usize, path: &Path) -> anyhow::Result<()> {
    if games > 1 && options.links_game() {
        bail!(
            "'{}' holds {games} games, but --cohort/--id link a single game",
            path.display()
        );
    }
    Ok(())
}

fn render_request(cli: &Cli, options: RenderOptions) -> anyhow::Result<()> {
    if options.pgn.trim().is_empty() {
        bail!("nothing to render: pass PGN files or a request with a `pgn` field");
    }

    let game = pgn_typeset::parse_game(&options.pgn).context("parsing request PGN")?;
    let markup = render(cli.format, game, options)?;

    match &cli.out_dir {
        Some(dir) => {
            let path = document_path(dir, "game", 1, 1, extension(cli.format));
            fs::write(&path, markup)
                .with_context(|| format!("writing '{}'", path.display()))?;
        }
        None => io::stdout().write_all(markup.as_bytes())?,
    }
    Ok(())
}

fn render_files(cli: &Cli, options: &RenderOptions) -> anyhow::Result<()> {
    let ext = extension(cli.format);

    for pattern in &cli.inputs {
        for path in input::expand_paths(pattern)? {
            let games = input::read_games_from_path(&path, cli.compression())
                .with_context(|| format!("reading '{}'", path.display()))?;

            let dir = match &cli.out_dir {
                Some(dir) => dir.clone(),
                None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
            };
            let stem = document_stem(&path);
            let total = games.len();
            check_game_link(options, total, &path)?;

            for (index, game) in games.into_iter().enumerate() {
                let out = document_path(&dir, &stem, index + 1, total, ext);
                let markup = render(cli.format, game, options.clone()).with_context(|| {
                    format!("rendering game {} of '{}'", index + 1, path.display())
                })?;
                fs::write(&out, markup)
                    .with_context(|| format!("writing '{}'", out.display()))?;
                tracing::info!(output = %out.display(), "rendered game");
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let options = cli.options()?;

    if let Some(dir) = &cli.out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating '{}'", dir.display()))?;
    }

    if cli.inputs.is_empty() {
        render_request(&cli, options)
    } else {
        render_files(&cli, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_stem_strips_pgn_and_zst() {
        assert_eq!(document_stem(Path::new("dir/games.pgn.zst")), "games");
        assert_eq!(document_stem(Path::new("games.pgn")), "games");
        assert_eq!(document_stem(Path::new("notes.txt")), "notes.txt");
    }

    #[test]
    fn test_game_link_rejected_for_multi_game_files() {
        let path = Path::new("games.pgn");
        let mut options = RenderOptions {
            cohort: Some("1500-1600".to_string()),
            id: Some("abc".to_string()),
            ..RenderOptions::default()
        };

        assert!(check_game_link(&options, 1, path).is_ok());
        let err = check_game_link(&options, 2, path).unwrap_err();
        assert!(err.to_string().contains("holds 2 games"));

        options.id = None;
        assert!(check_game_link(&options, 2, path).is_ok());
    }

    #[test]
    fn test_document_path_numbers_multi_game_files() {
        let dir = Path::new("out");
        assert_eq!(document_path(dir, "g", 1, 1, "tex"), PathBuf::from("out/g.tex"));
        assert_eq!(document_path(dir, "g", 2, 3, "typ"), PathBuf::from("out/g-2.typ"));
    }

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "pgn-typeset",
            "--format",
            "typst",
            "--orientation",
            "black",
            "--skip-nags",
            "--ply-between-diagrams",
            "4",
            "--cohort",
            "1500-1600",
            "games.pgn",
        ]);
        let options = cli.options().unwrap();

        assert!(matches!(cli.format, Format::Typst));
        assert_eq!(options.orientation, Orientation::Black);
        assert!(options.skip_nags);
        assert!(!options.skip_comments);
        assert_eq!(options.ply_between_diagrams.get(), 4);
        assert_eq!(options.cohort(), Some("1500-1600"));
        assert_eq!(cli.inputs, vec!["games.pgn"]);
    }

    #[test]
    fn test_request_file_merges_with_flags() {
        let dir = tempfile::TempDir::new().unwrap();
        let request = dir.path().join("request.json");
        let payload = r#"{"pgn": "1. e4 *", "skipComments": true, "id": "abc"}"#;
        fs::write(&request, payload).unwrap();

        let cli = Cli::parse_from([
            "pgn-typeset",
            "--request",
            request.to_str().unwrap(),
            "--skip-header",
        ]);
        let options = cli.options().unwrap();

        assert_eq!(options.pgn, "1. e4 *");
        assert!(options.skip_comments);
        assert!(options.skip_header);
        assert_eq!(options.id(), Some("abc"));
    }
}
