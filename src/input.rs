//! PGN files on disk: glob expansion, optional zstd decompression and
//! multi-game streams.

use crate::chess::{Game, GameVisitor};
use crate::error::{RenderError, Result};
use pgn_reader::Reader;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder as ZstdDecoder;

pub type PgnInput = Box<dyn Read + Send>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Compression {
    /// Decompress files ending in `.zst`, read everything else as is.
    #[default]
    Auto,
    Zstd,
}

impl Compression {
    fn decompresses(self, path: &Path) -> bool {
        match self {
            Self::Auto => path.extension().is_some_and(|ext| ext == "zst"),
            Self::Zstd => true,
        }
    }
}

/// A single path, or every match of a glob pattern in alphabetical order.
pub fn expand_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    if !pattern.contains(['*', '?', '[']) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => tracing::warn!(error = %e, "skipping unreadable glob match"),
        }
    }
    if paths.is_empty() {
        tracing::warn!(pattern, "pattern matched no files");
    }
    Ok(paths)
}

pub fn open_input_stream(path: &Path, compression: Compression) -> Result<PgnInput> {
    let open_error = |source| RenderError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;

    if !compression.decompresses(path) {
        return Ok(Box::new(file));
    }
    ZstdDecoder::new(file)
        .map(|decoder| Box::new(decoder) as PgnInput)
        .map_err(open_error)
}

/// Every game of a PGN stream. Games that fail to replay are skipped with a
/// warning; read failures abort.
pub fn read_games<R: Read>(input: R) -> Result<Vec<Game>> {
    let mut reader = Reader::new(input);
    let mut visitor = GameVisitor;
    let mut games = Vec::new();
    let mut index = 0usize;

    while let Some(game) = reader.read_game(&mut visitor)? {
        index += 1;
        match game {
            Ok(game) => games.push(game),
            Err(e) => tracing::warn!(game = index, error = %e, "skipping game"),
        }
    }

    Ok(games)
}

pub fn read_games_from_path(path: &Path, compression: Compression) -> Result<Vec<Game>> {
    let games = read_games(open_input_stream(path, compression)?)?;
    tracing::debug!(path = %path.display(), games = games.len(), "read PGN file");
    Ok(games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const TWO_GAMES: &str = r#"[White "Alice"]
[Black "Bob"]
[Result "1-0"]

1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0

[White "Carol"]
[Black "Dave"]
[Result "*"]

1. d4 d5 *
"#;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_read_games_multi_game_stream() {
        let games = read_games(TWO_GAMES.as_bytes()).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].headers.get("White"), Some("Alice"));
        assert_eq!(games[1].headers.get("White"), Some("Carol"));
        assert_eq!(games[1].main_line.moves.len(), 2);
    }

    #[test]
    fn test_read_games_skips_illegal_game() {
        let pgn = "1. e4 e5 2. Ke3 *\n\n1. d4 d5 *\n";
        let games = read_games(pgn.as_bytes()).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].main_line.moves[0].san, "d4");
    }

    #[test]
    fn test_zstd_file_by_extension() {
        let dir = TempDir::new().unwrap();
        let compressed = zstd::encode_all(TWO_GAMES.as_bytes(), 0).unwrap();
        let path = write_file(&dir, "games.pgn.zst", &compressed);

        let games = read_games_from_path(&path, Compression::Auto).unwrap();
        assert_eq!(games.len(), 2);
    }

    #[test]
    fn test_forced_zstd_on_plain_name() {
        let dir = TempDir::new().unwrap();
        let compressed = zstd::encode_all(TWO_GAMES.as_bytes(), 0).unwrap();
        let path = write_file(&dir, "games.bin", &compressed);

        let games = read_games_from_path(&path, Compression::Zstd).unwrap();
        assert_eq!(games.len(), 2);
    }

    #[test]
    fn test_glob_expansion_sorted() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "b.pgn", b"1. e4 *");
        write_file(&dir, "a.pgn", b"1. d4 *");
        write_file(&dir, "notes.txt", b"");

        let pattern = dir.path().join("*.pgn");
        let paths = expand_paths(&pattern.to_string_lossy()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pgn", "b.pgn"]);
    }

    #[test]
    fn test_plain_path_is_not_globbed() {
        let paths = expand_paths("/does/not/exist.pgn").unwrap();
        assert_eq!(paths, vec![PathBuf::from("/does/not/exist.pgn")]);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = open_input_stream(Path::new("/does/not/exist.pgn"), Compression::Auto)
            .err()
            .unwrap();
        assert!(err.to_string().contains("/does/not/exist.pgn"));
        assert_eq!(err.status_code(), 500);
    }
}
