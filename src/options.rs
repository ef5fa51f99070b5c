use crate::error::Result;
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

const DEFAULT_PLY_BETWEEN_DIAGRAMS: NonZeroU32 = NonZeroU32::new(16).unwrap();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    White,
    Black,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("White"),
            Self::Black => f.write_str("Black"),
        }
    }
}

/// Export request for a single game.
///
/// Deserializes from the camelCase JSON payload sent by the export handler;
/// every field except `pgn` is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub pgn: String,
    pub orientation: Orientation,
    pub skip_comments: bool,
    pub skip_variations: bool,
    pub skip_null_moves: bool,
    pub skip_nags: bool,
    pub skip_drawables: bool,
    pub skip_header: bool,
    pub ply_between_diagrams: NonZeroU32,
    pub cohort: Option<String>,
    pub id: Option<String>,
    pub qrcode_filename: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pgn: String::new(),
            orientation: Orientation::White,
            skip_comments: false,
            skip_variations: false,
            skip_null_moves: false,
            skip_nags: false,
            skip_drawables: false,
            skip_header: false,
            ply_between_diagrams: DEFAULT_PLY_BETWEEN_DIAGRAMS,
            cohort: None,
            id: None,
            qrcode_filename: None,
        }
    }
}

impl RenderOptions {
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn cohort(&self) -> Option<&str> {
        non_empty(self.cohort.as_deref())
    }

    pub fn id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }

    pub fn qrcode_filename(&self) -> Option<&std::path::Path> {
        self.qrcode_filename
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Cohort and id together identify the game online.
    pub fn links_game(&self) -> bool {
        self.cohort().is_some() && self.id().is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_camel_case_payload() {
        let options = RenderOptions::from_json(
            r#"{
                "pgn": "1. e4 *",
                "orientation": "black",
                "skipComments": true,
                "skipNullMoves": true,
                "plyBetweenDiagrams": 8,
                "cohort": "1500-1600",
                "id": "abc"
            }"#,
        )
        .unwrap();

        assert_eq!(options.pgn, "1. e4 *");
        assert_eq!(options.orientation, Orientation::Black);
        assert!(options.skip_comments);
        assert!(options.skip_null_moves);
        assert!(!options.skip_variations);
        assert_eq!(options.ply_between_diagrams.get(), 8);
        assert!(options.links_game());
        assert_eq!(options.qrcode_filename(), None);
    }

    #[test]
    fn test_from_json_defaults() {
        let options = RenderOptions::from_json(r#"{"pgn": ""}"#).unwrap();

        assert_eq!(options.orientation, Orientation::White);
        assert_eq!(options.ply_between_diagrams.get(), 16);
        assert!(!options.links_game());
    }

    #[test]
    fn test_zero_ply_between_diagrams_is_rejected() {
        let err = RenderOptions::from_json(r#"{"plyBetweenDiagrams": 0}"#).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_empty_identifiers_count_as_missing() {
        let options = RenderOptions {
            cohort: Some(String::new()),
            id: Some("abc".to_string()),
            ..RenderOptions::default()
        };
        assert!(!options.links_game());
    }

    #[test]
    fn test_orientation_display_is_capitalized() {
        assert_eq!(Orientation::White.to_string(), "White");
        assert_eq!(Orientation::Black.to_string(), "Black");
    }
}
