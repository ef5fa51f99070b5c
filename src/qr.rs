use crate::error::{RenderError, Result};
use image::{ImageFormat, Luma};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use qrcode::{EcLevel, QrCode};
use std::path::Path;

const GAME_URL_BASE: &str = "https://www.chessdojo.club/games";

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn game_url(cohort: &str, id: &str) -> String {
    format!(
        "{GAME_URL_BASE}/{}/{}",
        utf8_percent_encode(cohort, URI_COMPONENT),
        utf8_percent_encode(id, URI_COMPONENT)
    )
}

/// Writes a PNG QR code for `url` to `path`, with the highest error correction level.
pub fn write_qr_code(path: &Path, url: &str) -> Result<()> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::H).map_err(|e| {
        RenderError::QrEncode {
            url: url.to_string(),
            reason: e.to_string(),
        }
    })?;

    code.render::<Luma<u8>>()
        .build()
        .save_with_format(path, ImageFormat::Png)?;
    tracing::debug!(path = %path.display(), url, "wrote QR code");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_url_encodes_path_segments() {
        assert_eq!(
            game_url("1500-1600", "2024.01.02_abc"),
            "https://www.chessdojo.club/games/1500-1600/2024.01.02_abc"
        );
        assert_eq!(
            game_url("0-300", "a/b c#d"),
            "https://www.chessdojo.club/games/0-300/a%2Fb%20c%23d"
        );
    }

    #[test]
    fn test_write_qr_code_creates_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr.png");

        write_qr_code(&path, &game_url("1500-1600", "abc")).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_write_qr_code_propagates_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("qr.png");

        let err = write_qr_code(&path, "https://example.com").unwrap_err();
        assert!(matches!(err, RenderError::QrWrite(_)));
    }
}
