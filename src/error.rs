use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

const TEMPORARY_SERVER_ERROR: &str = "Temporary server error";

/// Every failure is fatal to the render call that produced it.
///
/// Variants carry an HTTP-style status code plus a public message that is safe
/// to show end users; `Display` is the private diagnostic message.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("QR code requested, but options are missing {missing}")]
    MissingQrFields { missing: String },

    #[error("title already built, output buffer holds {len} bytes")]
    TitleAlreadyBuilt { len: usize },

    #[error("failed to encode QR code for '{url}': {reason}")]
    QrEncode { url: String, reason: String },

    #[error(transparent)]
    QrWrite(#[from] image::ImageError),

    #[error("invalid PGN: {0}")]
    InvalidPgn(String),

    #[error("invalid render request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("invalid input pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidPgn(_) | Self::InvalidRequest(_) | Self::InvalidPattern(_) => 400,
            Self::MissingQrFields { .. }
            | Self::Open { .. }
            | Self::TitleAlreadyBuilt { .. }
            | Self::QrEncode { .. }
            | Self::QrWrite(_)
            | Self::Io(_) => 500,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidPgn(_) => "Invalid PGN",
            Self::InvalidRequest(_) | Self::InvalidPattern(_) => "Invalid request",
            Self::TitleAlreadyBuilt { .. } => "Internal server error",
            Self::MissingQrFields { .. }
            | Self::QrEncode { .. }
            | Self::QrWrite(_)
            | Self::Open { .. }
            | Self::Io(_) => TEMPORARY_SERVER_ERROR,
        }
    }

    pub fn private_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::RenderError;

    #[test]
    fn test_missing_qr_fields_hides_details_from_public_message() {
        let err = RenderError::MissingQrFields {
            missing: "qrcodeFilename".to_string(),
        };

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "Temporary server error");
        assert!(err.private_message().contains("qrcodeFilename"));
    }

    #[test]
    fn test_invalid_pgn_is_client_error() {
        let err = RenderError::InvalidPgn("illegal san 'Ke9'".to_string());

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.public_message(), "Invalid PGN");
        assert_eq!(err.private_message(), "invalid PGN: illegal san 'Ke9'");
    }

    #[test]
    fn test_title_already_built_is_internal() {
        let err = RenderError::TitleAlreadyBuilt { len: 12 };

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
