// ============================================================================
// ERRORS — boundary rejections and encoder / file failures
// ============================================================================

pub type CanvasResult<T> = Result<T, CanvasError>;

/// Everything the core can refuse or fail at.
///
/// Range-check failures (`InvalidDimension`, `InvalidIndex`,
/// `LastLayerProtected`) leave all state untouched; the caller decides how
/// to tell the user.
#[derive(thiserror::Error, Debug)]
pub enum CanvasError {
    #[error("invalid canvas dimensions {width}×{height}")]
    InvalidDimension { width: i64, height: i64 },

    #[error("layer index {index} out of range (stack has {len} layers)")]
    InvalidIndex { index: usize, len: usize },

    #[error("cannot delete the last remaining layer")]
    LastLayerProtected,

    #[error("unsupported export format '{0}'")]
    UnsupportedFormat(String),

    #[error("script error on line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("encode error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("WebP encode error: {0}")]
    WebpEncode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CanvasError {
    pub fn invalid_dimension(width: impl Into<i64>, height: impl Into<i64>) -> Self {
        Self::InvalidDimension {
            width: width.into(),
            height: height.into(),
        }
    }

    pub fn script(line: usize, message: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_offending_values() {
        let e = CanvasError::invalid_dimension(0, 4001);
        assert!(e.to_string().contains("0×4001"));

        let e = CanvasError::InvalidIndex { index: 7, len: 2 };
        assert!(e.to_string().contains('7'));
        assert!(e.to_string().contains("2 layers"));

        let e = CanvasError::script(12, "unknown command");
        assert!(e.to_string().contains("line 12"));
    }

    #[test]
    fn io_errors_convert() {
        fn fails() -> CanvasResult<()> {
            Err(std::io::Error::other("disk gone"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, CanvasError::Io(_)));
        assert!(err.to_string().contains("disk gone"));
    }
}
