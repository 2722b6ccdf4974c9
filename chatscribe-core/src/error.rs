//! Error types for chatscribe-core

#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScribeError::Clipboard("no display".into());
        assert_eq!(err.to_string(), "Clipboard error: no display");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ScribeError = io.into();
        assert!(err.to_string().starts_with("IO error:"));
    }
}
